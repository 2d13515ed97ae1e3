use sha2::{Digest, Sha256};

/// Incremental SHA-256 over tagged primitive values.
///
/// Floats are hashed by bit pattern, so two values only match when they are
/// bit-identical.
#[derive(Clone, Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_bytes(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.hasher.update([0u8]);
    }

    pub fn update_str(&mut self, value: &str) {
        self.update_bytes(value.as_bytes());
    }

    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    pub fn update_f32(&mut self, value: f32) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    pub fn finish_hex(self) -> String {
        to_hex_lower(&self.hasher.finalize())
    }
}

fn to_hex_lower(bytes: &[u8]) -> String {
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs_hash_identically() {
        let mut a = Fingerprint::new();
        let mut b = Fingerprint::new();
        for fp in [&mut a, &mut b] {
            fp.update_str("platform");
            fp.update_u64(7);
            fp.update_f32(1.5);
        }
        assert_eq!(a.finish_hex(), b.finish_hex());
    }

    #[test]
    fn string_boundaries_are_separated() {
        let mut a = Fingerprint::new();
        a.update_str("ab");
        a.update_str("c");
        let mut b = Fingerprint::new();
        b.update_str("a");
        b.update_str("bc");
        assert_ne!(a.finish_hex(), b.finish_hex());
    }

    #[test]
    fn float_bits_matter() {
        let mut a = Fingerprint::new();
        a.update_f32(0.0);
        let mut b = Fingerprint::new();
        b.update_f32(-0.0);
        assert_ne!(a.finish_hex(), b.finish_hex());
    }

    #[test]
    fn hex_is_lowercase_sha256_length() {
        let hex = Fingerprint::new().finish_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
