#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyDef {
    pub def_name: String,
    pub player_lives: u32,
    pub enemy_speed_factor: f32,
    pub platform_speed_factor: f32,
    pub gravity_factor: f32,
    pub enemies_to_kill: u32,
    pub exp_per_kill: u32,
}

/// Compiled defs in document order. Names are unique per source.
#[derive(Debug, Default, Clone)]
pub struct DefDatabase {
    difficulty_defs: Vec<DifficultyDef>,
    source_hash: String,
}

impl DefDatabase {
    pub(crate) fn from_difficulty_defs(difficulty_defs: Vec<DifficultyDef>, source_hash: String) -> Self {
        Self {
            difficulty_defs,
            source_hash,
        }
    }

    pub fn difficulty_defs(&self) -> &[DifficultyDef] {
        &self.difficulty_defs
    }

    pub fn source_hash(&self) -> &str {
        &self.source_hash
    }
}
