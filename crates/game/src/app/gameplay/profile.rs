use std::path::Path;

use engine::{compile_def_database, ContentCompileError, DefDatabase, DifficultyDef};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("platform count must be positive")]
    NonPositivePlatformCount,
    #[error("difficulty profile name must not be empty")]
    EmptyProfileName,
    #[error("difficulty profile `{profile}` must grant at least one life")]
    ZeroLives { profile: String },
    #[error("difficulty profile `{profile}` must require at least one enemy kill")]
    ZeroEnemyTarget { profile: String },
    #[error("difficulty profile `{profile}` has invalid {field} ({value}); expected finite and > 0")]
    InvalidFactor {
        profile: String,
        field: &'static str,
        value: f32,
    },
    #[error("unknown difficulty `{name}` (available: {available})")]
    UnknownDifficulty { name: String, available: String },
    #[error(transparent)]
    Content(#[from] ContentCompileError),
}

/// Immutable parameter set chosen once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyProfile {
    pub name: String,
    pub player_lives: u32,
    pub enemy_speed_factor: f32,
    pub platform_speed_factor: f32,
    pub gravity_factor: f32,
    pub enemies_to_kill: u32,
    pub exp_per_kill: u32,
}

impl DifficultyProfile {
    pub fn easy() -> Self {
        Self {
            name: "easy".to_string(),
            player_lives: 5,
            enemy_speed_factor: 0.75,
            platform_speed_factor: 0.75,
            gravity_factor: 0.9,
            enemies_to_kill: 8,
            exp_per_kill: 30,
        }
    }

    pub fn normal() -> Self {
        Self {
            name: "normal".to_string(),
            player_lives: 3,
            enemy_speed_factor: 1.0,
            platform_speed_factor: 1.0,
            gravity_factor: 1.0,
            enemies_to_kill: 12,
            exp_per_kill: 25,
        }
    }

    pub fn hard() -> Self {
        Self {
            name: "hard".to_string(),
            player_lives: 2,
            enemy_speed_factor: 1.5,
            platform_speed_factor: 1.3,
            gravity_factor: 1.2,
            enemies_to_kill: 20,
            exp_per_kill: 20,
        }
    }

    pub fn from_def(def: &DifficultyDef) -> Result<Self, ConfigurationError> {
        let profile = Self {
            name: def.def_name.clone(),
            player_lives: def.player_lives,
            enemy_speed_factor: def.enemy_speed_factor,
            platform_speed_factor: def.platform_speed_factor,
            gravity_factor: def.gravity_factor,
            enemies_to_kill: def.enemies_to_kill,
            exp_per_kill: def.exp_per_kill,
        };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyProfileName);
        }
        if self.player_lives == 0 {
            return Err(ConfigurationError::ZeroLives {
                profile: self.name.clone(),
            });
        }
        if self.enemies_to_kill == 0 {
            return Err(ConfigurationError::ZeroEnemyTarget {
                profile: self.name.clone(),
            });
        }
        for (field, value) in [
            ("enemy_speed_factor", self.enemy_speed_factor),
            ("platform_speed_factor", self.platform_speed_factor),
            ("gravity_factor", self.gravity_factor),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigurationError::InvalidFactor {
                    profile: self.name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        Self::normal()
    }
}

/// Built-in profiles plus any overrides compiled from difficulty XML.
#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    profiles: Vec<DifficultyProfile>,
}

impl Default for ProfileCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileCatalog {
    pub fn builtin() -> Self {
        Self {
            profiles: vec![
                DifficultyProfile::easy(),
                DifficultyProfile::normal(),
                DifficultyProfile::hard(),
            ],
        }
    }

    /// Loads overrides from `path` when the file exists; a missing file
    /// leaves the built-ins untouched.
    pub fn with_overrides_from(path: &Path) -> Result<Self, ConfigurationError> {
        let mut catalog = Self::builtin();
        if !path.is_file() {
            debug!(path = %path.display(), "difficulty_overrides_absent");
            return Ok(catalog);
        }
        let database = compile_def_database(path)?;
        catalog.apply_overrides(&database)?;
        info!(
            path = %path.display(),
            defs = database.difficulty_defs().len(),
            source_hash = database.source_hash(),
            "difficulty_overrides_loaded"
        );
        Ok(catalog)
    }

    pub fn apply_overrides(&mut self, database: &DefDatabase) -> Result<(), ConfigurationError> {
        for def in database.difficulty_defs() {
            let profile = DifficultyProfile::from_def(def)?;
            match self.profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => *existing = profile,
                None => self.profiles.push(profile),
            }
        }
        Ok(())
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn select(&self, name: &str) -> Result<DifficultyProfile, ConfigurationError> {
        let wanted = name.trim();
        self.profiles
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownDifficulty {
                name: wanted.to_string(),
                available: self.names().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use engine::compile_def_source;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn builtins_validate() {
        for profile in ProfileCatalog::builtin().profiles {
            profile.validate().expect("builtin profile valid");
        }
    }

    #[test]
    fn validation_rejects_zero_lives_and_bad_factors() {
        let mut profile = DifficultyProfile::normal();
        profile.player_lives = 0;
        assert!(matches!(
            profile.validate(),
            Err(ConfigurationError::ZeroLives { .. })
        ));

        let mut profile = DifficultyProfile::normal();
        profile.gravity_factor = f32::NAN;
        assert!(matches!(
            profile.validate(),
            Err(ConfigurationError::InvalidFactor {
                field: "gravity_factor",
                ..
            })
        ));

        let mut profile = DifficultyProfile::hard();
        profile.enemies_to_kill = 0;
        assert!(matches!(
            profile.validate(),
            Err(ConfigurationError::ZeroEnemyTarget { .. })
        ));
    }

    #[test]
    fn select_is_case_insensitive_and_reports_available() {
        let catalog = ProfileCatalog::builtin();
        assert_eq!(catalog.select(" Hard ").expect("hard").player_lives, 2);

        let err = catalog.select("nightmare").expect_err("unknown");
        let message = err.to_string();
        assert!(message.contains("nightmare"));
        assert!(message.contains("easy, normal, hard"));
    }

    #[test]
    fn overrides_replace_and_extend_builtins() {
        let xml = r#"<Defs>
  <DifficultyDef>
    <defName>normal</defName>
    <playerLives>4</playerLives>
    <enemiesToKill>6</enemiesToKill>
    <expPerKill>40</expPerKill>
  </DifficultyDef>
  <DifficultyDef>
    <defName>brutal</defName>
    <playerLives>1</playerLives>
    <enemiesToKill>30</enemiesToKill>
    <expPerKill>10</expPerKill>
    <gravityFactor>1.5</gravityFactor>
  </DifficultyDef>
</Defs>"#;
        let database =
            compile_def_source(Path::new("difficulty.xml"), xml).expect("compile defs");
        let mut catalog = ProfileCatalog::builtin();
        catalog.apply_overrides(&database).expect("apply");

        let normal = catalog.select("normal").expect("normal");
        assert_eq!(normal.player_lives, 4);
        assert_eq!(normal.enemies_to_kill, 6);
        assert_eq!(normal.gravity_factor, 1.0);

        let brutal = catalog.select("brutal").expect("brutal");
        assert_eq!(brutal.gravity_factor, 1.5);
        assert_eq!(catalog.names(), vec!["easy", "normal", "hard", "brutal"]);
    }

    #[test]
    fn zero_lives_override_is_rejected() {
        let xml = r#"<Defs><DifficultyDef>
  <defName>broken</defName>
  <playerLives>0</playerLives>
  <enemiesToKill>3</enemiesToKill>
  <expPerKill>10</expPerKill>
</DifficultyDef></Defs>"#;
        let database = compile_def_source(Path::new("d.xml"), xml).expect("compile defs");
        let mut catalog = ProfileCatalog::builtin();
        assert!(matches!(
            catalog.apply_overrides(&database),
            Err(ConfigurationError::ZeroLives { .. })
        ));
    }

    #[test]
    fn missing_override_file_keeps_builtins() {
        let temp = TempDir::new().expect("tempdir");
        let catalog =
            ProfileCatalog::with_overrides_from(&temp.path().join("difficulty.xml")).expect("load");
        assert_eq!(catalog.names(), vec!["easy", "normal", "hard"]);
    }

    #[test]
    fn malformed_override_file_surfaces_content_error() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("difficulty.xml");
        fs::write(&path, "<Defs><DifficultyDef>").expect("write");
        assert!(matches!(
            ProfileCatalog::with_overrides_from(&path),
            Err(ConfigurationError::Content(_))
        ));
    }

    #[test]
    fn shipped_asset_adds_a_profile() {
        let xml = include_str!("../../../../../assets/difficulty.xml");
        let database = compile_def_source(Path::new("difficulty.xml"), xml).expect("compile");
        let mut catalog = ProfileCatalog::builtin();
        catalog.apply_overrides(&database).expect("apply");
        assert_eq!(catalog.names(), vec!["easy", "normal", "hard", "nightmare"]);
        assert_eq!(catalog.select("Nightmare").expect("select").player_lives, 1);
    }
}
