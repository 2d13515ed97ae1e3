use engine::{resolve_app_paths, AppPaths, LoopConfig, StartupError};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::gameplay::{ConfigurationError, JumpPolicy, ProfileCatalog, SessionConfig};

const DIFFICULTY_ENV_VAR: &str = "SKYRUN_DIFFICULTY";
const SEED_ENV_VAR: &str = "SKYRUN_SEED";
const JUMP_POLICY_ENV_VAR: &str = "SKYRUN_JUMP_POLICY";
const ENEMY_CONTACT_DAMAGE_ENV_VAR: &str = "SKYRUN_ENEMY_CONTACT_DAMAGE";
const DEMO_SECONDS_ENV_VAR: &str = "SKYRUN_DEMO_SECONDS";

const DEFAULT_DIFFICULTY: &str = "normal";
const DEFAULT_SEED: u64 = 1337;
const DEFAULT_DEMO_SECONDS: f32 = 60.0;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("{var}={value:?} is invalid; expected {expected}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

pub struct AppWiring {
    pub paths: AppPaths,
    pub loop_config: LoopConfig,
    pub session: SessionConfig,
    pub demo_seconds: f32,
}

/// Raw settings read from the environment before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOverrides {
    pub difficulty: Option<String>,
    pub seed: Option<u64>,
    pub jump_policy: Option<JumpPolicy>,
    pub enemy_contact_damage: Option<u32>,
    pub demo_seconds: Option<f32>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self, BootstrapError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, BootstrapError> {
        let read = |var: &str| {
            lookup(var)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let seed = read(SEED_ENV_VAR)
            .map(|raw| {
                raw.parse::<u64>().map_err(|_| BootstrapError::InvalidEnv {
                    var: SEED_ENV_VAR,
                    value: raw,
                    expected: "an unsigned integer",
                })
            })
            .transpose()?;
        let jump_policy = read(JUMP_POLICY_ENV_VAR)
            .map(|raw| {
                JumpPolicy::parse(&raw).ok_or(BootstrapError::InvalidEnv {
                    var: JUMP_POLICY_ENV_VAR,
                    value: raw,
                    expected: "`edge` or `held`",
                })
            })
            .transpose()?;
        let enemy_contact_damage = read(ENEMY_CONTACT_DAMAGE_ENV_VAR)
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| BootstrapError::InvalidEnv {
                    var: ENEMY_CONTACT_DAMAGE_ENV_VAR,
                    value: raw,
                    expected: "an unsigned integer",
                })
            })
            .transpose()?;
        let demo_seconds = read(DEMO_SECONDS_ENV_VAR)
            .map(|raw| match raw.parse::<f32>() {
                Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
                _ => Err(BootstrapError::InvalidEnv {
                    var: DEMO_SECONDS_ENV_VAR,
                    value: raw,
                    expected: "a positive number of seconds",
                }),
            })
            .transpose()?;

        Ok(Self {
            difficulty: read(DIFFICULTY_ENV_VAR),
            seed,
            jump_policy,
            enemy_contact_damage,
            demo_seconds,
        })
    }

    pub fn session_config(&self, catalog: &ProfileCatalog) -> Result<SessionConfig, BootstrapError> {
        let difficulty = self.difficulty.as_deref().unwrap_or(DEFAULT_DIFFICULTY);
        let profile = catalog.select(difficulty)?;
        let mut config = SessionConfig::new(self.seed.unwrap_or(DEFAULT_SEED), profile);
        if let Some(policy) = self.jump_policy {
            config.locomotion.jump_policy = policy;
        }
        config.combat.enemy_contact_damage = self.enemy_contact_damage;
        config.quit_when_run_ends = true;
        Ok(config)
    }
}

pub fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Skyrun Startup ===");

    let paths = resolve_app_paths()?;
    let catalog = ProfileCatalog::with_overrides_from(&paths.difficulty_defs_path())?;
    let overrides = EnvOverrides::from_env()?;
    let session = overrides.session_config(&catalog)?;
    info!(
        root = %paths.root.display(),
        difficulty = %session.profile.name,
        seed = session.seed,
        jump_policy = ?session.locomotion.jump_policy,
        enemy_contact_damage = ?session.combat.enemy_contact_damage,
        "app_configured"
    );

    Ok(AppWiring {
        paths,
        loop_config: LoopConfig::default(),
        session,
        demo_seconds: overrides.demo_seconds.unwrap_or(DEFAULT_DEMO_SECONDS),
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
