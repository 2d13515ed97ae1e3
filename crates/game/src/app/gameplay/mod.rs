use engine::Vec3;

mod combat;
mod events;
mod highscore;
mod locomotion;
mod notifications;
mod physics;
mod profile;
mod session;
mod store;
mod types;
mod worldgen;

pub use combat::{
    accrue_experience, damage_player, next_experience_threshold, resolve, CombatConfig,
    ExperienceGain, Resolution,
};
pub use events::{
    DamageSource, DomainEvent, EventLog, GameEvent, GameEventCounts, GameEventKind, RespawnReason,
};
pub use highscore::{HighScoreError, HighScoreStore, JsonFileHighScores, MemoryHighScores};
pub use locomotion::{
    JumpPolicy, LocomotionConfig, LocomotionController, LocomotionOutput, LocomotionState,
};
pub use notifications::{
    notification_for, Notification, NotificationId, NotificationKind, NotificationQueue,
};
pub use physics::{
    BodyState, Contact, ContactTag, KinematicPhysics, PhysicsError, PhysicsWorld, StepOutcome,
};
pub use profile::{ConfigurationError, DifficultyProfile, ProfileCatalog};
pub use session::{GameSession, GameSnapshot, SessionConfig, TickReport};
pub use store::{reduce, Action, ActionRejected, GameState, GameStore, ObjectivesUpdate};
pub use types::{
    AudioSettings, Collectible, CollectibleKind, Enemy, Entity, GameStats, GraphicsQuality,
    GraphicsSettings, Platform, PlatformKind, PlayerState, RunPhase, Settings, WorldState,
};
pub use worldgen::{generate, generate_with};

pub const PLATFORM_COUNT: usize = 50;
pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 3.0, 0.0);
pub const ORIGIN_PLATFORM_SIZE: Vec3 = Vec3::new(10.0, 1.0, 10.0);
pub const PLATFORM_HORIZONTAL_SIZE_RANGE: (f32, f32) = (3.0, 6.0);
pub const PLATFORM_VERTICAL_SIZE_RANGE: (f32, f32) = (0.5, 1.0);
pub const MOVING_PLATFORM_INTERVAL: usize = 7;
pub const COLLECTIBLE_CHANCE: f64 = 0.6;
pub const SPECIAL_COLLECTIBLE_CHANCE: f64 = 0.2;
pub const ENEMY_CHANCE: f64 = 0.3;
pub const ENEMY_MIN_PLATFORM_INDEX: usize = 6;
pub const COLLECTIBLE_HEIGHT_OFFSET: f32 = 2.0;
pub const ENEMY_HEIGHT_OFFSET: f32 = 1.5;
pub const NORMAL_COLLECTIBLE_VALUE: u32 = 10;
pub const SPECIAL_COLLECTIBLE_VALUE: u32 = 50;
pub const ENEMY_HEALTH_PER_TIER: u32 = 50;
pub const MAX_ENEMY_TIER: u32 = 3;

pub const BASE_MOVE_SPEED: f32 = 8.0;
pub const DASH_MULTIPLIER: f32 = 1.5;
pub const BACKWARD_MULTIPLIER: f32 = 0.5;
pub const JUMP_IMPULSE: f32 = 15.0;
pub const BASE_GRAVITY: f32 = -30.0;
pub const FALL_FLOOR_Y: f32 = -20.0;
pub const FALL_DAMAGE: u32 = 20;
pub const PLAYER_MAX_HEALTH: u32 = 100;
pub const PLAYER_HALF_HEIGHT: f32 = 0.5;
pub const PICKUP_RADIUS: f32 = 1.5;
pub const ENEMY_CONTACT_RADIUS: f32 = 1.25;

pub const ENEMY_ATTACK_DAMAGE: u32 = 25;
pub const ENEMY_DEFEAT_REWARD: u32 = 100;
pub const INITIAL_EXPERIENCE_TO_NEXT: u32 = 100;

pub const CAMERA_SHAKE_INTENSITY: f32 = 0.5;
pub const CAMERA_SHAKE_DURATION_MS: u32 = 300;
pub const SHORT_NOTIFICATION_MS: u32 = 1_500;
pub const LONG_NOTIFICATION_MS: u32 = 4_000;

#[cfg(test)]
mod tests;
