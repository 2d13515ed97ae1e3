use engine::{EntityId, Vec3};
use thiserror::Error;
use tracing::warn;

use super::combat::accrue_experience;
use super::notifications::{NotificationId, NotificationKind, NotificationQueue};
use super::profile::DifficultyProfile;
use super::types::{Entity, GameStats, PlayerState, RunPhase, Settings, WorldState};
use super::SPAWN_POINT;

/// The single authoritative aggregate. Only [`reduce`] produces new values.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub profile: DifficultyProfile,
    pub spawn_point: Vec3,
    pub player: PlayerState,
    pub world: WorldState,
    pub stats: GameStats,
    pub notifications: NotificationQueue,
    pub phase: RunPhase,
    pub victory_fired: bool,
    pub settings: Settings,
    /// Session clock used for notification expiry. Keeps running after the
    /// run ends, unlike `stats.play_time_seconds`.
    pub clock_seconds: f64,
}

impl GameState {
    pub fn new_run(
        profile: DifficultyProfile,
        world: WorldState,
        settings: Settings,
        high_score: u32,
    ) -> Self {
        Self {
            spawn_point: SPAWN_POINT,
            player: PlayerState::spawned(SPAWN_POINT, profile.player_lives),
            stats: GameStats::for_run(profile.enemies_to_kill, high_score),
            profile,
            world,
            notifications: NotificationQueue::default(),
            phase: RunPhase::Playing,
            victory_fired: false,
            settings,
            clock_seconds: 0.0,
        }
    }
}

/// Partial merge of run counters; `None` leaves a counter untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectivesUpdate {
    pub enemies_killed: Option<u32>,
    pub gems_collected: Option<u32>,
    pub enemies_target: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    UpdateScore {
        score: u32,
    },
    AddScore {
        amount: u32,
    },
    UpdateHealth {
        health: u32,
    },
    ApplyDamage {
        amount: u32,
    },
    LoseLife,
    AddExperience {
        amount: u32,
    },
    UpdateObjectives(ObjectivesUpdate),
    UpdatePlayerPosition {
        position: Vec3,
        velocity: Vec3,
        grounded: bool,
    },
    AddNotification {
        kind: NotificationKind,
        message: String,
        duration_ms: u32,
    },
    RemoveNotification {
        id: NotificationId,
    },
    ResetRun {
        profile: DifficultyProfile,
        world: WorldState,
    },
    MarkCollected {
        id: EntityId,
    },
    DamageEnemy {
        id: EntityId,
        amount: u32,
    },
    RecordJump,
    AdvancePlayTime {
        seconds: f64,
    },
    DeclareVictory,
    DeclareGameOver,
    UpdateSettings(Settings),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdateScore { .. } => "update_score",
            Self::AddScore { .. } => "add_score",
            Self::UpdateHealth { .. } => "update_health",
            Self::ApplyDamage { .. } => "apply_damage",
            Self::LoseLife => "lose_life",
            Self::AddExperience { .. } => "add_experience",
            Self::UpdateObjectives(_) => "update_objectives",
            Self::UpdatePlayerPosition { .. } => "update_player_position",
            Self::AddNotification { .. } => "add_notification",
            Self::RemoveNotification { .. } => "remove_notification",
            Self::ResetRun { .. } => "reset_run",
            Self::MarkCollected { .. } => "mark_collected",
            Self::DamageEnemy { .. } => "damage_enemy",
            Self::RecordJump => "record_jump",
            Self::AdvancePlayTime { .. } => "advance_play_time",
            Self::DeclareVictory => "declare_victory",
            Self::DeclareGameOver => "declare_game_over",
            Self::UpdateSettings(_) => "update_settings",
        }
    }

    /// Actions that only make sense while the run is still being played.
    fn is_gameplay(&self) -> bool {
        !matches!(
            self,
            Self::AddNotification { .. }
                | Self::RemoveNotification { .. }
                | Self::ResetRun { .. }
                | Self::AdvancePlayTime { .. }
                | Self::UpdateSettings(_)
        )
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionRejected {
    #[error("score may not decrease ({current} -> {requested})")]
    ScoreDecrease { current: u32, requested: u32 },
    #[error("{field} may not decrease ({current} -> {requested})")]
    ObjectiveRegression {
        field: &'static str,
        current: u32,
        requested: u32,
    },
    #[error("objective target must be positive")]
    ZeroObjectiveTarget,
    #[error("player position or velocity is not finite")]
    NonFinitePosition,
    #[error("entity {0:?} does not exist")]
    UnknownEntity(EntityId),
    #[error("entity {id:?} is a {actual}, expected {expected}")]
    WrongEntityKind {
        id: EntityId,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("collectible {0:?} was already collected")]
    AlreadyCollected(EntityId),
    #[error("enemy {0:?} is already defeated")]
    EnemyAlreadyDefeated(EntityId),
    #[error("notification duration must be positive")]
    ZeroDuration,
    #[error("no lives remaining")]
    NoLivesRemaining,
    #[error("play time delta {0} is invalid")]
    InvalidTimeDelta(f64),
    #[error("invalid profile for run reset: {0}")]
    InvalidProfile(String),
    #[error("{action} rejected after the run ended ({phase:?})")]
    RunEnded {
        action: &'static str,
        phase: RunPhase,
    },
}

/// Pure reducer. A rejected action leaves no trace; callers keep `state`.
pub fn reduce(state: &GameState, action: &Action) -> Result<GameState, ActionRejected> {
    if state.phase.is_terminal() && action.is_gameplay() {
        return Err(ActionRejected::RunEnded {
            action: action.name(),
            phase: state.phase,
        });
    }

    let mut next = state.clone();
    match action {
        Action::UpdateScore { score } => {
            if *score < state.stats.score {
                return Err(ActionRejected::ScoreDecrease {
                    current: state.stats.score,
                    requested: *score,
                });
            }
            next.stats.score = *score;
        }
        Action::AddScore { amount } => {
            next.stats.score = next.stats.score.saturating_add(*amount);
        }
        Action::UpdateHealth { health } => {
            next.player.health = (*health).min(next.player.max_health);
        }
        Action::ApplyDamage { amount } => {
            next.player.health = next.player.health.saturating_sub(*amount);
        }
        Action::LoseLife => {
            if state.player.lives == 0 {
                return Err(ActionRejected::NoLivesRemaining);
            }
            next.player.lives -= 1;
            if next.player.lives > 0 {
                next.player.health = next.player.max_health;
                next.player.position = next.spawn_point;
                next.player.velocity = Vec3::ZERO;
                next.player.grounded = true;
            }
        }
        Action::AddExperience { amount } => {
            let gain = accrue_experience(&state.stats, *amount);
            next.stats.level = gain.level;
            next.stats.experience = gain.experience;
            next.stats.experience_to_next = gain.experience_to_next;
        }
        Action::UpdateObjectives(update) => {
            if let Some(killed) = update.enemies_killed {
                next.stats.enemies_killed =
                    monotonic("enemies_killed", state.stats.enemies_killed, killed)?;
            }
            if let Some(gems) = update.gems_collected {
                next.stats.gems_collected =
                    monotonic("gems_collected", state.stats.gems_collected, gems)?;
            }
            if let Some(target) = update.enemies_target {
                if target == 0 {
                    return Err(ActionRejected::ZeroObjectiveTarget);
                }
                next.stats.enemies_target = target;
            }
        }
        Action::UpdatePlayerPosition {
            position,
            velocity,
            grounded,
        } => {
            if !position.is_finite() || !velocity.is_finite() {
                return Err(ActionRejected::NonFinitePosition);
            }
            next.player.position = *position;
            next.player.velocity = *velocity;
            next.player.grounded = *grounded;
        }
        Action::AddNotification {
            kind,
            message,
            duration_ms,
        } => {
            if *duration_ms == 0 {
                return Err(ActionRejected::ZeroDuration);
            }
            let now = state.clock_seconds;
            next.notifications
                .push(*kind, message.clone(), *duration_ms, now);
        }
        Action::RemoveNotification { id } => {
            next.notifications.remove(*id);
        }
        Action::ResetRun { profile, world } => {
            profile
                .validate()
                .map_err(|err| ActionRejected::InvalidProfile(err.to_string()))?;
            let high_score = state.stats.high_score.max(state.stats.score);
            next = GameState::new_run(profile.clone(), world.clone(), state.settings, high_score);
            next.notifications = state.notifications.clone();
            next.notifications.clear();
            next.clock_seconds = state.clock_seconds;
        }
        Action::MarkCollected { id } => match next.world.entity_mut(*id) {
            Some(Entity::Collectible(collectible)) => {
                if collectible.collected {
                    return Err(ActionRejected::AlreadyCollected(*id));
                }
                collectible.collected = true;
            }
            Some(other) => return Err(wrong_kind(*id, "collectible", other)),
            None => return Err(ActionRejected::UnknownEntity(*id)),
        },
        Action::DamageEnemy { id, amount } => match next.world.entity_mut(*id) {
            Some(Entity::Enemy(enemy)) => {
                if !enemy.alive {
                    return Err(ActionRejected::EnemyAlreadyDefeated(*id));
                }
                enemy.health = enemy.health.saturating_sub(*amount);
                if enemy.health == 0 {
                    enemy.alive = false;
                }
            }
            Some(other) => return Err(wrong_kind(*id, "enemy", other)),
            None => return Err(ActionRejected::UnknownEntity(*id)),
        },
        Action::RecordJump => {
            next.stats.jumps = next.stats.jumps.saturating_add(1);
        }
        Action::AdvancePlayTime { seconds } => {
            if !seconds.is_finite() || *seconds < 0.0 {
                return Err(ActionRejected::InvalidTimeDelta(*seconds));
            }
            next.clock_seconds += seconds;
            if next.phase == RunPhase::Playing {
                next.stats.play_time_seconds += seconds;
            }
            next.notifications.expire_due(next.clock_seconds);
        }
        Action::DeclareVictory => {
            next.phase = RunPhase::Victory;
            next.victory_fired = true;
            next.stats.high_score = next.stats.high_score.max(next.stats.score);
        }
        Action::DeclareGameOver => {
            next.phase = RunPhase::GameOver;
            next.stats.high_score = next.stats.high_score.max(next.stats.score);
        }
        Action::UpdateSettings(settings) => {
            next.settings = *settings;
        }
    }
    Ok(next)
}

fn monotonic(field: &'static str, current: u32, requested: u32) -> Result<u32, ActionRejected> {
    if requested < current {
        return Err(ActionRejected::ObjectiveRegression {
            field,
            current,
            requested,
        });
    }
    Ok(requested)
}

fn wrong_kind(id: EntityId, expected: &'static str, actual: &Entity) -> ActionRejected {
    ActionRejected::WrongEntityKind {
        id,
        expected,
        actual: actual.kind_name(),
    }
}

/// Owns the current [`GameState`] and applies actions through [`reduce`].
#[derive(Debug)]
pub struct GameStore {
    state: GameState,
    applied: u64,
    rejected: u64,
}

impl GameStore {
    pub fn new(state: GameState) -> Self {
        Self {
            state,
            applied: 0,
            rejected: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn try_dispatch(&mut self, action: &Action) -> Result<(), ActionRejected> {
        match reduce(&self.state, action) {
            Ok(next) => {
                self.state = next;
                self.applied = self.applied.saturating_add(1);
                Ok(())
            }
            Err(reason) => {
                self.rejected = self.rejected.saturating_add(1);
                warn!(action = action.name(), reason = %reason, "action_rejected");
                Err(reason)
            }
        }
    }

    /// Applies `action`, logging and ignoring a rejection.
    pub fn dispatch(&mut self, action: Action) -> bool {
        self.try_dispatch(&action).is_ok()
    }

    pub fn dispatch_all(&mut self, actions: impl IntoIterator<Item = Action>) -> usize {
        actions
            .into_iter()
            .filter(|action| self.try_dispatch(action).is_ok())
            .count()
    }

    pub fn applied_count(&self) -> u64 {
        self.applied
    }

    pub fn rejected_count(&self) -> u64 {
        self.rejected
    }
}
