use engine::{EntityId, Vec3};
use serde::Serialize;

use super::types::CollectibleKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnReason {
    Fall,
    LifeLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "entity")]
pub enum DamageSource {
    Fall,
    Enemy(EntityId),
}

/// Gameplay occurrences presentation layers react to. Each variant carries
/// enough data that consumers never need to query the store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GameEvent {
    Collected {
        id: EntityId,
        value: u32,
        kind: CollectibleKind,
    },
    EnemyHit {
        id: EntityId,
        damage: u32,
        remaining_health: u32,
    },
    EnemyDefeated {
        id: EntityId,
        reward: u32,
    },
    PlayerDamaged {
        amount: u32,
        health: u32,
        source: DamageSource,
    },
    LifeLost {
        lives_remaining: u32,
    },
    Respawned {
        reason: RespawnReason,
        position: Vec3,
    },
    CameraShake {
        intensity: f32,
        duration_ms: u32,
    },
    Jumped {
        jumps: u32,
    },
    LevelUp {
        level: u32,
    },
    Victory {
        enemies_killed: u32,
        score: u32,
    },
    GameOver {
        final_score: u32,
    },
    HighScoreBeaten {
        previous: u32,
        score: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEventKind {
    Collected,
    EnemyHit,
    EnemyDefeated,
    PlayerDamaged,
    LifeLost,
    Respawned,
    CameraShake,
    Jumped,
    LevelUp,
    Victory,
    GameOver,
    HighScoreBeaten,
}

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            Self::Collected { .. } => GameEventKind::Collected,
            Self::EnemyHit { .. } => GameEventKind::EnemyHit,
            Self::EnemyDefeated { .. } => GameEventKind::EnemyDefeated,
            Self::PlayerDamaged { .. } => GameEventKind::PlayerDamaged,
            Self::LifeLost { .. } => GameEventKind::LifeLost,
            Self::Respawned { .. } => GameEventKind::Respawned,
            Self::CameraShake { .. } => GameEventKind::CameraShake,
            Self::Jumped { .. } => GameEventKind::Jumped,
            Self::LevelUp { .. } => GameEventKind::LevelUp,
            Self::Victory { .. } => GameEventKind::Victory,
            Self::GameOver { .. } => GameEventKind::GameOver,
            Self::HighScoreBeaten { .. } => GameEventKind::HighScoreBeaten,
        }
    }
}

/// A game event stamped with the tick and play time it was emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DomainEvent {
    pub tick: u64,
    pub play_time_seconds: f64,
    #[serde(flatten)]
    pub event: GameEvent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GameEventCounts {
    pub total: u32,
    pub collected: u32,
    pub enemy_hit: u32,
    pub enemy_defeated: u32,
    pub player_damaged: u32,
    pub life_lost: u32,
    pub respawned: u32,
    pub camera_shake: u32,
    pub jumped: u32,
    pub level_up: u32,
    pub victory: u32,
    pub game_over: u32,
    pub high_score_beaten: u32,
}

impl GameEventCounts {
    pub fn record(&mut self, kind: GameEventKind) {
        self.total = self.total.saturating_add(1);
        let slot = match kind {
            GameEventKind::Collected => &mut self.collected,
            GameEventKind::EnemyHit => &mut self.enemy_hit,
            GameEventKind::EnemyDefeated => &mut self.enemy_defeated,
            GameEventKind::PlayerDamaged => &mut self.player_damaged,
            GameEventKind::LifeLost => &mut self.life_lost,
            GameEventKind::Respawned => &mut self.respawned,
            GameEventKind::CameraShake => &mut self.camera_shake,
            GameEventKind::Jumped => &mut self.jumped,
            GameEventKind::LevelUp => &mut self.level_up,
            GameEventKind::Victory => &mut self.victory,
            GameEventKind::GameOver => &mut self.game_over,
            GameEventKind::HighScoreBeaten => &mut self.high_score_beaten,
        };
        *slot = slot.saturating_add(1);
    }
}

/// Append-only event stream. Consumers drain it; per-tick counts survive
/// the drain for diagnostics.
#[derive(Debug, Default)]
pub struct EventLog {
    pending: Vec<DomainEvent>,
    current_tick: GameEventCounts,
    last_tick_counts: GameEventCounts,
    total_emitted: u64,
}

impl EventLog {
    pub fn emit(&mut self, tick: u64, play_time_seconds: f64, event: GameEvent) {
        self.current_tick.record(event.kind());
        self.total_emitted = self.total_emitted.saturating_add(1);
        self.pending.push(DomainEvent {
            tick,
            play_time_seconds,
            event,
        });
    }

    pub fn pending(&self) -> &[DomainEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn finish_tick_rollover(&mut self) {
        self.last_tick_counts = std::mem::take(&mut self.current_tick);
    }

    pub fn last_tick_counts(&self) -> GameEventCounts {
        self.last_tick_counts
    }

    pub fn total_emitted(&self) -> u64 {
        self.total_emitted
    }
}
