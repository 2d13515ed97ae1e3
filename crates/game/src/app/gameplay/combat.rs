use tracing::debug;

use super::events::{DamageSource, GameEvent, RespawnReason};
use super::physics::{Contact, ContactTag};
use super::store::{Action, GameState, ObjectivesUpdate};
use super::types::GameStats;
use super::{ENEMY_ATTACK_DAMAGE, ENEMY_DEFEAT_REWARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatConfig {
    pub enemy_attack_damage: u32,
    pub defeat_reward: u32,
    /// Damage dealt to the player when an enemy touches them. `None` turns
    /// enemy touches into no-ops.
    pub enemy_contact_damage: Option<u32>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            enemy_attack_damage: ENEMY_ATTACK_DAMAGE,
            defeat_reward: ENEMY_DEFEAT_REWARD,
            enemy_contact_damage: None,
        }
    }
}

/// Actions for the store plus the events they imply, in application order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub actions: Vec<Action>,
    pub events: Vec<GameEvent>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.events.is_empty()
    }

    pub fn extend(&mut self, other: Resolution) {
        self.actions.extend(other.actions);
        self.events.extend(other.events);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperienceGain {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next: u32,
    pub levels_gained: Vec<u32>,
}

pub fn next_experience_threshold(current: u32) -> u32 {
    current.saturating_add(current / 2).max(1)
}

/// Adds `amount` and rolls over as many levels as it pays for.
pub fn accrue_experience(stats: &GameStats, amount: u32) -> ExperienceGain {
    let mut level = stats.level;
    let mut experience = stats.experience.saturating_add(amount);
    let mut experience_to_next = stats.experience_to_next.max(1);
    let mut levels_gained = Vec::new();
    while experience >= experience_to_next {
        experience -= experience_to_next;
        level = level.saturating_add(1);
        experience_to_next = next_experience_threshold(experience_to_next);
        levels_gained.push(level);
    }
    ExperienceGain {
        level,
        experience,
        experience_to_next,
        levels_gained,
    }
}

/// Maps one physics contact onto store actions and domain events.
///
/// Stale ids, wrong entity kinds, spent collectibles and dead enemies all
/// resolve to nothing. Victory is emitted at most once per run.
pub fn resolve(contact: &Contact, state: &GameState, config: &CombatConfig) -> Resolution {
    if state.phase.is_terminal() {
        return Resolution::default();
    }
    match contact.tag {
        ContactTag::Collectible => resolve_collectible(contact, state),
        ContactTag::EnemyAttack => resolve_attack(contact, state, config),
        ContactTag::EnemyTouch => resolve_touch(contact, state, config),
        ContactTag::Platform | ContactTag::Boundary => Resolution::default(),
    }
}

fn resolve_collectible(contact: &Contact, state: &GameState) -> Resolution {
    let Some(collectible) = contact.entity.and_then(|id| state.world.collectible(id)) else {
        debug!(entity = ?contact.entity, "collectible_contact_ignored");
        return Resolution::default();
    };
    if collectible.collected {
        return Resolution::default();
    }

    Resolution {
        actions: vec![
            Action::MarkCollected { id: collectible.id },
            Action::AddScore {
                amount: collectible.value,
            },
            Action::UpdateObjectives(ObjectivesUpdate {
                gems_collected: Some(state.stats.gems_collected.saturating_add(1)),
                ..ObjectivesUpdate::default()
            }),
        ],
        events: vec![GameEvent::Collected {
            id: collectible.id,
            value: collectible.value,
            kind: collectible.kind,
        }],
    }
}

fn resolve_attack(contact: &Contact, state: &GameState, config: &CombatConfig) -> Resolution {
    let Some(enemy) = contact.entity.and_then(|id| state.world.enemy(id)) else {
        debug!(entity = ?contact.entity, "enemy_contact_ignored");
        return Resolution::default();
    };
    if !enemy.alive {
        return Resolution::default();
    }

    let remaining_health = enemy.health.saturating_sub(config.enemy_attack_damage);
    let mut resolution = Resolution {
        actions: vec![Action::DamageEnemy {
            id: enemy.id,
            amount: config.enemy_attack_damage,
        }],
        events: vec![GameEvent::EnemyHit {
            id: enemy.id,
            damage: config.enemy_attack_damage,
            remaining_health,
        }],
    };
    if remaining_health > 0 {
        return resolution;
    }

    let enemies_killed = state.stats.enemies_killed.saturating_add(1);
    let exp_per_kill = state.profile.exp_per_kill;
    resolution.actions.extend([
        Action::AddScore {
            amount: config.defeat_reward,
        },
        Action::UpdateObjectives(ObjectivesUpdate {
            enemies_killed: Some(enemies_killed),
            ..ObjectivesUpdate::default()
        }),
        Action::AddExperience {
            amount: exp_per_kill,
        },
    ]);
    resolution.events.push(GameEvent::EnemyDefeated {
        id: enemy.id,
        reward: config.defeat_reward,
    });
    let gain = accrue_experience(&state.stats, exp_per_kill);
    resolution
        .events
        .extend(gain.levels_gained.into_iter().map(|level| GameEvent::LevelUp { level }));

    if enemies_killed >= state.stats.enemies_target && !state.victory_fired {
        resolution.actions.push(Action::DeclareVictory);
        resolution.events.push(GameEvent::Victory {
            enemies_killed,
            score: state.stats.score.saturating_add(config.defeat_reward),
        });
    }
    resolution
}

fn resolve_touch(contact: &Contact, state: &GameState, config: &CombatConfig) -> Resolution {
    let Some(damage) = config.enemy_contact_damage else {
        return Resolution::default();
    };
    match contact.entity.and_then(|id| state.world.enemy(id)) {
        Some(enemy) if enemy.alive => damage_player(state, damage, DamageSource::Enemy(enemy.id)),
        _ => Resolution::default(),
    }
}

/// Applies player damage: clamp health, lose a life at zero, end the run
/// when the last life goes, otherwise respawn at full health.
pub fn damage_player(state: &GameState, amount: u32, source: DamageSource) -> Resolution {
    if amount == 0 || state.phase.is_terminal() {
        return Resolution::default();
    }
    let health = state.player.health.saturating_sub(amount);
    let mut resolution = Resolution {
        actions: vec![Action::ApplyDamage { amount }],
        events: vec![GameEvent::PlayerDamaged {
            amount,
            health,
            source,
        }],
    };
    if health > 0 || state.player.lives == 0 {
        return resolution;
    }

    let lives_remaining = state.player.lives - 1;
    resolution.actions.push(Action::LoseLife);
    resolution.events.push(GameEvent::LifeLost { lives_remaining });
    if lives_remaining == 0 {
        resolution.actions.push(Action::DeclareGameOver);
        resolution.events.push(GameEvent::GameOver {
            final_score: state.stats.score,
        });
    } else {
        resolution.events.push(GameEvent::Respawned {
            reason: RespawnReason::LifeLost,
            position: state.spawn_point,
        });
    }
    resolution
}
