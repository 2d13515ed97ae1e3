use std::collections::BTreeSet;

use engine::{EntityId, Vec3};
use thiserror::Error;

use super::types::WorldState;
use super::{BASE_GRAVITY, ENEMY_CONTACT_RADIUS, PICKUP_RADIUS, PLAYER_HALF_HEIGHT};

const LANDING_TOLERANCE: f32 = 0.05;
const STOMP_MIN_HEIGHT: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactTag {
    Platform,
    Collectible,
    EnemyAttack,
    EnemyTouch,
    Boundary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub entity: Option<EntityId>,
    pub tag: ContactTag,
}

impl Contact {
    pub fn with(entity: EntityId, tag: ContactTag) -> Self {
        Self {
            entity: Some(entity),
            tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub body: BodyState,
    pub contacts: Vec<Contact>,
}

impl StepOutcome {
    pub fn is_supported(&self) -> bool {
        self.contacts
            .iter()
            .any(|contact| contact.tag == ContactTag::Platform)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum PhysicsError {
    #[error("physics step produced a non-finite body state")]
    NonFinite,
    #[error("physics step rejected dt {dt}")]
    InvalidTimeStep { dt: f32 },
    #[error("physics backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal contract the gameplay layer needs from a physics backend.
///
/// Platform contacts are reported on every tick the body is supported; all
/// other tags only on the tick a contact begins.
pub trait PhysicsWorld {
    fn step(
        &mut self,
        body: &BodyState,
        world: &WorldState,
        dt: f32,
    ) -> Result<StepOutcome, PhysicsError>;

    /// Forget contact history, e.g. after a teleport.
    fn reset(&mut self) {}
}

/// Explicit-Euler point body that lands on platform tops from above.
#[derive(Debug, Clone)]
pub struct KinematicPhysics {
    gravity: f32,
    touching: BTreeSet<EntityId>,
}

impl KinematicPhysics {
    pub fn new(gravity_factor: f32) -> Self {
        Self {
            gravity: BASE_GRAVITY * gravity_factor,
            touching: BTreeSet::new(),
        }
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }
}

impl PhysicsWorld for KinematicPhysics {
    fn step(
        &mut self,
        body: &BodyState,
        world: &WorldState,
        dt: f32,
    ) -> Result<StepOutcome, PhysicsError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(PhysicsError::InvalidTimeStep { dt });
        }

        let mut velocity = body.velocity;
        velocity.y += self.gravity * dt;
        let previous = body.position;
        let mut position = previous + velocity * dt;
        if !position.is_finite() || !velocity.is_finite() {
            return Err(PhysicsError::NonFinite);
        }
        let falling = velocity.y <= 0.0;

        let previous_feet = previous.y - PLAYER_HALF_HEIGHT;
        let next_feet = position.y - PLAYER_HALF_HEIGHT;
        let support = world
            .platforms()
            .filter(|platform| falling && platform.covers_xz(position))
            .filter(|platform| {
                let top = platform.top_y();
                previous_feet >= top - LANDING_TOLERANCE && next_feet <= top + LANDING_TOLERANCE
            })
            .fold(None, |best: Option<(EntityId, f32)>, platform| {
                let top = platform.top_y();
                match best {
                    Some((_, best_top)) if best_top >= top => best,
                    _ => Some((platform.id, top)),
                }
            });

        let mut contacts = Vec::new();
        if let Some((id, top)) = support {
            position.y = top + PLAYER_HALF_HEIGHT;
            velocity.y = 0.0;
            contacts.push(Contact::with(id, ContactTag::Platform));
        }

        let mut touching = BTreeSet::new();
        let pickup_sq = PICKUP_RADIUS * PICKUP_RADIUS;
        for collectible in world.collectibles().filter(|c| !c.collected) {
            if collectible.position.distance_squared(position) <= pickup_sq {
                touching.insert(collectible.id);
                if !self.touching.contains(&collectible.id) {
                    contacts.push(Contact::with(collectible.id, ContactTag::Collectible));
                }
            }
        }

        let enemy_sq = ENEMY_CONTACT_RADIUS * ENEMY_CONTACT_RADIUS;
        for enemy in world.enemies().filter(|e| e.alive) {
            if enemy.position.distance_squared(position) <= enemy_sq {
                touching.insert(enemy.id);
                if !self.touching.contains(&enemy.id) {
                    let stomp = falling && position.y >= enemy.position.y + STOMP_MIN_HEIGHT;
                    let tag = if stomp {
                        ContactTag::EnemyAttack
                    } else {
                        ContactTag::EnemyTouch
                    };
                    contacts.push(Contact::with(enemy.id, tag));
                }
            }
        }
        self.touching = touching;

        Ok(StepOutcome {
            body: BodyState { position, velocity },
            contacts,
        })
    }

    fn reset(&mut self) {
        self.touching.clear();
    }
}
