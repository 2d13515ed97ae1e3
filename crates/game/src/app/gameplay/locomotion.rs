use engine::{InputAction, InputSnapshot, Vec3};
use tracing::{debug, warn};

use super::combat::damage_player;
use super::events::{DamageSource, GameEvent, RespawnReason};
use super::physics::{BodyState, Contact, ContactTag, PhysicsError, PhysicsWorld};
use super::store::{Action, GameState};
use super::{
    BACKWARD_MULTIPLIER, BASE_MOVE_SPEED, CAMERA_SHAKE_DURATION_MS, CAMERA_SHAKE_INTENSITY,
    DASH_MULTIPLIER, FALL_DAMAGE, FALL_FLOOR_Y, JUMP_IMPULSE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionState {
    Grounded,
    Airborne,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JumpPolicy {
    /// One jump per press.
    #[default]
    EdgeTriggered,
    /// Every grounded tick with jump held starts a new jump.
    Held,
}

impl JumpPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "edge" | "edge_triggered" => Some(Self::EdgeTriggered),
            "held" => Some(Self::Held),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocomotionConfig {
    pub base_speed: f32,
    pub dash_multiplier: f32,
    pub backward_multiplier: f32,
    pub jump_impulse: f32,
    pub fall_floor_y: f32,
    pub fall_damage: u32,
    pub jump_policy: JumpPolicy,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            base_speed: BASE_MOVE_SPEED,
            dash_multiplier: DASH_MULTIPLIER,
            backward_multiplier: BACKWARD_MULTIPLIER,
            jump_impulse: JUMP_IMPULSE,
            fall_floor_y: FALL_FLOOR_Y,
            fall_damage: FALL_DAMAGE,
            jump_policy: JumpPolicy::EdgeTriggered,
        }
    }
}

/// What one controller tick wants applied, plus the contacts still to be
/// resolved by combat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocomotionOutput {
    pub actions: Vec<Action>,
    pub events: Vec<GameEvent>,
    pub contacts: Vec<Contact>,
    pub degraded: Option<PhysicsError>,
    pub respawned: bool,
}

#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
    state: LocomotionState,
    jump_was_down: bool,
}

impl LocomotionController {
    pub fn new(config: LocomotionConfig) -> Self {
        Self {
            config,
            state: LocomotionState::Grounded,
            jump_was_down: false,
        }
    }

    pub fn state(&self) -> LocomotionState {
        self.state
    }

    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Back to `Grounded`, e.g. after a respawn.
    pub fn reset(&mut self) {
        self.state = LocomotionState::Grounded;
    }

    /// Horizontal velocity from intents. Contributions add up without
    /// normalization, so diagonals are faster than straight lines.
    pub fn horizontal_velocity(&self, input: &InputSnapshot) -> (f32, f32) {
        let mut speed = self.config.base_speed;
        if input.is_down(InputAction::Dash) {
            speed *= self.config.dash_multiplier;
        }
        let mut x = 0.0;
        let mut z = 0.0;
        if input.is_down(InputAction::Forward) {
            z -= speed;
        }
        if input.is_down(InputAction::Backward) {
            z += speed * self.config.backward_multiplier;
        }
        if input.is_down(InputAction::Left) {
            x -= speed;
        }
        if input.is_down(InputAction::Right) {
            x += speed;
        }
        (x, z)
    }

    /// Whether this tick's input asks for a jump. The press is only
    /// committed to `jump_was_down` once the physics step succeeds.
    fn wants_jump(&self, input: &InputSnapshot) -> bool {
        let down = input.is_down(InputAction::Jump);
        match self.config.jump_policy {
            JumpPolicy::EdgeTriggered => down && !self.jump_was_down,
            JumpPolicy::Held => down,
        }
    }

    pub fn tick(
        &mut self,
        input: &InputSnapshot,
        dt: f32,
        state: &GameState,
        physics: &mut dyn PhysicsWorld,
    ) -> LocomotionOutput {
        let mut output = LocomotionOutput::default();
        let player = &state.player;
        let (vx, vz) = self.horizontal_velocity(input);
        let mut velocity = Vec3::new(vx, player.velocity.y, vz);

        let jumped = self.wants_jump(input) && self.state == LocomotionState::Grounded;
        if jumped {
            velocity.y = self.config.jump_impulse;
        }

        let body = BodyState {
            position: player.position,
            velocity,
        };
        let outcome = match physics.step(&body, &state.world, dt) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "physics_step_degraded");
                output.degraded = Some(err);
                return output;
            }
        };
        self.jump_was_down = input.is_down(InputAction::Jump);

        if jumped {
            self.state = LocomotionState::Airborne;
            output.actions.push(Action::RecordJump);
            output.events.push(GameEvent::Jumped {
                jumps: state.stats.jumps.saturating_add(1),
            });
        }
        if outcome.is_supported() {
            self.state = LocomotionState::Grounded;
        } else if self.state == LocomotionState::Grounded {
            self.state = LocomotionState::Airborne;
        }

        if outcome.body.position.y < self.config.fall_floor_y {
            self.respawn(state, physics, &mut output);
            return output;
        }

        output.actions.push(Action::UpdatePlayerPosition {
            position: outcome.body.position,
            velocity: outcome.body.velocity,
            grounded: self.state == LocomotionState::Grounded,
        });
        output.contacts = outcome
            .contacts
            .into_iter()
            .filter(|contact| contact.tag != ContactTag::Platform)
            .collect();
        output
    }

    fn respawn(
        &mut self,
        state: &GameState,
        physics: &mut dyn PhysicsWorld,
        output: &mut LocomotionOutput,
    ) {
        self.state = LocomotionState::Grounded;
        physics.reset();
        output.respawned = true;
        debug!(damage = self.config.fall_damage, "player_respawned");

        output.actions.push(Action::UpdatePlayerPosition {
            position: state.spawn_point,
            velocity: Vec3::ZERO,
            grounded: true,
        });
        output.events.push(GameEvent::Respawned {
            reason: RespawnReason::Fall,
            position: state.spawn_point,
        });
        output.events.push(GameEvent::CameraShake {
            intensity: CAMERA_SHAKE_INTENSITY,
            duration_ms: CAMERA_SHAKE_DURATION_MS,
        });

        let damage = damage_player(state, self.config.fall_damage, DamageSource::Fall);
        output.actions.extend(damage.actions);
        output.events.extend(
            damage
                .events
                .into_iter()
                .filter(|event| !matches!(event, GameEvent::Respawned { .. })),
        );
    }
}
