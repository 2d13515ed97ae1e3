use engine::{InputAction, InputSnapshot, SimCommand, Simulation, SnapshotHandle};
use tracing::{debug, info, warn};

use super::combat::{resolve, CombatConfig};
use super::events::{DomainEvent, EventLog, GameEvent, GameEventCounts, RespawnReason};
use super::highscore::HighScoreStore;
use super::locomotion::{LocomotionConfig, LocomotionController, LocomotionState};
use super::notifications::{notification_for, Notification, NotificationId};
use super::physics::{Contact, ContactTag, KinematicPhysics, PhysicsWorld};
use super::profile::{ConfigurationError, DifficultyProfile};
use super::store::{Action, GameState, GameStore};
use super::types::{GameStats, PlayerState, RunPhase, Settings, WorldState};
use super::worldgen::generate;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub seed: u64,
    pub profile: DifficultyProfile,
    pub locomotion: LocomotionConfig,
    pub combat: CombatConfig,
    pub settings: Settings,
    /// Ask the driver to quit once the run reaches victory or game over.
    pub quit_when_run_ends: bool,
}

impl SessionConfig {
    pub fn new(seed: u64, profile: DifficultyProfile) -> Self {
        Self {
            seed,
            profile,
            locomotion: LocomotionConfig::default(),
            combat: CombatConfig::default(),
            settings: Settings::default(),
            quit_when_run_ends: false,
        }
    }
}

/// Read-only copy of the run published at tick boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub tick: u64,
    pub paused: bool,
    pub phase: RunPhase,
    pub player: PlayerState,
    pub stats: GameStats,
    pub world: WorldState,
    pub notifications: Vec<Notification>,
    pub degraded_steps: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    /// False when the tick was skipped (paused) or the run had already ended.
    pub simulated: bool,
    pub degraded: bool,
    pub events: Vec<GameEvent>,
}

/// One run of the game: store, physics, controller and event log driven by
/// [`GameSession::tick`].
pub struct GameSession {
    config: SessionConfig,
    store: GameStore,
    physics: Box<dyn PhysicsWorld>,
    controller: LocomotionController,
    events: EventLog,
    high_scores: Box<dyn HighScoreStore>,
    persisted_high_score: u32,
    tick: u64,
    paused: bool,
    degraded_steps: u64,
    run_end_recorded: bool,
    snapshots: Option<SnapshotHandle<GameSnapshot>>,
}

impl GameSession {
    pub fn start(
        config: SessionConfig,
        high_scores: Box<dyn HighScoreStore>,
    ) -> Result<Self, ConfigurationError> {
        let physics = Box::new(KinematicPhysics::new(config.profile.gravity_factor));
        Self::start_with_physics(config, physics, high_scores)
    }

    pub fn start_with_physics(
        config: SessionConfig,
        physics: Box<dyn PhysicsWorld>,
        mut high_scores: Box<dyn HighScoreStore>,
    ) -> Result<Self, ConfigurationError> {
        let world = generate(config.seed, &config.profile)?;
        let persisted_high_score = high_scores.load().unwrap_or_else(|err| {
            warn!(error = %err, "high_score_load_failed");
            0
        });
        info!(
            seed = config.seed,
            profile = %config.profile.name,
            entities = world.len(),
            fingerprint = %world.fingerprint(),
            high_score = persisted_high_score,
            "run_started"
        );
        let state = GameState::new_run(
            config.profile.clone(),
            world,
            config.settings,
            persisted_high_score,
        );
        Ok(Self {
            controller: LocomotionController::new(config.locomotion),
            config,
            store: GameStore::new(state),
            physics,
            events: EventLog::default(),
            high_scores,
            persisted_high_score,
            tick: 0,
            paused: false,
            degraded_steps: 0,
            run_end_recorded: false,
            snapshots: None,
        })
    }

    pub fn state(&self) -> &GameState {
        self.store.state()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn locomotion_state(&self) -> LocomotionState {
        self.controller.state()
    }

    pub fn degraded_steps(&self) -> u64 {
        self.degraded_steps
    }

    pub fn rejected_actions(&self) -> u64 {
        self.store.rejected_count()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            info!(tick = self.tick, "run_paused");
            self.publish_snapshot();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            info!(tick = self.tick, "run_resumed");
            self.publish_snapshot();
        }
    }

    pub fn pending_events(&self) -> &[DomainEvent] {
        self.events.pending()
    }

    pub fn drain_events(&mut self) -> Vec<DomainEvent> {
        self.events.drain()
    }

    pub fn last_tick_event_counts(&self) -> GameEventCounts {
        self.events.last_tick_counts()
    }

    /// Applies an action from outside the tick (UI, scripting). Rejections
    /// are logged and leave the run untouched. `ResetRun` goes through the
    /// same run lifecycle as [`GameSession::restart`].
    pub fn submit(&mut self, action: Action) -> bool {
        let applied = match action {
            Action::ResetRun { profile, world } => self.begin_run(profile, world),
            action => self.store.dispatch(action),
        };
        self.publish_snapshot();
        applied
    }

    /// Consumer-side dismissal of a HUD notification.
    pub fn dismiss_notification(&mut self, id: NotificationId) {
        self.store.dispatch(Action::RemoveNotification { id });
    }

    pub fn update_settings(&mut self, settings: Settings) {
        self.store.dispatch(Action::UpdateSettings(settings));
    }

    /// Snapshots are pushed to `handle` after every tick from now on.
    pub fn attach_snapshot_handle(&mut self, handle: SnapshotHandle<GameSnapshot>) {
        handle.publish(self.snapshot());
        self.snapshots = Some(handle);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let state = self.store.state();
        GameSnapshot {
            tick: self.tick,
            paused: self.paused,
            phase: state.phase,
            player: state.player,
            stats: state.stats,
            world: state.world.clone(),
            notifications: state.notifications.items().to_vec(),
            degraded_steps: self.degraded_steps,
        }
    }

    /// Advances the run by `dt` seconds. Paused sessions do nothing; ended
    /// runs only advance the notification clock.
    pub fn tick(&mut self, input: &InputSnapshot, dt: f32) -> TickReport {
        if self.paused {
            return TickReport {
                tick: self.tick,
                ..TickReport::default()
            };
        }

        self.tick = self.tick.saturating_add(1);
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        self.store.dispatch(Action::AdvancePlayTime {
            seconds: f64::from(dt),
        });
        if self.store.state().phase.is_terminal() {
            self.finish_tick();
            return report;
        }
        report.simulated = true;

        let output = self
            .controller
            .tick(input, dt, self.store.state(), self.physics.as_mut());
        if let Some(err) = &output.degraded {
            self.degraded_steps = self.degraded_steps.saturating_add(1);
            report.degraded = true;
            debug!(
                tick = self.tick,
                degraded_steps = self.degraded_steps,
                error = %err,
                "tick_motion_skipped"
            );
        }
        self.store.dispatch_all(output.actions);
        let mut emitted = output.events;

        for contact in output.contacts {
            if self.store.state().phase.is_terminal() {
                break;
            }
            let contact = upgrade_dash_contact(contact, input);
            let resolution = resolve(&contact, self.store.state(), &self.config.combat);
            self.store.dispatch_all(resolution.actions);
            emitted.extend(resolution.events);
        }

        let lost_life = emitted.iter().any(|event| {
            matches!(
                event,
                GameEvent::Respawned {
                    reason: RespawnReason::LifeLost,
                    ..
                }
            )
        });
        if lost_life {
            self.controller.reset();
            self.physics.reset();
        }

        if self.store.state().phase.is_terminal() && !self.run_end_recorded {
            emitted.extend(self.record_run_end());
        }

        for event in &emitted {
            self.record_event(*event);
        }
        report.events = emitted;
        self.finish_tick();
        report
    }

    /// Discards the current run and starts a fresh one on a new world.
    pub fn restart(&mut self, seed: u64) -> Result<(), ConfigurationError> {
        let world = generate(seed, &self.config.profile)?;
        self.begin_run(self.config.profile.clone(), world);
        self.publish_snapshot();
        Ok(())
    }

    /// Closes out the current run (persisting a beaten score it has not
    /// recorded yet) and resets onto `world`.
    fn begin_run(&mut self, profile: DifficultyProfile, world: WorldState) -> bool {
        if !self.run_end_recorded {
            if let Some(event) = self.persist_high_score() {
                self.record_event(event);
            }
        }
        let seed = world.seed;
        let fingerprint = world.fingerprint();
        if !self.store.dispatch(Action::ResetRun {
            profile: profile.clone(),
            world,
        }) {
            return false;
        }
        self.config.profile = profile;
        self.config.seed = seed;
        self.controller.reset();
        self.physics.reset();
        self.run_end_recorded = false;
        self.paused = false;
        info!(seed, fingerprint = %fingerprint, "run_restarted");
        true
    }

    fn record_event(&mut self, event: GameEvent) {
        debug!(tick = self.tick, event = ?event, "domain_event");
        if let Some((kind, message, duration_ms)) = notification_for(&event) {
            self.store.dispatch(Action::AddNotification {
                kind,
                message,
                duration_ms,
            });
        }
        let play_time = self.store.state().stats.play_time_seconds;
        self.events.emit(self.tick, play_time, event);
    }

    fn record_run_end(&mut self) -> Option<GameEvent> {
        self.run_end_recorded = true;
        let state = self.store.state();
        info!(
            phase = ?state.phase,
            score = state.stats.score,
            enemies_killed = state.stats.enemies_killed,
            gems_collected = state.stats.gems_collected,
            play_time_seconds = state.stats.play_time_seconds,
            "run_ended"
        );
        self.persist_high_score()
    }

    fn persist_high_score(&mut self) -> Option<GameEvent> {
        let score = self.store.state().stats.score;
        if score <= self.persisted_high_score {
            return None;
        }
        let previous = self.persisted_high_score;
        match self.high_scores.save(score) {
            Ok(()) => info!(previous, score, "high_score_saved"),
            Err(err) => warn!(error = %err, score, "high_score_save_failed"),
        }
        self.persisted_high_score = score;
        Some(GameEvent::HighScoreBeaten { previous, score })
    }

    fn finish_tick(&mut self) {
        self.events.finish_tick_rollover();
        self.publish_snapshot();
    }

    fn publish_snapshot(&self) {
        if let Some(handle) = &self.snapshots {
            handle.publish(self.snapshot());
        }
    }
}

fn upgrade_dash_contact(contact: Contact, input: &InputSnapshot) -> Contact {
    if contact.tag == ContactTag::EnemyTouch && input.is_down(InputAction::Dash) {
        Contact {
            tag: ContactTag::EnemyAttack,
            ..contact
        }
    } else {
        contact
    }
}

impl Simulation for GameSession {
    fn load(&mut self) {
        info!(tick = self.tick, seed = self.config.seed, "session_loaded");
        self.publish_snapshot();
    }

    fn update(&mut self, fixed_dt_seconds: f32, input: &InputSnapshot) -> SimCommand {
        self.tick(input, fixed_dt_seconds);
        if self.config.quit_when_run_ends && self.store.state().phase.is_terminal() {
            SimCommand::Quit
        } else {
            SimCommand::None
        }
    }

    fn unload(&mut self) {
        if !self.run_end_recorded {
            if let Some(event) = self.persist_high_score() {
                self.record_event(event);
            }
        }
        info!(
            tick = self.tick,
            degraded_steps = self.degraded_steps,
            rejected_actions = self.store.rejected_count(),
            "session_unloaded"
        );
    }

    fn debug_title(&self) -> Option<String> {
        let state = self.store.state();
        Some(format!(
            "skyrun | score {} | lives {} | kills {}/{} | level {}",
            state.stats.score,
            state.player.lives,
            state.stats.enemies_killed,
            state.stats.enemies_target,
            state.stats.level
        ))
    }
}
