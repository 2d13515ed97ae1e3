use std::process::ExitCode;
use std::time::Duration;

use engine::{
    run_headless, FrameInput, FrameSource, InputAction, InputSnapshot, MetricsHandle,
    SnapshotHandle,
};
use serde::Serialize;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{GameSession, GameSnapshot, JsonFileHighScores, RunPhase};

const AUTOPILOT_CYCLE_FRAMES: u64 = 240;
const AUTOPILOT_JUMP_EVERY_FRAMES: u64 = 50;

/// Scripted input for headless demo runs. The spiral climbs toward +z and
/// opens out along +x, so the autopilot backs up the course while veering
/// right, cuts left for part of each cycle, hops at a fixed cadence and
/// dashes once per cycle.
#[derive(Debug, Clone)]
pub struct Autopilot {
    frame_dt: Duration,
    total_frames: u64,
}

impl Autopilot {
    pub fn new(target_tps: u32, seconds: f32) -> Self {
        let tps = target_tps.max(1);
        Self {
            frame_dt: Duration::from_secs(1) / tps,
            total_frames: (seconds.max(0.0) * tps as f32).round() as u64,
        }
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn input_for(frame_index: u64) -> InputSnapshot {
        let phase = frame_index % AUTOPILOT_CYCLE_FRAMES;
        InputSnapshot::from_actions(&[InputAction::Backward])
            .with_action_down(
                InputAction::Jump,
                frame_index % AUTOPILOT_JUMP_EVERY_FRAMES < 3,
            )
            .with_action_down(InputAction::Right, phase < 120)
            .with_action_down(InputAction::Left, (160..200).contains(&phase))
            .with_action_down(InputAction::Dash, (200..220).contains(&phase))
    }
}

impl FrameSource for Autopilot {
    fn next_frame(&mut self, frame_index: u64) -> Option<FrameInput> {
        (frame_index < self.total_frames).then(|| FrameInput {
            frame_dt: self.frame_dt,
            input: Self::input_for(frame_index),
            paused: false,
        })
    }
}

#[derive(Debug, Serialize)]
struct RunSummary {
    phase: RunPhase,
    ticks: u64,
    score: u32,
    high_score: u32,
    level: u32,
    gems_collected: u32,
    enemies_killed: u32,
    enemies_target: u32,
    lives: u32,
    health: u32,
    jumps: u32,
    play_time_seconds: f64,
    degraded_steps: u64,
}

impl From<&GameSnapshot> for RunSummary {
    fn from(snapshot: &GameSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            ticks: snapshot.tick,
            score: snapshot.stats.score,
            high_score: snapshot.stats.high_score,
            level: snapshot.stats.level,
            gems_collected: snapshot.stats.gems_collected,
            enemies_killed: snapshot.stats.enemies_killed,
            enemies_target: snapshot.stats.enemies_target,
            lives: snapshot.player.lives,
            health: snapshot.player.health,
            jumps: snapshot.stats.jumps,
            play_time_seconds: snapshot.stats.play_time_seconds,
            degraded_steps: snapshot.degraded_steps,
        }
    }
}

pub fn run(app: AppWiring) -> ExitCode {
    let high_scores = Box::new(JsonFileHighScores::new(app.paths.high_score_path()));
    let mut session = match GameSession::start(app.session, high_scores) {
        Ok(session) => session,
        Err(err) => {
            error!(error = %err, "run_start_failed");
            return ExitCode::FAILURE;
        }
    };
    let snapshots = SnapshotHandle::new(session.snapshot());
    session.attach_snapshot_handle(snapshots.clone());

    let mut autopilot = Autopilot::new(app.loop_config.target_tps, app.demo_seconds);
    info!(frames = autopilot.total_frames(), "autopilot_engaged");
    let metrics = match run_headless(
        &app.loop_config,
        &mut session,
        &mut autopilot,
        MetricsHandle::default(),
    ) {
        Ok(metrics) => metrics,
        Err(err) => {
            error!(error = %err, "loop_failed");
            return ExitCode::FAILURE;
        }
    };

    let summary = RunSummary::from(&snapshots.snapshot());
    info!(
        ticks = metrics.ticks,
        events = session.drain_events().len(),
        "demo_finished"
    );
    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(err) => error!(error = %err, "summary_serialize_failed"),
    }
    ExitCode::SUCCESS
}
