use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use super::metrics::{LoopMetricsSnapshot, MetricsAccumulator, MetricsHandle};
use super::{InputSnapshot, SimCommand, Simulation};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub pace_realtime: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            pace_realtime: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid loop configuration: {reason}")]
    InvalidLoopConfig { reason: String },
}

/// One frame's worth of external signal for the driver.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput {
    pub frame_dt: Duration,
    pub input: InputSnapshot,
    pub paused: bool,
}

pub trait FrameSource {
    /// Returns `None` once the source has no more frames to drive.
    fn next_frame(&mut self, frame_index: u64) -> Option<FrameInput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue { ticks: u32 },
    QuitRequested,
}

/// Fixed-step accumulator that turns irregular frame deltas into whole ticks.
///
/// Frame deltas are clamped to `max_frame_delta`, at most `max_ticks_per_frame`
/// ticks run per frame, and leftover time beyond that budget is dropped rather
/// than carried (no spiral of death). A paused driver runs no ticks and discards
/// the frame's time, so game time does not advance while paused.
#[derive(Debug)]
pub struct FixedStepDriver {
    fixed_dt: Duration,
    max_frame_delta: Duration,
    max_ticks_per_frame: u32,
    accumulator: Duration,
    paused: bool,
    metrics: MetricsAccumulator,
    metrics_handle: MetricsHandle,
}

impl FixedStepDriver {
    pub fn new(config: &LoopConfig, metrics_handle: MetricsHandle) -> Self {
        let target_tps = config.target_tps.max(1);
        Self {
            fixed_dt: Duration::from_secs_f64(1.0 / target_tps as f64),
            max_frame_delta: normalize_non_zero_duration(
                config.max_frame_delta,
                Duration::from_millis(250),
            ),
            max_ticks_per_frame: config.max_ticks_per_frame.max(1),
            accumulator: Duration::ZERO,
            paused: false,
            metrics: MetricsAccumulator::default(),
            metrics_handle,
        }
    }

    pub fn fixed_dt(&self) -> Duration {
        self.fixed_dt
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, "driver_pause_changed");
        }
        self.paused = paused;
        if paused {
            self.accumulator = Duration::ZERO;
        }
    }

    pub fn metrics(&self) -> LoopMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn advance<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        frame_dt: Duration,
        input: &InputSnapshot,
    ) -> FrameOutcome {
        self.metrics.record_frame(self.paused);
        if self.paused {
            self.metrics_handle.publish(self.metrics.snapshot());
            return FrameOutcome::Continue { ticks: 0 };
        }

        let clamped = frame_dt.min(self.max_frame_delta);
        if clamped < frame_dt {
            self.metrics.record_dropped(frame_dt - clamped);
        }
        self.accumulator = self.accumulator.saturating_add(clamped);

        let fixed_dt_seconds = self.fixed_dt.as_secs_f32();
        let mut ticks = 0u32;
        let mut outcome = None;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks_per_frame {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
            self.metrics.record_tick(self.fixed_dt);
            match sim.update(fixed_dt_seconds, input) {
                SimCommand::None => {}
                SimCommand::Pause => {
                    self.set_paused(true);
                    break;
                }
                SimCommand::Resume => self.set_paused(false),
                SimCommand::HardReset => {
                    sim.unload();
                    sim.load();
                    self.accumulator = Duration::ZERO;
                    break;
                }
                SimCommand::Quit => {
                    outcome = Some(FrameOutcome::QuitRequested);
                    break;
                }
            }
        }

        if ticks == self.max_ticks_per_frame && self.accumulator >= self.fixed_dt {
            self.metrics.record_dropped(self.accumulator);
            self.accumulator = Duration::ZERO;
        }

        self.metrics_handle.publish(self.metrics.snapshot());
        outcome.unwrap_or(FrameOutcome::Continue { ticks })
    }
}

pub fn run_headless<S, F>(
    config: &LoopConfig,
    sim: &mut S,
    frames: &mut F,
    metrics_handle: MetricsHandle,
) -> Result<LoopMetricsSnapshot, AppError>
where
    S: Simulation + ?Sized,
    F: FrameSource + ?Sized,
{
    if config.target_tps == 0 {
        return Err(AppError::InvalidLoopConfig {
            reason: "target_tps must be positive".to_string(),
        });
    }

    let mut driver = FixedStepDriver::new(config, metrics_handle);
    info!(
        target_tps = config.target_tps,
        max_frame_delta_ms = driver.max_frame_delta.as_millis() as u64,
        max_ticks_per_frame = driver.max_ticks_per_frame,
        pace_realtime = config.pace_realtime,
        "loop_config"
    );

    sim.load();
    let mut frame_index = 0u64;
    while let Some(frame) = frames.next_frame(frame_index) {
        let frame_start = Instant::now();
        driver.set_paused(frame.paused);
        if driver.advance(sim, frame.frame_dt, &frame.input) == FrameOutcome::QuitRequested {
            info!(frame_index, reason = "simulation", "shutdown_requested");
            break;
        }
        if config.pace_realtime {
            let sleep_for = compute_pacing_sleep(frame.frame_dt, frame_start.elapsed());
            if !sleep_for.is_zero() {
                thread::sleep(sleep_for);
            }
        }
        frame_index = frame_index.saturating_add(1);
    }
    sim.unload();

    let metrics = driver.metrics();
    info!(
        frames = metrics.frames,
        ticks = metrics.ticks,
        paused_frames = metrics.paused_frames,
        simulated_seconds = metrics.simulated_seconds,
        "loop_finished"
    );
    Ok(metrics)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn compute_pacing_sleep(target: Duration, elapsed: Duration) -> Duration {
    target.saturating_sub(elapsed)
}
