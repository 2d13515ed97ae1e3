use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde::Serialize;
use tracing::warn;

static SNAPSHOT_LOCK_POISON_WARNED: AtomicBool = AtomicBool::new(false);

fn warn_snapshot_lock_poison_once(operation: &'static str) {
    if SNAPSHOT_LOCK_POISON_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn!(operation, "snapshot lock poisoned; recovered inner value");
    }
}

/// Read-only copy of simulation state published at tick boundaries.
///
/// The simulation thread is the only writer. Other threads (render, audio, UI)
/// clone the last published value and never observe a half-applied tick.
#[derive(Debug)]
pub struct SnapshotHandle<T> {
    snapshot: Arc<RwLock<T>>,
}

impl<T> Clone for SnapshotHandle<T> {
    fn clone(&self) -> Self {
        Self {
            snapshot: Arc::clone(&self.snapshot),
        }
    }
}

impl<T: Default> Default for SnapshotHandle<T> {
    fn default() -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(T::default())),
        }
    }
}

impl<T: Clone> SnapshotHandle<T> {
    pub fn new(initial: T) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn snapshot(&self) -> T {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => {
                warn_snapshot_lock_poison_once("read");
                poisoned.into_inner().clone()
            }
        }
    }

    pub fn publish(&self, snapshot: T) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => {
                warn_snapshot_lock_poison_once("write");
                let mut guard = poisoned.into_inner();
                *guard = snapshot;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoopMetricsSnapshot {
    pub frames: u64,
    pub ticks: u64,
    pub paused_frames: u64,
    pub dropped_time_ms: f32,
    pub simulated_seconds: f32,
    pub average_ticks_per_frame: f32,
}

pub type MetricsHandle = SnapshotHandle<LoopMetricsSnapshot>;

#[derive(Debug, Default)]
pub(crate) struct MetricsAccumulator {
    frames: u64,
    ticks: u64,
    paused_frames: u64,
    dropped_time: Duration,
    simulated: Duration,
}

impl MetricsAccumulator {
    pub(crate) fn record_frame(&mut self, paused: bool) {
        self.frames = self.frames.saturating_add(1);
        if paused {
            self.paused_frames = self.paused_frames.saturating_add(1);
        }
    }

    pub(crate) fn record_tick(&mut self, fixed_dt: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.simulated = self.simulated.saturating_add(fixed_dt);
    }

    pub(crate) fn record_dropped(&mut self, dropped: Duration) {
        self.dropped_time = self.dropped_time.saturating_add(dropped);
    }

    pub(crate) fn snapshot(&self) -> LoopMetricsSnapshot {
        let average_ticks_per_frame = if self.frames == 0 {
            0.0
        } else {
            self.ticks as f32 / self.frames as f32
        };
        LoopMetricsSnapshot {
            frames: self.frames,
            ticks: self.ticks,
            paused_frames: self.paused_frames,
            dropped_time_ms: self.dropped_time.as_secs_f32() * 1000.0,
            simulated_seconds: self.simulated.as_secs_f32(),
            average_ticks_per_frame,
        }
    }
}
