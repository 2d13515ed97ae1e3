mod input;
mod loop_runner;
mod metrics;
mod scene;

pub use input::InputAction;
pub use loop_runner::{
    run_headless, AppError, FixedStepDriver, FrameInput, FrameOutcome, FrameSource, LoopConfig,
};
pub use metrics::{LoopMetricsSnapshot, MetricsHandle, SnapshotHandle};
pub use scene::{EntityId, EntityIdAllocator, InputSnapshot, SimCommand, Simulation, Vec3};
