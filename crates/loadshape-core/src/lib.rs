//! Core domain types and traits for the loadshape profile compiler.

pub mod config;
pub mod error;
pub mod schedule;
pub mod stage;
pub mod telemetry;
pub mod traits;

pub use config::{CompilerConfig, LoadshapeConfig, LoggingConfig};
pub use error::{ProfileError, ProfileOperation, ProfileResult};
pub use schedule::{
    round_to_resolution, secs_to_duration, BatchPlan, BatchRow, BatchSchedule, CompiledSchedule,
    RunLimit, SimpleSchedule,
};
pub use stage::{IterationBound, Stage, StageBound};
pub use traits::ScheduleSink;
