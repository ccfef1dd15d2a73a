use crate::schedule::{BatchRow, SimpleSchedule};

/// Interface of the worker-pool execution engine that realises a compiled schedule.
///
/// Durations handed to a sink are already rounded to the engine's time resolution.
pub trait ScheduleSink {
    /// Engine-specific failure.
    type Error;

    /// Runs `threads` workers ramped over `ramp_up` after `start_delay`,
    /// bounded by the schedule's run limit.
    fn run_simple(&mut self, schedule: &SimpleSchedule) -> Result<(), Self::Error>;

    /// Runs a table of independent cohorts whose sizes add up while they overlap.
    fn run_batches(&mut self, rows: &[BatchRow]) -> Result<(), Self::Error>;
}
