//! Compiled schedules handed to the worker-pool execution engine.
//!
//! The compiler keeps exact proportional timings as `f64` seconds. Rounding to
//! the engine's minimum time unit only happens when a schedule is dispatched
//! through a [`ScheduleSink`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::stage::IterationBound;
use crate::traits::ScheduleSink;

/// Slack used when sampling a schedule exactly at a batch edge.
const EDGE_EPSILON_SECS: f64 = 1e-9;

/// Bound on the steady phase of a [`SimpleSchedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLimit {
    /// Steady time measured from the end of the start delay (includes ramp-up).
    Duration(Duration),
    /// Each worker stops after the given iterations.
    Iterations(IterationBound),
}

/// Single ramp-up/hold block understood natively by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleSchedule {
    pub threads: u32,
    pub ramp_up: Duration,
    /// `None` when the profile declares no bound; workers run a single pass.
    pub limit: Option<RunLimit>,
    pub start_delay: Duration,
}

impl Default for SimpleSchedule {
    fn default() -> Self {
        Self {
            threads: 1,
            ramp_up: Duration::ZERO,
            limit: Some(RunLimit::Iterations(IterationBound::Bounded(1))),
            start_delay: Duration::ZERO,
        }
    }
}

impl SimpleSchedule {
    /// Steady duration, if the block is time-bound.
    pub fn steady(&self) -> Option<Duration> {
        match self.limit {
            Some(RunLimit::Duration(steady)) => Some(steady),
            _ => None,
        }
    }

    /// Iteration bound, if the block is iteration-bound.
    pub fn iterations(&self) -> Option<IterationBound> {
        match self.limit {
            Some(RunLimit::Iterations(iterations)) => Some(iterations),
            _ => None,
        }
    }

    /// Workers active `secs` after test start, ramping linearly.
    ///
    /// Iteration-bound and unbounded blocks are assumed to keep running.
    pub fn active_workers_at(&self, secs: f64) -> f64 {
        let delay = self.start_delay.as_secs_f64();
        if secs < delay {
            return 0.0;
        }
        let since_start = secs - delay;
        if let Some(steady) = self.steady() {
            if since_start > steady.as_secs_f64() + EDGE_EPSILON_SECS {
                return 0.0;
            }
        }
        let ramp_up = self.ramp_up.as_secs_f64();
        if since_start < ramp_up {
            f64::from(self.threads) * since_start / ramp_up
        } else {
            f64::from(self.threads)
        }
    }

    /// Rounds the block's edges (delay end, ramp end, steady end) rather
    /// than its lengths, so rounding errors never add up.
    fn rounded(&self, resolution: Duration) -> Self {
        let delay = self.start_delay.as_secs_f64();
        let start_delay = round_to_resolution(delay, resolution);
        let ramp_end = round_to_resolution(delay + self.ramp_up.as_secs_f64(), resolution);
        let limit = match self.limit {
            Some(RunLimit::Duration(steady)) => {
                let steady_end = round_to_resolution(delay + steady.as_secs_f64(), resolution);
                Some(RunLimit::Duration(steady_end.saturating_sub(start_delay)))
            }
            other => other,
        };
        Self {
            threads: self.threads,
            ramp_up: ramp_end.saturating_sub(start_delay),
            limit,
            start_delay,
        }
    }
}

/// One cohort of workers sharing a startup/hold/shutdown lifecycle.
///
/// Timings are exact seconds relative to test start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSchedule {
    pub size: u32,
    pub start_offset_secs: f64,
    pub startup_secs: f64,
    pub hold_secs: f64,
    pub shutdown_secs: f64,
}

impl BatchSchedule {
    /// A cohort that starts ramping up at `start_offset_secs`.
    pub fn starting(size: u32, start_offset_secs: f64, startup_secs: f64) -> Self {
        Self {
            size,
            start_offset_secs,
            startup_secs,
            hold_secs: 0.0,
            shutdown_secs: 0.0,
        }
    }

    /// Time from the first worker starting until the last one stops.
    pub fn lifetime_secs(&self) -> f64 {
        self.startup_secs + self.hold_secs + self.shutdown_secs
    }

    pub fn end_secs(&self) -> f64 {
        self.start_offset_secs + self.lifetime_secs()
    }

    pub fn start_offset(&self) -> Duration {
        secs_to_duration(self.start_offset_secs)
    }

    pub fn startup(&self) -> Duration {
        secs_to_duration(self.startup_secs)
    }

    pub fn hold(&self) -> Duration {
        secs_to_duration(self.hold_secs)
    }

    pub fn shutdown(&self) -> Duration {
        secs_to_duration(self.shutdown_secs)
    }

    /// Workers of this cohort active `secs` after test start.
    pub fn active_workers_at(&self, secs: f64) -> f64 {
        let size = f64::from(self.size);
        let ramped = self.start_offset_secs + self.startup_secs;
        let held = ramped + self.hold_secs;
        let end = held + self.shutdown_secs;
        if secs < self.start_offset_secs {
            0.0
        } else if secs < ramped {
            size * (secs - self.start_offset_secs) / self.startup_secs
        } else if secs <= held + EDGE_EPSILON_SECS {
            size
        } else if secs < end {
            size * (1.0 - (secs - held) / self.shutdown_secs)
        } else {
            0.0
        }
    }

    /// Rounds the cohort's edges to the engine's minimum time unit.
    ///
    /// Edges are absolute times (start, full size, shutdown begins, end), so a
    /// stage boundary that falls on the time unit stays on it after rounding.
    pub fn to_row(&self, resolution: Duration) -> BatchRow {
        let ramped = self.start_offset_secs + self.startup_secs;
        let held = ramped + self.hold_secs;
        let end = held + self.shutdown_secs;

        let start_offset = round_to_resolution(self.start_offset_secs, resolution);
        let ramped = round_to_resolution(ramped, resolution);
        let held = round_to_resolution(held, resolution);
        let end = round_to_resolution(end, resolution);

        let row = BatchRow {
            size: self.size,
            start_offset,
            startup: ramped.saturating_sub(start_offset),
            hold: held.saturating_sub(ramped),
            shutdown: end.saturating_sub(held),
        };
        if row.lifetime().is_zero() && self.lifetime_secs() > 0.0 {
            warn!(
                size = self.size,
                lifetime_secs = self.lifetime_secs(),
                resolution_ms = resolution.as_millis() as u64,
                "Batch lifetime rounds to zero at engine resolution"
            );
        }
        row
    }
}

/// Batch table produced by the general compiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPlan {
    /// Cohorts ordered by start offset ascending.
    pub batches: Vec<BatchSchedule>,
    /// Sum of all stage durations, including trailing idle time.
    pub total_secs: f64,
}

impl BatchPlan {
    pub fn total_duration(&self) -> Duration {
        secs_to_duration(self.total_secs)
    }

    /// Latest moment any cohort is still running.
    pub fn latest_end_secs(&self) -> f64 {
        self.batches
            .iter()
            .map(BatchSchedule::end_secs)
            .fold(0.0, f64::max)
    }

    /// Sum of active workers across cohorts `secs` after test start.
    pub fn active_workers_at(&self, secs: f64) -> f64 {
        self.batches
            .iter()
            .map(|batch| batch.active_workers_at(secs))
            .sum()
    }

    pub fn to_rows(&self, resolution: Duration) -> Vec<BatchRow> {
        self.batches
            .iter()
            .map(|batch| batch.to_row(resolution))
            .collect()
    }
}

/// Row of the engine's batch table, rounded to its time resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRow {
    pub size: u32,
    pub start_offset: Duration,
    pub startup: Duration,
    pub hold: Duration,
    pub shutdown: Duration,
}

impl BatchRow {
    pub fn lifetime(&self) -> Duration {
        self.startup
            .saturating_add(self.hold)
            .saturating_add(self.shutdown)
    }
}

/// Output of profile compilation, selected once by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompiledSchedule {
    Simple(SimpleSchedule),
    General(BatchPlan),
}

impl CompiledSchedule {
    pub fn is_simple(&self) -> bool {
        matches!(self, Self::Simple(_))
    }

    /// Workers active `secs` after test start.
    pub fn active_workers_at(&self, secs: f64) -> f64 {
        match self {
            Self::Simple(schedule) => schedule.active_workers_at(secs),
            Self::General(plan) => plan.active_workers_at(secs),
        }
    }

    /// Rounds the schedule to `resolution` and hands it to the engine.
    pub fn dispatch<S: ScheduleSink>(
        &self,
        sink: &mut S,
        resolution: Duration,
    ) -> Result<(), S::Error> {
        match self {
            Self::Simple(schedule) => sink.run_simple(&schedule.rounded(resolution)),
            Self::General(plan) => sink.run_batches(&plan.to_rows(resolution)),
        }
    }
}

/// Rounds `secs` to the nearest multiple of `resolution`, half away from zero.
///
/// A zero resolution keeps full nanosecond precision.
pub fn round_to_resolution(secs: f64, resolution: Duration) -> Duration {
    if resolution.is_zero() {
        return secs_to_duration(secs);
    }
    let units = (secs.max(0.0) / resolution.as_secs_f64()).round();
    let nanos = units * resolution.as_nanos() as f64;
    if nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        secs_to_duration(units * resolution.as_secs_f64())
    }
}

/// Converts seconds to a `Duration`, clamping negatives to zero and values
/// beyond the representable range to `Duration::MAX`.
pub fn secs_to_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(Duration::MAX)
}
