//! Decomposition of arbitrary ramp-up/ramp-down profiles into worker cohorts.
//!
//! The engine's batch primitive is a single uniform cohort with its own
//! startup, hold and shutdown ramps. The sweep walks the stages once, keeping
//! the most recently opened cohort as `current` and every cohort it
//! interrupted on a LIFO stack:
//!
//! ```text
//!  workers
//!    5 |            ____
//!    3 |    __     /    \___
//!    2 |   /  \___/         \
//!      +------------------------ time
//!           [ outer cohort    ]
//!                 [ inner ]
//! ```
//!
//! Worker identity does not matter, only the count, so a ramp-down always
//! shrinks the newest cohort first. When a cohort finishes, its lifetime is
//! folded into the hold of the cohort below it, which was running the whole
//! time.

use loadshape_core::{BatchPlan, BatchSchedule, Stage};
use tracing::debug;

use crate::interpolate::interpolate;

/// Compiles duration-bound stages into cohorts ordered by start offset.
///
/// Iteration-bound stages only occur in simple profiles and contribute no time.
pub fn compile(stages: &[Stage]) -> BatchPlan {
    let mut sweep = Sweep::default();
    for stage in stages {
        sweep.apply(stage.target, stage.duration_secs());
    }
    sweep.finish()
}

#[derive(Debug)]
struct Sweep {
    elapsed: f64,
    active: u32,
    current: BatchSchedule,
    open: Vec<BatchSchedule>,
    finished: Vec<BatchSchedule>,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            elapsed: 0.0,
            active: 0,
            // Sentinel at the bottom of the stack, never emitted.
            current: BatchSchedule::starting(0, 0.0, 0.0),
            open: Vec::new(),
            finished: Vec::new(),
        }
    }
}

impl Sweep {
    fn apply(&mut self, target: u32, duration: f64) {
        if target > self.active {
            self.ramp_up(target - self.active, duration);
        } else if target < self.active {
            self.ramp_down(self.active - target, duration);
        } else {
            self.current.hold_secs += duration;
        }

        debug!(
            target,
            elapsed_secs = self.elapsed,
            duration_secs = duration,
            open = self.open.len(),
            finished = self.finished.len(),
            "Applied stage"
        );

        self.active = target;
        self.elapsed += duration;
    }

    fn ramp_up(&mut self, added: u32, duration: f64) {
        let cohort = BatchSchedule::starting(added, self.elapsed, duration);
        let interrupted = std::mem::replace(&mut self.current, cohort);
        self.open.push(interrupted);
    }

    fn ramp_down(&mut self, mut remaining: u32, duration: f64) {
        let mut budget = duration;

        while remaining > self.current.size {
            let shutdown = interpolate(self.current.size, remaining, budget);
            self.current.shutdown_secs = shutdown;
            budget -= shutdown;
            remaining -= self.current.size;
            self.finalize();
        }

        if remaining == self.current.size {
            self.current.shutdown_secs = budget;
        } else {
            let departing = self.split(remaining, budget);
            let staying = std::mem::replace(&mut self.current, departing);
            self.open.push(staying);
        }
        self.finalize();
    }

    /// Carves `size` workers out of `current`, keeping the shared ramp rate.
    ///
    /// The departing part is the tail of the startup ramp, so both parts reach
    /// full size at the same moment the original cohort did.
    fn split(&mut self, size: u32, shutdown: f64) -> BatchSchedule {
        let spent = interpolate(size, self.current.size, self.current.startup_secs);
        let departing = BatchSchedule {
            size,
            start_offset_secs: self.current.start_offset_secs + self.current.startup_secs - spent,
            startup_secs: spent,
            hold_secs: self.current.hold_secs,
            shutdown_secs: shutdown,
        };

        self.current.size -= size;
        self.current.startup_secs -= spent;
        self.current.hold_secs = 0.0;
        departing
    }

    /// Emits `current` and resumes the cohort it interrupted.
    fn finalize(&mut self) {
        let Some(mut outer) = self.open.pop() else {
            return;
        };
        outer.hold_secs += self.current.lifetime_secs();
        let done = std::mem::replace(&mut self.current, outer);
        if done.size > 0 {
            self.finished.push(done);
        }
    }

    fn finish(mut self) -> BatchPlan {
        while !self.open.is_empty() {
            self.finalize();
        }
        if self.current.size > 0 {
            self.finished.push(self.current);
        }

        let mut batches = self.finished;
        batches.sort_by(|a, b| a.start_offset_secs.total_cmp(&b.start_offset_secs));
        BatchPlan {
            batches,
            total_secs: self.elapsed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn profile(stages: &[(u32, u64)]) -> Vec<Stage> {
        stages
            .iter()
            .map(|&(target, secs)| Stage::timed(target, Duration::from_secs(secs)))
            .collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_empty_profile_has_no_batches() {
        let plan = compile(&[]);
        assert!(plan.batches.is_empty());
        assert_eq!(plan.total_secs, 0.0);
    }

    #[test]
    fn test_ramp_up_then_down_is_one_batch() {
        let plan = compile(&profile(&[(3, 10), (0, 15)]));
        assert_eq!(
            plan.batches,
            vec![BatchSchedule {
                size: 3,
                start_offset_secs: 0.0,
                startup_secs: 10.0,
                hold_secs: 0.0,
                shutdown_secs: 15.0,
            }]
        );
    }

    #[test]
    fn test_inner_cohort_lifetime_extends_outer_hold() {
        let plan = compile(&profile(&[(2, 10), (5, 10), (5, 5), (2, 10), (0, 10)]));

        assert_eq!(plan.batches.len(), 2);
        let outer = &plan.batches[0];
        let inner = &plan.batches[1];

        assert_eq!(outer.size, 2);
        assert_close(outer.startup_secs, 10.0);
        assert_close(outer.hold_secs, 25.0);
        assert_close(outer.shutdown_secs, 10.0);

        assert_eq!(inner.size, 3);
        assert_close(inner.start_offset_secs, 10.0);
        assert_close(inner.startup_secs, 10.0);
        assert_close(inner.hold_secs, 5.0);
        assert_close(inner.shutdown_secs, 10.0);
    }

    #[test]
    fn test_partial_ramp_down_splits_current_cohort() {
        let plan = compile(&profile(&[(4, 8), (1, 6)]));

        assert_eq!(plan.batches.len(), 2);
        let staying = &plan.batches[0];
        let departing = &plan.batches[1];

        assert_eq!(staying.size, 1);
        assert_close(staying.start_offset_secs, 0.0);
        assert_close(staying.startup_secs, 2.0);
        assert_close(staying.hold_secs, 12.0);
        assert_close(staying.shutdown_secs, 0.0);

        assert_eq!(departing.size, 3);
        assert_close(departing.start_offset_secs, 2.0);
        assert_close(departing.startup_secs, 6.0);
        assert_close(departing.shutdown_secs, 6.0);
    }

    #[test]
    fn test_ramp_down_across_cohorts_shares_shutdown_time() {
        let plan = compile(&profile(&[(2, 10), (4, 10), (0, 20)]));

        assert_eq!(plan.batches.len(), 2);
        // Newest cohort leaves first, taking half of the shutdown window.
        assert_close(plan.batches[1].shutdown_secs, 10.0);
        assert_close(plan.batches[0].hold_secs, 20.0);
        assert_close(plan.batches[0].shutdown_secs, 10.0);
        assert_close(plan.latest_end_secs(), 40.0);
    }

    #[test]
    fn test_leading_delay_offsets_first_batch() {
        let plan = compile(&profile(&[(0, 10), (3, 10), (2, 10)]));
        assert_close(plan.batches[0].start_offset_secs, 10.0);
        assert_close(plan.total_secs, 30.0);
    }

    #[test]
    fn test_trailing_idle_time_is_kept_in_total() {
        let plan = compile(&profile(&[(3, 10), (0, 10), (0, 5)]));
        assert_eq!(plan.batches.len(), 1);
        assert_close(plan.latest_end_secs(), 20.0);
        assert_close(plan.total_secs, 25.0);
    }
}
