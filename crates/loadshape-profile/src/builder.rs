use std::time::Duration;

use loadshape_core::{
    IterationBound, ProfileError, ProfileOperation, ProfileResult, Stage, StageBound,
};
use tracing::debug;

use crate::profile::Profile;

/// Accumulates stages of a concurrency profile, rejecting sequences the
/// engine cannot realise as soon as they are declared.
///
/// # Example
///
/// ```
/// use loadshape_profile::ProfileBuilder;
/// use std::time::Duration;
///
/// # fn main() -> loadshape_core::ProfileResult<()> {
/// let profile = ProfileBuilder::new()
///     .ramp_to(10, Duration::from_secs(30))?
///     .hold_for(Duration::from_secs(60))?
///     .ramp_to(0, Duration::from_secs(10))?
///     .build();
/// assert_eq!(profile.stages().len(), 3);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProfileBuilder {
    stages: Vec<Stage>,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to `count` concurrent workers over `duration`.
    pub fn ramp_to(mut self, count: i64, duration: Duration) -> ProfileResult<Self> {
        let target = u32::try_from(count).map_err(|_| {
            ProfileError::invalid(
                ProfileOperation::RampTo,
                format!("requires a worker count between 0 and {}, got {count}", u32::MAX),
            )
        })?;
        self.ensure_open(ProfileOperation::RampTo)?;
        self.push(Stage::timed(target, duration));
        Ok(self)
    }

    /// Keeps the current worker count for `duration`.
    pub fn hold_for(mut self, duration: Duration) -> ProfileResult<Self> {
        self.ensure_open(ProfileOperation::HoldFor)?;
        let target = self.last_target();
        self.push(Stage::timed(target, duration));
        Ok(self)
    }

    /// Keeps the current workers until each ran `count` iterations; a negative
    /// count iterates until the engine stops.
    ///
    /// Only valid right after a single ramp, optionally preceded by a delay.
    pub fn hold_iterating(self, count: i64) -> ProfileResult<Self> {
        self.hold_bounded(IterationBound::from_count(count))
    }

    /// Ramps to `count` workers over `ramp`, then holds them for `hold`.
    pub fn ramp_to_and_hold(
        self,
        count: i64,
        ramp: Duration,
        hold: Duration,
    ) -> ProfileResult<Self> {
        self.ramp_to(count, ramp)?.hold_for(hold)
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn build(self) -> Profile {
        Profile::new(self.stages)
    }

    fn hold_bounded(mut self, iterations: IterationBound) -> ProfileResult<Self> {
        let target = self.last_target();
        if target == 0 {
            return Err(ProfileError::invalid(
                ProfileOperation::HoldIterating,
                "cannot iterate without workers; ramp to a positive count first",
            ));
        }
        if !self.accepts_iterations() {
            return Err(ProfileError::invalid(
                ProfileOperation::HoldIterating,
                "is only supported after a single ramp, optionally preceded by a delay",
            ));
        }
        self.push(Stage::iterating(target, iterations));
        Ok(self)
    }

    fn push(&mut self, stage: Stage) {
        debug!(index = self.stages.len(), %stage, "Appended stage");
        self.stages.push(stage);
    }

    fn last_target(&self) -> u32 {
        self.stages.last().map_or(0, |stage| stage.target)
    }

    /// No stage may follow an iteration-bound one.
    fn ensure_open(&self, operation: ProfileOperation) -> ProfileResult<()> {
        match self.stages.last() {
            Some(stage) if stage.is_iteration_bound() => Err(ProfileError::invalid(
                operation,
                "cannot follow `hold_iterating`; an iteration-bound hold must be the last stage",
            )),
            _ => Ok(()),
        }
    }

    fn accepts_iterations(&self) -> bool {
        let is_ramp = |stage: &Stage| {
            stage.target > 0 && matches!(stage.bound, StageBound::Duration(_))
        };
        match self.stages.as_slice() {
            [ramp] => is_ramp(ramp),
            [delay, ramp] => {
                delay.target == 0 && !delay.is_iteration_bound() && is_ramp(ramp)
            }
            _ => false,
        }
    }
}

impl TryFrom<Vec<Stage>> for Profile {
    type Error = ProfileError;

    /// Replays stages through the builder so externally supplied lists obey
    /// the same sequencing rules.
    fn try_from(stages: Vec<Stage>) -> ProfileResult<Self> {
        let mut builder = ProfileBuilder::new();
        for stage in stages {
            builder = match stage.bound {
                StageBound::Duration(duration) => {
                    builder.ramp_to(i64::from(stage.target), duration)?
                }
                StageBound::Iterations(iterations) => {
                    if stage.target != builder.last_target() {
                        return Err(ProfileError::invalid(
                            ProfileOperation::HoldIterating,
                            format!(
                                "must hold the current {} workers, got {}",
                                builder.last_target(),
                                stage.target
                            ),
                        ));
                    }
                    builder.hold_bounded(iterations)?
                }
            };
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: u64) -> Duration {
        Duration::from_secs(value)
    }

    fn assert_rejected<T: std::fmt::Debug>(
        result: ProfileResult<T>,
        operation: ProfileOperation,
    ) {
        match result {
            Err(ProfileError::InvalidProfile { operation: op, .. }) => assert_eq!(op, operation),
            other => panic!("expected InvalidProfile from {operation}, got {other:?}"),
        }
    }

    #[test]
    fn test_ramp_to_appends_stage() {
        let builder = ProfileBuilder::new().ramp_to(3, secs(10)).unwrap();
        assert_eq!(builder.stages(), &[Stage::timed(3, secs(10))]);
    }

    #[test]
    fn test_ramp_to_rejects_negative_count() {
        assert_rejected(
            ProfileBuilder::new().ramp_to(-1, secs(10)),
            ProfileOperation::RampTo,
        );
    }

    #[test]
    fn test_ramp_to_rejects_count_beyond_worker_range() {
        assert_rejected(
            ProfileBuilder::new().ramp_to(i64::from(u32::MAX) + 1, secs(1)),
            ProfileOperation::RampTo,
        );
    }

    #[test]
    fn test_hold_for_repeats_last_target() {
        let builder = ProfileBuilder::new()
            .hold_for(secs(5))
            .unwrap()
            .ramp_to(4, secs(10))
            .unwrap()
            .hold_for(secs(20))
            .unwrap();
        assert_eq!(
            builder.stages(),
            &[
                Stage::timed(0, secs(5)),
                Stage::timed(4, secs(10)),
                Stage::timed(4, secs(20)),
            ]
        );
    }

    #[test]
    fn test_ramp_to_and_hold() {
        let builder = ProfileBuilder::new()
            .ramp_to_and_hold(2, secs(5), secs(15))
            .unwrap();
        assert_eq!(
            builder.stages(),
            &[Stage::timed(2, secs(5)), Stage::timed(2, secs(15))]
        );
    }

    #[test]
    fn test_hold_iterating_after_ramp() {
        let builder = ProfileBuilder::new()
            .ramp_to(3, secs(10))
            .unwrap()
            .hold_iterating(5)
            .unwrap();
        assert_eq!(
            builder.stages().last(),
            Some(&Stage::iterating(3, IterationBound::Bounded(5)))
        );
    }

    #[test]
    fn test_hold_iterating_after_delay_and_ramp() {
        let builder = ProfileBuilder::new()
            .hold_for(secs(10))
            .unwrap()
            .ramp_to(3, secs(15))
            .unwrap()
            .hold_iterating(-1)
            .unwrap();
        assert_eq!(
            builder.stages().last(),
            Some(&Stage::iterating(3, IterationBound::Unbounded))
        );
    }

    #[test]
    fn test_hold_iterating_requires_workers() {
        assert_rejected(
            ProfileBuilder::new().hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
        assert_rejected(
            ProfileBuilder::new()
                .ramp_to(3, secs(10))
                .unwrap()
                .ramp_to(0, secs(10))
                .unwrap()
                .hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
    }

    #[test]
    fn test_hold_iterating_rejects_other_shapes() {
        // ramp up, ramp down, ramp up again
        assert_rejected(
            ProfileBuilder::new()
                .ramp_to(3, secs(10))
                .unwrap()
                .ramp_to(1, secs(10))
                .unwrap()
                .hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
        // ramp then hold
        assert_rejected(
            ProfileBuilder::new()
                .ramp_to_and_hold(3, secs(10), secs(10))
                .unwrap()
                .hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
        // two non-zero ramps
        assert_rejected(
            ProfileBuilder::new()
                .ramp_to(1, secs(10))
                .unwrap()
                .ramp_to(3, secs(10))
                .unwrap()
                .hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
        // twice in a row
        assert_rejected(
            ProfileBuilder::new()
                .ramp_to(3, secs(10))
                .unwrap()
                .hold_iterating(10)
                .unwrap()
                .hold_iterating(10),
            ProfileOperation::HoldIterating,
        );
    }

    #[test]
    fn test_nothing_follows_hold_iterating() {
        let iterating = ProfileBuilder::new()
            .ramp_to(3, secs(10))
            .unwrap()
            .hold_iterating(10)
            .unwrap();

        assert_rejected(
            iterating.clone().ramp_to(5, secs(10)),
            ProfileOperation::RampTo,
        );
        assert_rejected(iterating.hold_for(secs(10)), ProfileOperation::HoldFor);
    }

    #[test]
    fn test_try_from_replays_builder_rules() {
        let profile = Profile::try_from(vec![
            Stage::timed(0, secs(10)),
            Stage::timed(3, secs(15)),
            Stage::iterating(3, IterationBound::Bounded(10)),
        ])
        .unwrap();
        assert!(profile.is_simple());

        assert_rejected(
            Profile::try_from(vec![
                Stage::timed(3, secs(10)),
                Stage::iterating(2, IterationBound::Bounded(10)),
            ]),
            ProfileOperation::HoldIterating,
        );
        assert_rejected(
            Profile::try_from(vec![
                Stage::timed(3, secs(10)),
                Stage::iterating(3, IterationBound::Bounded(10)),
                Stage::timed(0, secs(10)),
            ]),
            ProfileOperation::RampTo,
        );
    }

    #[test]
    fn test_try_from_keeps_iteration_counts_beyond_i64() {
        let profile = Profile::try_from(vec![
            Stage::timed(3, secs(10)),
            Stage::iterating(3, IterationBound::Bounded(u64::MAX)),
        ])
        .unwrap();
        assert_eq!(
            profile.stages().last(),
            Some(&Stage::iterating(3, IterationBound::Bounded(u64::MAX)))
        );
    }
}
