use std::time::Duration;

use loadshape_core::{CompiledSchedule, CompilerConfig, ScheduleSink, Stage};
use serde::Serialize;
use tracing::info;

use crate::{classifier, general, simple};

/// Validated stage list and the strategy chosen to compile it.
///
/// Only built through [`ProfileBuilder`](crate::ProfileBuilder) or
/// `Profile::try_from(Vec<Stage>)`, so the stages always obey the
/// sequencing rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    stages: Vec<Stage>,
    simple: bool,
}

/// Declared worker count at the end of a duration-bound stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boundary {
    /// Seconds since test start.
    pub at_secs: f64,
    pub target: u32,
}

impl Profile {
    pub(crate) fn new(stages: Vec<Stage>) -> Self {
        let simple = classifier::is_simple(&stages);
        Self { stages, simple }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Whether the engine's single ramp/hold block can express this profile.
    pub fn is_simple(&self) -> bool {
        self.simple
    }

    /// Compiles the profile; the same profile always yields the same schedule.
    pub fn compile(&self) -> CompiledSchedule {
        let schedule = if self.simple {
            CompiledSchedule::Simple(simple::compile(&self.stages))
        } else {
            CompiledSchedule::General(general::compile(&self.stages))
        };

        match &schedule {
            CompiledSchedule::Simple(_) => {
                info!(stages = self.stages.len(), "Compiled profile to simple schedule");
            }
            CompiledSchedule::General(plan) => {
                info!(
                    stages = self.stages.len(),
                    batches = plan.batches.len(),
                    total_secs = plan.total_secs,
                    "Compiled profile to batch schedule"
                );
            }
        }
        schedule
    }

    /// Compiles, rounds to the engine's time resolution and hands the result to `sink`.
    pub fn dispatch<S: ScheduleSink>(
        &self,
        sink: &mut S,
        config: &CompilerConfig,
    ) -> Result<(), S::Error> {
        self.compile().dispatch(sink, config.time_resolution())
    }

    /// Sum of all declared stage durations, saturating at `Duration::MAX`.
    pub fn total_duration(&self) -> Duration {
        self.stages
            .iter()
            .filter_map(Stage::duration)
            .fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Highest worker count the profile reaches.
    pub fn peak_target(&self) -> u32 {
        self.stages.iter().map(|stage| stage.target).max().unwrap_or(0)
    }

    /// End time and target of every duration-bound stage, in order.
    pub fn boundaries(&self) -> Vec<Boundary> {
        let mut elapsed = 0.0;
        self.stages
            .iter()
            .filter(|stage| !stage.is_iteration_bound())
            .map(|stage| {
                elapsed += stage.duration_secs();
                Boundary {
                    at_secs: elapsed,
                    target: stage.target,
                }
            })
            .collect()
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
