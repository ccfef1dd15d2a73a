use std::time::Duration;

use loadshape_core::{RunLimit, SimpleSchedule, Stage};
use tracing::debug;

/// Maps a classifier-approved profile (at most three stages) onto the
/// engine's single ramp-up/hold block.
///
/// A leading zero-target stage is a start delay; otherwise the first stage is
/// the ramp-up. The engine measures the steady phase from the end of the start
/// delay, so any ramp-up time is folded into it.
pub fn compile(stages: &[Stage]) -> SimpleSchedule {
    let Some((first, rest)) = stages.split_first() else {
        return SimpleSchedule::default();
    };

    let delayed = first.target == 0;
    let first_duration = first.duration().unwrap_or_default();

    let mut threads = first.target;
    let mut ramp_up = Duration::ZERO;
    let mut start_delay = Duration::ZERO;
    let mut steady = None;
    let mut iterations = first.iterations();

    if delayed {
        start_delay = first_duration;
    } else {
        ramp_up = first_duration;
    }

    if let Some(second) = rest.first() {
        threads = second.target;
        iterations = second.iterations().or(iterations);
        if delayed {
            ramp_up = second.duration().unwrap_or_default();
            if let Some(third) = rest.get(1) {
                steady = third.duration();
                iterations = third.iterations().or(iterations);
            }
        } else {
            steady = second.duration();
        }
    }

    if !ramp_up.is_zero() && (iterations.is_none() || steady.is_some()) {
        steady = Some(steady.unwrap_or_default().saturating_add(ramp_up));
    }

    let limit = iterations
        .map(RunLimit::Iterations)
        .or(steady.map(RunLimit::Duration));

    let schedule = SimpleSchedule {
        threads,
        ramp_up,
        limit,
        start_delay,
    };
    debug!(?schedule, "Compiled simple schedule");
    schedule
}
