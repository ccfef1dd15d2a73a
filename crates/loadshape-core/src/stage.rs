//! Declarative stages of a concurrency profile.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How many iterations each worker executes before an iteration-bound stage ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IterationBound {
    /// Each worker stops after this many iterations.
    Bounded(u64),
    /// Workers iterate until the engine stops them.
    Unbounded,
}

impl IterationBound {
    /// Maps an author-supplied count; negative counts mean unbounded.
    pub fn from_count(count: i64) -> Self {
        match u64::try_from(count) {
            Ok(count) => Self::Bounded(count),
            Err(_) => Self::Unbounded,
        }
    }
}

impl fmt::Display for IterationBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bounded(count) => write!(f, "{} iterations", count),
            Self::Unbounded => write!(f, "unbounded iterations"),
        }
    }
}

/// What ends a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageBound {
    /// Time spent moving from the previous target to this one, or holding it.
    Duration(Duration),
    /// The stage ends once every worker ran this many iterations.
    Iterations(IterationBound),
}

/// A single declared transition or hold.
///
/// Stages are immutable once appended to a profile.
///
/// # Example
///
/// ```
/// use loadshape_core::Stage;
/// use std::time::Duration;
///
/// let stage = Stage::timed(3, Duration::from_secs(10));
/// assert_eq!(stage.target, 3);
/// assert_eq!(stage.duration(), Some(Duration::from_secs(10)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    /// Concurrent workers desired once the stage completes.
    pub target: u32,
    /// Duration or iteration count ending the stage.
    pub bound: StageBound,
}

impl Stage {
    /// Creates a duration-bound stage.
    pub fn timed(target: u32, duration: Duration) -> Self {
        Self {
            target,
            bound: StageBound::Duration(duration),
        }
    }

    /// Creates an iteration-bound stage.
    pub fn iterating(target: u32, iterations: IterationBound) -> Self {
        Self {
            target,
            bound: StageBound::Iterations(iterations),
        }
    }

    /// Transition duration, `None` for iteration-bound stages.
    pub fn duration(&self) -> Option<Duration> {
        match self.bound {
            StageBound::Duration(duration) => Some(duration),
            StageBound::Iterations(_) => None,
        }
    }

    /// Iteration bound, `None` for duration-bound stages.
    pub fn iterations(&self) -> Option<IterationBound> {
        match self.bound {
            StageBound::Duration(_) => None,
            StageBound::Iterations(iterations) => Some(iterations),
        }
    }

    pub fn is_iteration_bound(&self) -> bool {
        matches!(self.bound, StageBound::Iterations(_))
    }

    /// Transition duration in seconds; iteration-bound stages take no declared time.
    pub fn duration_secs(&self) -> f64 {
        self.duration().map_or(0.0, |duration| duration.as_secs_f64())
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bound {
            StageBound::Duration(duration) => {
                write!(f, "ramp to {} over {:?}", self.target, duration)
            }
            StageBound::Iterations(iterations) => {
                write!(f, "hold {} for {}", self.target, iterations)
            }
        }
    }
}
