use std::fmt;

use thiserror::Error;

/// Profile-builder call that rejected a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileOperation {
    RampTo,
    HoldFor,
    HoldIterating,
}

impl fmt::Display for ProfileOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RampTo => "ramp_to",
            Self::HoldFor => "hold_for",
            Self::HoldIterating => "hold_iterating",
        };
        f.write_str(name)
    }
}

/// Canonical error type for profile construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    /// The requested stage would break the profile's sequencing rules.
    #[error("invalid profile: `{operation}` {reason}")]
    InvalidProfile {
        /// Builder call that triggered the violation.
        operation: ProfileOperation,
        /// Human-readable description of the violated rule.
        reason: String,
    },
}

impl ProfileError {
    /// Creates an `InvalidProfile` variant.
    #[must_use]
    pub fn invalid(operation: ProfileOperation, reason: impl Into<String>) -> Self {
        Self::InvalidProfile {
            operation,
            reason: reason.into(),
        }
    }

    /// Builder call that failed.
    pub fn operation(&self) -> ProfileOperation {
        match self {
            Self::InvalidProfile { operation, .. } => *operation,
        }
    }
}

/// Convenient result alias for profile construction.
pub type ProfileResult<T> = Result<T, ProfileError>;
