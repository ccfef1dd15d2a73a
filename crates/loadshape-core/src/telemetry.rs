//! Tracing subscriber initialization
//!
//! Library code only emits `tracing` events; whoever drives the compiler
//! decides where they go. `RUST_LOG` wins over the configured filter.
//!
//! # Example
//! ```no_run
//! use loadshape_core::{telemetry, LoadshapeConfig};
//!
//! let config = LoadshapeConfig::load().expect("Failed to load configuration");
//! telemetry::init_tracing(&config.logging).expect("Failed to initialize tracing");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Install the global subscriber.
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.filter.as_str()));

    let registry = Registry::default().with(env_filter);

    if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_line_number(true),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(true),
            )
            .try_init()
    }
}
