//! Configuration management for loadshape
//!
//! Sources, lowest precedence first:
//! - Hardcoded defaults
//! - Config file named by `LOADSHAPE_CONFIG`
//! - `./config/loadshape.{yaml,toml,json}`
//! - Environment variables prefixed with `LOADSHAPE`

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LoadshapeConfig {
    #[serde(default)]
    pub compiler: CompilerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LoadshapeConfig {
    /// Load configuration from all sources and validate it.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("LOADSHAPE_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder.add_source(File::with_name("./config/loadshape").required(false));

        // Example: LOADSHAPE_COMPILER__TIME_RESOLUTION_MS=100
        builder = builder.add_source(
            Environment::with_prefix("LOADSHAPE")
                .separator("__")
                .try_parsing(true),
        );

        let config: LoadshapeConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("compiler.time_resolution_ms", 1000)?
            .set_default("logging.filter", "info")?
            .set_default("logging.json", false)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compiler.time_resolution_ms == 0 {
            return Err(ConfigError::Message(
                "compiler.time_resolution_ms must be > 0".to_string(),
            ));
        }

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Message(
                "logging.filter must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a specific file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: LoadshapeConfig = Self::set_defaults(Config::builder())?
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// Settings for the schedule handed to the execution engine
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CompilerConfig {
    /// Minimum time unit of the engine in milliseconds (default: 1000)
    pub time_resolution_ms: u64,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            time_resolution_ms: 1000,
        }
    }
}

impl CompilerConfig {
    pub fn time_resolution(&self) -> Duration {
        Duration::from_millis(self.time_resolution_ms)
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
