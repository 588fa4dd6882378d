//! Weir Configuration
//!
//! One document describes the whole topology: an input, an optional buffer,
//! the pipeline, an output, shared resources, and the ambient logger and
//! metrics sections. Minimal documents should just work; every field has a
//! default.
//!
//! # Parsing
//!
//! Documents are YAML; JSON parses as well since every JSON document is
//! valid YAML:
//!
//! ```
//! use weir_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("input:\n  type: stdin\noutput:\n  type: stdout\n").unwrap();
//! assert_eq!(config.input.kind, "stdin");
//! ```
//!
//! # Example Minimal Config
//!
//! ```yaml
//! input:
//!   type: file
//!   file:
//!     paths: [input.txt]
//! output:
//!   type: stdout
//! ```

mod error;
mod logger;
mod metrics;

pub use error::{ConfigError, Result};
pub use logger::{LogFormat, LoggerConfig};
pub use metrics::MetricsConfig;

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The complete topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: weir_input::Config,
    pub buffer: weir_buffer::Config,
    pub pipeline: weir_pipeline::Config,
    pub output: weir_output::Config,
    pub resources: weir_manager::ResourcesConfig,
    pub logger: LoggerConfig,
    pub metrics: MetricsConfig,

    /// Grace period for orderly shutdown, in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: weir_input::Config::default(),
            buffer: weir_buffer::Config::default(),
            pipeline: weir_pipeline::Config::default(),
            output: weir_output::Config::default(),
            resources: weir_manager::ResourcesConfig::default(),
            logger: LoggerConfig::default(),
            metrics: MetricsConfig::default(),
            shutdown_timeout_secs: 20,
        }
    }
}

impl Config {
    /// Load a document from a file, by extension: `.json` parses as JSON,
    /// anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.display().to_string(), err))?;

        let config: Config = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents)?
        } else {
            serde_yaml::from_str(&contents)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check constraints the type system cannot express
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.threads == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.threads must be at least 1".to_string(),
            ));
        }
        if self.buffer.kind == "memory" && self.buffer.memory.limit == 0 {
            return Err(ConfigError::Invalid(
                "buffer.memory.limit must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }

    /// The shutdown grace period
    pub fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.shutdown_timeout_secs.max(1))
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod lib_test;
