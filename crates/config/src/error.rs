//! Configuration errors

use thiserror::Error;

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while loading the topology document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),

    /// The document is not valid YAML
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document is not valid JSON
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    /// The document parsed but violates a constraint
    #[error("invalid config: {0}")]
    Invalid(String),
}
