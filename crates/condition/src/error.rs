//! Condition construction errors

use thiserror::Error;

/// Errors raised while building conditions
#[derive(Debug, Error)]
pub enum Error {
    /// The `type` string matched no registered condition
    #[error("unknown condition type '{0}'")]
    UnknownType(String),

    /// A `resource` reference matched no named condition
    #[error("unknown condition resource '{0}'")]
    UnknownResource(String),

    /// Named conditions reference each other in a loop
    #[error("condition resource cycle involving '{0}'")]
    ResourceCycle(String),

    /// The configuration is structurally invalid
    #[error("invalid condition config: {0}")]
    Config(String),

    /// The regex operator received an invalid pattern
    #[error("invalid regex: {0}")]
    Regex(#[from] regex::Error),
}
