//! Manager construction errors

use thiserror::Error;

/// Errors raised while building the resource registry
#[derive(Debug, Error)]
pub enum Error {
    /// The cache `type` string matched no registered cache
    #[error("unknown cache type '{0}'")]
    UnknownCacheType(String),

    /// The rate limit `type` string matched no registered rate limit
    #[error("unknown rate limit type '{0}'")]
    UnknownRateLimitType(String),

    /// A resource configuration is structurally invalid
    #[error("invalid resource config: {0}")]
    Config(String),

    /// A named condition failed to build
    #[error(transparent)]
    Condition(#[from] weir_condition::Error),
}
