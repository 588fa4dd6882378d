//! Output construction errors

use thiserror::Error as ThisError;

/// Errors raised while building outputs
#[derive(Debug, ThisError)]
pub enum Error {
    /// The `type` string matched no registered output
    #[error("unknown output type '{0}'")]
    UnknownType(String),

    /// The broker pattern is not recognised
    #[error("unknown broker pattern '{0}'")]
    UnknownPattern(String),

    /// The configuration is structurally invalid
    #[error("invalid output config: {0}")]
    Config(String),

    /// An embedded condition failed to build
    #[error(transparent)]
    Condition(#[from] weir_condition::Error),
}
