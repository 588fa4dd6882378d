//! Input construction errors

use thiserror::Error as ThisError;

/// Errors raised while building inputs
#[derive(Debug, ThisError)]
pub enum Error {
    /// The `type` string matched no registered input
    #[error("unknown input type '{0}'")]
    UnknownType(String),

    /// The configuration is structurally invalid
    #[error("invalid input config: {0}")]
    Config(String),

    /// An embedded condition failed to build
    #[error(transparent)]
    Condition(#[from] weir_condition::Error),
}
