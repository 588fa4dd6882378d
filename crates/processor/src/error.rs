//! Processor construction errors

use thiserror::Error;

/// Errors raised while building processors
#[derive(Debug, Error)]
pub enum Error {
    /// The `type` string matched no registered processor
    #[error("unknown processor type '{0}'")]
    UnknownType(String),

    /// The compression algorithm is not recognised
    #[error("compression algorithm not recognised: {0}")]
    UnknownAlgorithm(String),

    /// The configuration is structurally invalid
    #[error("invalid processor config: {0}")]
    Config(String),

    /// An embedded condition failed to build
    #[error(transparent)]
    Condition(#[from] weir_condition::Error),
}
