//! Transaction response errors
//!
//! Every transaction resolves with a `Response`: success, or an error drawn
//! from a closed set of kinds. Only the producer side of a transaction
//! interprets the kind; intermediaries forward responses verbatim.

use thiserror::Error;

/// Result of a resolved transaction
pub type Response = Result<(), Error>;

/// Error kinds carried by transaction responses and connector operations
///
/// The kinds partition cleanly by what the originator should do next:
/// reconnect (`NotConnected`), retry later (`Timeout`, `Transient`), stop the
/// branch (`TypeClosed`), drop the message (`BadMessage`), or stop the engine
/// (`Fatal`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The connector is not connected to its target source or sink
    #[error("not connected to target source or sink")]
    NotConnected,

    /// No data was available within the deadline; not a failure
    #[error("action timed out")]
    Timeout,

    /// The upstream is exhausted or the component was closed; terminal for
    /// that branch
    #[error("type was closed")]
    TypeClosed,

    /// The message is structurally invalid and must not be retried
    #[error("message is invalid: {0}")]
    BadMessage(String),

    /// A generic retryable failure; the producer decides whether to retry
    #[error("{0}")]
    Transient(String),

    /// An unrecoverable failure; triggers engine-wide shutdown
    #[error("fatal: {0}")]
    Fatal(String),
}

impl Error {
    /// Create a `BadMessage` error
    pub fn bad_message(msg: impl Into<String>) -> Self {
        Self::BadMessage(msg.into())
    }

    /// Create a `Transient` error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    /// Create a `Fatal` error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    /// Whether a producer may usefully retry after this error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Timeout | Self::Transient(_)
        )
    }

    /// Whether this is the non-failure "no data yet" signal
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether this error terminates the branch that observed it
    pub fn is_type_closed(&self) -> bool {
        matches!(self, Self::TypeClosed)
    }

    /// Whether this error requires a reconnect before progress
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// Whether this error must stop the whole engine
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;
        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => Self::Timeout,
            ErrorKind::NotConnected
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::ConnectionRefused
            | ErrorKind::BrokenPipe => Self::NotConnected,
            ErrorKind::UnexpectedEof => Self::TypeClosed,
            _ => Self::Transient(err.to_string()),
        }
    }
}
