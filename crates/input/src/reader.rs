//! The connector contract for inputs

use async_trait::async_trait;
use weir_protocol::{Error, Message};

/// A low-level input connector
///
/// The reader adaptor drives this interface from a single task, so
/// implementations never see concurrent calls.
///
/// Error semantics on `read`:
/// - `Timeout` - no data within the deadline; the adaptor retries without
///   acknowledging
/// - `NotConnected` - the adaptor calls `connect` again before reading
/// - `TypeClosed` - the upstream is exhausted; the adaptor shuts the input
///   down gracefully
/// - anything else is treated as transient and retried after a backoff
#[async_trait]
pub trait Reader: Send {
    /// Establish the connection; idempotent
    async fn connect(&mut self) -> Result<(), Error>;

    /// Produce the next message
    async fn read(&mut self) -> Result<Message, Error>;

    /// Report whether everything read since the last acknowledgement was
    /// durably handled downstream
    ///
    /// `None` commits the reads (offsets, deletions, remote acks); an error
    /// means "retry later" and the connector decides whether re-reading is
    /// needed or the message will be re-presented some other way.
    async fn acknowledge(&mut self, err: Option<&Error>) -> Result<(), Error>;

    /// Release the connection; called exactly once, after the last read
    async fn close(&mut self);
}
