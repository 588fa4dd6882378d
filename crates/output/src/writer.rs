//! The connector contract for outputs

use async_trait::async_trait;
use weir_protocol::{Error, Message};

/// A low-level output connector
///
/// The writer adaptor drives this interface from a single task, so
/// implementations never see concurrent calls.
///
/// Error semantics on `write`:
/// - `NotConnected` - the adaptor reconnects and retries the same message
///   without resolving its transaction
/// - anything else resolves the transaction with that error; the upstream
///   producer decides whether the whole message is retried
#[async_trait]
pub trait Writer: Send {
    /// Establish the connection; idempotent
    async fn connect(&mut self) -> Result<(), Error>;

    /// Durably write one message
    async fn write(&mut self, msg: &Message) -> Result<(), Error>;

    /// Release the connection; called exactly once, after the last write
    async fn close(&mut self);
}
