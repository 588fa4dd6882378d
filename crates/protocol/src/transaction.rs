//! Transactions - the unit of transport
//!
//! A transaction couples a message with a single-use response channel and a
//! shutdown signal. The producer holds the receiving half and blocks until a
//! response arrives; whichever component terminally handles the message
//! resolves it exactly once. This one primitive carries both backpressure
//! and acknowledgement through the entire engine.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::{Message, Response};

/// Sending half of an inter-stage transaction channel
pub type TransactionTx = crossfire::MAsyncTx<Transaction>;

/// Receiving half of an inter-stage transaction channel
pub type TransactionRx = crossfire::MAsyncRx<Transaction>;

/// Receiving half of a transaction's response channel
pub type ResponseRx = oneshot::Receiver<Response>;

/// Create a bounded MPMC transaction channel
///
/// Both halves are cloneable: fan-in brokers share the sender, pipeline
/// workers and greedy output children share the receiver.
pub fn transaction_channel(capacity: usize) -> (TransactionTx, TransactionRx) {
    crossfire::mpmc::bounded_async(capacity)
}

/// A message in flight, paired with its response sink and shutdown signal
///
/// A transaction is *open* from creation until the response sink is
/// resolved. Every transaction produced by an input is eventually resolved;
/// dropping one unresolved closes the response channel, which producers
/// treat as `TypeClosed`.
pub struct Transaction {
    message: Message,
    responder: oneshot::Sender<Response>,
    cancel: CancellationToken,
}

impl Transaction {
    /// Create a transaction, returning the response receiver for the
    /// producer to await
    pub fn new(message: Message, cancel: CancellationToken) -> (Self, ResponseRx) {
        let (responder, response_rx) = oneshot::channel();
        (
            Self {
                message,
                responder,
                cancel,
            },
            response_rx,
        )
    }

    /// Re-wrap a message around an existing responder
    ///
    /// Used by stages that replace the message but forward the upstream
    /// response sink verbatim (the single-survivor pipeline path).
    pub fn with_responder(
        message: Message,
        responder: oneshot::Sender<Response>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            message,
            responder,
            cancel,
        }
    }

    /// The message carried by this transaction
    pub fn message(&self) -> &Message {
        &self.message
    }

    /// The shutdown signal accompanying this transaction
    ///
    /// Components blocked on forwarding or awaiting a response select
    /// against this token and resolve with `TypeClosed` when it fires.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Decompose into message, responder and shutdown signal
    pub fn into_parts(self) -> (Message, oneshot::Sender<Response>, CancellationToken) {
        (self.message, self.responder, self.cancel)
    }

    /// Resolve the transaction
    ///
    /// A send failure means the producer stopped waiting, which is only
    /// possible during forced shutdown; the response is discarded.
    pub fn resolve(self, response: Response) {
        let _ = self.responder.send(response);
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("parts", &self.message.len())
            .field("bytes", &self.message.total_bytes())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
