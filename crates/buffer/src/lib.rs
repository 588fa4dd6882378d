//! Weir Buffer - Decoupling ingress from egress acknowledgement
//!
//! Without a buffer, an input's transaction resolves only when the terminal
//! output accepts the message. With a buffer, the copy in the queue becomes
//! the delivery guarantee: the ingress side acknowledges as soon as the
//! message is enqueued, and the buffer becomes the producer for everything
//! downstream, retrying nacked messages itself.
//!
//! Only the in-memory buffer ships in-tree; its contents do not survive a
//! restart. A persistent buffer is an external collaborator implementing
//! the same stage contract.

mod config;
mod memory;

pub use config::{Config, MemoryBufferConfig};
pub use memory::spawn_memory;

use thiserror::Error as ThisError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weir_metrics::Metrics;
use weir_protocol::TransactionRx;

/// Errors raised while building a buffer stage
#[derive(Debug, ThisError)]
pub enum Error {
    /// The `type` string matched no registered buffer
    #[error("unknown buffer type '{0}'")]
    UnknownType(String),

    /// The configuration is structurally invalid
    #[error("invalid buffer config: {0}")]
    Config(String),
}

/// Description of a registered buffer type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered buffer types
pub const TYPE_SPECS: &[TypeSpec] = &[
    TypeSpec {
        name: "none",
        description: "No buffering; downstream acknowledgements resolve the \
                      input's transactions directly.",
    },
    TypeSpec {
        name: "memory",
        description: "A bounded in-memory queue. Input transactions resolve \
                      on enqueue; contents are lost on restart.",
    },
];

/// A running buffer stage
pub struct Buffer {
    rx: TransactionRx,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Buffer {
    /// The outbound transaction stream
    pub fn transactions(&self) -> TransactionRx {
        self.rx.clone()
    }

    /// Request the stage to stop
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the ingress and egress tasks to exit within the deadline
    pub async fn wait_closed(
        &mut self,
        deadline: std::time::Duration,
    ) -> Result<(), weir_protocol::Error> {
        let deadline = tokio::time::Instant::now() + deadline;
        for handle in self.handles.drain(..) {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "buffer task panicked during shutdown");
                }
                Err(_) => return Err(weir_protocol::Error::Timeout),
            }
        }
        Ok(())
    }
}

/// Build the configured buffer stage, if any
///
/// Returns the stream the next stage should consume: `type: none` hands the
/// inbound receiver straight back with no stage spawned.
pub fn new_buffer(
    conf: &Config,
    inbound: TransactionRx,
    metrics: &Metrics,
    cancel: CancellationToken,
) -> Result<(TransactionRx, Option<Buffer>), Error> {
    match conf.kind.as_str() {
        "none" => Ok((inbound, None)),
        "memory" => {
            let stage = spawn_memory(&conf.memory, inbound, metrics.child("memory"), cancel)?;
            Ok((stage.transactions(), Some(stage)))
        }
        other => Err(Error::UnknownType(other.to_string())),
    }
}
