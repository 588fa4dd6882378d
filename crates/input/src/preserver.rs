//! The preserver wrapper

use async_trait::async_trait;
use weir_protocol::{Error, Message};

use crate::Reader;

/// Re-presents a non-acknowledged message on the next read
///
/// Some connectors destroy a message by reading it (a popped list entry, a
/// consumed socket line) and cannot re-present it after a failed
/// acknowledgement. The preserver retains a copy of the last read message;
/// a nack is swallowed rather than forwarded, and the retained message is
/// returned by the next `read` instead of polling the upstream. Transparent
/// to both sides.
pub struct Preserver {
    inner: Box<dyn Reader>,
    unacked: Option<Message>,
    resend: Option<Message>,
}

impl Preserver {
    /// Wrap a reader
    pub fn new(inner: Box<dyn Reader>) -> Self {
        Self {
            inner,
            unacked: None,
            resend: None,
        }
    }
}

#[async_trait]
impl Reader for Preserver {
    async fn connect(&mut self) -> Result<(), Error> {
        self.inner.connect().await
    }

    async fn read(&mut self) -> Result<Message, Error> {
        if let Some(msg) = self.resend.take() {
            self.unacked = Some(msg.clone());
            return Ok(msg);
        }
        let msg = self.inner.read().await?;
        self.unacked = Some(msg.clone());
        Ok(msg)
    }

    async fn acknowledge(&mut self, err: Option<&Error>) -> Result<(), Error> {
        match err {
            Some(_) => {
                // Keep the message for re-presentation; the inner connector
                // never learns about the failure
                self.resend = self.unacked.take();
                Ok(())
            }
            None => {
                self.unacked = None;
                self.inner.acknowledge(None).await
            }
        }
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}
