//! The batching wrapper

use std::time::Duration;

use async_trait::async_trait;
use weir_protocol::{Error, Message};

use crate::Reader;

/// How long to wait for further messages once a batch has started
const DEFAULT_FLUSH_PERIOD: Duration = Duration::from_millis(100);

/// Accumulates consecutive reads into one multi-part message
///
/// The first read blocks as usual; further reads are attempted under a flush
/// deadline until the batch is full, the deadline lapses, or the inner
/// reader errors (the error is left to resurface on the next call). One
/// acknowledgement covers the whole batch, so it commits or retries
/// atomically. The `split` processor reverses the grouping downstream.
pub struct Batcher {
    inner: Box<dyn Reader>,
    max_parts: usize,
    period: Duration,
}

impl Batcher {
    /// Wrap a reader, batching up to `max_parts` parts per message
    pub fn new(inner: Box<dyn Reader>, max_parts: usize) -> Self {
        Self {
            inner,
            max_parts: max_parts.max(1),
            period: DEFAULT_FLUSH_PERIOD,
        }
    }

    /// Override the flush period
    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }
}

#[async_trait]
impl Reader for Batcher {
    async fn connect(&mut self) -> Result<(), Error> {
        self.inner.connect().await
    }

    async fn read(&mut self) -> Result<Message, Error> {
        let mut batch = self.inner.read().await?;

        while batch.len() < self.max_parts {
            match tokio::time::timeout(self.period, self.inner.read()).await {
                Err(_elapsed) => break,
                Ok(Ok(next)) => batch.parts_mut().extend(next.into_parts()),
                Ok(Err(err)) if err.is_timeout() => break,
                Ok(Err(_)) => break,
            }
        }
        Ok(batch)
    }

    async fn acknowledge(&mut self, err: Option<&Error>) -> Result<(), Error> {
        self.inner.acknowledge(err).await
    }

    async fn close(&mut self) {
        self.inner.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockReader;

    #[tokio::test]
    async fn test_batches_up_to_target() {
        let (mock, _acks) = MockReader::with_messages(&["a", "b", "c", "d", "e"]);
        let mut batcher = Batcher::new(Box::new(mock), 2);
        batcher.connect().await.unwrap();

        let first = batcher.read().await.unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first.get(0).unwrap().as_slice(), b"a");
        assert_eq!(first.get(1).unwrap().as_slice(), b"b");

        let second = batcher.read().await.unwrap();
        assert_eq!(second.len(), 2);

        // Trailing partial batch flushes when the source ends
        let third = batcher.read().await.unwrap();
        assert_eq!(third.len(), 1);
        assert_eq!(third.get(0).unwrap().as_slice(), b"e");
    }

    #[tokio::test]
    async fn test_terminal_error_resurfaces_after_flush() {
        let (mock, _acks) = MockReader::with_messages(&["only"]);
        let mut batcher = Batcher::new(Box::new(mock), 3);
        batcher.connect().await.unwrap();

        let batch = batcher.read().await.unwrap();
        assert_eq!(batch.len(), 1);

        assert!(matches!(batcher.read().await, Err(Error::TypeClosed)));
    }

    #[tokio::test]
    async fn test_single_ack_covers_batch() {
        let (mock, acks) = MockReader::with_messages(&["a", "b"]);
        let mut batcher = Batcher::new(Box::new(mock), 2);
        batcher.connect().await.unwrap();

        batcher.read().await.unwrap();
        batcher.acknowledge(None).await.unwrap();
        assert_eq!(acks.lock().len(), 1);
    }
}
