//! Scripted writer for driver and broker tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;
use parking_lot::Mutex;
use weir_protocol::{Error, Message};

use crate::{Context, Writer};

/// A context for tests: empty manager, silent metrics, fresh tokens
pub(crate) fn test_context() -> Context {
    Context::new(
        Arc::new(weir_manager::Manager::empty()),
        weir_metrics::Metrics::noop(),
        tokio_util::sync::CancellationToken::new(),
    )
}

/// Messages accepted by a mock, in order
pub(crate) type WriteLog = Arc<Mutex<Vec<Message>>>;

/// A writer that records writes and can fail on a script
pub(crate) struct MockWriter {
    written: WriteLog,
    failures: VecDeque<Error>,
    delay: Option<std::time::Duration>,
    pub(crate) connects: Arc<AtomicUsize>,
}

impl MockWriter {
    pub(crate) fn new() -> (Self, WriteLog) {
        let written: WriteLog = Arc::default();
        (
            Self {
                written: Arc::clone(&written),
                failures: VecDeque::new(),
                delay: None,
                connects: Arc::default(),
            },
            written,
        )
    }

    /// Fail the next writes with the given errors, in order, then succeed
    pub(crate) fn failing_writes(mut self, errors: Vec<Error>) -> Self {
        self.failures = errors.into();
        self
    }

    /// Sleep this long inside every write
    pub(crate) fn with_write_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Writer for MockWriter {
    async fn connect(&mut self) -> Result<(), Error> {
        self.connects
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        Ok(())
    }

    async fn write(&mut self, msg: &Message) -> Result<(), Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.failures.pop_front() {
            return Err(err);
        }
        self.written.lock().push(msg.clone());
        Ok(())
    }

    async fn close(&mut self) {}
}
