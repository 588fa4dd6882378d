//! Scripted reader for driver and wrapper tests

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use async_trait::async_trait;
use parking_lot::Mutex;
use weir_protocol::{Error, Message, Part};

use crate::{Context, Reader};

/// A context for tests: empty manager, silent metrics, fresh tokens
pub(crate) fn test_context() -> Context {
    Context::new(
        Arc::new(weir_manager::Manager::empty()),
        weir_metrics::Metrics::noop(),
        tokio_util::sync::CancellationToken::new(),
    )
}

/// Acknowledgements observed by a mock, in order
pub(crate) type AckLog = Arc<Mutex<Vec<Option<Error>>>>;

/// A reader that replays a script of read results
///
/// An exhausted script reads as `TypeClosed`.
pub(crate) struct MockReader {
    script: VecDeque<Result<Message, Error>>,
    acks: AckLog,
    pub(crate) connects: Arc<AtomicUsize>,
    connect_failures: usize,
}

impl MockReader {
    pub(crate) fn new(script: Vec<Result<Message, Error>>) -> (Self, AckLog) {
        let acks: AckLog = Arc::default();
        (
            Self {
                script: script.into(),
                acks: Arc::clone(&acks),
                connects: Arc::default(),
                connect_failures: 0,
            },
            acks,
        )
    }

    /// A script of single-part messages
    pub(crate) fn with_messages(texts: &[&str]) -> (Self, AckLog) {
        Self::new(
            texts
                .iter()
                .map(|t| Ok(Message::from(Part::new(t.to_string()))))
                .collect(),
        )
    }

    /// Fail the first `count` connect attempts with `NotConnected`
    pub(crate) fn failing_connects(mut self, count: usize) -> Self {
        self.connect_failures = count;
        self
    }
}

#[async_trait]
impl Reader for MockReader {
    async fn connect(&mut self) -> Result<(), Error> {
        self.connects
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(Error::NotConnected);
        }
        Ok(())
    }

    async fn read(&mut self) -> Result<Message, Error> {
        self.script.pop_front().unwrap_or(Err(Error::TypeClosed))
    }

    async fn acknowledge(&mut self, err: Option<&Error>) -> Result<(), Error> {
        self.acks.lock().push(err.cloned());
        Ok(())
    }

    async fn close(&mut self) {}
}
