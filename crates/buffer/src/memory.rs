//! In-memory buffer

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use weir_metrics::{Metrics, event};
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, Error as ProtocolError, Message, Transaction, TransactionRx,
    TransactionTx, transaction_channel,
};

use crate::{Buffer, Error, MemoryBufferConfig};

/// Base delay before re-presenting a nacked message
const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Cap on the re-present backoff
const RETRY_MAX_DELAY: Duration = Duration::from_secs(5);

struct Entry {
    msg: Message,
    cancel: CancellationToken,
}

struct Shared {
    queue: Mutex<VecDeque<Entry>>,
    bytes: AtomicUsize,
    space: Notify,
    items: Notify,
    ingress_done: AtomicBool,
}

/// Spawn the in-memory buffer stage
///
/// The ingress task resolves input transactions as soon as their message is
/// enqueued; the egress task produces fresh transactions downstream and
/// re-presents messages whose response was a retryable error.
pub fn spawn_memory(
    conf: &MemoryBufferConfig,
    inbound: TransactionRx,
    metrics: Metrics,
    cancel: CancellationToken,
) -> Result<Buffer, Error> {
    if conf.limit == 0 {
        return Err(Error::Config(
            "memory buffer limit must be at least 1 byte".to_string(),
        ));
    }

    let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::new()),
        bytes: AtomicUsize::new(0),
        space: Notify::new(),
        items: Notify::new(),
        ingress_done: AtomicBool::new(false),
    });

    let handles = vec![
        tokio::spawn(ingress(
            Arc::clone(&shared),
            inbound,
            conf.limit,
            metrics.clone(),
            cancel.clone(),
        )),
        tokio::spawn(egress(shared, tx, metrics, cancel.clone())),
    ];

    Ok(Buffer {
        rx,
        cancel,
        handles,
    })
}

async fn ingress(
    shared: Arc<Shared>,
    inbound: TransactionRx,
    limit: usize,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = inbound.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);
        let (msg, responder, txn_cancel) = txn.into_parts();
        let size = msg.total_bytes();

        if !wait_for_space(&shared, size, limit, &cancel).await {
            let _ = responder.send(Err(ProtocolError::TypeClosed));
            break;
        }

        shared.queue.lock().push_back(Entry {
            msg,
            cancel: txn_cancel,
        });
        shared.bytes.fetch_add(size, Ordering::Relaxed);
        shared.items.notify_one();

        // The enqueued copy is now the delivery guarantee
        let _ = responder.send(Ok(()));
    }

    shared.ingress_done.store(true, Ordering::Release);
    shared.items.notify_waiters();
    tracing::debug!("buffer ingress stopping");
}

/// Block until the message fits; a message larger than the whole limit is
/// admitted once the queue is empty
async fn wait_for_space(
    shared: &Shared,
    size: usize,
    limit: usize,
    cancel: &CancellationToken,
) -> bool {
    loop {
        if fits(shared, size, limit) {
            return true;
        }
        let notified = shared.space.notified();
        // Re-check after arming the waiter so a release between the first
        // check and here is not missed
        if fits(shared, size, limit) {
            return true;
        }
        tokio::select! {
            _ = notified => {}
            _ = cancel.cancelled() => return false,
        }
    }
}

fn fits(shared: &Shared, size: usize, limit: usize) -> bool {
    shared.bytes.load(Ordering::Relaxed) + size <= limit || shared.queue.lock().is_empty()
}

async fn egress(
    shared: Arc<Shared>,
    outbound: TransactionTx,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    'main: loop {
        let entry = loop {
            if let Some(entry) = shared.queue.lock().pop_front() {
                break entry;
            }
            if shared.ingress_done.load(Ordering::Acquire) {
                if let Some(entry) = shared.queue.lock().pop_front() {
                    break entry;
                }
                break 'main;
            }
            let notified = shared.items.notified();
            if let Some(entry) = shared.queue.lock().pop_front() {
                break entry;
            }
            tokio::select! {
                _ = notified => {}
                _ = cancel.cancelled() => break 'main,
            }
        };

        let size = entry.msg.total_bytes();
        let mut attempt: u32 = 0;
        loop {
            let (txn, response_rx) = Transaction::new(entry.msg.clone(), entry.cancel.clone());
            if outbound.send(txn).await.is_err() {
                shared.queue.lock().push_front(entry);
                break 'main;
            }

            let response = tokio::select! {
                received = response_rx => match received {
                    Ok(response) => response,
                    Err(_) => Err(ProtocolError::TypeClosed),
                },
                _ = cancel.cancelled() => Err(ProtocolError::TypeClosed),
            };

            match response {
                Ok(()) => {
                    shared.bytes.fetch_sub(size, Ordering::Relaxed);
                    shared.space.notify_one();
                    metrics.incr(event::SUCCESS);
                    break;
                }
                Err(ProtocolError::BadMessage(reason)) => {
                    tracing::warn!(reason = %reason, "dropping invalid message from buffer");
                    shared.bytes.fetch_sub(size, Ordering::Relaxed);
                    shared.space.notify_one();
                    metrics.incr(event::ERROR);
                    break;
                }
                Err(err) if err.is_retryable() => {
                    metrics.incr(event::ERROR);
                    attempt += 1;
                    let delay = retry_delay(attempt);
                    tracing::warn!(
                        error = %err,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "buffered message rejected downstream, re-presenting"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => {
                            shared.queue.lock().push_front(entry);
                            break 'main;
                        }
                    }
                }
                Err(_) => {
                    shared.queue.lock().push_front(entry);
                    break 'main;
                }
            }
        }
    }
    tracing::debug!("buffer egress stopping");
}

fn retry_delay(attempt: u32) -> Duration {
    let delay = RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.min(6));
    delay.min(RETRY_MAX_DELAY)
}
