//! The writer adaptor
//!
//! Wraps a [`Writer`] into the transaction protocol: one driver task that
//! consumes transactions, writes each message, and resolves the transaction
//! with the outcome. `NotConnected` is handled inside the adaptor with a
//! reconnect-and-retry loop; the transaction stays unresolved meanwhile so
//! the producer keeps waiting rather than redelivering.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use weir_metrics::{Metrics, event};
use weir_protocol::{Error, TransactionRx};

use crate::{Context, Output, Writer};

/// Base delay for reconnect attempts
const CONNECT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Cap on the reconnect backoff
const CONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Doubling backoff with a cap, reset on success
struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    fn next(&mut self) -> Duration {
        let delay = self.base * 2u32.saturating_pow(self.attempt.min(6));
        self.attempt = self.attempt.saturating_add(1);
        delay.min(self.cap)
    }

    fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Spawn the driver task for a writer over the given receiver
pub fn spawn_writer(
    name: impl Into<String>,
    writer: Box<dyn Writer>,
    rx: TransactionRx,
    ctx: &Context,
) -> Output {
    let name = name.into();
    let handle = tokio::spawn(run_writer(
        writer,
        rx,
        ctx.metrics.clone(),
        ctx.cancel.clone(),
        name.clone(),
    ));
    Output::new(name, ctx.cancel.clone(), vec![handle])
}

async fn run_writer(
    mut writer: Box<dyn Writer>,
    rx: TransactionRx,
    metrics: Metrics,
    cancel: CancellationToken,
    name: String,
) {
    let mut connected = false;
    let mut backoff = Backoff::new(CONNECT_BASE_DELAY, CONNECT_MAX_DELAY);

    'driver: loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);
        let (msg, responder, _txn_cancel) = txn.into_parts();

        loop {
            while !connected {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = responder.send(Err(Error::TypeClosed));
                        break 'driver;
                    }
                    result = writer.connect() => match result {
                        Ok(()) => {
                            connected = true;
                            backoff.reset();
                        }
                        Err(err) => {
                            metrics.incr(event::ERROR);
                            let delay = backoff.next();
                            tracing::warn!(
                                output = %name,
                                error = %err,
                                delay_ms = delay.as_millis() as u64,
                                "failed to connect, retrying"
                            );
                            tokio::select! {
                                _ = tokio::time::sleep(delay) => {}
                                _ = cancel.cancelled() => {
                                    let _ = responder.send(Err(Error::TypeClosed));
                                    break 'driver;
                                }
                            }
                        }
                    }
                }
            }

            match writer.write(&msg).await {
                Ok(()) => {
                    metrics.incr(event::SUCCESS);
                    let _ = responder.send(Ok(()));
                    break;
                }
                Err(Error::NotConnected) => {
                    // Reconnect and retry the same message without resolving
                    connected = false;
                    metrics.incr(event::ERROR);
                    tracing::warn!(output = %name, "connection lost mid-write, retrying");
                }
                Err(err) => {
                    metrics.incr(event::ERROR);
                    tracing::warn!(output = %name, error = %err, "write failed");
                    let _ = responder.send(Err(err));
                    break;
                }
            }
        }
    }

    // Unblock anything still queued behind a closed output
    while let Ok(txn) = rx.try_recv() {
        txn.resolve(Err(Error::TypeClosed));
    }
    writer.close().await;
    tracing::debug!(output = %name, "writer stopping");
}
