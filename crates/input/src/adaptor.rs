//! The reader adaptor
//!
//! Wraps a [`Reader`] into the transaction protocol: one driver task that
//! connects with backoff, reads, emits a transaction per message, awaits its
//! response and acknowledges the connector accordingly.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use weir_metrics::{Metrics, event};
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, Error, Transaction, TransactionTx, transaction_channel,
};

use crate::{Context, Input, Reader};

/// Base delay for reconnect attempts
const CONNECT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Cap on the reconnect backoff
const CONNECT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Base delay before re-reading after a rejected message
const NACK_BASE_DELAY: Duration = Duration::from_millis(100);

/// Cap on the rejected-message backoff
const NACK_MAX_DELAY: Duration = Duration::from_secs(10);

/// Doubling backoff with a cap, reset on success
pub(crate) struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    pub(crate) fn next(&mut self) -> Duration {
        let delay = self.base * 2u32.saturating_pow(self.attempt.min(6));
        self.attempt = self.attempt.saturating_add(1);
        delay.min(self.cap)
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Spawn the driver task for a reader
pub fn spawn_reader(name: impl Into<String>, reader: Box<dyn Reader>, ctx: &Context) -> Input {
    let name = name.into();
    let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_reader(
        reader,
        tx,
        ctx.metrics.clone(),
        ctx.cancel.clone(),
        ctx.kill.clone(),
        name.clone(),
    ));

    Input::new(name, rx, ctx.cancel.clone(), vec![handle])
}

async fn run_reader(
    mut reader: Box<dyn Reader>,
    tx: TransactionTx,
    metrics: Metrics,
    cancel: CancellationToken,
    kill: CancellationToken,
    name: String,
) {
    let mut connect_backoff = Backoff::new(CONNECT_BASE_DELAY, CONNECT_MAX_DELAY);
    let mut nack_backoff = Backoff::new(NACK_BASE_DELAY, NACK_MAX_DELAY);

    'driver: loop {
        // Connect with exponential backoff until success or shutdown
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break 'driver,
                result = reader.connect() => match result {
                    Ok(()) => {
                        connect_backoff.reset();
                        break;
                    }
                    Err(err) if err.is_type_closed() => break 'driver,
                    Err(err) => {
                        metrics.incr(event::ERROR);
                        let delay = connect_backoff.next();
                        tracing::warn!(
                            input = %name,
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "failed to connect, retrying"
                        );
                        tokio::select! {
                            _ = tokio::time::sleep(delay) => {}
                            _ = cancel.cancelled() => break 'driver,
                        }
                    }
                }
            }
        }

        loop {
            let message = tokio::select! {
                _ = cancel.cancelled() => break 'driver,
                result = reader.read() => match result {
                    Ok(message) => message,
                    Err(Error::Timeout) => continue,
                    Err(Error::NotConnected) => continue 'driver,
                    Err(err) if err.is_type_closed() => break 'driver,
                    Err(err) => {
                        metrics.incr(event::ERROR);
                        tracing::warn!(input = %name, error = %err, "read failed, retrying");
                        tokio::select! {
                            _ = tokio::time::sleep(nack_backoff.next()) => {}
                            _ = cancel.cancelled() => break 'driver,
                        }
                        continue;
                    }
                }
            };
            metrics.incr(event::COUNT);

            // An unsent message is simply unacknowledged: closing here is
            // safe because the connector will re-present it
            let (txn, response_rx) = Transaction::new(message, kill.clone());
            tokio::select! {
                result = tx.send(txn) => if result.is_err() { break 'driver },
                _ = cancel.cancelled() => break 'driver,
            }

            // A closed input keeps serving this wait; only the engine-wide
            // kill token abandons a pending acknowledgement
            let response = tokio::select! {
                received = response_rx => match received {
                    Ok(response) => response,
                    Err(_) => Err(Error::TypeClosed),
                },
                _ = kill.cancelled() => Err(Error::TypeClosed),
            };

            match response {
                Ok(()) => {
                    metrics.incr(event::SUCCESS);
                    nack_backoff.reset();
                    if let Err(err) = reader.acknowledge(None).await {
                        tracing::warn!(input = %name, error = %err, "failed to acknowledge");
                    }
                }
                Err(err) if err.is_type_closed() => {
                    let _ = reader.acknowledge(Some(&err)).await;
                    break 'driver;
                }
                Err(Error::BadMessage(reason)) => {
                    // Poison: acknowledge as handled so it cannot loop
                    metrics.incr(event::ERROR);
                    tracing::warn!(input = %name, reason = %reason, "dropping invalid message");
                    if let Err(err) = reader.acknowledge(None).await {
                        tracing::warn!(input = %name, error = %err, "failed to acknowledge");
                    }
                }
                Err(err) if err.is_fatal() => {
                    tracing::error!(input = %name, error = %err, "fatal response, closing input");
                    let _ = reader.acknowledge(Some(&err)).await;
                    break 'driver;
                }
                Err(err) => {
                    metrics.incr(event::ERROR);
                    tracing::warn!(
                        input = %name,
                        error = %err,
                        "message rejected downstream, will re-present"
                    );
                    let _ = reader.acknowledge(Some(&err)).await;
                    tokio::select! {
                        _ = tokio::time::sleep(nack_backoff.next()) => {}
                        _ = cancel.cancelled() => break 'driver,
                    }
                }
            }
        }
    }

    reader.close().await;
    tracing::debug!(input = %name, "reader stopping");
}
