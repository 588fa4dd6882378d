//! Weir Pipeline - Processor dispatch over transaction streams
//!
//! The pipeline stage consumes transactions from an inbound channel, runs
//! each message through an ordered processor chain, and forwards the
//! survivors downstream.
//!
//! # Architecture
//!
//! ```text
//! [Inbound] ──→ worker 0 ─┐
//!          ──→ worker 1 ─┼──→ [Outbound]
//!          ──→ worker N ─┘
//! ```
//!
//! # Key Design
//!
//! - **Shared MPMC inbound**: `threads` workers pull from one channel;
//!   whichever worker is free takes the next transaction
//! - **Responder forwarding**: a single surviving message keeps the upstream
//!   response channel, so acknowledgement flows straight through
//! - **Fan-out folding**: when a processor multiplies a message, one child
//!   transaction is created per survivor and the upstream resolves success
//!   only when every child did
//! - **Per-sibling settlement**: a processor response settles only the
//!   message it was returned for; the rest of the batch keeps flowing, and
//!   the upstream resolves success only when every sibling was delivered
//!   or explicitly dropped

mod config;

pub use config::Config;

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weir_metrics::{Metrics, event};
use weir_processor::Processor;
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, Error, Response, Transaction, TransactionRx, TransactionTx,
    transaction_channel,
};


/// A running pipeline stage
///
/// Workers exit when the inbound channel ends or the stage token is
/// cancelled; the outbound channel ends once the last worker exits.
pub struct Pipeline {
    rx: TransactionRx,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawn `threads` workers over the inbound channel
    pub fn spawn(
        processors: Vec<Box<dyn Processor>>,
        threads: usize,
        inbound: TransactionRx,
        metrics: Metrics,
        cancel: CancellationToken,
    ) -> Pipeline {
        let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);
        let processors = Arc::new(processors);
        let threads = threads.max(1);

        tracing::debug!(
            threads,
            processors = processors.len(),
            "pipeline stage starting"
        );

        let mut handles = Vec::with_capacity(threads);
        for worker_id in 0..threads {
            handles.push(tokio::spawn(worker(
                worker_id,
                Arc::clone(&processors),
                inbound.clone(),
                tx.clone(),
                metrics.clone(),
                cancel.clone(),
            )));
        }

        Pipeline {
            rx,
            cancel,
            handles,
        }
    }

    /// The outbound transaction stream
    pub fn transactions(&self) -> TransactionRx {
        self.rx.clone()
    }

    /// Request the stage to stop consuming
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for every worker to exit within the deadline
    pub async fn wait_closed(&mut self, deadline: std::time::Duration) -> Result<(), Error> {
        let deadline = tokio::time::Instant::now() + deadline;
        for handle in self.handles.drain(..) {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(error = %err, "pipeline worker panicked during shutdown");
                }
                Err(_) => return Err(Error::Timeout),
            }
        }
        Ok(())
    }
}

async fn worker(
    worker_id: usize,
    processors: Arc<Vec<Box<dyn Processor>>>,
    inbound: TransactionRx,
    outbound: TransactionTx,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "pipeline worker starting");

    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = inbound.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        dispatch(txn, &processors, &outbound, &metrics, &cancel).await;
    }

    tracing::debug!(worker_id, "pipeline worker stopping");
}

/// Run one transaction through the chain and forward the survivors
async fn dispatch(
    txn: Transaction,
    processors: &[Box<dyn Processor>],
    outbound: &TransactionTx,
    metrics: &Metrics,
    stage_cancel: &CancellationToken,
) {
    metrics.incr(event::COUNT);
    let started = Instant::now();
    let (message, responder, cancel) = txn.into_parts();

    // Siblings created by earlier processors settle independently: a
    // response from a processor resolves only the message it was returned
    // for, while the rest of the batch keeps moving through the chain
    let mut messages = vec![message];
    let mut sibling_failure: Option<Error> = None;
    for processor in processors {
        let mut next = Vec::new();
        for msg in messages {
            let (out, response) = processor.process(msg);
            match response {
                None => next.extend(out),
                Some(Ok(())) => metrics.incr(event::SKIPPED),
                Some(Err(err)) => {
                    metrics.incr(event::ERROR);
                    if sibling_failure.is_none() {
                        sibling_failure = Some(err);
                    } else {
                        tracing::debug!(error = %err, "additional sibling rejected mid-pipeline");
                    }
                }
            }
        }
        messages = next;
        if messages.is_empty() {
            break;
        }
    }
    metrics.timing(started.elapsed());

    if messages.is_empty() {
        // Every sibling settled inside the chain: success only if none of
        // them failed
        let _ = responder.send(match sibling_failure {
            Some(err) => Err(err),
            None => Ok(()),
        });
        return;
    }

    if messages.len() == 1 && sibling_failure.is_none() {
        // Single survivor, nothing to fold: forward the upstream responder
        // verbatim so the acknowledgement path has no extra hop
        let msg = messages.remove(0);
        let forwarded = Transaction::with_responder(msg, responder, cancel);
        tokio::select! {
            result = outbound.send(forwarded) => {
                if result.is_ok() {
                    metrics.incr(event::SENT);
                }
            }
            // Dropping the transaction closes its response channel, which
            // the producer observes as TypeClosed
            _ = stage_cancel.cancelled() => {}
        }
        return;
    }

    // Fan-out: one child transaction per survivor; their responses fold
    // together with any failure recorded inside the chain
    let expected = messages.len();
    let mut response_rxs = Vec::with_capacity(expected);
    for msg in messages {
        let (child, response_rx) = Transaction::new(msg, cancel.clone());
        let sent = tokio::select! {
            result = outbound.send(child) => result.is_ok(),
            _ = stage_cancel.cancelled() => false,
        };
        if !sent {
            break;
        }
        response_rxs.push(response_rx);
    }
    metrics.incr_by(event::SENT, response_rxs.len() as u64);

    let mut folded: Response = match sibling_failure {
        Some(err) => Err(err),
        None if response_rxs.len() == expected => Ok(()),
        None => Err(Error::TypeClosed),
    };
    for response_rx in response_rxs {
        let response = match response_rx.await {
            Ok(response) => response,
            Err(_) => Err(Error::TypeClosed),
        };
        if let Err(err) = response {
            if folded.is_ok() {
                folded = Err(err);
            } else {
                tracing::debug!(error = %err, "additional fan-out branch failed");
            }
        }
    }

    match &folded {
        Ok(()) => metrics.incr(event::SUCCESS),
        Err(_) => metrics.incr(event::ERROR),
    }
    let _ = responder.send(folded);
}
