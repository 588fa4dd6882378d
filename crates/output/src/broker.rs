//! Fan-out broker
//!
//! Every pattern owns the arrangement of channels between the broker's
//! receiver and its children:
//!
//! - `round_robin` - one channel per child, a forwarder cycles through them
//! - `greedy` - every child consumes a clone of the broker's own receiver;
//!   whichever child is free takes the next transaction
//! - `broadcast` - one channel per child, the forwarder deep-copies the
//!   message for each and folds the responses
//! - `try` - one channel per child, attempted in order until a success
//! - `switch` - a condition list picks exactly one child per message

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use weir_condition::{Condition, new_condition};
use weir_metrics::{Metrics, event};
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, Error as ProtocolError, Response, Transaction, TransactionRx,
    TransactionTx, transaction_channel,
};

use crate::{BrokerConfig, Context, Error, Output, new_output};

/// Build a fan-out broker from configuration
pub(crate) fn new_broker(
    conf: &BrokerConfig,
    rx: TransactionRx,
    ctx: &Context,
) -> Result<Output, Error> {
    match conf.pattern.as_str() {
        "greedy" => {
            require_children(&conf.outputs)?;
            // Sharing the one receiver is the whole pattern: a child takes a
            // transaction exactly when its writer is ready for one
            let mut handles = Vec::new();
            for (index, child_conf) in conf.outputs.iter().enumerate() {
                let child = new_output(child_conf, rx.clone(), &ctx.child(index.to_string()))?;
                handles.extend(child.into_handles());
            }
            Ok(Output::new("broker", ctx.cancel.clone(), handles))
        }
        "round_robin" => {
            let (child_txs, mut handles) = spawn_children(&conf.outputs, ctx)?;
            handles.push(tokio::spawn(round_robin(
                rx,
                child_txs,
                ctx.metrics.clone(),
                ctx.cancel.clone(),
            )));
            Ok(Output::new("broker", ctx.cancel.clone(), handles))
        }
        "broadcast" => {
            let (child_txs, mut handles) = spawn_children(&conf.outputs, ctx)?;
            handles.push(tokio::spawn(broadcast(
                rx,
                child_txs,
                ctx.metrics.clone(),
                ctx.cancel.clone(),
            )));
            Ok(Output::new("broker", ctx.cancel.clone(), handles))
        }
        "try" => {
            let (child_txs, mut handles) = spawn_children(&conf.outputs, ctx)?;
            handles.push(tokio::spawn(try_each(
                rx,
                child_txs,
                ctx.metrics.clone(),
                ctx.cancel.clone(),
            )));
            Ok(Output::new("broker", ctx.cancel.clone(), handles))
        }
        "switch" => {
            if conf.switch.cases.is_empty() {
                return Err(Error::Config(
                    "switch pattern requires at least one case".to_string(),
                ));
            }
            let mut children = Vec::with_capacity(conf.switch.cases.len());
            let mut handles = Vec::new();
            for (index, case) in conf.switch.cases.iter().enumerate() {
                let condition = new_condition(&case.condition, ctx.manager.as_ref())?;
                let (tx, child_rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);
                let child = new_output(&case.output, child_rx, &ctx.child(index.to_string()))?;
                handles.extend(child.into_handles());
                children.push(SwitchChild { condition, tx });
            }
            handles.push(tokio::spawn(switch(
                rx,
                children,
                conf.switch.strict,
                ctx.metrics.clone(),
                ctx.cancel.clone(),
            )));
            Ok(Output::new("broker", ctx.cancel.clone(), handles))
        }
        other => Err(Error::UnknownPattern(other.to_string())),
    }
}

fn require_children(outputs: &[crate::Config]) -> Result<(), Error> {
    if outputs.is_empty() {
        return Err(Error::Config(
            "broker requires at least one child output".to_string(),
        ));
    }
    Ok(())
}

fn spawn_children(
    outputs: &[crate::Config],
    ctx: &Context,
) -> Result<(Vec<TransactionTx>, Vec<tokio::task::JoinHandle<()>>), Error> {
    require_children(outputs)?;
    let mut child_txs = Vec::with_capacity(outputs.len());
    let mut handles = Vec::new();
    for (index, child_conf) in outputs.iter().enumerate() {
        let (tx, child_rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);
        let child = new_output(child_conf, child_rx, &ctx.child(index.to_string()))?;
        handles.extend(child.into_handles());
        child_txs.push(tx);
    }
    Ok((child_txs, handles))
}

/// Cycle transactions across children, one each
pub(crate) async fn round_robin(
    rx: TransactionRx,
    child_txs: Vec<TransactionTx>,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    let mut index = 0;
    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);
        if child_txs[index].send(txn).await.is_err() {
            break;
        }
        metrics.incr(event::SENT);
        index = (index + 1) % child_txs.len();
    }
}

/// Copy every transaction to every child and fold the responses
pub(crate) async fn broadcast(
    rx: TransactionRx,
    child_txs: Vec<TransactionTx>,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);
        let (msg, responder, txn_cancel) = txn.into_parts();

        let mut response_rxs = Vec::with_capacity(child_txs.len());
        for child_tx in &child_txs {
            // Each child gets its own copy so downstream mutation cannot
            // corrupt a sibling's view
            let (child_txn, response_rx) =
                Transaction::new(msg.deep_copy(), txn_cancel.clone());
            if child_tx.send(child_txn).await.is_err() {
                break;
            }
            response_rxs.push(response_rx);
        }

        let mut folded: Response = if response_rxs.len() == child_txs.len() {
            Ok(())
        } else {
            Err(ProtocolError::TypeClosed)
        };
        for response_rx in response_rxs {
            let response = match response_rx.await {
                Ok(response) => response,
                Err(_) => Err(ProtocolError::TypeClosed),
            };
            if let Err(err) = response {
                if folded.is_ok() {
                    folded = Err(err);
                } else {
                    tracing::debug!(error = %err, "additional broadcast branch failed");
                }
            }
        }

        match &folded {
            Ok(()) => metrics.incr(event::SUCCESS),
            Err(_) => metrics.incr(event::ERROR),
        }
        let _ = responder.send(folded);
    }
}

/// Attempt children in order until one succeeds
pub(crate) async fn try_each(
    rx: TransactionRx,
    child_txs: Vec<TransactionTx>,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);
        let (msg, responder, txn_cancel) = txn.into_parts();

        let mut last_err = ProtocolError::TypeClosed;
        let mut delivered = None;
        for (attempt, child_tx) in child_txs.iter().enumerate() {
            let (child_txn, response_rx) = Transaction::new(msg.clone(), txn_cancel.clone());
            if child_tx.send(child_txn).await.is_err() {
                continue;
            }
            match response_rx.await {
                Ok(Ok(())) => {
                    metrics.incr(event::SUCCESS);
                    delivered = Some(Ok(()));
                    break;
                }
                Ok(Err(err)) => {
                    tracing::debug!(attempt, error = %err, "try output attempt failed");
                    last_err = err;
                }
                Err(_) => last_err = ProtocolError::TypeClosed,
            }
        }
        match delivered {
            Some(ok) => {
                let _ = responder.send(ok);
            }
            None => {
                metrics.incr(event::ERROR);
                let _ = responder.send(Err(last_err));
            }
        }
    }
}

pub(crate) struct SwitchChild {
    pub(crate) condition: Arc<dyn Condition>,
    pub(crate) tx: TransactionTx,
}

/// Route each transaction to the first child whose condition matches
pub(crate) async fn switch(
    rx: TransactionRx,
    children: Vec<SwitchChild>,
    strict: bool,
    metrics: Metrics,
    cancel: CancellationToken,
) {
    loop {
        let txn = tokio::select! {
            _ = cancel.cancelled() => break,
            received = rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => break,
            },
        };
        metrics.incr(event::COUNT);

        match children.iter().find(|c| c.condition.check(txn.message())) {
            Some(child) => {
                // Forwarded unchanged; the child's acknowledgement resolves
                // the producer directly
                if child.tx.send(txn).await.is_err() {
                    break;
                }
                metrics.incr(event::SENT);
            }
            None if strict => {
                metrics.incr(event::ERROR);
                txn.resolve(Err(ProtocolError::bad_message(
                    "no switch case matched",
                )));
            }
            None => {
                metrics.incr(event::SKIPPED);
                txn.resolve(Ok(()));
            }
        }
    }
}
