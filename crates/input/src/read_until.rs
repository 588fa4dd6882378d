//! The read_until meta-input

use std::sync::Arc;

use weir_condition::Condition;
use weir_protocol::{
    DEFAULT_CHANNEL_CAPACITY, Error as ProtocolError, Transaction, TransactionTx,
    transaction_channel,
};

use crate::{Config, Context, Error, Input, new_input};

/// Metadata key marking the final message of a read_until input
pub const READ_UNTIL_FINAL_KEY: &str = "weir_read_until";

/// Wrap a child input with a terminating condition
///
/// Messages are forwarded unchanged until the condition matches. The
/// matching message is marked with `weir_read_until=final` on its first
/// part and interposed: only after its downstream acknowledgement succeeds
/// is the child shut down. With `restart_input`, a child that closes before
/// the condition fires is rebuilt from its configuration.
pub fn spawn_read_until(
    child_conf: Config,
    restart_input: bool,
    condition: Arc<dyn Condition>,
    ctx: Context,
) -> Result<Input, Error> {
    let child = new_input(&child_conf, &ctx)?;
    let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);

    let cancel = ctx.cancel.clone();
    let handle = tokio::spawn(run_read_until(
        child,
        child_conf,
        restart_input,
        condition,
        tx,
        ctx,
    ));

    Ok(Input::new("read_until", rx, cancel, vec![handle]))
}

async fn run_read_until(
    mut child: Input,
    child_conf: Config,
    restart_input: bool,
    condition: Arc<dyn Condition>,
    tx: TransactionTx,
    ctx: Context,
) {
    let mut child_rx = child.transactions();
    let mut restarts: u64 = 0;

    loop {
        let txn = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            received = child_rx.recv() => match received {
                Ok(txn) => txn,
                Err(_) => {
                    child.join().await;
                    if !restart_input {
                        tracing::debug!("read_until child closed, shutting down");
                        break;
                    }
                    restarts += 1;
                    tracing::warn!(
                        restarts,
                        "read_until child closed before the condition matched, restarting"
                    );
                    match new_input(&child_conf, &ctx) {
                        Ok(rebuilt) => {
                            child = rebuilt;
                            child_rx = child.transactions();
                            continue;
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "failed to restart read_until child");
                            break;
                        }
                    }
                }
            }
        };

        if !condition.check(txn.message()) {
            let forwarded = tokio::select! {
                result = tx.send(txn) => result.is_ok(),
                _ = ctx.cancel.cancelled() => false,
            };
            if !forwarded {
                break;
            }
            continue;
        }

        // Final message: mark it, interpose on its acknowledgement, and only
        // shut the child down once that acknowledgement is a success
        let (mut msg, responder, txn_cancel) = txn.into_parts();
        if let Some(part) = msg.get_mut(0) {
            part.metadata_mut().set(READ_UNTIL_FINAL_KEY, "final");
        }
        let (marked, response_rx) = Transaction::new(msg, txn_cancel);
        if tx.send(marked).await.is_err() {
            break;
        }
        let response = match response_rx.await {
            Ok(response) => response,
            Err(_) => Err(ProtocolError::TypeClosed),
        };
        let succeeded = response.is_ok();
        let _ = responder.send(response);

        if succeeded {
            tracing::debug!("read_until condition matched and final message acknowledged");
            break;
        }
        // Nacked: the child's connector re-presents the message and the
        // condition will match it again
    }

    child.close();
    child.join().await;
}
