//! In-process pipe connector

use weir_protocol::TransactionRx;

use crate::{Context, Output};

/// Feed a named in-process pipe as an output
///
/// Transactions are forwarded whole, so acknowledgement flows from whatever
/// consumes the paired inproc input straight back to the producer on this
/// side.
pub(crate) fn new_inproc_output(pipe: &str, rx: TransactionRx, ctx: &Context) -> Output {
    let tx = ctx.manager.pipe_sender(pipe);
    let cancel = ctx.cancel.clone();
    tracing::debug!(pipe, "inproc output attached");

    let handle = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            loop {
                let txn = tokio::select! {
                    _ = cancel.cancelled() => break,
                    received = rx.recv() => match received {
                        Ok(txn) => txn,
                        Err(_) => break,
                    },
                };
                if tx.send(txn).await.is_err() {
                    break;
                }
            }
        }
    });

    Output::new("inproc", cancel, vec![handle])
}
