//! Fan-in broker

use weir_protocol::{DEFAULT_CHANNEL_CAPACITY, transaction_channel};

use crate::{BrokerConfig, Context, Error, Input, new_input};

/// Build a fan-in broker from configuration
///
/// Instantiates `copies` instances of each child and multiplexes them into
/// one stream. A child that closes on its own only silences its slot;
/// the broker ends once every child has closed.
pub(crate) fn new_broker(conf: &BrokerConfig, ctx: &Context) -> Result<Input, Error> {
    if conf.inputs.is_empty() {
        return Err(Error::Config(
            "broker requires at least one child input".to_string(),
        ));
    }
    let copies = conf.copies.max(1);

    let mut children = Vec::with_capacity(copies * conf.inputs.len());
    for copy in 0..copies {
        for (index, child_conf) in conf.inputs.iter().enumerate() {
            let slot = copy * conf.inputs.len() + index;
            children.push(new_input(child_conf, &ctx.child(slot.to_string()))?);
        }
    }
    Ok(spawn_fan_in("broker", children, ctx))
}

/// Multiplex already-built child inputs into one stream
///
/// Transactions are forwarded unchanged, so acknowledgements flow straight
/// back to whichever child produced the message.
pub fn spawn_fan_in(name: impl Into<String>, children: Vec<Input>, ctx: &Context) -> Input {
    let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);

    let mut handles = Vec::new();
    for child in children {
        let child_rx = child.transactions();
        let forward_tx = tx.clone();
        handles.extend(child.into_handles());
        handles.push(tokio::spawn(async move {
            while let Ok(txn) = child_rx.recv().await {
                if forward_tx.send(txn).await.is_err() {
                    break;
                }
            }
        }));
    }

    Input::new(name, rx, ctx.cancel.clone(), handles)
}
