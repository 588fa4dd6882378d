//! The dynamic meta-input

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use weir_protocol::{DEFAULT_CHANNEL_CAPACITY, TransactionTx, transaction_channel};

use crate::{Config, Context, DynamicConfig, Error, Input, new_input};

enum Command {
    Set {
        label: String,
        conf: Box<Config>,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    Remove {
        label: String,
        reply: oneshot::Sender<Result<(), Error>>,
    },
    List {
        reply: oneshot::Sender<Vec<String>>,
    },
}

/// Control handle for a dynamic input
///
/// All operations are serialized through the supervisor task, which is what
/// makes concurrent adds on the same label well-defined: the newest wins and
/// the previous child is closed first.
#[derive(Clone)]
pub struct DynamicInputHandle {
    commands: mpsc::Sender<Command>,
}

impl DynamicInputHandle {
    /// Add a child under a label, atomically replacing any existing child
    pub async fn set_input(&self, label: impl Into<String>, conf: Config) -> Result<(), Error> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Set {
                label: label.into(),
                conf: Box::new(conf),
                reply,
            })
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))?;
        response
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))?
    }

    /// Gracefully remove a child by label
    pub async fn remove_input(&self, label: &str) -> Result<(), Error> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Remove {
                label: label.to_string(),
                reply,
            })
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))?;
        response
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))?
    }

    /// The labels of the currently active children
    pub async fn list_inputs(&self) -> Result<Vec<String>, Error> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::List { reply })
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))?;
        response
            .await
            .map_err(|_| Error::Config("dynamic input has stopped".to_string()))
    }
}

struct ChildEntry {
    input: Input,
    forwarder: JoinHandle<()>,
}

/// Build a dynamic input and its control handle
///
/// Children configured up front are started before the supervisor accepts
/// commands. The configured timeout bounds how long a removal waits for the
/// outgoing child to stop.
pub fn spawn_dynamic(
    conf: &DynamicConfig,
    ctx: &Context,
) -> Result<(Input, DynamicInputHandle), Error> {
    let (tx, rx) = transaction_channel(DEFAULT_CHANNEL_CAPACITY);
    let timeout = Duration::from_millis(conf.timeout_ms.max(1));

    let mut children: HashMap<String, ChildEntry> = HashMap::new();
    for (label, child_conf) in &conf.inputs {
        let input = new_input(child_conf, &ctx.child(label))?;
        children.insert(label.clone(), start_child(&tx, input));
    }

    let (commands, command_rx) = mpsc::channel(16);
    let cancel = ctx.cancel.clone();
    let handle = tokio::spawn(supervise(
        children,
        command_rx,
        tx,
        timeout,
        ctx.clone(),
    ));

    Ok((
        Input::new("dynamic", rx, cancel, vec![handle]),
        DynamicInputHandle { commands },
    ))
}

fn start_child(tx: &TransactionTx, child: Input) -> ChildEntry {
    let child_rx = child.transactions();
    let forward_tx = tx.clone();
    let forwarder = tokio::spawn(async move {
        while let Ok(txn) = child_rx.recv().await {
            if forward_tx.send(txn).await.is_err() {
                break;
            }
        }
    });
    ChildEntry {
        input: child,
        forwarder,
    }
}

async fn stop_child(label: &str, mut entry: ChildEntry, timeout: Duration) -> Result<(), Error> {
    entry.input.close();
    let result = entry.input.wait_closed(timeout).await;
    entry.forwarder.abort();
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            tracing::warn!(label, error = %err, "dynamic child did not stop in time");
            Err(Error::Config(format!(
                "child '{label}' did not stop within the timeout"
            )))
        }
    }
}

async fn supervise(
    mut children: HashMap<String, ChildEntry>,
    mut command_rx: mpsc::Receiver<Command>,
    tx: TransactionTx,
    timeout: Duration,
    ctx: Context,
) {
    loop {
        let command = tokio::select! {
            _ = ctx.cancel.cancelled() => break,
            received = command_rx.recv() => match received {
                Some(command) => command,
                // All handles dropped: keep forwarding, nothing left to manage
                None => {
                    ctx.cancel.cancelled().await;
                    break;
                }
            },
        };

        match command {
            Command::Set { label, conf, reply } => {
                // Replace atomically: close the old child before starting
                // the replacement under the same label
                if let Some(existing) = children.remove(&label) {
                    let _ = stop_child(&label, existing, timeout).await;
                }
                let result = new_input(&conf, &ctx.child(&label)).map(|input| {
                    tracing::info!(label = %label, "dynamic input child started");
                    children.insert(label.clone(), start_child(&tx, input));
                });
                let _ = reply.send(result.map(|_| ()));
            }
            Command::Remove { label, reply } => {
                let result = match children.remove(&label) {
                    Some(entry) => {
                        let stopped = stop_child(&label, entry, timeout).await;
                        if stopped.is_ok() {
                            tracing::info!(label = %label, "dynamic input child removed");
                        }
                        stopped
                    }
                    None => Err(Error::Config(format!("no child labelled '{label}'"))),
                };
                let _ = reply.send(result);
            }
            Command::List { reply } => {
                let mut labels: Vec<String> = children.keys().cloned().collect();
                labels.sort();
                let _ = reply.send(labels);
            }
        }
    }

    // Shutdown: stop every child and wait for the forwarders
    for (label, entry) in children {
        let _ = stop_child(&label, entry, timeout).await;
    }
}
