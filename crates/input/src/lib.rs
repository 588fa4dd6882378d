//! Weir Input - Sources of transactions
//!
//! An input produces a stream of transactions and resolves each one against
//! its underlying connector: success commits the read (offsets, deletions),
//! failure nacks it so the connector can re-present the message. The reader
//! adaptor in this crate owns that protocol; connectors only implement
//! [`Reader`].
//!
//! Meta-inputs compose other inputs: `broker` fans several children into one
//! stream, `read_until` bounds a child with a condition, and `dynamic`
//! manages a labelled set of children at runtime.

mod adaptor;
mod batcher;
mod broker;
mod config;
mod dynamic;
mod error;
mod file;
mod inproc;
mod preserver;
mod read_until;
mod reader;
mod stdin;
mod tcp;

pub(crate) mod lines;

pub use adaptor::spawn_reader;
pub use batcher::Batcher;
pub use broker::spawn_fan_in;
pub use config::{BrokerConfig, Config, DynamicConfig, ReadUntilConfig};
pub use dynamic::{DynamicInputHandle, spawn_dynamic};
pub use error::Error;
pub use file::{FileInputConfig, FileReader};
pub use preserver::Preserver;
pub use read_until::{READ_UNTIL_FINAL_KEY, spawn_read_until};
pub use reader::Reader;
pub use stdin::{StdinConfig, StdinReader};
pub use tcp::{TcpInputConfig, TcpReader};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weir_condition::new_condition;
use weir_manager::Manager;
use weir_metrics::Metrics;
use weir_protocol::{Error as ProtocolError, TransactionRx};

/// Construction context threaded through input constructors
///
/// `cancel` is this component's own shutdown signal; `kill` is the
/// engine-wide forced-shutdown token that rides on every transaction.
/// Closing a component must not cancel the transactions it already emitted,
/// so the two are distinct.
#[derive(Clone)]
pub struct Context {
    pub manager: Arc<Manager>,
    pub metrics: Metrics,
    pub kill: CancellationToken,
    pub cancel: CancellationToken,
}

impl Context {
    /// Create a root context; the component token is a child of `kill`
    pub fn new(manager: Arc<Manager>, metrics: Metrics, kill: CancellationToken) -> Self {
        let cancel = kill.child_token();
        Self {
            manager,
            metrics,
            kill,
            cancel,
        }
    }

    /// Scope the context for a child component
    pub fn child(&self, label: impl AsRef<str>) -> Context {
        Context {
            manager: Arc::clone(&self.manager),
            metrics: self.metrics.child(label),
            kill: self.kill.clone(),
            cancel: self.cancel.child_token(),
        }
    }
}

/// A running input component
///
/// The transaction stream ends when the input's driver tasks exit; `close`
/// requests that, `wait_closed` bounds the wait.
pub struct Input {
    name: String,
    rx: TransactionRx,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Input {
    /// Wrap spawned driver tasks into an input handle
    pub fn new(
        name: impl Into<String>,
        rx: TransactionRx,
        cancel: CancellationToken,
        handles: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            name: name.into(),
            rx,
            cancel,
            handles,
        }
    }

    /// The input's type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The outbound transaction stream
    pub fn transactions(&self) -> TransactionRx {
        self.rx.clone()
    }

    /// Request shutdown; driver tasks stop reading once their current call
    /// returns
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for every driver task to exit within the deadline
    pub async fn wait_closed(&mut self, deadline: Duration) -> Result<(), ProtocolError> {
        let deadline = tokio::time::Instant::now() + deadline;
        for handle in self.handles.drain(..) {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::warn!(input = %self.name, error = %err, "input task panicked");
                }
                Err(_) => return Err(ProtocolError::Timeout),
            }
        }
        Ok(())
    }

    /// Wait for every driver task without a deadline
    ///
    /// Safe to drop mid-wait: handles not yet finished stay tracked and a
    /// later `wait_closed` still observes them.
    pub async fn join(&mut self) {
        while let Some(handle) = self.handles.last_mut() {
            if let Err(err) = handle.await {
                tracing::warn!(input = %self.name, error = %err, "input task panicked");
            }
            self.handles.pop();
        }
    }

    pub(crate) fn into_handles(self) -> Vec<JoinHandle<()>> {
        self.handles
    }
}

impl std::fmt::Debug for Input {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Input")
            .field("name", &self.name)
            .field("closed", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Description of a registered input type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered input types
pub const TYPE_SPECS: &[TypeSpec] = &[
    TypeSpec {
        name: "broker",
        description: "Reads from `copies` instances of each child input \
                      concurrently and multiplexes them into one stream.",
    },
    TypeSpec {
        name: "dynamic",
        description: "A labelled set of child inputs that can be added and \
                      removed at runtime, fanned into one stream.",
    },
    TypeSpec {
        name: "file",
        description: "Reads newline-delimited messages from one or more \
                      files, in order.",
    },
    TypeSpec {
        name: "inproc",
        description: "Receives transactions from a named in-process pipe fed \
                      by an inproc output.",
    },
    TypeSpec {
        name: "read_until",
        description: "Wraps a child input and forwards until a condition \
                      matches; the final message is marked and its ack \
                      awaited before shutdown.",
    },
    TypeSpec {
        name: "stdin",
        description: "Reads newline-delimited messages from standard input; \
                      blank lines delimit parts in multipart mode.",
    },
    TypeSpec {
        name: "tcp",
        description: "Connects to a remote host and reads newline-delimited \
                      messages, reconnecting on failure.",
    },
];

/// Build an input from configuration
pub fn new_input(conf: &Config, ctx: &Context) -> Result<Input, Error> {
    match conf.kind.as_str() {
        "stdin" => {
            let scoped = ctx.child("stdin");
            let reader: Box<dyn Reader> = Box::new(StdinReader::new(&conf.stdin));
            Ok(wrap_reader(
                "stdin",
                reader,
                conf.stdin.max_batch_count,
                false,
                &scoped,
            ))
        }
        "file" => {
            let scoped = ctx.child("file");
            let reader: Box<dyn Reader> = Box::new(FileReader::new(&conf.file)?);
            Ok(wrap_reader(
                "file",
                reader,
                conf.file.max_batch_count,
                false,
                &scoped,
            ))
        }
        "tcp" => {
            let scoped = ctx.child("tcp");
            let reader: Box<dyn Reader> = Box::new(TcpReader::new(&conf.tcp)?);
            // A socket cannot re-present a line after a failed ack
            Ok(wrap_reader(
                "tcp",
                reader,
                conf.tcp.max_batch_count,
                true,
                &scoped,
            ))
        }
        "inproc" => {
            if conf.inproc.is_empty() {
                return Err(Error::Config("inproc input requires a pipe name".to_string()));
            }
            let scoped = ctx.child("inproc");
            Ok(inproc::new_inproc_input(&conf.inproc, &scoped))
        }
        "broker" => {
            let scoped = ctx.child("broker");
            broker::new_broker(&conf.broker, &scoped)
        }
        "read_until" => {
            let ru = &conf.read_until;
            let child_conf = ru
                .input
                .as_deref()
                .cloned()
                .ok_or_else(|| Error::Config("read_until requires a child input".to_string()))?;
            let condition = new_condition(&ru.condition, ctx.manager.as_ref())?;
            let scoped = ctx.child("read_until");
            spawn_read_until(child_conf, ru.restart_input, condition, scoped)
        }
        "dynamic" => {
            let scoped = ctx.child("dynamic");
            let (input, _handle) = spawn_dynamic(&conf.dynamic, &scoped)?;
            Ok(input)
        }
        other => Err(Error::UnknownType(other.to_string())),
    }
}

/// Apply the standard connector wrappers and spawn the adaptor
fn wrap_reader(
    name: &str,
    reader: Box<dyn Reader>,
    max_batch_count: usize,
    preserve: bool,
    ctx: &Context,
) -> Input {
    let mut reader = reader;
    if max_batch_count > 1 {
        reader = Box::new(Batcher::new(reader, max_batch_count));
    }
    if preserve {
        reader = Box::new(Preserver::new(reader));
    }
    spawn_reader(name, reader, ctx)
}

#[cfg(test)]
pub(crate) mod mock;

#[cfg(test)]
mod dynamic_test;
