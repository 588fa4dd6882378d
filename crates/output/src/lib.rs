//! Weir Output - Sinks of transactions
//!
//! An output consumes transactions and resolves each one: success once the
//! message is durably written, an error otherwise. The writer adaptor owns
//! that protocol; connectors only implement [`Writer`].
//!
//! Outputs consume a receiver handed to them at construction. The owner of
//! the channel decides the arrangement: the engine wires a single output to
//! the pipeline, while the fan-out broker gives each child its own channel -
//! or, for the greedy pattern, a clone of one shared channel.

mod adaptor;
mod broker;
mod config;
mod discard;
mod error;
mod file;
mod inproc;
mod stdout;
mod tcp;
mod writer;

pub use adaptor::spawn_writer;
pub use config::{BrokerConfig, Config, SwitchCase, SwitchConfig};
pub use discard::DropWriter;
pub use error::Error;
pub use file::{FileOutputConfig, FileWriter};
pub use stdout::{StdoutOutputConfig, StdoutWriter};
pub use tcp::{TcpOutputConfig, TcpWriter};
pub use writer::Writer;

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use weir_manager::Manager;
use weir_metrics::Metrics;
use weir_protocol::{Error as ProtocolError, TransactionRx};

/// Construction context threaded through output constructors
///
/// Mirrors the input-side context: `cancel` is the component's own shutdown
/// signal, `kill` the engine-wide forced-shutdown token.
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

/// A running output component
pub struct Output {
    name: String,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Output {
    /// Wrap spawned driver tasks into an output handle
    pub fn new(
        name: impl Into<String>,
        cancel: CancellationToken,
        handles: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            name: name.into(),
            cancel,
            handles,
        }
    }

    /// The output's type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request shutdown; pending transactions are resolved `TypeClosed`
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
                    tracing::warn!(output = %self.name, error = %err, "output task panicked");
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
                tracing::warn!(output = %self.name, error = %err, "output task panicked");
            }
            self.handles.pop();
        }
    }

    pub(crate) fn into_handles(self) -> Vec<JoinHandle<()>> {
        self.handles
    }
}

impl std::fmt::Debug for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("name", &self.name)
            .field("closed", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Description of a registered output type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered output types
pub const TYPE_SPECS: &[TypeSpec] = &[
    TypeSpec {
        name: "broker",
        description: "Routes messages across child outputs using one of: \
                      round_robin, greedy, broadcast, try, switch.",
    },
    TypeSpec {
        name: "drop",
        description: "Acknowledges and discards every message.",
    },
    TypeSpec {
        name: "file",
        description: "Appends newline-delimited messages to a file.",
    },
    TypeSpec {
        name: "inproc",
        description: "Feeds transactions into a named in-process pipe \
                      consumed by an inproc input.",
    },
    TypeSpec {
        name: "stdout",
        description: "Writes newline-delimited messages to standard output.",
    },
    TypeSpec {
        name: "tcp",
        description: "Writes newline-delimited messages to a remote host, \
                      reconnecting on failure.",
    },
];

/// Build an output from configuration, consuming the given receiver
pub fn new_output(conf: &Config, rx: TransactionRx, ctx: &Context) -> Result<Output, Error> {
    match conf.kind.as_str() {
        "stdout" => {
            let scoped = ctx.child("stdout");
            Ok(spawn_writer(
                "stdout",
                Box::new(StdoutWriter::new(&conf.stdout)),
                rx,
                &scoped,
            ))
        }
        "file" => {
            let scoped = ctx.child("file");
            Ok(spawn_writer(
                "file",
                Box::new(FileWriter::new(&conf.file)?),
                rx,
                &scoped,
            ))
        }
        "tcp" => {
            let scoped = ctx.child("tcp");
            Ok(spawn_writer(
                "tcp",
                Box::new(TcpWriter::new(&conf.tcp)?),
                rx,
                &scoped,
            ))
        }
        "drop" => {
            let scoped = ctx.child("drop");
            Ok(spawn_writer("drop", Box::new(DropWriter), rx, &scoped))
        }
        "inproc" => {
            if conf.inproc.is_empty() {
                return Err(Error::Config(
                    "inproc output requires a pipe name".to_string(),
                ));
            }
            let scoped = ctx.child("inproc");
            Ok(inproc::new_inproc_output(&conf.inproc, rx, &scoped))
        }
        "broker" => {
            let scoped = ctx.child("broker");
            broker::new_broker(&conf.broker, rx, &scoped)
        }
        other => Err(Error::UnknownType(other.to_string())),
    }
}

#[cfg(test)]
pub(crate) mod mock;

#[cfg(test)]
mod adaptor_test;
#[cfg(test)]
mod broker_test;
