//! Weir Metrics - Path-scoped counters
//!
//! Every component emits counters of the form `<path>.<event>`, where `path`
//! reflects the component's position in the topology (`input.broker.0.file`)
//! and `event` is one of the names in [`event`]. Backends are pluggable
//! behind the [`MetricsSink`] trait.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use weir_metrics::{LocalSink, Metrics, event};
//!
//! let sink = Arc::new(LocalSink::new());
//! let metrics = Metrics::new(sink.clone()).child("input").child("file");
//!
//! metrics.incr(event::COUNT);
//! metrics.incr(event::SUCCESS);
//!
//! assert_eq!(sink.get("input.file.count"), 1);
//! ```

mod sink;

pub use sink::{LocalSink, NullSink, TracingSink};

use std::sync::Arc;
use std::time::Duration;

/// Standard event names emitted against component paths
pub mod event {
    /// A message or operation was observed
    pub const COUNT: &str = "count";
    /// The operation completed successfully
    pub const SUCCESS: &str = "success";
    /// The operation failed
    pub const ERROR: &str = "error";
    /// The message was deliberately not propagated
    pub const SKIPPED: &str = "skipped";
    /// The message was handed to the next stage
    pub const SENT: &str = "sent";
    /// Processing latency in nanoseconds
    pub const LATENCY: &str = "latency";
}

/// Backend receiving fully-qualified counter increments
pub trait MetricsSink: Send + Sync {
    /// Increment a counter by `delta`
    fn incr(&self, path: &str, delta: u64);

    /// Record a latency observation in nanoseconds
    ///
    /// Backends without timing support accumulate it as a counter.
    fn timing(&self, path: &str, nanos: u64) {
        self.incr(path, nanos);
    }
}

/// Handle scoped to one position in the topology
///
/// Cloning is cheap; `child` extends the path by one segment. Components
/// receive an already-scoped handle and only ever append their own name.
#[derive(Clone)]
pub struct Metrics {
    sink: Arc<dyn MetricsSink>,
    path: String,
}

impl Metrics {
    /// Create an unscoped handle over a sink
    pub fn new(sink: Arc<dyn MetricsSink>) -> Self {
        Self {
            sink,
            path: String::new(),
        }
    }

    /// Create a handle that discards everything
    pub fn noop() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Extend the path by one segment
    pub fn child(&self, segment: impl AsRef<str>) -> Metrics {
        let segment = segment.as_ref();
        let path = if self.path.is_empty() {
            segment.to_string()
        } else {
            format!("{}.{}", self.path, segment)
        };
        Metrics {
            sink: Arc::clone(&self.sink),
            path,
        }
    }

    /// The scoped path of this handle
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Increment `<path>.<event>` by one
    pub fn incr(&self, event: &str) {
        self.incr_by(event, 1);
    }

    /// Increment `<path>.<event>` by `delta`
    pub fn incr_by(&self, event: &str, delta: u64) {
        self.sink.incr(&self.scoped(event), delta);
    }

    /// Record a latency observation against `<path>.latency`
    pub fn timing(&self, elapsed: Duration) {
        self.sink
            .timing(&self.scoped(event::LATENCY), elapsed.as_nanos() as u64);
    }

    fn scoped(&self, event: &str) -> String {
        if self.path.is_empty() {
            event.to_string()
        } else {
            format!("{}.{}", self.path, event)
        }
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").field("path", &self.path).finish()
    }
}

#[cfg(test)]
mod lib_test;
