//! Metrics sink implementations

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::MetricsSink;

/// Discards every observation
pub struct NullSink;

impl MetricsSink for NullSink {
    fn incr(&self, _path: &str, _delta: u64) {}

    fn timing(&self, _path: &str, _nanos: u64) {}
}

/// Emits every observation as a trace-level tracing event
///
/// Useful for development; not intended for high-throughput production
/// topologies.
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn incr(&self, path: &str, delta: u64) {
        tracing::trace!(metric = path, delta, "counter");
    }

    fn timing(&self, path: &str, nanos: u64) {
        tracing::trace!(metric = path, nanos, "timing");
    }
}

/// In-process aggregating sink
///
/// Backs tests and the shutdown summary. Counters accumulate; timings are
/// accumulated as totals under their latency path.
#[derive(Default)]
pub struct LocalSink {
    counters: RwLock<HashMap<String, u64>>,
}

impl LocalSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a counter, zero if never incremented
    pub fn get(&self, path: &str) -> u64 {
        self.counters.read().get(path).copied().unwrap_or(0)
    }

    /// All counters, sorted by path
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> = self
            .counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort();
        entries
    }
}

impl MetricsSink for LocalSink {
    fn incr(&self, path: &str, delta: u64) {
        *self.counters.write().entry(path.to_string()).or_insert(0) += delta;
    }
}
