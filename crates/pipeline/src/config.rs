//! Pipeline configuration

use serde::{Deserialize, Serialize};

/// The `pipeline` section of the topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Number of worker tasks sharing the inbound channel
    pub threads: usize,

    /// Ordered processor chain applied by every worker
    pub processors: Vec<weir_processor::Config>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: 1,
            processors: Vec::new(),
        }
    }
}
