//! Metrics configuration

use serde::{Deserialize, Serialize};

/// The `metrics` section of the topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Backend: none, logger or local
    #[serde(rename = "type")]
    pub kind: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
        }
    }
}
