//! Buffer configuration

use serde::{Deserialize, Serialize};

/// The `buffer` section of the topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Buffer type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub memory: MemoryBufferConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "none".to_string(),
            memory: MemoryBufferConfig::default(),
        }
    }
}

/// Configuration for the in-memory buffer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryBufferConfig {
    /// Queue capacity in payload bytes
    pub limit: usize,
}

impl Default for MemoryBufferConfig {
    fn default() -> Self {
        Self {
            // 100MB
            limit: 100 * 1024 * 1024,
        }
    }
}
