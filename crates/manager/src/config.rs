//! Resource configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{LocalRateLimitConfig, MemoryCacheConfig};

/// The `resources` section of the topology document
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourcesConfig {
    pub caches: HashMap<String, CacheConfig>,
    pub rate_limits: HashMap<String, RateLimitConfig>,
    pub conditions: HashMap<String, weir_condition::Config>,
}

/// Configuration for one named cache
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub memory: MemoryCacheConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            kind: "memory".to_string(),
            memory: MemoryCacheConfig::default(),
        }
    }
}

/// Configuration for one named rate limiter
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Rate limit type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub local: LocalRateLimitConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            kind: "local".to_string(),
            local: LocalRateLimitConfig::default(),
        }
    }
}
