//! Processor configuration

use serde::{Deserialize, Serialize};

/// Configuration for any processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Processor type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub filter: FilterConfig,
    pub combine: CombineConfig,
    pub select_parts: SelectPartsConfig,
    pub metadata: MetadataConfig,
    pub compress: CompressConfig,
    pub decompress: DecompressConfig,
    pub dedupe: DedupeConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "noop".to_string(),
            filter: FilterConfig::default(),
            combine: CombineConfig::default(),
            select_parts: SelectPartsConfig::default(),
            metadata: MetadataConfig::default(),
            compress: CompressConfig::default(),
            decompress: DecompressConfig::default(),
            dedupe: DedupeConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Configuration for the `filter` processor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Messages failing this condition are dropped with success
    pub condition: weir_condition::Config,
}

/// Configuration for the `combine` processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Emit once the accumulated part count reaches this target
    pub parts: usize,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self { parts: 2 }
    }
}

/// Configuration for the `select_parts` processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectPartsConfig {
    /// Part indexes to keep, in order; negative counts from the end
    pub parts: Vec<isize>,
}

impl Default for SelectPartsConfig {
    fn default() -> Self {
        Self { parts: vec![0] }
    }
}

/// Configuration for the `metadata` processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Operation: set or delete
    pub operator: String,

    /// Metadata key to operate on
    pub key: String,

    /// Value for the set operation
    pub value: String,

    /// Target part indexes; empty targets every part
    pub parts: Vec<isize>,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            operator: "set".to_string(),
            key: String::new(),
            value: String::new(),
            parts: Vec::new(),
        }
    }
}

/// Configuration for the `dedupe` processor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupeConfig {
    /// Named cache resource that records seen keys
    pub cache: String,

    /// Part whose payload is the dedupe key; negative counts from the end
    pub part: isize,
}

/// Configuration for the `rate_limit` processor
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Named rate limit resource to consult
    pub resource: String,
}

/// Configuration for the `compress` processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Algorithm: gzip, zlib or deflate
    pub algorithm: String,

    /// Compression level, 0-9
    pub level: u32,

    /// Target part indexes; empty targets every part
    pub parts: Vec<isize>,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            algorithm: "gzip".to_string(),
            level: 6,
            parts: Vec::new(),
        }
    }
}

/// Configuration for the `decompress` processor
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecompressConfig {
    /// Algorithm: gzip, zlib or deflate
    pub algorithm: String,

    /// Target part indexes; empty targets every part
    pub parts: Vec<isize>,
}

impl Default for DecompressConfig {
    fn default() -> Self {
        Self {
            algorithm: "gzip".to_string(),
            parts: Vec::new(),
        }
    }
}
