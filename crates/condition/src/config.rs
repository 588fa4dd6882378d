//! Condition configuration
//!
//! One document shape for every condition type: a `type` discriminator plus
//! a sub-section per type, all defaulted so minimal configs stay minimal.

use serde::{Deserialize, Serialize};

/// Configuration for any condition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Condition type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub content: ContentConfig,
    pub jsonpath: JsonPathConfig,
    pub metadata: MetadataConfig,
    pub and: Vec<Config>,
    pub or: Vec<Config>,
    pub not: Option<Box<Config>>,
    pub count: CountConfig,
    #[serde(rename = "static")]
    pub static_: bool,
    pub resource: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "content".to_string(),
            content: ContentConfig::default(),
            jsonpath: JsonPathConfig::default(),
            metadata: MetadataConfig::default(),
            and: Vec::new(),
            or: Vec::new(),
            not: None,
            count: CountConfig::default(),
            static_: false,
            resource: String::new(),
        }
    }
}

/// Configuration for the `content` condition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Comparison operator: equals, contains, prefix, suffix, regex
    pub operator: String,

    /// Target part index; negative counts from the end
    pub part: isize,

    /// Argument to compare against
    pub arg: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            operator: "equals".to_string(),
            part: 0,
            arg: String::new(),
        }
    }
}

/// Configuration for the `jsonpath` condition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct JsonPathConfig {
    /// Dot-separated path into the part's structured payload
    pub path: String,

    /// Comparison operator: equals, contains, exists
    pub operator: String,

    /// Target part index; negative counts from the end
    pub part: isize,

    /// Argument to compare against; ignored by `exists`
    pub arg: String,
}

impl Default for JsonPathConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            operator: "equals".to_string(),
            part: 0,
            arg: String::new(),
        }
    }
}

/// Configuration for the `metadata` condition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Metadata key to inspect
    pub key: String,

    /// Comparison operator: equals, contains, exists
    pub operator: String,

    /// Target part index; negative counts from the end
    pub part: isize,

    /// Argument to compare against; ignored by `exists`
    pub arg: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            operator: "equals".to_string(),
            part: 0,
            arg: String::new(),
        }
    }
}

/// Configuration for the `count` condition
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CountConfig {
    /// The condition is true on every `arg`th check
    pub arg: u64,
}

impl Default for CountConfig {
    fn default() -> Self {
        Self { arg: 100 }
    }
}
