//! Input configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{FileInputConfig, StdinConfig, TcpInputConfig};

/// The `input` section of the topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Input type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub stdin: StdinConfig,
    pub file: FileInputConfig,
    pub tcp: TcpInputConfig,

    /// Name of the in-process pipe to receive from
    pub inproc: String,

    pub broker: BrokerConfig,
    pub read_until: ReadUntilConfig,
    pub dynamic: DynamicConfig,

    /// Processors applied to this input's messages before the shared
    /// pipeline
    pub processors: Vec<weir_processor::Config>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "stdin".to_string(),
            stdin: StdinConfig::default(),
            file: FileInputConfig::default(),
            tcp: TcpInputConfig::default(),
            inproc: String::new(),
            broker: BrokerConfig::default(),
            read_until: ReadUntilConfig::default(),
            dynamic: DynamicConfig::default(),
            processors: Vec::new(),
        }
    }
}

/// Configuration for the fan-in broker
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// How many instances of each child to run
    pub copies: usize,

    /// Child inputs, all multiplexed into one stream
    pub inputs: Vec<Config>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            copies: 1,
            inputs: Vec::new(),
        }
    }
}

/// Configuration for the read_until meta-input
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ReadUntilConfig {
    /// The wrapped child input
    pub input: Option<Box<Config>>,

    /// Forwarding stops once this condition matches a message
    pub condition: weir_condition::Config,

    /// Rebuild the child if it closes before the condition matches
    pub restart_input: bool,
}

/// Configuration for the dynamic meta-input
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DynamicConfig {
    /// Children started up front, by label
    pub inputs: HashMap<String, Config>,

    /// How long add and remove operations wait for a child to stop, in
    /// milliseconds
    pub timeout_ms: u64,
}

impl Default for DynamicConfig {
    fn default() -> Self {
        Self {
            inputs: HashMap::new(),
            timeout_ms: 5000,
        }
    }
}
