//! Output configuration

use serde::{Deserialize, Serialize};

use crate::{FileOutputConfig, StdoutOutputConfig, TcpOutputConfig};

/// The `output` section of the topology document
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Output type discriminator
    #[serde(rename = "type")]
    pub kind: String,

    pub stdout: StdoutOutputConfig,
    pub file: FileOutputConfig,
    pub tcp: TcpOutputConfig,

    /// Name of the in-process pipe to feed
    pub inproc: String,

    pub broker: BrokerConfig,

    /// Processors applied to messages entering this output, after the
    /// shared pipeline
    pub processors: Vec<weir_processor::Config>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            kind: "stdout".to_string(),
            stdout: StdoutOutputConfig::default(),
            file: FileOutputConfig::default(),
            tcp: TcpOutputConfig::default(),
            inproc: String::new(),
            broker: BrokerConfig::default(),
            processors: Vec::new(),
        }
    }
}

/// Configuration for the fan-out broker
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Dispatch pattern: round_robin, greedy, broadcast, try or switch
    pub pattern: String,

    /// Child outputs for every pattern except switch
    pub outputs: Vec<Config>,

    /// Cases for the switch pattern
    pub switch: SwitchConfig,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            pattern: "round_robin".to_string(),
            outputs: Vec::new(),
            switch: SwitchConfig::default(),
        }
    }
}

/// Configuration for the switch pattern
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Evaluated in order; the first matching case receives the message
    pub cases: Vec<SwitchCase>,

    /// Reject unmatched messages instead of dropping them with success
    pub strict: bool,
}

/// One switch case: a condition guarding a child output
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SwitchCase {
    pub condition: weir_condition::Config,
    pub output: Config,
}
