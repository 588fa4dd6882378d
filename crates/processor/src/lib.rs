//! Weir Processor - In-flight message transformation
//!
//! Processors consume one message and emit zero or more. They can drop
//! (filter), transform (compress), split one message into many (split) or
//! fold many into one (combine).
//!
//! # Contract
//!
//! `process` returns `(out_messages, response)`:
//! - an empty output with no response is a silent drop (resolved success);
//! - a non-`None` response settles the input message immediately: the
//!   enclosing pipeline invokes no further processors on it and emits
//!   nothing for it, folding the response into the upstream
//!   acknowledgement alongside any sibling messages still in flight;
//! - processors must be idempotent with respect to their own side effects,
//!   because the engine may re-present a message after a failed downstream
//!   acknowledgement.

mod combine;
mod compress;
mod config;
mod decompress;
mod dedupe;
mod error;
mod filter;
mod metadata;
mod noop;
mod rate_limit;
mod select_parts;
mod split;

pub use combine::Combine;
pub use compress::Compress;
pub use config::{
    CombineConfig, CompressConfig, Config, DecompressConfig, DedupeConfig, FilterConfig,
    MetadataConfig, RateLimitConfig, SelectPartsConfig,
};
pub use decompress::Decompress;
pub use dedupe::Dedupe;
pub use error::Error;
pub use filter::Filter;
pub use metadata::MetadataProcessor;
pub use noop::Noop;
pub use rate_limit::RateLimitProcessor;
pub use select_parts::SelectParts;
pub use split::Split;

use std::collections::HashSet;

use weir_manager::Manager;
use weir_metrics::Metrics;
use weir_protocol::{Message, Response};

/// Result of processing one message
pub type ProcessorOutput = (Vec<Message>, Option<Response>);

/// A single stage of in-flight transformation
pub trait Processor: Send + Sync {
    /// Process a message, producing zero or more messages
    fn process(&self, msg: Message) -> ProcessorOutput;

    /// Type name for logging and metrics
    fn name(&self) -> &'static str;
}

/// Description of a registered processor type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered processor types
pub const TYPE_SPECS: &[TypeSpec] = &[
    TypeSpec {
        name: "combine",
        description: "Accumulates parts across consecutive messages and emits \
                      one combined message once the target part count is \
                      reached. Intermediate messages are acknowledged as \
                      handled when enqueued.",
    },
    TypeSpec {
        name: "compress",
        description: "Compresses targeted parts with gzip, zlib or deflate. \
                      Parts that fail to compress are removed; a fully \
                      emptied message is skipped.",
    },
    TypeSpec {
        name: "decompress",
        description: "Decompresses targeted parts with gzip, zlib or deflate. \
                      Parts that fail to decompress are removed; a fully \
                      emptied message is skipped.",
    },
    TypeSpec {
        name: "dedupe",
        description: "Drops messages whose key part was already recorded in \
                      a named cache resource. Duplicates settle with \
                      success.",
    },
    TypeSpec {
        name: "filter",
        description: "Evaluates a condition against each message and drops \
                      non-matching messages with a success response.",
    },
    TypeSpec {
        name: "metadata",
        description: "Sets or deletes a metadata key on targeted parts.",
    },
    TypeSpec {
        name: "noop",
        description: "Passes messages through unchanged.",
    },
    TypeSpec {
        name: "rate_limit",
        description: "Consults a named rate limit resource; messages over \
                      budget settle with a transient error so the producer \
                      re-presents them after a backoff.",
    },
    TypeSpec {
        name: "select_parts",
        description: "Keeps only the listed part indexes, in the order \
                      listed. Negative indexes count from the end.",
    },
    TypeSpec {
        name: "split",
        description: "Splits a multi-part message into one message per part.",
    },
];

/// Build a processor from configuration
///
/// The manager resolves the named resources a processor may reference: the
/// filter's condition tree, the dedupe cache, the rate limit.
pub fn new_processor(
    conf: &Config,
    manager: &Manager,
    metrics: &Metrics,
) -> Result<Box<dyn Processor>, Error> {
    match conf.kind.as_str() {
        "noop" => Ok(Box::new(Noop)),
        "filter" => Ok(Box::new(Filter::new(&conf.filter, manager, metrics)?)),
        "split" => Ok(Box::new(Split::new(metrics))),
        "combine" => Ok(Box::new(Combine::new(&conf.combine, metrics)?)),
        "select_parts" => Ok(Box::new(SelectParts::new(&conf.select_parts, metrics))),
        "metadata" => Ok(Box::new(MetadataProcessor::new(&conf.metadata, metrics)?)),
        "compress" => Ok(Box::new(Compress::new(&conf.compress, metrics)?)),
        "decompress" => Ok(Box::new(Decompress::new(&conf.decompress, metrics)?)),
        "dedupe" => Ok(Box::new(Dedupe::new(&conf.dedupe, manager, metrics)?)),
        "rate_limit" => Ok(Box::new(RateLimitProcessor::new(
            &conf.rate_limit,
            manager,
            metrics,
        )?)),
        other => Err(Error::UnknownType(other.to_string())),
    }
}

/// Build an ordered processor list from configuration
pub fn new_processors(
    confs: &[Config],
    manager: &Manager,
    metrics: &Metrics,
) -> Result<Vec<Box<dyn Processor>>, Error> {
    confs
        .iter()
        .enumerate()
        .map(|(index, conf)| new_processor(conf, manager, &metrics.child(index.to_string())))
        .collect()
}

/// Resolve part targets to concrete indexes; an empty target list selects
/// every part
pub(crate) fn resolve_targets(msg: &Message, targets: &[isize]) -> HashSet<usize> {
    if targets.is_empty() {
        return (0..msg.len()).collect();
    }
    targets
        .iter()
        .filter_map(|&t| msg.resolve_index(t))
        .collect()
}
