//! Duplicate suppression

use std::sync::Arc;

use weir_manager::{Cache, Manager};
use weir_metrics::{Metrics, event};
use weir_protocol::{Bytes, Message};

use crate::{DedupeConfig, Error, Processor, ProcessorOutput};

/// Drops messages whose key was already recorded in a named cache
///
/// The key is the payload of the target part; the cache is looked up from
/// the manager by name at construction. A duplicate settles with success,
/// the same way a filtered message does. A re-presented message whose first
/// delivery already reached the cache is treated as a duplicate - that is
/// the at-least-once trade-off this processor exists to make.
pub struct Dedupe {
    cache: Arc<dyn Cache>,
    part: isize,
    metrics: Metrics,
}

impl Dedupe {
    /// Build from configuration; the named cache must exist
    pub fn new(conf: &DedupeConfig, manager: &Manager, metrics: &Metrics) -> Result<Self, Error> {
        if conf.cache.is_empty() {
            return Err(Error::Config(
                "dedupe requires a cache resource".to_string(),
            ));
        }
        let cache = manager
            .cache(&conf.cache)
            .ok_or_else(|| Error::Config(format!("unknown cache resource '{}'", conf.cache)))?;
        Ok(Self {
            cache,
            part: conf.part,
            metrics: metrics.child("dedupe"),
        })
    }
}

impl Processor for Dedupe {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let Some(index) = msg.resolve_index(self.part) else {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        };
        let Some(part) = msg.get(index) else {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        };
        let key = String::from_utf8_lossy(part.as_slice()).into_owned();

        if self.cache.add(&key, Bytes::new()) {
            self.metrics.incr(event::SENT);
            (vec![msg], None)
        } else {
            self.metrics.incr(event::SKIPPED);
            (Vec::new(), Some(Ok(())))
        }
    }

    fn name(&self) -> &'static str {
        "dedupe"
    }
}
