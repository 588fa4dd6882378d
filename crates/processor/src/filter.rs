//! Condition-driven filter

use std::sync::Arc;

use weir_condition::{Condition, ConditionLookup, new_condition};
use weir_metrics::{Metrics, event};
use weir_protocol::Message;

use crate::{Error, FilterConfig, Processor, ProcessorOutput};

/// Drops messages that fail a condition
///
/// Dropped messages short-circuit with a success response: the upstream
/// connector treats them as handled.
pub struct Filter {
    condition: Arc<dyn Condition>,
    metrics: Metrics,
}

impl Filter {
    /// Build from configuration
    pub fn new(
        conf: &FilterConfig,
        lookup: &dyn ConditionLookup,
        metrics: &Metrics,
    ) -> Result<Self, Error> {
        Ok(Self {
            condition: new_condition(&conf.condition, lookup)?,
            metrics: metrics.child("filter"),
        })
    }
}

impl Processor for Filter {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);
        if self.condition.check(&msg) {
            self.metrics.incr(event::SENT);
            (vec![msg], None)
        } else {
            self.metrics.incr(event::SKIPPED);
            (Vec::new(), Some(Ok(())))
        }
    }

    fn name(&self) -> &'static str {
        "filter"
    }
}
