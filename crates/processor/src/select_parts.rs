//! Part selector

use weir_metrics::{Metrics, event};
use weir_protocol::Message;

use crate::{Processor, ProcessorOutput, SelectPartsConfig};

/// Keeps only the configured part indexes, in the order listed
///
/// Indexes that fall outside the message are ignored. A selection that
/// matches nothing skips the message entirely.
pub struct SelectParts {
    parts: Vec<isize>,
    metrics: Metrics,
}

impl SelectParts {
    pub fn new(conf: &SelectPartsConfig, metrics: &Metrics) -> Self {
        Self {
            parts: conf.parts.clone(),
            metrics: metrics.child("select_parts"),
        }
    }
}

impl Processor for SelectParts {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let selected: Message = self
            .parts
            .iter()
            .filter_map(|&target| msg.resolve_index(target))
            .filter_map(|index| msg.get(index).cloned())
            .collect();

        if selected.is_empty() {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        }

        self.metrics.incr(event::SENT);
        (vec![selected], None)
    }

    fn name(&self) -> &'static str {
        "select_parts"
    }
}
