//! Part splitter

use weir_metrics::{Metrics, event};
use weir_protocol::Message;

use crate::{Processor, ProcessorOutput};

/// Splits a multi-part message into one message per part
pub struct Split {
    metrics: Metrics,
}

impl Split {
    pub fn new(metrics: &Metrics) -> Self {
        Self {
            metrics: metrics.child("split"),
        }
    }
}

impl Processor for Split {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);
        if msg.is_empty() {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        }

        let out: Vec<Message> = msg.into_parts().into_iter().map(Message::from).collect();
        self.metrics.incr_by(event::SENT, out.len() as u64);
        (out, None)
    }

    fn name(&self) -> &'static str {
        "split"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_protocol::Part;

    #[test]
    fn test_split_preserves_order_and_metadata() {
        let mut msg = Message::new();
        let mut part = Part::new("a");
        part.metadata_mut().set("idx", "0");
        msg.push(part);
        msg.push(Part::new("b"));

        let (out, response) = Split::new(&Metrics::noop()).process(msg);

        assert!(response.is_none());
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get(0).unwrap().as_slice(), b"a");
        assert_eq!(out[0].get(0).unwrap().metadata().get("idx"), Some("0"));
        assert_eq!(out[1].get(0).unwrap().as_slice(), b"b");
    }

    #[test]
    fn test_single_part_message_passes_whole() {
        let (out, _) = Split::new(&Metrics::noop()).process(Message::from(Part::new("only")));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_empty_message_skipped() {
        let (out, response) = Split::new(&Metrics::noop()).process(Message::new());
        assert!(out.is_empty());
        assert_eq!(response, Some(Ok(())));
    }
}
