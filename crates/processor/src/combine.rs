//! Part combiner

use parking_lot::Mutex;
use weir_metrics::{Metrics, event};
use weir_protocol::{Message, Part};

use crate::{CombineConfig, Error, Processor, ProcessorOutput};

/// Accumulates parts across messages into larger batches
///
/// While the tally is below the target, inputs are absorbed and resolved
/// success immediately; their delivery guarantee transfers to the combined
/// message that eventually carries their parts. The inverse of `split`.
pub struct Combine {
    target: usize,
    pending: Mutex<Vec<Part>>,
    metrics: Metrics,
}

impl Combine {
    /// Build from configuration; a zero part target is rejected
    pub fn new(conf: &CombineConfig, metrics: &Metrics) -> Result<Self, Error> {
        if conf.parts == 0 {
            return Err(Error::Config(
                "combine parts target must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            target: conf.parts,
            pending: Mutex::new(Vec::new()),
            metrics: metrics.child("combine"),
        })
    }
}

impl Processor for Combine {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let mut pending = self.pending.lock();
        pending.extend(msg.into_parts());

        if pending.len() < self.target {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        }

        let combined = Message::from_parts(std::mem::take(&mut *pending));
        self.metrics.incr(event::SENT);
        (vec![combined], None)
    }

    fn name(&self) -> &'static str {
        "combine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combine(parts: usize) -> Combine {
        Combine::new(&CombineConfig { parts }, &Metrics::noop()).unwrap()
    }

    #[test]
    fn test_accumulates_until_target() {
        let c = combine(3);

        let (out, response) = c.process(Message::from(Part::new("a")));
        assert!(out.is_empty());
        assert_eq!(response, Some(Ok(())));

        let (out, response) = c.process(Message::from(Part::new("b")));
        assert!(out.is_empty());
        assert_eq!(response, Some(Ok(())));

        let (out, response) = c.process(Message::from(Part::new("c")));
        assert!(response.is_none());
        assert_eq!(out.len(), 1);
        let contents: Vec<&[u8]> = out[0].iter().map(Part::as_slice).collect();
        assert_eq!(contents, vec![b"a" as &[u8], b"b", b"c"]);
    }

    #[test]
    fn test_multi_part_input_can_overshoot() {
        let c = combine(2);

        let mut msg = Message::new();
        msg.push(Part::new("1"));
        msg.push(Part::new("2"));
        msg.push(Part::new("3"));

        let (out, response) = c.process(msg);
        assert!(response.is_none());
        assert_eq!(out[0].len(), 3);
    }

    #[test]
    fn test_state_resets_after_emit() {
        let c = combine(2);

        c.process(Message::from(Part::new("a")));
        let (out, _) = c.process(Message::from(Part::new("b")));
        assert_eq!(out[0].len(), 2);

        let (out, response) = c.process(Message::from(Part::new("fresh")));
        assert!(out.is_empty());
        assert_eq!(response, Some(Ok(())));
    }

    #[test]
    fn test_zero_target_rejected() {
        assert!(Combine::new(&CombineConfig { parts: 0 }, &Metrics::noop()).is_err());
    }
}
