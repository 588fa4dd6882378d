//! Part decompression

use weir_metrics::{Metrics, event};
use weir_protocol::{Message, Part};

use crate::compress::Algorithm;
use crate::{DecompressConfig, Error, Processor, ProcessorOutput, resolve_targets};

/// Decompresses targeted parts of a message
///
/// Parts that fail to decompress (invalid format) are removed from the
/// message; if nothing remains the message is skipped with a success
/// response.
pub struct Decompress {
    algorithm: Algorithm,
    parts: Vec<isize>,
    metrics: Metrics,
}

impl Decompress {
    /// Build from configuration
    pub fn new(conf: &DecompressConfig, metrics: &Metrics) -> Result<Self, Error> {
        Ok(Self {
            algorithm: Algorithm::parse(&conf.algorithm)?,
            parts: conf.parts.clone(),
            metrics: metrics.child("decompress"),
        })
    }
}

impl Processor for Decompress {
    fn process(&self, msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let targets = resolve_targets(&msg, &self.parts);
        let mut out = Message::new();
        for (index, part) in msg.iter().enumerate() {
            if !targets.contains(&index) {
                out.push(part.clone());
                continue;
            }
            match self.algorithm.decompress(part.as_slice()) {
                Ok(converted) => {
                    self.metrics.incr(event::SUCCESS);
                    out.push(Part::with_metadata(converted, part.metadata().clone()));
                }
                Err(err) => {
                    self.metrics.incr(event::ERROR);
                    tracing::warn!(error = %err, part = index, "failed to decompress part");
                }
            }
        }

        if out.is_empty() {
            self.metrics.incr(event::SKIPPED);
            return (Vec::new(), Some(Ok(())));
        }
        self.metrics.incr(event::SENT);
        (vec![out], None)
    }

    fn name(&self) -> &'static str {
        "decompress"
    }
}
