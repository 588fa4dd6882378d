//! Metadata mutation processor

use weir_metrics::{Metrics, event};
use weir_protocol::Message;

use crate::{Error, MetadataConfig, Processor, ProcessorOutput, resolve_targets};

enum MetadataOperator {
    Set,
    Delete,
}

/// Sets or deletes a metadata key on targeted parts
pub struct MetadataProcessor {
    operator: MetadataOperator,
    key: String,
    value: String,
    parts: Vec<isize>,
    metrics: Metrics,
}

impl MetadataProcessor {
    /// Build from configuration
    pub fn new(conf: &MetadataConfig, metrics: &Metrics) -> Result<Self, Error> {
        if conf.key.is_empty() {
            return Err(Error::Config(
                "metadata processor requires a key".to_string(),
            ));
        }
        let operator = match conf.operator.as_str() {
            "set" => MetadataOperator::Set,
            "delete" => MetadataOperator::Delete,
            other => {
                return Err(Error::Config(format!(
                    "unknown metadata operator '{other}'"
                )));
            }
        };
        Ok(Self {
            operator,
            key: conf.key.clone(),
            value: conf.value.clone(),
            parts: conf.parts.clone(),
            metrics: metrics.child("metadata"),
        })
    }
}

impl Processor for MetadataProcessor {
    fn process(&self, mut msg: Message) -> ProcessorOutput {
        self.metrics.incr(event::COUNT);

        let targets = resolve_targets(&msg, &self.parts);
        for index in targets {
            if let Some(part) = msg.get_mut(index) {
                match self.operator {
                    MetadataOperator::Set => {
                        part.metadata_mut().set(self.key.clone(), self.value.clone());
                    }
                    MetadataOperator::Delete => {
                        part.metadata_mut().delete(&self.key);
                    }
                }
            }
        }

        self.metrics.incr(event::SENT);
        (vec![msg], None)
    }

    fn name(&self) -> &'static str {
        "metadata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_protocol::Part;

    fn set_processor(key: &str, value: &str, parts: Vec<isize>) -> MetadataProcessor {
        MetadataProcessor::new(
            &MetadataConfig {
                operator: "set".to_string(),
                key: key.to_string(),
                value: value.to_string(),
                parts,
            },
            &Metrics::noop(),
        )
        .unwrap()
    }

    #[test]
    fn test_set_on_all_parts_by_default() {
        let mut msg = Message::new();
        msg.push(Part::new("a"));
        msg.push(Part::new("b"));

        let (out, _) = set_processor("env", "prod", Vec::new()).process(msg);
        for part in out[0].iter() {
            assert_eq!(part.metadata().get("env"), Some("prod"));
        }
    }

    #[test]
    fn test_set_targets_only_listed_parts() {
        let mut msg = Message::new();
        msg.push(Part::new("a"));
        msg.push(Part::new("b"));

        let (out, _) = set_processor("tag", "x", vec![-1]).process(msg);
        assert!(out[0].get(0).unwrap().metadata().get("tag").is_none());
        assert_eq!(out[0].get(1).unwrap().metadata().get("tag"), Some("x"));
    }

    #[test]
    fn test_delete_removes_key() {
        let mut part = Part::new("a");
        part.metadata_mut().set("stale", "1");
        let msg = Message::from(part);

        let processor = MetadataProcessor::new(
            &MetadataConfig {
                operator: "delete".to_string(),
                key: "stale".to_string(),
                value: String::new(),
                parts: Vec::new(),
            },
            &Metrics::noop(),
        )
        .unwrap();

        let (out, _) = processor.process(msg);
        assert!(out[0].get(0).unwrap().metadata().get("stale").is_none());
    }

    #[test]
    fn test_missing_key_rejected() {
        assert!(MetadataProcessor::new(&MetadataConfig::default(), &Metrics::noop()).is_err());
    }
}
