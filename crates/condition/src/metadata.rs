//! Metadata comparison condition

use weir_protocol::Message;

use crate::{Condition, Error, MetadataConfig};

enum MetadataOperator {
    Equals,
    Contains,
    Exists,
}

/// Compares a metadata value of a part against an argument
pub struct MetadataCondition {
    key: String,
    operator: MetadataOperator,
    part: isize,
    arg: String,
}

impl MetadataCondition {
    /// Build from configuration
    pub fn new(conf: &MetadataConfig) -> Result<Self, Error> {
        if conf.key.is_empty() {
            return Err(Error::Config(
                "metadata condition requires a key".to_string(),
            ));
        }
        let operator = match conf.operator.as_str() {
            "equals" => MetadataOperator::Equals,
            "contains" => MetadataOperator::Contains,
            "exists" => MetadataOperator::Exists,
            other => {
                return Err(Error::Config(format!(
                    "unknown metadata operator '{other}'"
                )));
            }
        };
        Ok(Self {
            key: conf.key.clone(),
            operator,
            part: conf.part,
            arg: conf.arg.clone(),
        })
    }
}

impl Condition for MetadataCondition {
    fn check(&self, msg: &Message) -> bool {
        let Some(index) = msg.resolve_index(self.part) else {
            return false;
        };
        let Some(part) = msg.get(index) else {
            return false;
        };
        let value = part.metadata().get(&self.key);

        match &self.operator {
            MetadataOperator::Exists => value.is_some(),
            MetadataOperator::Equals => value == Some(self.arg.as_str()),
            MetadataOperator::Contains => value.is_some_and(|v| v.contains(&self.arg)),
        }
    }

    fn name(&self) -> &'static str {
        "metadata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weir_protocol::Part;

    fn tagged_message(key: &str, value: &str) -> Message {
        let mut part = Part::new("payload");
        part.metadata_mut().set(key, value);
        Message::from(part)
    }

    #[test]
    fn test_equals_and_exists() {
        let msg = tagged_message("kind", "audit");

        let equals = MetadataCondition::new(&MetadataConfig {
            key: "kind".to_string(),
            operator: "equals".to_string(),
            part: 0,
            arg: "audit".to_string(),
        })
        .unwrap();
        assert!(equals.check(&msg));

        let exists = MetadataCondition::new(&MetadataConfig {
            key: "missing".to_string(),
            operator: "exists".to_string(),
            part: 0,
            arg: String::new(),
        })
        .unwrap();
        assert!(!exists.check(&msg));
    }

    #[test]
    fn test_missing_key_rejected_at_build() {
        let err = MetadataCondition::new(&MetadataConfig::default());
        assert!(err.is_err());
    }
}
