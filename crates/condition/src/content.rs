//! Payload comparison conditions

use regex::bytes::Regex;
use serde_json::Value;
use weir_protocol::{Message, lookup_path};

use crate::{Condition, ContentConfig, Error, JsonPathConfig};

enum ContentOperator {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Regex(Regex),
}

/// Compares a part's raw payload against an argument
pub struct ContentCondition {
    operator: ContentOperator,
    part: isize,
    arg: Vec<u8>,
}

impl ContentCondition {
    /// Build from configuration, compiling the regex operator eagerly
    pub fn new(conf: &ContentConfig) -> Result<Self, Error> {
        let operator = match conf.operator.as_str() {
            "equals" => ContentOperator::Equals,
            "contains" => ContentOperator::Contains,
            "prefix" => ContentOperator::Prefix,
            "suffix" => ContentOperator::Suffix,
            "regex" => ContentOperator::Regex(Regex::new(&conf.arg)?),
            other => {
                return Err(Error::Config(format!(
                    "unknown content operator '{other}'"
                )));
            }
        };
        Ok(Self {
            operator,
            part: conf.part,
            arg: conf.arg.clone().into_bytes(),
        })
    }
}

impl Condition for ContentCondition {
    fn check(&self, msg: &Message) -> bool {
        let Some(index) = msg.resolve_index(self.part) else {
            return false;
        };
        let Some(part) = msg.get(index) else {
            return false;
        };
        let data = part.as_slice();

        match &self.operator {
            ContentOperator::Equals => data == self.arg.as_slice(),
            ContentOperator::Contains => {
                !self.arg.is_empty()
                    && data
                        .windows(self.arg.len())
                        .any(|window| window == self.arg.as_slice())
            }
            ContentOperator::Prefix => data.starts_with(&self.arg),
            ContentOperator::Suffix => data.ends_with(&self.arg),
            ContentOperator::Regex(re) => re.is_match(data),
        }
    }

    fn name(&self) -> &'static str {
        "content"
    }
}

enum JsonPathOperator {
    Equals,
    Contains,
    Exists,
}

/// Compares a field of a part's structured payload
///
/// Non-JSON payloads and missing paths never match (except `exists`, which
/// is then false).
pub struct JsonPathCondition {
    path: String,
    operator: JsonPathOperator,
    part: isize,
    arg: String,
}

impl JsonPathCondition {
    /// Build from configuration
    pub fn new(conf: &JsonPathConfig) -> Result<Self, Error> {
        let operator = match conf.operator.as_str() {
            "equals" => JsonPathOperator::Equals,
            "contains" => JsonPathOperator::Contains,
            "exists" => JsonPathOperator::Exists,
            other => {
                return Err(Error::Config(format!(
                    "unknown jsonpath operator '{other}'"
                )));
            }
        };
        Ok(Self {
            path: conf.path.clone(),
            operator,
            part: conf.part,
            arg: conf.arg.clone(),
        })
    }

    fn value_as_text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl Condition for JsonPathCondition {
    fn check(&self, msg: &Message) -> bool {
        let Some(index) = msg.resolve_index(self.part) else {
            return false;
        };
        let Some(part) = msg.get(index) else {
            return false;
        };
        let Some(structured) = part.structured() else {
            return false;
        };
        let found = lookup_path(structured, &self.path);

        match &self.operator {
            JsonPathOperator::Exists => found.is_some(),
            JsonPathOperator::Equals => {
                found.is_some_and(|v| Self::value_as_text(v) == self.arg)
            }
            JsonPathOperator::Contains => {
                found.is_some_and(|v| Self::value_as_text(v).contains(&self.arg))
            }
        }
    }

    fn name(&self) -> &'static str {
        "jsonpath"
    }
}
