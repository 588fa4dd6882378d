//! Weir Condition - Message predicates
//!
//! Conditions answer one question about a message: does it match? They feed
//! the `filter` processor, the `switch` output broker and the `read_until`
//! meta-input.
//!
//! Conditions are synchronous and side-effect free with one deliberate
//! exception: `count` keeps a tally across checks.
//!
//! # Types
//!
//! | Type | Behaviour |
//! |---|---|
//! | `content` | Compare a part's payload against an argument |
//! | `jsonpath` | Compare a field of a part's structured payload |
//! | `metadata` | Compare a part's metadata value |
//! | `and` / `or` / `not` | Combine child conditions |
//! | `count` | True on every Nth check |
//! | `static` | Fixed boolean |
//! | `resource` | Reference a named condition from the manager |

mod config;
mod content;
mod count;
mod error;
mod logic;
mod metadata;

pub use config::{Config, ContentConfig, CountConfig, JsonPathConfig, MetadataConfig};
pub use content::{ContentCondition, JsonPathCondition};
pub use count::CountCondition;
pub use error::Error;
pub use logic::{AndCondition, NotCondition, OrCondition};
pub use metadata::MetadataCondition;

use std::sync::Arc;

use weir_protocol::Message;

/// A predicate over messages
pub trait Condition: Send + Sync {
    /// Whether the message matches
    fn check(&self, msg: &Message) -> bool;

    /// Type name for logging and metrics
    fn name(&self) -> &'static str;
}

/// Resolver for `resource` condition references
///
/// Implemented by the manager; construction-time resolution is where
/// reference cycles are detected.
pub trait ConditionLookup {
    /// Resolve a named condition
    fn condition(&self, name: &str) -> Result<Arc<dyn Condition>, Error>;
}

/// Lookup for contexts without named resources; every reference fails
pub struct NoConditions;

impl ConditionLookup for NoConditions {
    fn condition(&self, name: &str) -> Result<Arc<dyn Condition>, Error> {
        Err(Error::UnknownResource(name.to_string()))
    }
}

/// Description of a registered condition type, for the CLI catalogue
pub struct TypeSpec {
    pub name: &'static str,
    pub description: &'static str,
}

/// All registered condition types
pub const TYPE_SPECS: &[TypeSpec] = &[
    TypeSpec {
        name: "and",
        description: "True when every child condition matches.",
    },
    TypeSpec {
        name: "content",
        description: "Compares a part's raw payload against an argument using \
                      equals, contains, prefix, suffix or regex.",
    },
    TypeSpec {
        name: "count",
        description: "Keeps a tally of checks and returns true on every Nth.",
    },
    TypeSpec {
        name: "jsonpath",
        description: "Resolves a dot-separated path in a part's structured \
                      payload and compares the value found there.",
    },
    TypeSpec {
        name: "metadata",
        description: "Compares a metadata value of a part against an argument.",
    },
    TypeSpec {
        name: "not",
        description: "Inverts its child condition.",
    },
    TypeSpec {
        name: "or",
        description: "True when any child condition matches.",
    },
    TypeSpec {
        name: "resource",
        description: "Delegates to a condition configured under manager \
                      resources, referenced by name.",
    },
    TypeSpec {
        name: "static",
        description: "Always returns the configured boolean.",
    },
];

/// Build a condition from configuration
///
/// Unknown types and unresolvable resources fail fast at construction.
pub fn new_condition(
    conf: &Config,
    lookup: &dyn ConditionLookup,
) -> Result<Arc<dyn Condition>, Error> {
    match conf.kind.as_str() {
        "content" => Ok(Arc::new(ContentCondition::new(&conf.content)?)),
        "jsonpath" => Ok(Arc::new(JsonPathCondition::new(&conf.jsonpath)?)),
        "metadata" => Ok(Arc::new(MetadataCondition::new(&conf.metadata)?)),
        "and" => {
            let children = build_children(&conf.and, lookup)?;
            Ok(Arc::new(AndCondition::new(children)))
        }
        "or" => {
            let children = build_children(&conf.or, lookup)?;
            Ok(Arc::new(OrCondition::new(children)))
        }
        "not" => {
            let child_conf = conf
                .not
                .as_deref()
                .ok_or_else(|| Error::Config("not condition requires a child".to_string()))?;
            Ok(Arc::new(NotCondition::new(new_condition(
                child_conf, lookup,
            )?)))
        }
        "count" => Ok(Arc::new(CountCondition::new(&conf.count)?)),
        "static" => Ok(Arc::new(StaticCondition(conf.static_))),
        "resource" => lookup.condition(&conf.resource),
        other => Err(Error::UnknownType(other.to_string())),
    }
}

fn build_children(
    confs: &[Config],
    lookup: &dyn ConditionLookup,
) -> Result<Vec<Arc<dyn Condition>>, Error> {
    confs.iter().map(|c| new_condition(c, lookup)).collect()
}

/// Fixed boolean condition
pub struct StaticCondition(pub bool);

impl Condition for StaticCondition {
    fn check(&self, _msg: &Message) -> bool {
        self.0
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod lib_test;
