//! Condition construction and dispatch tests

use std::sync::Arc;

use weir_protocol::{Message, Part};

use crate::{
    Condition, ConditionLookup, Config, ContentConfig, Error, NoConditions, StaticCondition,
    new_condition,
};

fn msg(content: &str) -> Message {
    Message::from(Part::new(content.to_string()))
}

fn content_config(operator: &str, arg: &str) -> Config {
    Config {
        kind: "content".to_string(),
        content: ContentConfig {
            operator: operator.to_string(),
            part: 0,
            arg: arg.to_string(),
        },
        ..Config::default()
    }
}

#[test]
fn test_unknown_type_fails_fast() {
    let conf = Config {
        kind: "telepathy".to_string(),
        ..Config::default()
    };
    match new_condition(&conf, &NoConditions) {
        Err(Error::UnknownType(name)) => assert_eq!(name, "telepathy"),
        other => panic!("expected unknown type error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_and_combinator_from_config() {
    let conf = Config {
        kind: "and".to_string(),
        and: vec![
            content_config("prefix", "he"),
            content_config("suffix", "lo"),
        ],
        ..Config::default()
    };
    let cond = new_condition(&conf, &NoConditions).unwrap();

    assert!(cond.check(&msg("hello")));
    assert!(!cond.check(&msg("help")));
}

#[test]
fn test_not_requires_child() {
    let conf = Config {
        kind: "not".to_string(),
        ..Config::default()
    };
    assert!(new_condition(&conf, &NoConditions).is_err());

    let conf = Config {
        kind: "not".to_string(),
        not: Some(Box::new(content_config("equals", "skip"))),
        ..Config::default()
    };
    let cond = new_condition(&conf, &NoConditions).unwrap();
    assert!(!cond.check(&msg("skip")));
    assert!(cond.check(&msg("keep")));
}

struct SingleLookup {
    name: &'static str,
    cond: Arc<dyn Condition>,
}

impl ConditionLookup for SingleLookup {
    fn condition(&self, name: &str) -> Result<Arc<dyn Condition>, Error> {
        if name == self.name {
            Ok(Arc::clone(&self.cond))
        } else {
            Err(Error::UnknownResource(name.to_string()))
        }
    }
}

#[test]
fn test_resource_resolution() {
    let lookup = SingleLookup {
        name: "always",
        cond: Arc::new(StaticCondition(true)),
    };

    let conf = Config {
        kind: "resource".to_string(),
        resource: "always".to_string(),
        ..Config::default()
    };
    let cond = new_condition(&conf, &lookup).unwrap();
    assert!(cond.check(&msg("anything")));

    let conf = Config {
        kind: "resource".to_string(),
        resource: "missing".to_string(),
        ..Config::default()
    };
    assert!(matches!(
        new_condition(&conf, &lookup),
        Err(Error::UnknownResource(_))
    ));
}

#[test]
fn test_default_config_parses_as_content() {
    let conf: Config = serde_yaml::from_str("type: content\ncontent:\n  arg: hi\n").unwrap();
    let cond = new_condition(&conf, &NoConditions).unwrap();
    assert!(cond.check(&msg("hi")));
}
