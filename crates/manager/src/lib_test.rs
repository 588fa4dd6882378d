//! Manager build and lookup tests

use weir_condition::{Condition, ConditionLookup, Config as ConditionConfig, ContentConfig};
use weir_protocol::{Message, Part, Transaction};
use tokio_util::sync::CancellationToken;

use crate::{Error, Manager, ResourcesConfig};

fn content_condition(arg: &str) -> ConditionConfig {
    ConditionConfig {
        kind: "content".to_string(),
        content: ContentConfig {
            operator: "equals".to_string(),
            part: 0,
            arg: arg.to_string(),
        },
        ..ConditionConfig::default()
    }
}

fn resource_condition(target: &str) -> ConditionConfig {
    ConditionConfig {
        kind: "resource".to_string(),
        resource: target.to_string(),
        ..ConditionConfig::default()
    }
}

#[test]
fn test_named_condition_lookup() {
    let mut conf = ResourcesConfig::default();
    conf.conditions
        .insert("is_stop".to_string(), content_condition("STOP"));

    let manager = Manager::build(&conf).unwrap();
    let cond = manager.condition("is_stop").unwrap();

    assert!(cond.check(&Message::from(Part::new("STOP"))));
    assert!(!cond.check(&Message::from(Part::new("GO"))));
    assert!(manager.condition("missing").is_err());
}

#[test]
fn test_chained_resource_references_resolve() {
    let mut conf = ResourcesConfig::default();
    conf.conditions
        .insert("base".to_string(), content_condition("yes"));
    conf.conditions
        .insert("alias".to_string(), resource_condition("base"));

    let manager = Manager::build(&conf).unwrap();
    let cond = manager.condition("alias").unwrap();
    assert!(cond.check(&Message::from(Part::new("yes"))));
}

#[test]
fn test_resource_cycle_fails_build() {
    let mut conf = ResourcesConfig::default();
    conf.conditions
        .insert("a".to_string(), resource_condition("b"));
    conf.conditions
        .insert("b".to_string(), resource_condition("a"));

    match Manager::build(&conf) {
        Err(Error::Condition(weir_condition::Error::ResourceCycle(_))) => {}
        other => panic!("expected cycle error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_self_cycle_fails_build() {
    let mut conf = ResourcesConfig::default();
    conf.conditions
        .insert("narcissus".to_string(), resource_condition("narcissus"));

    assert!(Manager::build(&conf).is_err());
}

#[tokio::test]
async fn test_pipes_connect_by_name() {
    let manager = Manager::empty();

    let tx = manager.pipe_sender("bridge");
    let rx = manager.pipe_receiver("bridge");

    let (txn, _response) = Transaction::new(
        Message::from(Part::new("through the pipe")),
        CancellationToken::new(),
    );
    tx.send(txn).await.unwrap();

    let received = rx.recv().await.unwrap();
    assert_eq!(received.message().get(0).unwrap().as_slice(), b"through the pipe");
}

#[test]
fn test_unknown_cache_type_fails() {
    let mut conf = ResourcesConfig::default();
    conf.caches.insert(
        "broken".to_string(),
        crate::CacheConfig {
            kind: "quantum".to_string(),
            ..crate::CacheConfig::default()
        },
    );

    assert!(matches!(
        Manager::build(&conf),
        Err(Error::UnknownCacheType(_))
    ));
}
