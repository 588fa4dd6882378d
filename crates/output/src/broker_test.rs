//! Fan-out broker tests

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use weir_condition::{Config as ConditionConfig, ContentConfig};
use weir_metrics::Metrics;
use weir_protocol::{Error, Message, Part, Transaction, transaction_channel};

use crate::broker::{SwitchChild, broadcast, new_broker, round_robin, switch, try_each};
use crate::mock::test_context;
use crate::{BrokerConfig, Config};

fn txn(content: &str) -> (Transaction, weir_protocol::ResponseRx) {
    Transaction::new(
        Message::from(Part::new(content.to_string())),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_round_robin_distributes_within_one() {
    let (tx, rx) = transaction_channel(4);
    let (child_a_tx, child_a_rx) = transaction_channel(4);
    let (child_b_tx, child_b_rx) = transaction_channel(4);

    tokio::spawn(round_robin(
        rx,
        vec![child_a_tx, child_b_tx],
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let counter_a = tokio::spawn(async move {
        let mut count = 0u32;
        while let Ok(txn) = child_a_rx.recv().await {
            txn.resolve(Ok(()));
            count += 1;
        }
        count
    });
    let counter_b = tokio::spawn(async move {
        let mut count = 0u32;
        while let Ok(txn) = child_b_rx.recv().await {
            txn.resolve(Ok(()));
            count += 1;
        }
        count
    });

    let mut response_rxs = Vec::new();
    for i in 0..100 {
        let (transaction, response_rx) = txn(&format!("msg-{i}"));
        tx.send(transaction).await.unwrap();
        response_rxs.push(response_rx);
    }
    for response_rx in response_rxs {
        assert_eq!(response_rx.await.unwrap(), Ok(()));
    }
    drop(tx);

    let (count_a, count_b) = (counter_a.await.unwrap(), counter_b.await.unwrap());
    assert_eq!(count_a + count_b, 100);
    assert!(count_a.abs_diff(count_b) <= 1, "{count_a} vs {count_b}");
}

#[tokio::test]
async fn test_broadcast_success_requires_every_child() {
    let (tx, rx) = transaction_channel(1);
    let (child_a_tx, child_a_rx) = transaction_channel(1);
    let (child_b_tx, child_b_rx) = transaction_channel(1);

    tokio::spawn(broadcast(
        rx,
        vec![child_a_tx, child_b_tx],
        Metrics::noop(),
        CancellationToken::new(),
    ));

    // Round one: both children accept
    let (transaction, response_rx) = txn("both accept");
    tx.send(transaction).await.unwrap();
    child_a_rx.recv().await.unwrap().resolve(Ok(()));
    child_b_rx.recv().await.unwrap().resolve(Ok(()));
    assert_eq!(response_rx.await.unwrap(), Ok(()));

    // Round two: one child fails, the upstream sees the error
    let (transaction, response_rx) = txn("b refuses");
    tx.send(transaction).await.unwrap();
    child_a_rx.recv().await.unwrap().resolve(Ok(()));
    child_b_rx
        .recv()
        .await
        .unwrap()
        .resolve(Err(Error::transient("sink b down")));
    assert_eq!(
        response_rx.await.unwrap(),
        Err(Error::transient("sink b down"))
    );
}

#[tokio::test]
async fn test_broadcast_children_get_independent_copies() {
    let (tx, rx) = transaction_channel(1);
    let (child_a_tx, child_a_rx) = transaction_channel(1);
    let (child_b_tx, child_b_rx) = transaction_channel(1);

    tokio::spawn(broadcast(
        rx,
        vec![child_a_tx, child_b_tx],
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let mut part = Part::new("shared payload");
    part.metadata_mut().set("origin", "broadcast");
    let (transaction, response_rx) = Transaction::new(
        Message::from(part),
        CancellationToken::new(),
    );
    tx.send(transaction).await.unwrap();

    let received_a = child_a_rx.recv().await.unwrap();
    let received_b = child_b_rx.recv().await.unwrap();

    // Same content, separate metadata maps
    let (mut msg_a, responder_a, _) = received_a.into_parts();
    msg_a.get_mut(0).unwrap().metadata_mut().set("origin", "mutated");
    assert_eq!(
        received_b.message().get(0).unwrap().metadata().get("origin"),
        Some("broadcast")
    );

    let _ = responder_a.send(Ok(()));
    received_b.resolve(Ok(()));
    assert_eq!(response_rx.await.unwrap(), Ok(()));
}

#[tokio::test]
async fn test_try_falls_through_to_next_child() {
    let (tx, rx) = transaction_channel(1);
    let (child_a_tx, child_a_rx) = transaction_channel(1);
    let (child_b_tx, child_b_rx) = transaction_channel(1);

    tokio::spawn(try_each(
        rx,
        vec![child_a_tx, child_b_tx],
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let (transaction, response_rx) = txn("failover");
    tx.send(transaction).await.unwrap();

    child_a_rx
        .recv()
        .await
        .unwrap()
        .resolve(Err(Error::NotConnected));
    // Only after the first child fails is the second attempted
    child_b_rx.recv().await.unwrap().resolve(Ok(()));

    assert_eq!(response_rx.await.unwrap(), Ok(()));
}

#[tokio::test]
async fn test_try_reports_last_error_when_all_fail() {
    let (tx, rx) = transaction_channel(1);
    let (child_a_tx, child_a_rx) = transaction_channel(1);
    let (child_b_tx, child_b_rx) = transaction_channel(1);

    tokio::spawn(try_each(
        rx,
        vec![child_a_tx, child_b_tx],
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let (transaction, response_rx) = txn("doomed");
    tx.send(transaction).await.unwrap();

    child_a_rx
        .recv()
        .await
        .unwrap()
        .resolve(Err(Error::NotConnected));
    child_b_rx
        .recv()
        .await
        .unwrap()
        .resolve(Err(Error::transient("b also down")));

    assert_eq!(
        response_rx.await.unwrap(),
        Err(Error::transient("b also down"))
    );
}

fn content_condition(arg: &str) -> Arc<dyn weir_condition::Condition> {
    weir_condition::new_condition(
        &ConditionConfig {
            kind: "content".to_string(),
            content: ContentConfig {
                operator: "prefix".to_string(),
                part: 0,
                arg: arg.to_string(),
            },
            ..ConditionConfig::default()
        },
        &weir_condition::NoConditions,
    )
    .unwrap()
}

#[tokio::test]
async fn test_switch_routes_first_match_and_drops_unmatched() {
    let (tx, rx) = transaction_channel(1);
    let (audit_tx, audit_rx) = transaction_channel(4);
    let (event_tx, event_rx) = transaction_channel(4);

    tokio::spawn(switch(
        rx,
        vec![
            SwitchChild {
                condition: content_condition("audit:"),
                tx: audit_tx,
            },
            SwitchChild {
                condition: content_condition("event:"),
                tx: event_tx,
            },
        ],
        false,
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let (transaction, audit_response) = txn("audit: login");
    tx.send(transaction).await.unwrap();
    let routed = audit_rx.recv().await.unwrap();
    assert_eq!(routed.message().get(0).unwrap().as_slice(), b"audit: login");
    routed.resolve(Ok(()));
    assert_eq!(audit_response.await.unwrap(), Ok(()));

    // Unmatched messages are dropped with success
    let (transaction, dropped_response) = txn("metric: cpu");
    tx.send(transaction).await.unwrap();
    assert_eq!(dropped_response.await.unwrap(), Ok(()));
    assert!(event_rx.try_recv().is_err());
}

#[tokio::test]
async fn test_switch_strict_rejects_unmatched() {
    let (tx, rx) = transaction_channel(1);
    let (only_tx, _only_rx) = transaction_channel(4);

    tokio::spawn(switch(
        rx,
        vec![SwitchChild {
            condition: content_condition("match:"),
            tx: only_tx,
        }],
        true,
        Metrics::noop(),
        CancellationToken::new(),
    ));

    let (transaction, response_rx) = txn("nothing matches this");
    tx.send(transaction).await.unwrap();
    assert!(matches!(
        response_rx.await.unwrap(),
        Err(Error::BadMessage(_))
    ));
}

#[tokio::test]
async fn test_broker_config_greedy_drains_through_any_child() {
    let ctx = test_context();
    let (tx, rx) = transaction_channel(4);

    let conf = BrokerConfig {
        pattern: "greedy".to_string(),
        outputs: vec![
            Config {
                kind: "drop".to_string(),
                ..Config::default()
            },
            Config {
                kind: "drop".to_string(),
                ..Config::default()
            },
        ],
        ..BrokerConfig::default()
    };
    let mut broker = new_broker(&conf, rx, &ctx).unwrap();

    let mut response_rxs = Vec::new();
    for i in 0..10 {
        let (transaction, response_rx) = txn(&format!("greedy-{i}"));
        tx.send(transaction).await.unwrap();
        response_rxs.push(response_rx);
    }
    for response_rx in response_rxs {
        assert_eq!(response_rx.await.unwrap(), Ok(()));
    }

    drop(tx);
    broker.wait_closed(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_broker_rejects_unknown_pattern() {
    let ctx = test_context();
    let (_tx, rx) = transaction_channel(1);
    let conf = BrokerConfig {
        pattern: "scatter".to_string(),
        outputs: vec![Config::default()],
        ..BrokerConfig::default()
    };
    assert!(new_broker(&conf, rx, &ctx).is_err());
}
