//! Writer adaptor tests

use std::sync::atomic::Ordering;
use std::time::Duration;

use weir_protocol::{Error, Message, Part, Transaction, transaction_channel};
use tokio_util::sync::CancellationToken;

use crate::mock::{MockWriter, test_context};
use crate::spawn_writer;

fn txn(content: &str) -> (Transaction, weir_protocol::ResponseRx) {
    Transaction::new(
        Message::from(Part::new(content.to_string())),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_write_success_resolves_transaction() {
    let ctx = test_context();
    let (tx, rx) = transaction_channel(1);
    let (mock, written) = MockWriter::new();
    let mut output = spawn_writer("mock", Box::new(mock), rx, &ctx);

    let (transaction, response_rx) = txn("persist me");
    tx.send(transaction).await.unwrap();
    assert_eq!(response_rx.await.unwrap(), Ok(()));
    assert_eq!(written.lock().len(), 1);

    drop(tx);
    output.wait_closed(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_write_error_resolves_with_that_error() {
    let ctx = test_context();
    let (tx, rx) = transaction_channel(1);
    let (mock, written) = MockWriter::new();
    let mock = mock.failing_writes(vec![Error::transient("disk full")]);
    let mut output = spawn_writer("mock", Box::new(mock), rx, &ctx);

    let (transaction, response_rx) = txn("rejected");
    tx.send(transaction).await.unwrap();
    assert_eq!(
        response_rx.await.unwrap(),
        Err(Error::transient("disk full"))
    );
    assert!(written.lock().is_empty());

    drop(tx);
    output.wait_closed(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_not_connected_reconnects_and_retries_same_message() {
    let ctx = test_context();
    let (tx, rx) = transaction_channel(1);
    let (mock, written) = MockWriter::new();
    let mock = mock.failing_writes(vec![Error::NotConnected]);
    let connects = mock.connects.clone();
    let mut output = spawn_writer("mock", Box::new(mock), rx, &ctx);

    let (transaction, response_rx) = txn("retried");
    tx.send(transaction).await.unwrap();

    // The transaction resolves success only after the retry lands
    assert_eq!(
        tokio::time::timeout(Duration::from_secs(5), response_rx)
            .await
            .expect("write should be retried after reconnect")
            .unwrap(),
        Ok(())
    );
    assert_eq!(written.lock().len(), 1);
    assert!(connects.load(Ordering::Relaxed) >= 2);

    drop(tx);
    output.wait_closed(Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_close_resolves_queued_transactions_type_closed() {
    let ctx = test_context();
    let (tx, rx) = transaction_channel(4);
    let (mock, _written) = MockWriter::new();
    // Slow writer so the second transaction is still queued at close
    let mock = mock.with_write_delay(Duration::from_millis(300));
    let mut output = spawn_writer("mock", Box::new(mock), rx, &ctx);

    let (busy, _busy_rx) = txn("being written");
    let (queued, queued_rx) = txn("still queued");
    tx.send(busy).await.unwrap();
    tx.send(queued).await.unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    output.close();
    output.wait_closed(Duration::from_secs(2)).await.unwrap();

    // The queued transaction is unblocked rather than abandoned
    assert_eq!(queued_rx.await.unwrap(), Err(Error::TypeClosed));
}
