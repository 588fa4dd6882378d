//! Dynamic meta-input tests

use std::io::Write;
use std::time::Duration;

use crate::mock::test_context;
use crate::{Config, DynamicConfig, FileInputConfig, spawn_dynamic};

fn file_config(contents: &str) -> (tempfile::NamedTempFile, Config) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();

    let conf = Config {
        kind: "file".to_string(),
        file: FileInputConfig {
            paths: vec![file.path().to_path_buf()],
            ..FileInputConfig::default()
        },
        ..Config::default()
    };
    (file, conf)
}

#[tokio::test]
async fn test_added_child_feeds_the_stream() {
    let ctx = test_context();
    let (input, handle) = spawn_dynamic(&DynamicConfig::default(), &ctx).unwrap();
    let rx = input.transactions();

    let (_file, conf) = file_config("dynamic hello\n");
    handle.set_input("feed", conf).await.unwrap();

    let txn = rx.recv().await.unwrap();
    assert_eq!(txn.message().get(0).unwrap().as_slice(), b"dynamic hello");
    txn.resolve(Ok(()));

    assert_eq!(handle.list_inputs().await.unwrap(), vec!["feed".to_string()]);
}

#[tokio::test]
async fn test_remove_detaches_child() {
    let ctx = test_context();
    let (input, handle) = spawn_dynamic(&DynamicConfig::default(), &ctx).unwrap();
    let rx = input.transactions();

    let (_file, conf) = file_config("x\n");
    handle.set_input("ephemeral", conf).await.unwrap();

    // Settle the in-flight message so the child can stop serving its ack
    let txn = rx.recv().await.unwrap();
    txn.resolve(Ok(()));

    handle.remove_input("ephemeral").await.unwrap();
    assert!(handle.list_inputs().await.unwrap().is_empty());
    assert!(handle.remove_input("ephemeral").await.is_err());
}

#[tokio::test]
async fn test_set_replaces_existing_label() {
    let ctx = test_context();
    let (input, handle) = spawn_dynamic(&DynamicConfig::default(), &ctx).unwrap();
    let rx = input.transactions();

    let (_file_a, conf_a) = file_config("from-first\n");
    handle.set_input("slot", conf_a).await.unwrap();

    let txn = rx.recv().await.unwrap();
    assert_eq!(txn.message().get(0).unwrap().as_slice(), b"from-first");
    txn.resolve(Ok(()));

    // Same label again: the old child is closed, the new one takes over
    let (_file_b, conf_b) = file_config("from-second\n");
    handle.set_input("slot", conf_b).await.unwrap();
    assert_eq!(handle.list_inputs().await.unwrap(), vec!["slot".to_string()]);

    let txn = rx.recv().await.unwrap();
    assert_eq!(txn.message().get(0).unwrap().as_slice(), b"from-second");
    txn.resolve(Ok(()));
}

#[tokio::test]
async fn test_initial_children_start_with_the_input() {
    let (_file, conf) = file_config("preconfigured\n");
    let mut dynamic_conf = DynamicConfig::default();
    dynamic_conf.inputs.insert("boot".to_string(), conf);

    let ctx = test_context();
    let cancel = ctx.cancel.clone();
    let (mut input, handle) = spawn_dynamic(&dynamic_conf, &ctx).unwrap();
    let rx = input.transactions();

    let txn = rx.recv().await.unwrap();
    assert_eq!(txn.message().get(0).unwrap().as_slice(), b"preconfigured");
    txn.resolve(Ok(()));
    assert_eq!(handle.list_inputs().await.unwrap(), vec!["boot".to_string()]);

    cancel.cancel();
    input.wait_closed(Duration::from_secs(2)).await.unwrap();
}
