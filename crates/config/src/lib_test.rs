//! Configuration loading tests

use std::str::FromStr;

use crate::{Config, ConfigError, LogFormat};

#[test]
fn test_empty_document_gets_full_defaults() {
    let config = Config::from_str("{}").unwrap();

    assert_eq!(config.input.kind, "stdin");
    assert_eq!(config.buffer.kind, "none");
    assert_eq!(config.pipeline.threads, 1);
    assert_eq!(config.output.kind, "stdout");
    assert_eq!(config.logger.level, "info");
    assert_eq!(config.metrics.kind, "none");
    assert_eq!(config.shutdown_timeout_secs, 20);
}

#[test]
fn test_yaml_topology_parses() {
    let doc = r#"
input:
  type: file
  file:
    paths: [in.txt]
  processors:
    - type: split
pipeline:
  threads: 4
  processors:
    - type: filter
      filter:
        condition:
          type: content
          content:
            operator: contains
            arg: keep
output:
  type: broker
  broker:
    pattern: round_robin
    outputs:
      - type: file
        file:
          path: a.log
      - type: file
        file:
          path: b.log
"#;
    let config = Config::from_str(doc).unwrap();

    assert_eq!(config.input.kind, "file");
    assert_eq!(config.input.file.paths.len(), 1);
    assert_eq!(config.input.processors.len(), 1);
    assert_eq!(config.pipeline.threads, 4);
    assert_eq!(config.output.broker.outputs.len(), 2);
    assert_eq!(config.output.broker.pattern, "round_robin");
}

#[test]
fn test_json_document_parses_as_yaml_superset() {
    let doc = r#"{"input": {"type": "stdin"}, "output": {"type": "stdout"}}"#;
    let config = Config::from_str(doc).unwrap();
    assert_eq!(config.input.kind, "stdin");
}

#[test]
fn test_logger_and_metrics_sections() {
    let doc = "logger:\n  level: debug\n  format: json\nmetrics:\n  type: logger\n";
    let config = Config::from_str(doc).unwrap();

    assert_eq!(config.logger.level, "debug");
    assert_eq!(config.logger.format, LogFormat::Json);
    assert_eq!(config.metrics.kind, "logger");
}

#[test]
fn test_zero_pipeline_threads_rejected() {
    let result = Config::from_str("pipeline:\n  threads: 0\n");
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_zero_memory_limit_rejected() {
    let doc = "buffer:\n  type: memory\n  memory:\n    limit: 0\n";
    assert!(matches!(
        Config::from_str(doc),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn test_nested_read_until_config() {
    let doc = r#"
input:
  type: read_until
  read_until:
    restart_input: true
    condition:
      type: content
      content:
        operator: equals
        arg: STOP
    input:
      type: file
      file:
        paths: [stream.txt]
"#;
    let config = Config::from_str(doc).unwrap();
    let child = config.input.read_until.input.as_deref().unwrap();

    assert!(config.input.read_until.restart_input);
    assert_eq!(child.kind, "file");
    assert_eq!(config.input.read_until.condition.content.arg, "STOP");
}

#[test]
fn test_from_file_json_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weir.json");
    std::fs::write(&path, r#"{"pipeline": {"threads": 2}}"#).unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.pipeline.threads, 2);
}

#[test]
fn test_missing_file_errors() {
    assert!(matches!(
        Config::from_file("/no/such/config.yaml"),
        Err(ConfigError::Io(_, _))
    ));
}
