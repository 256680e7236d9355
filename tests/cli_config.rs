//! CLI Configuration Tests
//!
//! Tests for the command layer driven through its public entry points:
//! - init writes a config that run accepts
//! - run honors the configured queue settings
//! - invalid configs stop boot before any request is read

use lodedb::cli::{init, start};
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

fn create_temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

#[test]
fn test_init_then_run() {
    let temp = create_temp_dir();
    let path = temp.path().join("lodedb.json");
    init(&path).unwrap();

    let input = "{\"op\":\"insert\",\"collection\":\"c\",\"document\":{\"_id\":\"x\"}}\n{\"op\":\"stats\"}\n";
    let mut out = Vec::new();
    let stats = start(Some(path.as_path()), input.as_bytes(), &mut out).unwrap();
    assert_eq!(stats.entries_committed, 1);

    let last: Value = serde_json::from_str(String::from_utf8(out).unwrap().lines().last().unwrap()).unwrap();
    assert_eq!(last["data"]["queue_capacity"], 1024);
}

#[test]
fn test_run_uses_configured_capacity() {
    let temp = create_temp_dir();
    let path = temp.path().join("lodedb.json");
    fs::write(&path, r#"{"queue_capacity": 3, "batch_max_records": 2}"#).unwrap();

    let mut out = Vec::new();
    start(Some(path.as_path()), "{\"op\":\"stats\"}\n".as_bytes(), &mut out).unwrap();
    let stats: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(stats["data"]["queue_capacity"], 3);
    assert_eq!(stats["data"]["queue_phase"], "open");
}

#[test]
fn test_invalid_config_fails_boot() {
    let temp = create_temp_dir();
    let path = temp.path().join("lodedb.json");
    fs::write(&path, r#"{"queue_capacity": 3, "wal_sync_mode": "fsync"}"#).unwrap();

    let mut out = Vec::new();
    let err = start(Some(path.as_path()), "{\"op\":\"stats\"}\n".as_bytes(), &mut out).unwrap_err();
    assert_eq!(err.code_str(), "LODE_CLI_CONFIG_ERROR");
    assert!(out.is_empty());
}
