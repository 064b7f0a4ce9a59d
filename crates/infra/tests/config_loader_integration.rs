//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;

use codetrail_domain::CodetrailError;
use codetrail_infra::config;
use tempfile::NamedTempFile;

fn write_temp(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(contents.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension(extension);
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");
    path
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "api": {
            "base_url": "https://onprem.example/api/v2",
            "client_kind": "vscode",
            "request_timeout_ms": 2500
        },
        "tracking": {
            "idle_timeout_secs": 90,
            "console_enabled": true
        },
        "storage": {
            "base_dir": "/tmp/codetrail-json",
            "instance_id": "laptop"
        },
        "client": {
            "version": "1.5.2.0"
        }
    }"#;
    let path = write_temp(json_content, "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load JSON config");

    assert_eq!(config.api.base_url, "https://onprem.example/api/v2");
    assert_eq!(config.api.client_kind, "vscode");
    assert_eq!(config.api.request_timeout_ms, 2500);
    assert_eq!(config.api.connect_timeout_ms, 30_000);
    assert_eq!(config.tracking.idle_timeout_secs, 90);
    assert!(config.tracking.console_enabled);
    assert_eq!(config.storage.instance_id, "laptop");
    assert_eq!(config.storage.client_id, "intellij");
    assert_eq!(config.client.version, "1.5.2.0");

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
[api]
accept_invalid_certs = true

[tracking]
idle_check_interval_secs = 5
flush_interval_secs = 60

[storage]
track_sent = false
"#;
    let path = write_temp(toml_content, "toml");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load TOML config");

    assert!(config.api.accept_invalid_certs);
    assert_eq!(config.tracking.idle_check_interval_secs, 5);
    assert_eq!(config.tracking.flush_interval_secs, 60);
    assert_eq!(config.tracking.idle_timeout_secs, 60);
    assert!(!config.storage.track_sent);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_empty_file_yields_defaults() {
    let path = write_temp("{}", "json");

    let config = config::load_from_file(Some(path.clone())).expect("Failed to load empty config");
    assert_eq!(config, codetrail_domain::AgentConfig::default());

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_nonexistent_file() {
    let result = config::load_from_file(Some("/nonexistent/path/config.json".into()));

    match result {
        Err(CodetrailError::Config(msg)) => {
            assert!(msg.contains("not found"), "Error message should mention 'not found'");
        }
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_load_config_with_invalid_format() {
    let path = write_temp(r#"{ "this is": "not valid" "#, "json");

    match config::load_from_file(Some(path.clone())) {
        Err(CodetrailError::Config(msg)) => {
            assert!(msg.contains("Invalid JSON"), "Error message should mention invalid JSON");
        }
        other => panic!("Expected Config error, got {:?}", other),
    }

    std::fs::remove_file(path).ok();
}
