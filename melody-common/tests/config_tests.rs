//! Integration tests for configuration loading
//!
//! Covers:
//! - Explicit config file loading and missing-file handling
//! - Environment overrides on top of TOML values
//! - Validation of mandatory credentials
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate SPOTIFY_* / LLMPROXY_* variables are marked with
//! #[serial] so they run sequentially, not in parallel.

use melody_common::config::TomlConfig;
use melody_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const OVERRIDE_VARS: &[&str] = &[
    "SPOTIFY_CLIENT_ID",
    "SPOTIFY_CLIENT_SECRET",
    "SPOTIFY_REDIRECT_URI",
    "SPOTIFY_USER_ID",
    "SPOTIFY_REFRESH_TOKEN",
    "LLMPROXY_ENDPOINT",
    "LLMPROXY_API_KEY",
    "MELODY_LOG_LEVEL",
];

fn clear_env() {
    for var in OVERRIDE_VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, content: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

const FULL_CONFIG: &str = r#"
http_timeout_secs = 20

[server]
port = 6001

[generation]
endpoint = "https://llm.example.com/generate"
api_key = "file-key"
temperature = 0.5

[catalog]
client_id = "file-client"
client_secret = "file-secret"
owner_user_id = "helloniam"
"#;

#[test]
#[serial]
fn test_explicit_file_is_loaded() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    let config = TomlConfig::load(Some(&path)).unwrap();

    assert_eq!(config.server.port, 6001);
    assert_eq!(config.http_timeout_secs, 20);
    assert_eq!(config.generation.api_key.as_deref(), Some("file-key"));
    assert_eq!(config.catalog.owner_user_id.as_deref(), Some("helloniam"));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_missing_explicit_file_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let result = TomlConfig::load(Some(&path));

    match result {
        Err(Error::Config(msg)) => assert!(msg.contains("not found")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    env::set_var("SPOTIFY_CLIENT_ID", "env-client");
    env::set_var("LLMPROXY_API_KEY", "env-key");
    env::set_var("SPOTIFY_REDIRECT_URI", "http://127.0.0.1:5001/callback");
    env::set_var("MELODY_LOG_LEVEL", "debug");

    let config = TomlConfig::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.catalog.client_id.as_deref(), Some("env-client"));
    assert_eq!(config.generation.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.catalog.redirect_uri, "http://127.0.0.1:5001/callback");
    assert_eq!(config.logging.level, "debug");
    // Untouched values still come from the file
    assert_eq!(config.catalog.client_secret.as_deref(), Some("file-secret"));
}

#[test]
#[serial]
fn test_blank_env_value_does_not_erase_file_value() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, FULL_CONFIG);

    env::set_var("SPOTIFY_USER_ID", "   ");
    let config = TomlConfig::load(Some(&path)).unwrap();
    clear_env();

    assert_eq!(config.catalog.owner_user_id.as_deref(), Some("helloniam"));
}

#[test]
#[serial]
fn test_env_alone_satisfies_validation() {
    clear_env();
    env::set_var("SPOTIFY_CLIENT_ID", "id");
    env::set_var("SPOTIFY_CLIENT_SECRET", "secret");
    env::set_var("SPOTIFY_USER_ID", "owner");
    env::set_var("LLMPROXY_ENDPOINT", "https://llm.example.com");
    env::set_var("LLMPROXY_API_KEY", "key");

    let mut config = TomlConfig::default();
    config.apply_env_overrides();
    clear_env();

    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_out_of_range_temperature_rejected() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, &FULL_CONFIG.replace("temperature = 0.5", "temperature = 3.5"));

    let config = TomlConfig::load(Some(&path)).unwrap();

    assert!(matches!(config.validate(), Err(Error::InvalidInput(_))));
}
