//! Configuration loading and graceful degradation tests
//!
//! Uses serial_test for the tests that touch process environment variables.

use sahayak_common::config::{
    env_override, load_toml_config, load_toml_config_or_default, write_toml_config,
    CompiledDefaults, LoggingConfig, TomlConfig,
};
use serial_test::serial;
use std::env;
use tempfile::TempDir;

#[test]
fn test_compiled_defaults() {
    let defaults = CompiledDefaults::default();

    assert_eq!(defaults.host, "127.0.0.1");
    assert_eq!(defaults.port, 8100);
    assert_eq!(defaults.content_service_url, "http://localhost:8000");
    assert_eq!(defaults.frontend_origin, "http://localhost:5173");
    assert_eq!(defaults.session_idle_timeout_secs, 3600);
    assert_eq!(defaults.log_level, "info");
    assert!(defaults.request_timeout_secs > 0);
    assert!(defaults.max_image_bytes > 0);
}

#[test]
fn test_missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.toml");

    let config = load_toml_config_or_default(&path);
    assert_eq!(config, TomlConfig::default());
}

#[test]
fn test_malformed_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(load_toml_config(&path).is_err());
    assert_eq!(load_toml_config_or_default(&path), TomlConfig::default());
}

#[test]
fn test_full_file_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sahayak-planner.toml");
    std::fs::write(
        &path,
        r#"
host = "0.0.0.0"
port = 9100
content_service_url = "http://backend:8000"
request_timeout_secs = 45
max_image_bytes = 2048
frontend_origin = "https://example.app.github.dev"
session_idle_timeout_secs = 900

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.port, Some(9100));
    assert_eq!(config.content_service_url.as_deref(), Some("http://backend:8000"));
    assert_eq!(config.request_timeout_secs, Some(45));
    assert_eq!(config.max_image_bytes, Some(2048));
    assert_eq!(
        config.frontend_origin.as_deref(),
        Some("https://example.app.github.dev")
    );
    assert_eq!(config.session_idle_timeout_secs, Some(900));
    assert_eq!(
        config.logging,
        LoggingConfig {
            level: "debug".to_string()
        }
    );
}

#[test]
fn test_write_then_load_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("sahayak").join("planner.toml");

    let config = TomlConfig {
        port: Some(8200),
        content_service_url: Some("http://localhost:9000".to_string()),
        ..Default::default()
    };
    write_toml_config(&config, &path).unwrap();

    assert!(path.exists());
    assert_eq!(load_toml_config(&path).unwrap(), config);
}

#[test]
#[serial]
fn test_env_override_ignores_blank_values() {
    env::set_var("SAHAYAK_TEST_OVERRIDE", "   ");
    assert_eq!(env_override("SAHAYAK_TEST_OVERRIDE"), None);

    env::set_var("SAHAYAK_TEST_OVERRIDE", " http://svc:8000 ");
    assert_eq!(
        env_override("SAHAYAK_TEST_OVERRIDE").as_deref(),
        Some("http://svc:8000")
    );

    env::remove_var("SAHAYAK_TEST_OVERRIDE");
    assert_eq!(env_override("SAHAYAK_TEST_OVERRIDE"), None);
}
