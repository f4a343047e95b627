//! Unit tests for configuration resolution
//!
//! Tests the priority order CLI > environment > TOML > compiled default
//! and the errors reported for missing or malformed config files.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate COURSE_SSE_POLL_MS are marked with #[serial].

use lingo_common::config::{
    load_toml_config, CliOverrides, Settings, TomlConfig,
    DEFAULT_KEEPALIVE_INTERVAL_MS, DEFAULT_POLL_INTERVAL_MS, DEFAULT_PORT, MAX_SESSION_TTL_HOURS,
    POLL_INTERVAL_ENV,
};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn toml(text: &str) -> TomlConfig {
    toml::from_str(text).expect("test TOML should parse")
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    env::remove_var(POLL_INTERVAL_ENV);

    let settings = Settings::resolve(CliOverrides::default(), TomlConfig::default()).unwrap();

    assert_eq!(settings.host, "127.0.0.1");
    assert_eq!(settings.port, DEFAULT_PORT);
    assert_eq!(settings.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    assert_eq!(settings.keepalive_interval_ms, DEFAULT_KEEPALIVE_INTERVAL_MS);
    assert_eq!(settings.session_ttl_hours, 168);
    assert_eq!(settings.min_password_length, 8);
    assert!(settings.database_path.ends_with("lingo.db"));
}

#[test]
#[serial]
fn test_cli_overrides_toml() {
    env::remove_var(POLL_INTERVAL_ENV);

    let cli = CliOverrides {
        host: Some("0.0.0.0".to_string()),
        port: Some(9000),
        database_path: Some(PathBuf::from("/tmp/cli.db")),
    };
    let file = toml(
        r#"
        [server]
        host = "10.0.0.1"
        port = 8000

        [database]
        path = "/tmp/toml.db"
        "#,
    );

    let settings = Settings::resolve(cli, file).unwrap();
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.port, 9000);
    assert_eq!(settings.database_path, PathBuf::from("/tmp/cli.db"));
}

#[test]
#[serial]
fn test_toml_used_when_cli_absent() {
    env::remove_var(POLL_INTERVAL_ENV);

    let file = toml(
        r#"
        [server]
        port = 8000

        [feed]
        poll_interval_ms = 1500
        keepalive_interval_ms = 4000
        "#,
    );

    let settings = Settings::resolve(CliOverrides::default(), file).unwrap();
    assert_eq!(settings.port, 8000);
    assert_eq!(settings.poll_interval_ms, 1500);
    assert_eq!(settings.keepalive_interval_ms, 4000);
}

#[test]
#[serial]
fn test_poll_env_overrides_toml() {
    env::set_var(POLL_INTERVAL_ENV, "750");

    let file = toml("[feed]\npoll_interval_ms = 1500\n");
    let settings = Settings::resolve(CliOverrides::default(), file).unwrap();
    assert_eq!(settings.poll_interval_ms, 750);

    env::remove_var(POLL_INTERVAL_ENV);
}

#[test]
#[serial]
fn test_invalid_poll_env_is_config_error() {
    env::set_var(POLL_INTERVAL_ENV, "fast");
    let result = Settings::resolve(CliOverrides::default(), TomlConfig::default());
    assert!(result.is_err());

    env::set_var(POLL_INTERVAL_ENV, "0");
    let result = Settings::resolve(CliOverrides::default(), TomlConfig::default());
    assert!(result.is_err());

    env::remove_var(POLL_INTERVAL_ENV);
}

#[test]
#[serial]
fn test_zero_session_ttl_rejected() {
    env::remove_var(POLL_INTERVAL_ENV);
    let file = toml("[auth]\nsession_ttl_hours = 0\n");
    assert!(Settings::resolve(CliOverrides::default(), file).is_err());
}

#[test]
#[serial]
fn test_session_ttl_upper_bound() {
    env::remove_var(POLL_INTERVAL_ENV);

    let at_limit = toml(&format!("[auth]\nsession_ttl_hours = {}\n", MAX_SESSION_TTL_HOURS));
    let settings = Settings::resolve(CliOverrides::default(), at_limit).unwrap();
    assert_eq!(settings.session_ttl_hours, MAX_SESSION_TTL_HOURS);

    let huge = toml("[auth]\nsession_ttl_hours = 9223372036854775807\n");
    assert!(matches!(
        Settings::resolve(CliOverrides::default(), huge),
        Err(lingo_common::Error::Config(_))
    ));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let missing = PathBuf::from("/nonexistent/lingo/config.toml");
    assert!(matches!(
        load_toml_config(&missing),
        Err(lingo_common::Error::Io(_))
    ));
}

#[test]
fn test_config_file_loaded_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lingo.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "[logging]\nlevel = \"debug\"\n\n[auth]\nmin_password_length = 12").unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.logging.level.as_deref(), Some("debug"));
    assert_eq!(config.auth.min_password_length, Some(12));
}

#[test]
fn test_malformed_config_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[server\nport = ").unwrap();

    assert!(matches!(
        load_toml_config(&path),
        Err(lingo_common::Error::Config(_))
    ));
}
