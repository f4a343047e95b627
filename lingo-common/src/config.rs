//! Configuration loading
//!
//! Resolution priority for every setting:
//! 1. Command-line argument (clap, which also folds in `LINGO_*` env vars)
//! 2. Environment variable (`COURSE_SSE_POLL_MS` for the feed interval)
//! 3. TOML config file
//! 4. Compiled default
//!
//! [`load_toml_config`] reports a missing or malformed file as an error;
//! the server logs it and carries on with defaults.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the change-feed poll interval (ms)
pub const POLL_INTERVAL_ENV: &str = "COURSE_SSE_POLL_MS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
pub const DEFAULT_KEEPALIVE_INTERVAL_MS: u64 = 15000;
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;
/// Upper bound for `session_ttl_hours` (one year)
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// TOML configuration file contents. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub auth: AuthSection,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedSection {
    pub poll_interval_ms: Option<u64>,
    pub keepalive_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSection {
    pub session_ttl_hours: Option<i64>,
    pub min_password_length: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `lingo_server=debug`
    pub level: Option<String>,
}

/// Values supplied on the command line (or their `LINGO_*` env fallbacks)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub poll_interval_ms: u64,
    pub keepalive_interval_ms: u64,
    pub session_ttl_hours: i64,
    pub min_password_length: usize,
}

impl Settings {
    /// Merge CLI overrides, environment and TOML over compiled defaults
    pub fn resolve(cli: CliOverrides, toml: TomlConfig) -> Result<Self> {
        let env_poll = poll_interval_from_env()?;

        let settings = Settings {
            host: cli
                .host
                .or(toml.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(toml.server.port).unwrap_or(DEFAULT_PORT),
            database_path: cli
                .database_path
                .or(toml.database.path)
                .unwrap_or_else(default_database_path),
            poll_interval_ms: env_poll
                .or(toml.feed.poll_interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            keepalive_interval_ms: toml
                .feed
                .keepalive_interval_ms
                .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL_MS),
            session_ttl_hours: toml
                .auth
                .session_ttl_hours
                .unwrap_or(DEFAULT_SESSION_TTL_HOURS),
            min_password_length: toml
                .auth
                .min_password_length
                .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH),
        };

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be positive".to_string()));
        }
        if self.keepalive_interval_ms == 0 {
            return Err(Error::Config("keepalive_interval_ms must be positive".to_string()));
        }
        if self.session_ttl_hours <= 0 {
            return Err(Error::Config("session_ttl_hours must be positive".to_string()));
        }
        if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            return Err(Error::Config(format!(
                "session_ttl_hours must be at most {}",
                MAX_SESSION_TTL_HOURS
            )));
        }
        Ok(())
    }
}

/// Read the poll interval from `COURSE_SSE_POLL_MS`
///
/// Unset yields `None`; a value that is not a positive integer is a
/// configuration error rather than a silent fallback.
pub fn poll_interval_from_env() -> Result<Option<u64>> {
    match std::env::var(POLL_INTERVAL_ENV) {
        Ok(raw) => {
            let ms = raw.trim().parse::<u64>().map_err(|e| {
                Error::Config(format!("{} must be milliseconds ({:?}): {}", POLL_INTERVAL_ENV, raw, e))
            })?;
            if ms == 0 {
                return Err(Error::Config(format!("{} must be positive", POLL_INTERVAL_ENV)));
            }
            Ok(Some(ms))
        }
        Err(_) => Ok(None),
    }
}

/// Parse a TOML configuration file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lingo"))
        .unwrap_or_else(|| PathBuf::from("./lingo_data"))
        .join("lingo.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_sections_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [feed]
            poll_interval_ms = 2000

            [auth]
            session_ttl_hours = 12
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, Some(8080));
        assert!(config.server.host.is_none());
        assert_eq!(config.feed.poll_interval_ms, Some(2000));
        assert_eq!(config.auth.session_ttl_hours, Some(12));
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_empty_toml_is_valid() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_default_database_path_names_file() {
        assert!(default_database_path().ends_with("lingo.db"));
    }
}
