//! Failures raised below the HTTP layer
//!
//! Storage and startup code returns [`Result`]; the server maps each variant
//! onto an API response.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Creating the data directory or reading the config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected setting from the TOML file or environment
    #[error("Configuration error: {0}")]
    Config(String),

    /// Role name outside user/premium/instructor/admin
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Stored data that cannot be encoded or read back
    #[error("Internal error: {0}")]
    Internal(String),
}
