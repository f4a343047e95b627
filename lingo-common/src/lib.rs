//! # Lingo Common Library
//!
//! Shared code for the Lingo language-learning service:
//! - Error type and `Result` alias
//! - Configuration loading (CLI > env > TOML > defaults)
//! - Millisecond clock helpers used for row timestamps
//! - Roles, capabilities and the route access policy
//! - Change-feed event types (SSE wire format)
//! - Database schema initialization and row models

pub mod access;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod time;

pub use access::{Capability, Role};
pub use error::{Error, Result};
pub use events::ChangeEvent;
