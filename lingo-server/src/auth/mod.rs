//! Authentication and authorization
//!
//! - `password`: Argon2 hashing
//! - `session`: opaque session tokens (Bearer header or cookie)
//! - `guard`: route policy middleware and the `CurrentUser` extractor

pub mod guard;
pub mod password;
pub mod session;

pub use guard::{access_guard, CurrentUser};
