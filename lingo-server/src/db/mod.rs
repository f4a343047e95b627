//! Repository functions over the Lingo schema
//!
//! Schema creation lives in `lingo_common::db`; this module holds the
//! queries the HTTP handlers run. Writes that touch catalog rows stamp
//! `next_timestamp_ms()` so change-feed versions always move forward.

pub mod analytics;
pub mod content;
pub mod courses;
pub mod progress;
pub mod quiz_results;
pub mod sessions;
pub mod users;
pub mod vocabulary;

/// Whether an error is a UNIQUE constraint violation
pub fn is_unique_violation(err: &lingo_common::Error) -> bool {
    match err {
        lingo_common::Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}
