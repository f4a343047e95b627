//! HTTP API handlers for lingo-server

pub mod analytics;
pub mod auth;
pub mod content;
pub mod courses;
pub mod feed;
pub mod health;
pub mod progress;
pub mod quiz_results;
pub mod users;
pub mod vocabulary;

pub use health::health_routes;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// `?id=` on learner-record endpoints
#[derive(Debug, Default, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

/// Parse a numeric record id; missing or malformed ids are `INVALID_ID`
pub(crate) fn parse_id(raw: Option<&str>) -> ApiResult<i64> {
    raw.and_then(|id| id.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(ApiError::invalid_id)
}

#[derive(Serialize)]
struct DeletedResponse<T> {
    message: &'static str,
    deleted_record: T,
}

/// Unmatched paths. Page routes that pass the guard land here too.
pub async fn fallback() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Route not found")
}

/// Body returned by every learner-record DELETE
pub(crate) fn deleted<T: Serialize>(message: &'static str, record: T) -> Response {
    Json(DeletedResponse {
        message,
        deleted_record: record,
    })
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(Some("42")).unwrap(), 42);
        assert_eq!(parse_id(Some(" 7 ")).unwrap(), 7);
        assert!(parse_id(None).is_err());
        assert!(parse_id(Some("abc")).is_err());
        assert!(parse_id(Some("0")).is_err());
        assert!(parse_id(Some("-3")).is_err());
    }
}
