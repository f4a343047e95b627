//! Error types for lingo-server
//!
//! Every handler returns [`ApiResult`]. Responses carry a JSON body of the
//! form `{"error": <message>, "code": <CODE>}`; forbidden responses add the
//! roles that would have been accepted and the caller's role.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lingo_common::Role;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::feed::FeedError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    /// Invalid role value in an admin update (400)
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    /// No valid session (401)
    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    /// Authenticated but not permitted (403)
    #[error("Insufficient permissions")]
    Forbidden {
        required: &'static [Role],
        current: Role,
    },

    /// Resource not found (404)
    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    /// Conflict with existing data (409)
    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// lingo-common error
    #[error("{0}")]
    Common(#[from] lingo_common::Error),

    /// Change stream could not be opened
    #[error(transparent)]
    Feed(#[from] FeedError),
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        ApiError::Unauthorized {
            code: "UNAUTHORIZED",
            message: "Authentication required".to_string(),
        }
    }

    /// Missing or non-numeric `id` query parameter
    pub fn invalid_id() -> Self {
        Self::bad_request("INVALID_ID", "Valid ID is required")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, json!({ "error": message, "code": code }))
            }
            ApiError::InvalidRole(role) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": format!("Invalid role: {}", role),
                    "code": "INVALID_ROLE",
                    "valid_roles": Role::ALL,
                }),
            ),
            ApiError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message, "code": code }))
            }
            ApiError::Forbidden { required, current } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "Insufficient permissions",
                    "code": "FORBIDDEN",
                    "required": required,
                    "current": current,
                }),
            ),
            ApiError::NotFound { code, message } => {
                (StatusCode::NOT_FOUND, json!({ "error": message, "code": code }))
            }
            ApiError::Conflict { code, message } => {
                (StatusCode::CONFLICT, json!({ "error": message, "code": code }))
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                internal_error()
            }
            ApiError::Database(ref err) => {
                error!("Database error: {}", err);
                internal_error()
            }
            ApiError::Common(ref err) => {
                error!("Common error: {}", err);
                internal_error()
            }
            ApiError::Feed(ref err) => {
                error!("{}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Change stream unavailable", "code": "STREAM_SETUP_FAILED" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn internal_error() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "Internal server error", "code": "INTERNAL_ERROR" }),
    )
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_body_carries_code() {
        let response = ApiError::bad_request("MISSING_NAME", "Name is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Name is required");
        assert_eq!(body["code"], "MISSING_NAME");
    }

    #[tokio::test]
    async fn test_forbidden_lists_required_roles() {
        let response = ApiError::Forbidden {
            required: &[Role::Instructor, Role::Admin],
            current: Role::User,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_json(response).await;
        assert_eq!(body["code"], "FORBIDDEN");
        assert_eq!(body["required"], json!(["instructor", "admin"]));
        assert_eq!(body["current"], "user");
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let response = ApiError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_stored_role_error_is_internal() {
        let err: ApiError = "root".parse::<Role>().unwrap_err().into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn test_invalid_role_lists_valid_roles() {
        let body = body_json(ApiError::InvalidRole("root".to_string()).into_response()).await;
        assert_eq!(body["code"], "INVALID_ROLE");
        assert_eq!(body["valid_roles"], json!(["user", "premium", "instructor", "admin"]));
    }
}
