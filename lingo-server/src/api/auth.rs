//! Sign-up, sign-in, sign-out and session lookup

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use lingo_common::db::User;
use lingo_common::Role;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{password, session, CurrentUser};
use crate::db::{self, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: User,
}

fn required(value: Option<String>, code: &'static str, message: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::bad_request(code, message))
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized {
        code: "INVALID_CREDENTIALS",
        message: "Invalid email or password".to_string(),
    }
}

/// POST /api/auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let name = required(body.name, "MISSING_NAME", "Name is required")?;
    let email = required(body.email, "MISSING_EMAIL", "Email is required")?.to_lowercase();
    let password = body.password.unwrap_or_default();

    if !email.contains('@') {
        return Err(ApiError::bad_request("INVALID_EMAIL", "Email address is not valid"));
    }
    if password.chars().count() < state.auth.min_password_length {
        return Err(ApiError::bad_request(
            "WEAK_PASSWORD",
            format!(
                "Password must be at least {} characters",
                state.auth.min_password_length
            ),
        ));
    }

    if users::find_row_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::conflict("EMAIL_TAKEN", "Email is already registered"));
    }

    let password_hash = password::hash_password(&password)?;
    let user = users::create_user(&state.db, &name, &email, &password_hash, Role::User)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::conflict("EMAIL_TAKEN", "Email is already registered")
            } else {
                e.into()
            }
        })?;

    info!("New account {} ({})", user.id, user.email);
    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SignInRequest>,
) -> ApiResult<Response> {
    let email = body.email.unwrap_or_default().trim().to_lowercase();
    let password = body.password.unwrap_or_default();

    let Some(row) = users::find_row_by_email(&state.db, &email).await? else {
        return Err(invalid_credentials());
    };
    if !row.is_active || !password::verify_password(&password, &row.password_hash) {
        warn!("Failed sign-in for {}", email);
        return Err(invalid_credentials());
    }

    let user = row.into_user()?;
    let issued =
        session::issue_session(&state.db, &user.id, state.auth.session_ttl_hours, &headers).await?;
    let cookie = issued.cookie(state.auth.session_ttl_hours);

    info!("User {} signed in", user.id);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(SignInResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }),
    )
        .into_response())
}

/// POST /api/auth/sign-out
///
/// Always clears the cookie; reports whether a session was revoked.
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let revoked = session::revoke_session(&state.db, &headers).await?;

    Ok((
        [(header::SET_COOKIE, session::clear_cookie())],
        Json(json!({ "success": true, "revoked": revoked })),
    )
        .into_response())
}

/// GET /api/auth/session
pub async fn current_session(user: CurrentUser) -> Json<User> {
    Json(user.0)
}
