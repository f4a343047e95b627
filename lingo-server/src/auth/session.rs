//! Session tokens
//!
//! A token is 32 random bytes, hex encoded, handed to the client once.
//! The database keeps only its SHA-256 digest.

use axum::http::{header, HeaderMap};
use lingo_common::db::User;
use lingo_common::time::now_ms;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db::sessions::{self, NewSession};
use crate::error::ApiResult;

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "lingo.session_token";

const TOKEN_BYTES: usize = 32;

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Token from `Authorization: Bearer`, falling back to the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Newly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: i64,
}

impl IssuedSession {
    /// `Set-Cookie` value for this session
    pub fn cookie(&self, ttl_hours: i64) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            self.token,
            ttl_hours * 3600
        )
    }
}

/// `Set-Cookie` value that clears the session cookie
pub fn clear_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

/// Issue a session for `user_id` valid for `ttl_hours`
pub async fn issue_session(
    db: &SqlitePool,
    user_id: &str,
    ttl_hours: i64,
    headers: &HeaderMap,
) -> ApiResult<IssuedSession> {
    let token = generate_token();
    let token_hash = hash_token(&token);
    let expires_at = now_ms() + ttl_hours * 3_600_000;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok());
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim);

    sessions::insert_session(
        db,
        NewSession {
            token_hash: &token_hash,
            user_id,
            expires_at,
            ip_address,
            user_agent,
        },
    )
    .await?;

    debug!("Issued session for user {}", user_id);
    Ok(IssuedSession { token, expires_at })
}

/// User behind the request's token, if it names a live session of an
/// active account
pub async fn resolve_user(db: &SqlitePool, headers: &HeaderMap) -> ApiResult<Option<User>> {
    let Some(token) = token_from_headers(headers) else {
        return Ok(None);
    };

    Ok(sessions::find_active_user(db, &hash_token(&token)).await?)
}

/// Revoke the request's session. Returns whether one was removed.
pub async fn revoke_session(db: &SqlitePool, headers: &HeaderMap) -> ApiResult<bool> {
    let Some(token) = token_from_headers(headers) else {
        return Ok(false);
    };

    Ok(sessions::delete_session(db, &hash_token(&token)).await?)
}
