//! Session rows. Only the SHA-256 of a token is ever stored.

use lingo_common::db::{User, UserRow};
use lingo_common::{time::now_ms, Result};
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct NewSession<'a> {
    pub token_hash: &'a str,
    pub user_id: &'a str,
    pub expires_at: i64,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

pub async fn insert_session(db: &SqlitePool, session: NewSession<'_>) -> Result<()> {
    let now = now_ms();

    sqlx::query(
        r#"
        INSERT INTO sessions (id, token_hash, user_id, expires_at, ip_address, user_agent,
                              created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(session.token_hash)
    .bind(session.user_id)
    .bind(session.expires_at)
    .bind(session.ip_address)
    .bind(session.user_agent)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(())
}

/// Owner of an unexpired session whose account is active
pub async fn find_active_user(db: &SqlitePool, token_hash: &str) -> Result<Option<User>> {
    let row: Option<UserRow> = sqlx::query_as(
        r#"
        SELECT u.id, u.name, u.email, u.email_verified, u.image, u.role, u.is_active,
               u.password_hash, u.created_at, u.updated_at
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = ? AND s.expires_at > ? AND u.is_active = 1
        "#,
    )
    .bind(token_hash)
    .bind(now_ms())
    .fetch_optional(db)
    .await?;

    row.map(UserRow::into_user).transpose()
}

/// Returns whether a session was removed
pub async fn delete_session(db: &SqlitePool, token_hash: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
        .bind(token_hash)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Drop every expired session, returning how many were removed
pub async fn purge_expired(db: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now_ms())
        .execute(db)
        .await?;

    Ok(result.rows_affected())
}
