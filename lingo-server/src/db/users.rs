//! User accounts

use lingo_common::db::{User, UserRow};
use lingo_common::{time::next_timestamp_ms, Result, Role};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::pagination::Page;

const USER_COLUMNS: &str = "id, name, email, email_verified, image, role, is_active, \
                            password_hash, created_at, updated_at";

pub async fn find_by_id(db: &SqlitePool, id: &str) -> Result<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await?;

    row.map(UserRow::into_user).transpose()
}

/// Raw row including the password hash, for sign-in
pub async fn find_row_by_email(db: &SqlitePool, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query_as(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Insert a new account with a fresh id
pub async fn create_user(
    db: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<User> {
    let id = Uuid::new_v4().to_string();
    let now = next_timestamp_ms();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, email_verified, image, role, is_active,
                           password_hash, created_at, updated_at)
        VALUES (?, ?, ?, 0, NULL, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(name)
    .bind(email)
    .bind(role.as_str())
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?;

    Ok(User {
        id,
        name: name.to_string(),
        email: email.to_string(),
        email_verified: false,
        image: None,
        role,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Update name, and image when given. `None` if the user does not exist.
pub async fn update_profile(
    db: &SqlitePool,
    id: &str,
    name: &str,
    image: Option<&str>,
) -> Result<Option<User>> {
    let result = sqlx::query(
        "UPDATE users SET name = ?, image = COALESCE(?, image), updated_at = ? WHERE id = ?",
    )
    .bind(name)
    .bind(image)
    .bind(next_timestamp_ms())
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(db, id).await
}

/// Admin update of role and/or active flag. `None` if the user does not
/// exist.
pub async fn update_access(
    db: &SqlitePool,
    id: &str,
    role: Option<Role>,
    is_active: Option<bool>,
) -> Result<Option<User>> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET role = COALESCE(?, role),
            is_active = COALESCE(?, is_active),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(role.map(|r| r.as_str()))
    .bind(is_active)
    .bind(next_timestamp_ms())
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(db, id).await
}

/// Newest accounts first, optionally filtered by name/email substring
pub async fn list_users(db: &SqlitePool, search: Option<&str>, page: Page) -> Result<Vec<User>> {
    let pattern = search.map(|s| format!("%{}%", s));

    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM users
        WHERE (?1 IS NULL OR name LIKE ?1 OR email LIKE ?1)
        ORDER BY created_at DESC
        LIMIT ?2 OFFSET ?3
        "#,
        USER_COLUMNS
    ))
    .bind(pattern)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    rows.into_iter().map(UserRow::into_user).collect()
}
