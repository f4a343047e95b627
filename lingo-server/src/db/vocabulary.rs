//! Words a learner has saved

use lingo_common::db::LearnedWord;
use lingo_common::{time::now_ms, Result};
use sqlx::SqlitePool;

use crate::pagination::Page;

const WORD_COLUMNS: &str = "id, user_id, language_code, word, translation, learned_at, times_reviewed";

#[derive(Debug, Clone, Default)]
pub struct WordChanges {
    pub word: Option<String>,
    pub translation: Option<String>,
    pub times_reviewed: Option<i64>,
}

impl WordChanges {
    pub fn is_empty(&self) -> bool {
        self.word.is_none() && self.translation.is_none() && self.times_reviewed.is_none()
    }
}

pub async fn find_word(db: &SqlitePool, id: i64) -> Result<Option<LearnedWord>> {
    let word = sqlx::query_as(&format!("SELECT {} FROM learned_vocabulary WHERE id = ?", WORD_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(word)
}

/// Whether the user already saved `word` for `language_code`
/// (case-insensitive)
pub async fn word_exists(
    db: &SqlitePool,
    user_id: &str,
    language_code: &str,
    word: &str,
) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT 1 FROM learned_vocabulary
        WHERE user_id = ? AND language_code = ? AND lower(word) = lower(?)
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(language_code)
    .bind(word)
    .fetch_optional(db)
    .await?;

    Ok(found.is_some())
}

/// Newest first, optionally filtered by language and a word/translation
/// substring
pub async fn list_words(
    db: &SqlitePool,
    user_id: &str,
    language_code: Option<&str>,
    search: Option<&str>,
    page: Page,
) -> Result<Vec<LearnedWord>> {
    let pattern = search.map(|s| format!("%{}%", s.to_lowercase()));

    let words = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM learned_vocabulary
        WHERE user_id = ?1
          AND (?2 IS NULL OR language_code = ?2)
          AND (?3 IS NULL OR lower(word) LIKE ?3 OR lower(translation) LIKE ?3)
        ORDER BY learned_at DESC, id DESC
        LIMIT ?4 OFFSET ?5
        "#,
        WORD_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .bind(pattern)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    Ok(words)
}

pub async fn insert_word(
    db: &SqlitePool,
    user_id: &str,
    language_code: &str,
    word: &str,
    translation: &str,
) -> Result<LearnedWord> {
    let stored = sqlx::query_as(&format!(
        r#"
        INSERT INTO learned_vocabulary (user_id, language_code, word, translation, learned_at, times_reviewed)
        VALUES (?, ?, ?, ?, ?, 0)
        RETURNING {}
        "#,
        WORD_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .bind(word)
    .bind(translation)
    .bind(now_ms())
    .fetch_one(db)
    .await?;

    Ok(stored)
}

pub async fn update_word(db: &SqlitePool, id: i64, changes: &WordChanges) -> Result<Option<LearnedWord>> {
    let updated = sqlx::query_as(&format!(
        r#"
        UPDATE learned_vocabulary
        SET word = COALESCE(?, word),
            translation = COALESCE(?, translation),
            times_reviewed = COALESCE(?, times_reviewed)
        WHERE id = ?
        RETURNING {}
        "#,
        WORD_COLUMNS
    ))
    .bind(&changes.word)
    .bind(&changes.translation)
    .bind(changes.times_reviewed)
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(updated)
}

pub async fn delete_word(db: &SqlitePool, id: i64) -> Result<Option<LearnedWord>> {
    let deleted = sqlx::query_as(&format!(
        "DELETE FROM learned_vocabulary WHERE id = ? RETURNING {}",
        WORD_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(deleted)
}
