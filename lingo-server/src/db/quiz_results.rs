//! Completed quiz attempts

use lingo_common::db::QuizResult;
use lingo_common::{time::now_ms, Result};
use sqlx::SqlitePool;

use crate::pagination::Page;

const RESULT_COLUMNS: &str =
    "id, user_id, language_code, quiz_type, score, total_questions, completed_at";

pub async fn find_result(db: &SqlitePool, id: i64) -> Result<Option<QuizResult>> {
    let result = sqlx::query_as(&format!("SELECT {} FROM quiz_results WHERE id = ?", RESULT_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(result)
}

/// Most recent first
pub async fn list_results(
    db: &SqlitePool,
    user_id: &str,
    language_code: Option<&str>,
    page: Page,
) -> Result<Vec<QuizResult>> {
    let results = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM quiz_results
        WHERE user_id = ?1 AND (?2 IS NULL OR language_code = ?2)
        ORDER BY completed_at DESC, id DESC
        LIMIT ?3 OFFSET ?4
        "#,
        RESULT_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    Ok(results)
}

pub async fn insert_result(
    db: &SqlitePool,
    user_id: &str,
    language_code: &str,
    quiz_type: &str,
    score: i64,
    total_questions: i64,
) -> Result<QuizResult> {
    let result = sqlx::query_as(&format!(
        r#"
        INSERT INTO quiz_results (user_id, language_code, quiz_type, score, total_questions, completed_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        RESULT_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .bind(quiz_type)
    .bind(score)
    .bind(total_questions)
    .bind(now_ms())
    .fetch_one(db)
    .await?;

    Ok(result)
}

/// Overwrite the editable fields with already-merged values
pub async fn update_result(
    db: &SqlitePool,
    id: i64,
    quiz_type: &str,
    score: i64,
    total_questions: i64,
) -> Result<Option<QuizResult>> {
    let result = sqlx::query_as(&format!(
        r#"
        UPDATE quiz_results SET quiz_type = ?, score = ?, total_questions = ?
        WHERE id = ?
        RETURNING {}
        "#,
        RESULT_COLUMNS
    ))
    .bind(quiz_type)
    .bind(score)
    .bind(total_questions)
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(result)
}

pub async fn delete_result(db: &SqlitePool, id: i64) -> Result<Option<QuizResult>> {
    let deleted = sqlx::query_as(&format!(
        "DELETE FROM quiz_results WHERE id = ? RETURNING {}",
        RESULT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(deleted)
}
