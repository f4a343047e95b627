//! Per-language learner progress and per-course lesson progress

use lingo_common::db::{UserCourseProgress, UserProgress};
use lingo_common::{time::next_timestamp_ms, Result};
use sqlx::SqlitePool;

const PROGRESS_COLUMNS: &str = "id, user_id, language_code, words_learned, lessons_completed, \
                                quizzes_passed, current_streak, last_practice_date, created_at, updated_at";

/// Partial update of a progress record; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct ProgressChanges {
    pub language_code: Option<String>,
    pub words_learned: Option<i64>,
    pub lessons_completed: Option<i64>,
    pub quizzes_passed: Option<i64>,
    pub current_streak: Option<i64>,
    pub last_practice_date: Option<i64>,
}

pub async fn find_progress(db: &SqlitePool, id: i64) -> Result<Option<UserProgress>> {
    let progress = sqlx::query_as(&format!("SELECT {} FROM user_progress WHERE id = ?", PROGRESS_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(progress)
}

pub async fn find_progress_for_language(
    db: &SqlitePool,
    user_id: &str,
    language_code: &str,
) -> Result<Option<UserProgress>> {
    let progress = sqlx::query_as(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ? AND language_code = ?",
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .fetch_optional(db)
    .await?;

    Ok(progress)
}

pub async fn list_progress(db: &SqlitePool, user_id: &str) -> Result<Vec<UserProgress>> {
    let progress = sqlx::query_as(&format!(
        "SELECT {} FROM user_progress WHERE user_id = ? ORDER BY language_code ASC",
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(progress)
}

/// Update the (user, language) record if present, create it otherwise
///
/// Returns the stored record and `true` when it was created. New records
/// start every counter at zero before `changes` apply.
pub async fn upsert_progress(
    db: &SqlitePool,
    user_id: &str,
    language_code: &str,
    changes: &ProgressChanges,
) -> Result<(UserProgress, bool)> {
    if let Some(existing) = find_progress_for_language(db, user_id, language_code).await? {
        let updated = update_progress(db, existing.id, changes).await?;
        return Ok((updated.unwrap_or(existing), false));
    }

    let now = next_timestamp_ms();
    let created = sqlx::query_as(&format!(
        r#"
        INSERT INTO user_progress (user_id, language_code, words_learned, lessons_completed,
                                   quizzes_passed, current_streak, last_practice_date,
                                   created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {}
        "#,
        PROGRESS_COLUMNS
    ))
    .bind(user_id)
    .bind(language_code)
    .bind(changes.words_learned.unwrap_or(0))
    .bind(changes.lessons_completed.unwrap_or(0))
    .bind(changes.quizzes_passed.unwrap_or(0))
    .bind(changes.current_streak.unwrap_or(0))
    .bind(changes.last_practice_date)
    .bind(now)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok((created, true))
}

/// `None` if the record does not exist
pub async fn update_progress(
    db: &SqlitePool,
    id: i64,
    changes: &ProgressChanges,
) -> Result<Option<UserProgress>> {
    let progress = sqlx::query_as(&format!(
        r#"
        UPDATE user_progress
        SET language_code = COALESCE(?, language_code),
            words_learned = COALESCE(?, words_learned),
            lessons_completed = COALESCE(?, lessons_completed),
            quizzes_passed = COALESCE(?, quizzes_passed),
            current_streak = COALESCE(?, current_streak),
            last_practice_date = COALESCE(?, last_practice_date),
            updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        PROGRESS_COLUMNS
    ))
    .bind(&changes.language_code)
    .bind(changes.words_learned)
    .bind(changes.lessons_completed)
    .bind(changes.quizzes_passed)
    .bind(changes.current_streak)
    .bind(changes.last_practice_date)
    .bind(next_timestamp_ms())
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(progress)
}

/// Delete and return the removed record
pub async fn delete_progress(db: &SqlitePool, id: i64) -> Result<Option<UserProgress>> {
    let deleted = sqlx::query_as(&format!(
        "DELETE FROM user_progress WHERE id = ? RETURNING {}",
        PROGRESS_COLUMNS
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(deleted)
}

pub async fn find_course_progress(
    db: &SqlitePool,
    user_id: &str,
    course_id: &str,
) -> Result<Option<UserCourseProgress>> {
    let progress = sqlx::query_as(
        r#"
        SELECT id, user_id, course_id, completed_lessons, last_lesson_id, updated_at
        FROM user_course_progress WHERE user_id = ? AND course_id = ?
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .fetch_optional(db)
    .await?;

    Ok(progress)
}

/// Record how far the user got in a course
pub async fn save_course_progress(
    db: &SqlitePool,
    user_id: &str,
    course_id: &str,
    completed_lessons: i64,
    last_lesson_id: Option<i64>,
) -> Result<UserCourseProgress> {
    let progress = sqlx::query_as(
        r#"
        INSERT INTO user_course_progress (user_id, course_id, completed_lessons, last_lesson_id, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (user_id, course_id) DO UPDATE SET
            completed_lessons = excluded.completed_lessons,
            last_lesson_id = COALESCE(excluded.last_lesson_id, last_lesson_id),
            updated_at = excluded.updated_at
        RETURNING id, user_id, course_id, completed_lessons, last_lesson_id, updated_at
        "#,
    )
    .bind(user_id)
    .bind(course_id)
    .bind(completed_lessons)
    .bind(last_lesson_id)
    .bind(next_timestamp_ms())
    .fetch_one(db)
    .await?;

    Ok(progress)
}
