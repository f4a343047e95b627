//! Aggregate queries for the analytics summary and per-user stats

use lingo_common::db::UserProgress;
use lingo_common::Result;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;

use super::progress;

#[derive(Debug, Clone, Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub active: i64,
    pub by_role: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LanguageBreakdown {
    pub language_code: String,
    pub learners: i64,
    pub quizzes_taken: i64,
    pub average_score_percent: Option<f64>,
    pub words_learned: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub users: UserCounts,
    pub courses: i64,
    pub quizzes_taken: i64,
    pub average_score_percent: Option<f64>,
    pub words_learned: i64,
    pub languages: Vec<LanguageBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStats {
    pub words_learned: i64,
    pub lessons_completed: i64,
    pub quizzes_passed: i64,
    pub best_streak: i64,
    pub quizzes_taken: i64,
    pub average_score_percent: Option<f64>,
    pub saved_words: i64,
    pub languages: Vec<UserProgress>,
}

#[derive(FromRow)]
struct QuizTotals {
    taken: i64,
    average: Option<f64>,
}

/// Quiz count and mean score as a percentage, optionally for one user
async fn quiz_totals(db: &SqlitePool, user_id: Option<&str>) -> Result<QuizTotals> {
    let totals = sqlx::query_as(
        r#"
        SELECT COUNT(*) AS taken,
               AVG(CAST(score AS REAL) * 100.0 / total_questions) AS average
        FROM quiz_results
        WHERE total_questions > 0 AND (?1 IS NULL OR user_id = ?1)
        "#,
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(totals)
}

pub async fn summary(db: &SqlitePool) -> Result<AnalyticsSummary> {
    let role_rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role")
            .fetch_all(db)
            .await?;
    let active: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
        .fetch_one(db)
        .await?;

    let by_role: BTreeMap<String, i64> = role_rows.into_iter().collect();
    let users = UserCounts {
        total: by_role.values().sum(),
        active,
        by_role,
    };

    let courses: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM courses")
        .fetch_one(db)
        .await?;
    let words_learned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM learned_vocabulary")
        .fetch_one(db)
        .await?;
    let quizzes = quiz_totals(db, None).await?;

    let languages = sqlx::query_as(
        r#"
        SELECT l.language_code,
               (SELECT COUNT(DISTINCT user_id) FROM user_progress p
                 WHERE p.language_code = l.language_code) AS learners,
               (SELECT COUNT(*) FROM quiz_results q
                 WHERE q.language_code = l.language_code) AS quizzes_taken,
               (SELECT AVG(CAST(score AS REAL) * 100.0 / total_questions) FROM quiz_results q
                 WHERE q.language_code = l.language_code AND total_questions > 0) AS average_score_percent,
               (SELECT COUNT(*) FROM learned_vocabulary v
                 WHERE v.language_code = l.language_code) AS words_learned
        FROM (
            SELECT language_code FROM user_progress
            UNION SELECT language_code FROM quiz_results
            UNION SELECT language_code FROM learned_vocabulary
        ) l
        ORDER BY l.language_code
        "#,
    )
    .fetch_all(db)
    .await?;

    Ok(AnalyticsSummary {
        users,
        courses,
        quizzes_taken: quizzes.taken,
        average_score_percent: quizzes.average,
        words_learned,
        languages,
    })
}

pub async fn user_stats(db: &SqlitePool, user_id: &str) -> Result<UserStats> {
    let languages = progress::list_progress(db, user_id).await?;
    let quizzes = quiz_totals(db, Some(user_id)).await?;
    let saved_words: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM learned_vocabulary WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db)
            .await?;

    Ok(UserStats {
        words_learned: languages.iter().map(|p| p.words_learned).sum(),
        lessons_completed: languages.iter().map(|p| p.lessons_completed).sum(),
        quizzes_passed: languages.iter().map(|p| p.quizzes_passed).sum(),
        best_streak: languages.iter().map(|p| p.current_streak).max().unwrap_or(0),
        quizzes_taken: quizzes.taken,
        average_score_percent: quizzes.average,
        saved_words,
        languages,
    })
}
