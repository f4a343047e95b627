//! Database initialization
//!
//! Creates the database file on first run and applies the schema with
//! idempotent `CREATE TABLE IF NOT EXISTS` statements, so opening an
//! existing database is always safe.
//!
//! All timestamp columns hold INTEGER epoch milliseconds.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema revision recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Foreign keys and busy timeout are per-connection settings, so they go
    // on the connect options rather than through a one-off PRAGMA.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    if let Some(newest) = newest_catalog_timestamp(&pool).await? {
        crate::time::raise_timestamp_floor(newest);
    }

    Ok(pool)
}

/// Largest timestamp among the rows change-feed versions are computed from
pub async fn newest_catalog_timestamp(pool: &SqlitePool) -> Result<Option<i64>> {
    let newest: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT MAX(ts) FROM (
            SELECT MAX(updated_at) AS ts FROM courses
            UNION ALL SELECT MAX(updated_at) FROM course_modules
            UNION ALL SELECT MAX(updated_at) FROM lessons
            UNION ALL SELECT MAX(created_at) FROM course_vocabulary
            UNION ALL SELECT MAX(created_at) FROM course_grammar
            UNION ALL SELECT MAX(created_at) FROM cultural_content
            UNION ALL SELECT MAX(created_at) FROM quiz_questions
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(newest)
}

/// Apply every table definition and record the schema version
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Accounts
    create_users_table(pool).await?;
    create_sessions_table(pool).await?;

    // Course catalog
    create_courses_table(pool).await?;
    create_course_modules_table(pool).await?;
    create_lessons_table(pool).await?;
    create_course_content_tables(pool).await?;

    // Learner records
    create_user_progress_table(pool).await?;
    create_quiz_results_table(pool).await?;
    create_learned_vocabulary_table(pool).await?;
    create_user_course_progress_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?, ?)")
        .bind(SCHEMA_VERSION)
        .bind(crate::time::now_ms())
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            email_verified INTEGER NOT NULL DEFAULT 0,
            image TEXT,
            role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'premium', 'instructor', 'admin')),
            is_active INTEGER NOT NULL DEFAULT 1,
            password_hash TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            token_hash TEXT NOT NULL UNIQUE,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            expires_at INTEGER NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_courses_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS courses (
            id TEXT PRIMARY KEY,
            language_code TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL,
            level TEXT NOT NULL,
            category TEXT NOT NULL,
            flag TEXT,
            duration TEXT,
            students INTEGER NOT NULL DEFAULT 0,
            rating_tenths INTEGER NOT NULL DEFAULT 0,
            total_lessons INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_courses_updated ON courses(updated_at)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_course_modules_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_modules (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            title TEXT NOT NULL,
            description TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_course_modules_course ON course_modules(course_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_lessons_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            module_id INTEGER NOT NULL REFERENCES course_modules(id) ON DELETE CASCADE,
            position INTEGER NOT NULL DEFAULT 0,
            title TEXT NOT NULL,
            content TEXT,
            duration TEXT,
            lesson_type TEXT NOT NULL DEFAULT 'general',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Append-only content attached to a course. These rows are never
/// updated in place, so `created_at` doubles as their change marker.
async fn create_course_content_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_vocabulary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            word TEXT NOT NULL,
            translation TEXT NOT NULL,
            part_of_speech TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS course_grammar (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            example TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cultural_content (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT,
            url TEXT,
            image_url TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_questions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            question TEXT NOT NULL,
            options_json TEXT NOT NULL,
            correct_index INTEGER NOT NULL,
            question_type TEXT NOT NULL DEFAULT 'vocabulary',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (index, table) in [
        ("idx_course_vocabulary_course", "course_vocabulary"),
        ("idx_course_grammar_course", "course_grammar"),
        ("idx_cultural_content_course", "cultural_content"),
        ("idx_quiz_questions_course", "quiz_questions"),
    ] {
        let sql = format!("CREATE INDEX IF NOT EXISTS {} ON {}(course_id)", index, table);
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_user_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_progress (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            language_code TEXT NOT NULL,
            words_learned INTEGER NOT NULL DEFAULT 0,
            lessons_completed INTEGER NOT NULL DEFAULT 0,
            quizzes_passed INTEGER NOT NULL DEFAULT 0,
            current_streak INTEGER NOT NULL DEFAULT 0,
            last_practice_date INTEGER,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE (user_id, language_code)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_quiz_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS quiz_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            language_code TEXT NOT NULL,
            quiz_type TEXT NOT NULL,
            score INTEGER NOT NULL,
            total_questions INTEGER NOT NULL,
            completed_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_quiz_results_user ON quiz_results(user_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_learned_vocabulary_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS learned_vocabulary (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            language_code TEXT NOT NULL,
            word TEXT NOT NULL,
            translation TEXT NOT NULL,
            learned_at INTEGER NOT NULL,
            times_reviewed INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_learned_vocabulary_user ON learned_vocabulary(user_id, language_code)",
    )
    .execute(pool)
    .await?;

    // One saved entry per word, case-insensitive
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_learned_vocabulary_word
        ON learned_vocabulary(user_id, language_code, lower(word))
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_user_course_progress_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS user_course_progress (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            course_id TEXT NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
            completed_lessons INTEGER NOT NULL DEFAULT 0,
            last_lesson_id INTEGER,
            updated_at INTEGER NOT NULL,
            UNIQUE (user_id, course_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
