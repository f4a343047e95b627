//! Version token computation
//!
//! A scope's version is the largest modification timestamp among the rows
//! belonging to it. It is recomputed on every call and never stored.

use async_trait::async_trait;
use lingo_common::Result;
use sqlx::{Sqlite, SqlitePool};
use std::fmt;

/// Set of entities a version token is computed over
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The whole course catalog
    Global,
    /// One course: the course row, its modules, their lessons, and the
    /// course's vocabulary, grammar, culture and quiz rows
    Course(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global => f.write_str("global"),
            Scope::Course(id) => write!(f, "course:{}", id),
        }
    }
}

/// Anything able to produce a version token for a scope
#[async_trait]
pub trait VersionSource: Send + Sync {
    /// Most recent modification timestamp in `scope` (epoch ms), `0` when
    /// the scope holds no rows
    async fn compute_version(&self, scope: &Scope) -> Result<i64>;
}

/// Version source backed by the catalog tables
#[derive(Clone)]
pub struct SqliteVersionSource {
    db: SqlitePool,
}

impl SqliteVersionSource {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

const GLOBAL_VERSION_SQL: &str = "SELECT MAX(updated_at) FROM courses";

// Courses, modules and lessons change in place and track `updated_at`.
// The content tables are append-only, so `created_at` is their marker.
const COURSE_VERSION_SQL: &str = r#"
    SELECT MAX(ts) FROM (
        SELECT updated_at AS ts FROM courses WHERE id = ?
        UNION ALL
        SELECT updated_at FROM course_modules WHERE course_id = ?
        UNION ALL
        SELECT l.updated_at FROM lessons l
            JOIN course_modules m ON l.module_id = m.id
            WHERE m.course_id = ?
        UNION ALL
        SELECT created_at FROM course_vocabulary WHERE course_id = ?
        UNION ALL
        SELECT created_at FROM course_grammar WHERE course_id = ?
        UNION ALL
        SELECT created_at FROM cultural_content WHERE course_id = ?
        UNION ALL
        SELECT created_at FROM quiz_questions WHERE course_id = ?
    )
"#;

#[async_trait]
impl VersionSource for SqliteVersionSource {
    async fn compute_version(&self, scope: &Scope) -> Result<i64> {
        let version: Option<i64> = match scope {
            Scope::Global => {
                sqlx::query_scalar::<Sqlite, Option<i64>>(GLOBAL_VERSION_SQL)
                    .fetch_one(&self.db)
                    .await?
            }
            Scope::Course(course_id) => {
                let mut query = sqlx::query_scalar::<Sqlite, Option<i64>>(COURSE_VERSION_SQL);
                for _ in 0..7 {
                    query = query.bind(course_id.as_str());
                }
                query.fetch_one(&self.db).await?
            }
        };

        Ok(version.unwrap_or(0))
    }
}
