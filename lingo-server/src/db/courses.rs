//! Course catalog: listing, upsert, aggregate reads

use lingo_common::db::{
    Course, CourseModule, CulturalContent, GrammarTopic, Lesson, QuizQuestion, VocabularyItem,
};
use lingo_common::{time::next_timestamp_ms, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::pagination::Page;

const COURSE_COLUMNS: &str = "id, language_code, title, description, level, category, flag, \
                              duration, students, rating_tenths, total_lessons, created_at, updated_at";

/// Filters for the public catalog listing. Empty fields do not filter.
#[derive(Debug, Default, Clone)]
pub struct CourseFilter {
    pub search: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub language_code: Option<String>,
}

/// Validated course fields for an upsert
#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: String,
    pub language_code: String,
    pub title: String,
    pub description: String,
    pub level: String,
    pub category: String,
    pub flag: Option<String>,
    pub duration: Option<String>,
    pub students: i64,
    pub rating_tenths: i64,
    pub total_lessons: i64,
}

/// Module with its lessons in order
#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    #[serde(flatten)]
    pub module: CourseModule,
    pub lessons: Vec<Lesson>,
}

/// Quiz question with `options_json` decoded
#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestionDetail {
    #[serde(flatten)]
    pub question: QuizQuestion,
    pub options: Vec<String>,
}

impl From<QuizQuestion> for QuizQuestionDetail {
    fn from(question: QuizQuestion) -> Self {
        let options = question.options();
        Self { question, options }
    }
}

/// Everything the course page needs in one payload
#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
    pub course: Course,
    pub modules: Vec<ModuleDetail>,
    pub vocabulary: Vec<VocabularyItem>,
    pub grammar: Vec<GrammarTopic>,
    pub culture: Vec<CulturalContent>,
    pub quiz: Vec<QuizQuestionDetail>,
}

pub async fn list_courses(db: &SqlitePool, filter: &CourseFilter, page: Page) -> Result<Vec<Course>> {
    let search = filter.search.as_ref().map(|s| format!("%{}%", s));

    let courses = sqlx::query_as(&format!(
        r#"
        SELECT {} FROM courses
        WHERE (?1 IS NULL OR title LIKE ?1 OR description LIKE ?1
               OR category LIKE ?1 OR level LIKE ?1)
          AND (?2 IS NULL OR level = ?2)
          AND (?3 IS NULL OR category = ?3)
          AND (?4 IS NULL OR language_code = ?4)
        ORDER BY updated_at DESC
        LIMIT ?5 OFFSET ?6
        "#,
        COURSE_COLUMNS
    ))
    .bind(search)
    .bind(filter.level.as_deref())
    .bind(filter.category.as_deref())
    .bind(filter.language_code.as_deref())
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    Ok(courses)
}

pub async fn find_course(db: &SqlitePool, id: &str) -> Result<Option<Course>> {
    let course = sqlx::query_as(&format!("SELECT {} FROM courses WHERE id = ?", COURSE_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(course)
}

pub async fn course_exists(db: &SqlitePool, id: &str) -> Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM courses WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(found.is_some())
}

/// Update the course if `id` exists, insert it otherwise
///
/// A single statement, so concurrent first writes of the same id resolve to
/// one insert and one update. Returns the stored course and `true` when it
/// was inserted; an update keeps the original `created_at`, which is always
/// older than the timestamp issued here.
pub async fn upsert_course(db: &SqlitePool, record: &CourseRecord) -> Result<(Course, bool)> {
    let now = next_timestamp_ms();

    let course: Course = sqlx::query_as(&format!(
        r#"
        INSERT INTO courses ({})
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
        ON CONFLICT(id) DO UPDATE SET
            language_code = excluded.language_code,
            title = excluded.title,
            description = excluded.description,
            level = excluded.level,
            category = excluded.category,
            flag = excluded.flag,
            duration = excluded.duration,
            students = excluded.students,
            rating_tenths = excluded.rating_tenths,
            total_lessons = excluded.total_lessons,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        COURSE_COLUMNS, COURSE_COLUMNS
    ))
    .bind(&record.id)
    .bind(&record.language_code)
    .bind(&record.title)
    .bind(&record.description)
    .bind(&record.level)
    .bind(&record.category)
    .bind(&record.flag)
    .bind(&record.duration)
    .bind(record.students)
    .bind(record.rating_tenths)
    .bind(record.total_lessons)
    .bind(now)
    .fetch_one(db)
    .await?;

    let inserted = course.created_at == now;
    Ok((course, inserted))
}

/// Delete a course and, through cascades, all of its content
pub async fn delete_course(db: &SqlitePool, id: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Course with modules, lessons and content; `None` if the course does not
/// exist
pub async fn load_course_detail(db: &SqlitePool, id: &str) -> Result<Option<CourseDetail>> {
    let Some(course) = find_course(db, id).await? else {
        return Ok(None);
    };

    let modules: Vec<CourseModule> = sqlx::query_as(
        r#"
        SELECT id, course_id, position, title, description, created_at, updated_at
        FROM course_modules WHERE course_id = ?
        ORDER BY position ASC, id ASC
        "#,
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let lessons: Vec<Lesson> = sqlx::query_as(
        r#"
        SELECT l.id, l.module_id, l.position, l.title, l.content, l.duration, l.lesson_type,
               l.created_at, l.updated_at
        FROM lessons l
        JOIN course_modules m ON l.module_id = m.id
        WHERE m.course_id = ?
        ORDER BY l.position ASC, l.id ASC
        "#,
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let mut lessons_by_module: HashMap<i64, Vec<Lesson>> = HashMap::new();
    for lesson in lessons {
        lessons_by_module.entry(lesson.module_id).or_default().push(lesson);
    }

    let modules = modules
        .into_iter()
        .map(|module| ModuleDetail {
            lessons: lessons_by_module.remove(&module.id).unwrap_or_default(),
            module,
        })
        .collect();

    let vocabulary = sqlx::query_as(
        "SELECT id, course_id, word, translation, part_of_speech, created_at
         FROM course_vocabulary WHERE course_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let grammar = sqlx::query_as(
        "SELECT id, course_id, title, content, example, created_at
         FROM course_grammar WHERE course_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let culture = sqlx::query_as(
        "SELECT id, course_id, title, description, url, image_url, created_at
         FROM cultural_content WHERE course_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    let quiz: Vec<QuizQuestion> = sqlx::query_as(
        "SELECT id, course_id, question, options_json, correct_index, question_type, created_at
         FROM quiz_questions WHERE course_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(id)
    .fetch_all(db)
    .await?;

    Ok(Some(CourseDetail {
        course,
        modules,
        vocabulary,
        grammar,
        culture,
        quiz: quiz.into_iter().map(QuizQuestionDetail::from).collect(),
    }))
}

/// Lessons across all modules of a course
pub async fn count_lessons(db: &SqlitePool, course_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM lessons l
        JOIN course_modules m ON l.module_id = m.id
        WHERE m.course_id = ?
        "#,
    )
    .bind(course_id)
    .fetch_one(db)
    .await?;

    Ok(count)
}
