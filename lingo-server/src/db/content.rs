//! Course content authoring: modules, lessons, vocabulary, grammar,
//! cultural notes and quiz questions
//!
//! Every write stamps a fresh timestamp so the course's change-feed version
//! moves forward.

use lingo_common::db::{
    CourseModule, CulturalContent, GrammarTopic, Lesson, QuizQuestion, VocabularyItem,
};
use lingo_common::{time::next_timestamp_ms, Result};
use sqlx::SqlitePool;

const MODULE_COLUMNS: &str = "id, course_id, position, title, description, created_at, updated_at";
const LESSON_COLUMNS: &str =
    "id, module_id, position, title, content, duration, lesson_type, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct ModuleChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub lesson_type: Option<String>,
    pub position: Option<i64>,
}

/// Append a module. Without an explicit position it goes after the last one.
pub async fn create_module(
    db: &SqlitePool,
    course_id: &str,
    title: &str,
    description: Option<&str>,
    position: Option<i64>,
) -> Result<CourseModule> {
    let now = next_timestamp_ms();

    let module = sqlx::query_as(&format!(
        r#"
        INSERT INTO course_modules (course_id, position, title, description, created_at, updated_at)
        VALUES (?1,
                COALESCE(?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM course_modules WHERE course_id = ?1)),
                ?3, ?4, ?5, ?5)
        RETURNING {}
        "#,
        MODULE_COLUMNS
    ))
    .bind(course_id)
    .bind(position)
    .bind(title)
    .bind(description)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(module)
}

pub async fn find_module(db: &SqlitePool, id: i64) -> Result<Option<CourseModule>> {
    let module = sqlx::query_as(&format!("SELECT {} FROM course_modules WHERE id = ?", MODULE_COLUMNS))
        .bind(id)
        .fetch_optional(db)
        .await?;

    Ok(module)
}

/// Apply the given changes; `None` if the module does not exist
pub async fn update_module(
    db: &SqlitePool,
    id: i64,
    changes: &ModuleChanges,
) -> Result<Option<CourseModule>> {
    let module = sqlx::query_as(&format!(
        r#"
        UPDATE course_modules
        SET title = COALESCE(?, title),
            description = COALESCE(?, description),
            position = COALESCE(?, position),
            updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        MODULE_COLUMNS
    ))
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.position)
    .bind(next_timestamp_ms())
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(module)
}

/// Append a lesson to a module
pub async fn create_lesson(
    db: &SqlitePool,
    module_id: i64,
    title: &str,
    changes: &LessonChanges,
) -> Result<Lesson> {
    let now = next_timestamp_ms();

    let lesson = sqlx::query_as(&format!(
        r#"
        INSERT INTO lessons (module_id, position, title, content, duration, lesson_type,
                             created_at, updated_at)
        VALUES (?1,
                COALESCE(?2, (SELECT COALESCE(MAX(position) + 1, 0) FROM lessons WHERE module_id = ?1)),
                ?3, ?4, ?5, COALESCE(?6, 'general'), ?7, ?7)
        RETURNING {}
        "#,
        LESSON_COLUMNS
    ))
    .bind(module_id)
    .bind(changes.position)
    .bind(title)
    .bind(&changes.content)
    .bind(&changes.duration)
    .bind(&changes.lesson_type)
    .bind(now)
    .fetch_one(db)
    .await?;

    Ok(lesson)
}

/// Apply the given changes; `None` if the lesson does not exist
pub async fn update_lesson(
    db: &SqlitePool,
    id: i64,
    changes: &LessonChanges,
) -> Result<Option<Lesson>> {
    let lesson = sqlx::query_as(&format!(
        r#"
        UPDATE lessons
        SET title = COALESCE(?, title),
            content = COALESCE(?, content),
            duration = COALESCE(?, duration),
            lesson_type = COALESCE(?, lesson_type),
            position = COALESCE(?, position),
            updated_at = ?
        WHERE id = ?
        RETURNING {}
        "#,
        LESSON_COLUMNS
    ))
    .bind(&changes.title)
    .bind(&changes.content)
    .bind(&changes.duration)
    .bind(&changes.lesson_type)
    .bind(changes.position)
    .bind(next_timestamp_ms())
    .bind(id)
    .fetch_optional(db)
    .await?;

    Ok(lesson)
}

pub async fn add_vocabulary(
    db: &SqlitePool,
    course_id: &str,
    word: &str,
    translation: &str,
    part_of_speech: Option<&str>,
) -> Result<VocabularyItem> {
    let item = sqlx::query_as(
        r#"
        INSERT INTO course_vocabulary (course_id, word, translation, part_of_speech, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, course_id, word, translation, part_of_speech, created_at
        "#,
    )
    .bind(course_id)
    .bind(word)
    .bind(translation)
    .bind(part_of_speech)
    .bind(next_timestamp_ms())
    .fetch_one(db)
    .await?;

    Ok(item)
}

pub async fn add_grammar(
    db: &SqlitePool,
    course_id: &str,
    title: &str,
    content: &str,
    example: Option<&str>,
) -> Result<GrammarTopic> {
    let topic = sqlx::query_as(
        r#"
        INSERT INTO course_grammar (course_id, title, content, example, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, course_id, title, content, example, created_at
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(content)
    .bind(example)
    .bind(next_timestamp_ms())
    .fetch_one(db)
    .await?;

    Ok(topic)
}

pub async fn add_culture(
    db: &SqlitePool,
    course_id: &str,
    title: &str,
    description: Option<&str>,
    url: Option<&str>,
    image_url: Option<&str>,
) -> Result<CulturalContent> {
    let note = sqlx::query_as(
        r#"
        INSERT INTO cultural_content (course_id, title, description, url, image_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, course_id, title, description, url, image_url, created_at
        "#,
    )
    .bind(course_id)
    .bind(title)
    .bind(description)
    .bind(url)
    .bind(image_url)
    .bind(next_timestamp_ms())
    .fetch_one(db)
    .await?;

    Ok(note)
}

/// Store a quiz question. `options` must already be validated against
/// `correct_index`.
pub async fn add_quiz_question(
    db: &SqlitePool,
    course_id: &str,
    question: &str,
    options: &[String],
    correct_index: i64,
    question_type: Option<&str>,
) -> Result<QuizQuestion> {
    let options_json = serde_json::to_string(options)
        .map_err(|e| lingo_common::Error::Internal(format!("Failed to encode options: {}", e)))?;

    let stored = sqlx::query_as(
        r#"
        INSERT INTO quiz_questions (course_id, question, options_json, correct_index,
                                    question_type, created_at)
        VALUES (?, ?, ?, ?, COALESCE(?, 'vocabulary'), ?)
        RETURNING id, course_id, question, options_json, correct_index, question_type, created_at
        "#,
    )
    .bind(course_id)
    .bind(question)
    .bind(options_json)
    .bind(correct_index)
    .bind(question_type)
    .bind(next_timestamp_ms())
    .fetch_one(db)
    .await?;

    Ok(stored)
}
