//! Course content authoring (instructors and admins)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use lingo_common::db::{CourseModule, CulturalContent, GrammarTopic, Lesson, VocabularyItem};
use lingo_common::Capability;
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::content::{self, LessonChanges, ModuleChanges};
use crate::db::courses::{self, QuizQuestionDetail};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn require_field(value: Option<String>, code: &'static str, message: &str) -> ApiResult<String> {
    non_empty(value).ok_or_else(|| ApiError::bad_request(code, message))
}

/// Authoring capability plus an existing course
async fn authoring_course(state: &AppState, user: &CurrentUser, course_id: &str) -> ApiResult<()> {
    user.require(Capability::CoursesWrite)?;
    if courses::course_exists(&state.db, course_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("NOT_FOUND", "Course not found"))
    }
}

fn check_position(position: Option<i64>) -> ApiResult<()> {
    match position {
        Some(p) if p < 0 => Err(ApiError::bad_request(
            "INVALID_POSITION",
            "Position cannot be negative",
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Deserialize)]
pub struct ModuleInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub position: Option<i64>,
}

/// POST /api/courses/:course_id/modules
pub async fn create_module(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<ModuleInput>,
) -> ApiResult<(StatusCode, Json<CourseModule>)> {
    authoring_course(&state, &user, &course_id).await?;
    let title = require_field(input.title, "MISSING_TITLE", "Title is required")?;
    check_position(input.position)?;

    let module = content::create_module(
        &state.db,
        &course_id,
        &title,
        input.description.as_deref(),
        input.position,
    )
    .await?;

    info!("Module {} added to course {} by {}", module.id, course_id, user.id());
    Ok((StatusCode::CREATED, Json(module)))
}

/// PUT /api/modules/:module_id
pub async fn update_module(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(module_id): Path<i64>,
    Json(input): Json<ModuleInput>,
) -> ApiResult<Json<CourseModule>> {
    user.require(Capability::CoursesWrite)?;
    check_position(input.position)?;

    let changes = ModuleChanges {
        title: non_empty(input.title),
        description: input.description,
        position: input.position,
    };

    content::update_module(&state.db, module_id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Module not found"))
}

#[derive(Debug, Deserialize)]
pub struct LessonInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub duration: Option<String>,
    pub lesson_type: Option<String>,
    pub position: Option<i64>,
}

impl LessonInput {
    fn split(self) -> (Option<String>, LessonChanges) {
        let title = non_empty(self.title);
        let changes = LessonChanges {
            title: title.clone(),
            content: self.content,
            duration: self.duration,
            lesson_type: non_empty(self.lesson_type),
            position: self.position,
        };
        (title, changes)
    }
}

/// POST /api/modules/:module_id/lessons
pub async fn create_lesson(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(module_id): Path<i64>,
    Json(input): Json<LessonInput>,
) -> ApiResult<(StatusCode, Json<Lesson>)> {
    user.require(Capability::CoursesWrite)?;
    check_position(input.position)?;

    if content::find_module(&state.db, module_id).await?.is_none() {
        return Err(ApiError::not_found("NOT_FOUND", "Module not found"));
    }

    let (title, changes) = input.split();
    let title = title.ok_or_else(|| ApiError::bad_request("MISSING_TITLE", "Title is required"))?;

    let lesson = content::create_lesson(&state.db, module_id, &title, &changes).await?;
    info!("Lesson {} added to module {} by {}", lesson.id, module_id, user.id());
    Ok((StatusCode::CREATED, Json(lesson)))
}

/// PUT /api/lessons/:lesson_id
pub async fn update_lesson(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(lesson_id): Path<i64>,
    Json(input): Json<LessonInput>,
) -> ApiResult<Json<Lesson>> {
    user.require(Capability::CoursesWrite)?;
    check_position(input.position)?;

    let (_, changes) = input.split();
    content::update_lesson(&state.db, lesson_id, &changes)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Lesson not found"))
}

#[derive(Debug, Deserialize)]
pub struct VocabularyInput {
    pub word: Option<String>,
    pub translation: Option<String>,
    pub part_of_speech: Option<String>,
}

/// POST /api/courses/:course_id/vocabulary
pub async fn add_vocabulary(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<VocabularyInput>,
) -> ApiResult<(StatusCode, Json<VocabularyItem>)> {
    authoring_course(&state, &user, &course_id).await?;
    let word = require_field(input.word, "MISSING_WORD", "Word is required")?;
    let translation =
        require_field(input.translation, "MISSING_TRANSLATION", "Translation is required")?;
    let part_of_speech = non_empty(input.part_of_speech);

    let item = content::add_vocabulary(
        &state.db,
        &course_id,
        &word,
        &translation,
        part_of_speech.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct GrammarInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub example: Option<String>,
}

/// POST /api/courses/:course_id/grammar
pub async fn add_grammar(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<GrammarInput>,
) -> ApiResult<(StatusCode, Json<GrammarTopic>)> {
    authoring_course(&state, &user, &course_id).await?;
    let title = require_field(input.title, "MISSING_TITLE", "Title is required")?;
    let body = require_field(input.content, "MISSING_CONTENT", "Content is required")?;

    let topic = content::add_grammar(&state.db, &course_id, &title, &body, input.example.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

#[derive(Debug, Deserialize)]
pub struct CultureInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
}

/// POST /api/courses/:course_id/culture
pub async fn add_culture(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<CultureInput>,
) -> ApiResult<(StatusCode, Json<CulturalContent>)> {
    authoring_course(&state, &user, &course_id).await?;
    let title = require_field(input.title, "MISSING_TITLE", "Title is required")?;

    let note = content::add_culture(
        &state.db,
        &course_id,
        &title,
        input.description.as_deref(),
        input.url.as_deref(),
        input.image_url.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[derive(Debug, Deserialize)]
pub struct QuizQuestionInput {
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_index: Option<i64>,
    pub question_type: Option<String>,
}

/// Question text, at least two options, and an index that points into them
fn validate_quiz_question(input: &QuizQuestionInput) -> ApiResult<(String, i64)> {
    let question = non_empty(input.question.clone())
        .ok_or_else(|| ApiError::bad_request("MISSING_QUESTION", "Question is required"))?;

    if input.options.len() < 2 {
        return Err(ApiError::bad_request(
            "INVALID_OPTIONS",
            "At least two options are required",
        ));
    }

    match input.correct_index {
        Some(index) if index >= 0 && (index as usize) < input.options.len() => Ok((question, index)),
        _ => Err(ApiError::bad_request(
            "INVALID_CORRECT_INDEX",
            "Correct index must point at one of the options",
        )),
    }
}

/// POST /api/courses/:course_id/quiz
pub async fn add_quiz_question(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<QuizQuestionInput>,
) -> ApiResult<(StatusCode, Json<QuizQuestionDetail>)> {
    authoring_course(&state, &user, &course_id).await?;
    let (question, correct_index) = validate_quiz_question(&input)?;

    let stored = content::add_quiz_question(
        &state.db,
        &course_id,
        &question,
        &input.options,
        correct_index,
        non_empty(input.question_type).as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(QuizQuestionDetail::from(stored))))
}
