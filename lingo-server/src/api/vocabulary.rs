//! `/api/learned-vocabulary`: words a learner has saved

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lingo_common::db::LearnedWord;
use serde::Deserialize;

use super::{deleted, parse_id};
use crate::auth::CurrentUser;
use crate::db::{self, vocabulary::{self, WordChanges}};
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageParams;
use crate::AppState;

const DEFAULT_WORD_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct VocabularyQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub language_code: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(default)]
    pub increment_review: bool,
}

#[derive(Debug, Deserialize)]
pub struct WordInput {
    pub user_id: Option<String>,
    pub language_code: Option<String>,
    pub word: Option<String>,
    pub translation: Option<String>,
    pub times_reviewed: Option<i64>,
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Vocabulary record not found")
}

fn already_saved() -> ApiError {
    ApiError::conflict("WORD_ALREADY_EXISTS", "This word is already in your vocabulary")
}

/// The unique (user, language, word) index backs the existence check when
/// two writes race
fn map_duplicate(err: lingo_common::Error) -> ApiError {
    if db::is_unique_violation(&err) {
        already_saved()
    } else {
        err.into()
    }
}

async fn owned_word(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<LearnedWord> {
    match vocabulary::find_word(&state.db, id).await? {
        Some(word) if user.may_access(&word.user_id) => Ok(word),
        _ => Err(not_found()),
    }
}

/// GET /api/learned-vocabulary
pub async fn get_words(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<VocabularyQuery>,
) -> ApiResult<Response> {
    if query.id.is_some() {
        let id = parse_id(query.id.as_deref())?;
        return Ok(Json(owned_word(&state, &user, id).await?).into_response());
    }

    let target = user.target_user(query.user_id.as_deref())?;
    let language_code = trimmed(query.language_code);
    let search = trimmed(query.search);
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(DEFAULT_WORD_LIMIT);

    let words = vocabulary::list_words(
        &state.db,
        &target,
        language_code.as_deref(),
        search.as_deref(),
        page,
    )
    .await?;
    Ok(Json(words).into_response())
}

/// POST /api/learned-vocabulary
pub async fn add_word(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<WordInput>,
) -> ApiResult<(StatusCode, Json<LearnedWord>)> {
    let target = user.target_user(input.user_id.as_deref())?;
    let language_code = trimmed(input.language_code).ok_or_else(|| {
        ApiError::bad_request("MISSING_LANGUAGE_CODE", "Language code is required")
    })?;
    let word = trimmed(input.word)
        .ok_or_else(|| ApiError::bad_request("MISSING_WORD", "Word is required"))?;
    let translation = trimmed(input.translation)
        .ok_or_else(|| ApiError::bad_request("MISSING_TRANSLATION", "Translation is required"))?;

    if vocabulary::word_exists(&state.db, &target, &language_code, &word).await? {
        return Err(already_saved());
    }

    let stored = vocabulary::insert_word(&state.db, &target, &language_code, &word, &translation)
        .await
        .map_err(map_duplicate)?;
    Ok((StatusCode::CREATED, Json(stored)))
}

/// PUT /api/learned-vocabulary?id=[&increment_review=true]
///
/// An explicit `times_reviewed` wins over `increment_review`. With nothing
/// to change the record is returned as is.
pub async fn update_word(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<VocabularyQuery>,
    Json(input): Json<WordInput>,
) -> ApiResult<Json<LearnedWord>> {
    let id = parse_id(query.id.as_deref())?;
    let existing = owned_word(&state, &user, id).await?;

    if matches!(input.times_reviewed, Some(n) if n < 0) {
        return Err(ApiError::bad_request(
            "INVALID_TIMES_REVIEWED",
            "Times reviewed cannot be negative",
        ));
    }

    let changes = WordChanges {
        word: trimmed(input.word),
        translation: trimmed(input.translation),
        times_reviewed: input
            .times_reviewed
            .or(query.increment_review.then(|| existing.times_reviewed + 1)),
    };
    if changes.is_empty() {
        return Ok(Json(existing));
    }

    vocabulary::update_word(&state.db, id, &changes)
        .await
        .map_err(map_duplicate)?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/learned-vocabulary?id=
pub async fn delete_word(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<VocabularyQuery>,
) -> ApiResult<Response> {
    let id = parse_id(query.id.as_deref())?;
    owned_word(&state, &user, id).await?;

    let word = vocabulary::delete_word(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(deleted("Vocabulary record deleted successfully", word))
}
