//! `/api/quiz-results`: completed quiz attempts

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lingo_common::db::QuizResult;
use serde::Deserialize;

use super::{deleted, parse_id};
use crate::auth::CurrentUser;
use crate::db::quiz_results;
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageParams;
use crate::AppState;

const DEFAULT_RESULT_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct QuizResultQuery {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub language_code: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct QuizResultInput {
    pub user_id: Option<String>,
    pub language_code: Option<String>,
    pub quiz_type: Option<String>,
    pub score: Option<i64>,
    pub total_questions: Option<i64>,
}

/// Score and total after merging: score in `0..=total`, total positive
fn check_score(score: i64, total_questions: i64) -> ApiResult<()> {
    if score < 0 {
        return Err(ApiError::bad_request("INVALID_SCORE", "Score must be a positive integer"));
    }
    if total_questions <= 0 {
        return Err(ApiError::bad_request(
            "INVALID_TOTAL_QUESTIONS",
            "Total questions must be a positive integer",
        ));
    }
    if score > total_questions {
        return Err(ApiError::bad_request(
            "SCORE_EXCEEDS_TOTAL",
            "Score cannot exceed total questions",
        ));
    }
    Ok(())
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Quiz result not found")
}

async fn owned_result(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<QuizResult> {
    match quiz_results::find_result(&state.db, id).await? {
        Some(result) if user.may_access(&result.user_id) => Ok(result),
        _ => Err(not_found()),
    }
}

/// GET /api/quiz-results
///
/// `?id=` returns one result; otherwise the user's results, newest first.
pub async fn get_results(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<QuizResultQuery>,
) -> ApiResult<Response> {
    if query.id.is_some() {
        let id = parse_id(query.id.as_deref())?;
        return Ok(Json(owned_result(&state, &user, id).await?).into_response());
    }

    let target = user.target_user(query.user_id.as_deref())?;
    let language_code = trimmed(query.language_code);
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(DEFAULT_RESULT_LIMIT);

    let results =
        quiz_results::list_results(&state.db, &target, language_code.as_deref(), page).await?;
    Ok(Json(results).into_response())
}

/// POST /api/quiz-results
pub async fn create_result(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<QuizResultInput>,
) -> ApiResult<(StatusCode, Json<QuizResult>)> {
    let target = user.target_user(input.user_id.as_deref())?;
    let language_code = trimmed(input.language_code).ok_or_else(|| {
        ApiError::bad_request("MISSING_LANGUAGE_CODE", "Language code is required")
    })?;
    let quiz_type = trimmed(input.quiz_type)
        .ok_or_else(|| ApiError::bad_request("MISSING_QUIZ_TYPE", "Quiz type is required"))?;
    let score = input
        .score
        .ok_or_else(|| ApiError::bad_request("INVALID_SCORE", "Score is required"))?;
    let total_questions = input.total_questions.ok_or_else(|| {
        ApiError::bad_request("INVALID_TOTAL_QUESTIONS", "Total questions is required")
    })?;
    check_score(score, total_questions)?;

    let result = quiz_results::insert_result(
        &state.db,
        &target,
        &language_code,
        &quiz_type,
        score,
        total_questions,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// PUT /api/quiz-results?id=
///
/// Partial update; the score check runs against the merged values.
pub async fn update_result(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<QuizResultQuery>,
    Json(input): Json<QuizResultInput>,
) -> ApiResult<Json<QuizResult>> {
    let id = parse_id(query.id.as_deref())?;
    let existing = owned_result(&state, &user, id).await?;

    let quiz_type = match input.quiz_type {
        Some(raw) => trimmed(Some(raw)).ok_or_else(|| {
            ApiError::bad_request("INVALID_QUIZ_TYPE", "Quiz type cannot be empty")
        })?,
        None => existing.quiz_type,
    };
    let score = input.score.unwrap_or(existing.score);
    let total_questions = input.total_questions.unwrap_or(existing.total_questions);
    check_score(score, total_questions)?;

    quiz_results::update_result(&state.db, id, &quiz_type, score, total_questions)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/quiz-results?id=
pub async fn delete_result(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<QuizResultQuery>,
) -> ApiResult<Response> {
    let id = parse_id(query.id.as_deref())?;
    owned_result(&state, &user, id).await?;

    let result = quiz_results::delete_result(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(deleted("Quiz result deleted successfully", result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(result: ApiResult<()>) -> Option<&'static str> {
        match result {
            Ok(()) => None,
            Err(ApiError::BadRequest { code, .. }) => Some(code),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_score_rules() {
        assert_eq!(code(check_score(7, 10)), None);
        assert_eq!(code(check_score(10, 10)), None);
        assert_eq!(code(check_score(0, 1)), None);
        assert_eq!(code(check_score(-1, 10)), Some("INVALID_SCORE"));
        assert_eq!(code(check_score(0, 0)), Some("INVALID_TOTAL_QUESTIONS"));
        assert_eq!(code(check_score(11, 10)), Some("SCORE_EXCEEDS_TOTAL"));
    }
}
