//! `/api/user-progress`: per-language learner progress

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lingo_common::db::UserProgress;
use lingo_common::time::parse_rfc3339_ms;
use serde::Deserialize;

use super::{deleted, parse_id, IdQuery};
use crate::auth::CurrentUser;
use crate::db::{self, progress, progress::ProgressChanges};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProgressQuery {
    pub user_id: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProgressInput {
    pub user_id: Option<String>,
    pub language_code: Option<String>,
    pub words_learned: Option<i64>,
    pub lessons_completed: Option<i64>,
    pub quizzes_passed: Option<i64>,
    pub current_streak: Option<i64>,
    /// RFC 3339
    pub last_practice_date: Option<String>,
}

impl ProgressInput {
    fn changes(&self) -> ApiResult<ProgressChanges> {
        let counters = [
            self.words_learned,
            self.lessons_completed,
            self.quizzes_passed,
            self.current_streak,
        ];
        if counters.iter().flatten().any(|&n| n < 0) {
            return Err(ApiError::bad_request(
                "INVALID_COUNT",
                "Progress counters cannot be negative",
            ));
        }

        let last_practice_date = match self.last_practice_date.as_deref() {
            Some(raw) => Some(parse_rfc3339_ms(raw).ok_or_else(|| {
                ApiError::bad_request("INVALID_DATE", "last_practice_date must be RFC 3339")
            })?),
            None => None,
        };

        Ok(ProgressChanges {
            language_code: trimmed(self.language_code.as_deref()),
            words_learned: self.words_learned,
            lessons_completed: self.lessons_completed,
            quizzes_passed: self.quizzes_passed,
            current_streak: self.current_streak,
            last_practice_date,
        })
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn not_found() -> ApiError {
    ApiError::not_found("NOT_FOUND", "Progress record not found")
}

/// Record by id, hidden unless the caller may see its owner's records
async fn owned_record(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<UserProgress> {
    match progress::find_progress(&state.db, id).await? {
        Some(record) if user.may_access(&record.user_id) => Ok(record),
        _ => Err(not_found()),
    }
}

/// GET /api/user-progress
///
/// With `language_code` returns the single record, otherwise all of the
/// user's records. 404 when nothing matches.
pub async fn get_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ProgressQuery>,
) -> ApiResult<Response> {
    let target = user.target_user(query.user_id.as_deref())?;

    if let Some(language_code) = trimmed(query.language_code.as_deref()) {
        let record = progress::find_progress_for_language(&state.db, &target, &language_code)
            .await?
            .ok_or_else(not_found)?;
        return Ok(Json(record).into_response());
    }

    let records = progress::list_progress(&state.db, &target).await?;
    if records.is_empty() {
        return Err(ApiError::not_found("NOT_FOUND", "No progress records found"));
    }
    Ok(Json(records).into_response())
}

/// POST /api/user-progress
///
/// Upsert by (user, language): 201 when created, 200 when updated.
pub async fn upsert_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ProgressInput>,
) -> ApiResult<(StatusCode, Json<UserProgress>)> {
    let target = user.target_user(input.user_id.as_deref())?;
    let language_code = trimmed(input.language_code.as_deref()).ok_or_else(|| {
        ApiError::bad_request("MISSING_LANGUAGE_CODE", "Language code is required")
    })?;
    let mut changes = input.changes()?;
    // the key is (user, language); never rename it through an upsert
    changes.language_code = None;

    let (record, created) =
        progress::upsert_progress(&state.db, &target, &language_code, &changes).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(record)))
}

/// PUT /api/user-progress?id=
pub async fn update_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<IdQuery>,
    Json(input): Json<ProgressInput>,
) -> ApiResult<Json<UserProgress>> {
    let id = parse_id(query.id.as_deref())?;
    owned_record(&state, &user, id).await?;
    let changes = input.changes()?;

    progress::update_progress(&state.db, id, &changes)
        .await
        .map_err(|e| {
            if db::is_unique_violation(&e) {
                ApiError::conflict(
                    "PROGRESS_EXISTS",
                    "Progress for that language already exists",
                )
            } else {
                e.into()
            }
        })?
        .map(Json)
        .ok_or_else(not_found)
}

/// DELETE /api/user-progress?id=
pub async fn delete_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<IdQuery>,
) -> ApiResult<Response> {
    let id = parse_id(query.id.as_deref())?;
    owned_record(&state, &user, id).await?;

    let record = progress::delete_progress(&state.db, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(deleted("Progress record deleted successfully", record))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProgressInput {
        ProgressInput {
            user_id: None,
            language_code: Some(" fr ".to_string()),
            words_learned: Some(10),
            lessons_completed: None,
            quizzes_passed: None,
            current_streak: Some(3),
            last_practice_date: Some("2024-05-01T10:00:00Z".to_string()),
        }
    }

    #[test]
    fn test_changes_parse_date_and_trim_language() {
        let changes = input().changes().unwrap();
        assert_eq!(changes.language_code.as_deref(), Some("fr"));
        assert_eq!(changes.words_learned, Some(10));
        assert_eq!(changes.lessons_completed, None);
        assert_eq!(changes.last_practice_date, Some(1_714_557_600_000));
    }

    #[test]
    fn test_bad_date_rejected() {
        let mut bad = input();
        bad.last_practice_date = Some("yesterday".to_string());
        assert!(matches!(
            bad.changes(),
            Err(ApiError::BadRequest { code: "INVALID_DATE", .. })
        ));
    }

    #[test]
    fn test_negative_counter_rejected() {
        let mut bad = input();
        bad.quizzes_passed = Some(-1);
        assert!(matches!(
            bad.changes(),
            Err(ApiError::BadRequest { code: "INVALID_COUNT", .. })
        ));
    }
}
