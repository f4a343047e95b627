//! Course catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lingo_common::db::{Course, UserCourseProgress};
use lingo_common::Capability;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::courses::{self, CourseDetail, CourseFilter, CourseRecord};
use crate::db::progress;
use crate::error::{ApiError, ApiResult};
use crate::pagination::PageParams;
use crate::AppState;

const DEFAULT_COURSE_LIMIT: i64 = 30;

#[derive(Debug, Deserialize)]
pub struct CourseListQuery {
    pub search: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub language_code: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Trimmed, non-empty value; `all` counts as no filter when `all_means_any`
fn filter_value(value: Option<String>, all_means_any: bool) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !(all_means_any && v == "all"))
}

/// GET /api/courses
pub async fn list_courses(
    State(state): State<AppState>,
    Query(query): Query<CourseListQuery>,
) -> ApiResult<Json<Vec<Course>>> {
    let filter = CourseFilter {
        search: filter_value(query.search, false),
        level: filter_value(query.level, true),
        category: filter_value(query.category, true),
        language_code: filter_value(query.language_code, false),
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(DEFAULT_COURSE_LIMIT);

    Ok(Json(courses::list_courses(&state.db, &filter, page).await?))
}

#[derive(Debug, Deserialize)]
pub struct CourseInput {
    pub id: Option<String>,
    pub language_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<String>,
    pub category: Option<String>,
    pub flag: Option<String>,
    pub duration: Option<String>,
    pub students: Option<i64>,
    pub rating_tenths: Option<i64>,
    pub total_lessons: Option<i64>,
}

impl CourseInput {
    fn into_record(self) -> ApiResult<CourseRecord> {
        fn present(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        let missing = || ApiError::bad_request("MISSING_FIELDS", "Missing required fields");

        Ok(CourseRecord {
            id: present(self.id).ok_or_else(missing)?,
            language_code: present(self.language_code).ok_or_else(missing)?,
            title: present(self.title).ok_or_else(missing)?,
            description: present(self.description).ok_or_else(missing)?,
            level: present(self.level).ok_or_else(missing)?,
            category: present(self.category).ok_or_else(missing)?,
            flag: self.flag,
            duration: self.duration,
            students: self.students.unwrap_or(0),
            rating_tenths: self.rating_tenths.unwrap_or(0),
            total_lessons: self.total_lessons.unwrap_or(0),
        })
    }
}

/// POST /api/courses
///
/// Upsert by id: 201 when created, 200 when an existing course was
/// replaced.
pub async fn upsert_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<CourseInput>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    user.require(Capability::CoursesWrite)?;
    let record = input.into_record()?;

    let (course, inserted) = courses::upsert_course(&state.db, &record).await?;
    info!(
        "Course {} {} by {}",
        course.id,
        if inserted { "created" } else { "updated" },
        user.id()
    );

    let status = if inserted { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(course)))
}

/// GET /api/courses/:course_id
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseDetail>> {
    courses::load_course_detail(&state.db, &course_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("NOT_FOUND", "Course not found"))
}

/// DELETE /api/courses/:course_id
pub async fn delete_course(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<Value>> {
    user.require(Capability::CoursesDelete)?;

    if !courses::delete_course(&state.db, &course_id).await? {
        return Err(ApiError::not_found("NOT_FOUND", "Course not found"));
    }

    info!("Course {} deleted by {}", course_id, user.id());
    Ok(Json(json!({ "message": "Course deleted successfully", "id": course_id })))
}

#[derive(Debug, Serialize)]
pub struct CourseProgressResponse {
    pub course_id: String,
    pub total_lessons: i64,
    pub completed_lessons: i64,
    pub last_lesson_id: Option<i64>,
    pub percent_complete: f64,
    pub updated_at: Option<i64>,
}

impl CourseProgressResponse {
    fn new(course_id: String, total_lessons: i64, progress: Option<UserCourseProgress>) -> Self {
        let completed_lessons = progress.as_ref().map_or(0, |p| p.completed_lessons);
        let percent_complete = if total_lessons > 0 {
            (completed_lessons.min(total_lessons) as f64 * 100.0) / total_lessons as f64
        } else {
            0.0
        };

        Self {
            course_id,
            total_lessons,
            completed_lessons,
            last_lesson_id: progress.as_ref().and_then(|p| p.last_lesson_id),
            percent_complete,
            updated_at: progress.map(|p| p.updated_at),
        }
    }
}

async fn require_course(state: &AppState, course_id: &str) -> ApiResult<()> {
    if courses::course_exists(&state.db, course_id).await? {
        Ok(())
    } else {
        Err(ApiError::not_found("NOT_FOUND", "Course not found"))
    }
}

/// GET /api/courses/:course_id/progress
pub async fn get_course_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseProgressResponse>> {
    require_course(&state, &course_id).await?;

    let total = courses::count_lessons(&state.db, &course_id).await?;
    let saved = progress::find_course_progress(&state.db, user.id(), &course_id).await?;

    Ok(Json(CourseProgressResponse::new(course_id, total, saved)))
}

#[derive(Debug, Deserialize)]
pub struct CourseProgressInput {
    pub completed_lessons: Option<i64>,
    pub last_lesson_id: Option<i64>,
}

/// PUT /api/courses/:course_id/progress
///
/// Fields left out of the body keep their saved values.
pub async fn save_course_progress(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(course_id): Path<String>,
    Json(input): Json<CourseProgressInput>,
) -> ApiResult<Json<CourseProgressResponse>> {
    require_course(&state, &course_id).await?;

    if matches!(input.completed_lessons, Some(n) if n < 0) {
        return Err(ApiError::bad_request(
            "INVALID_COMPLETED_LESSONS",
            "Completed lessons cannot be negative",
        ));
    }

    let previous = progress::find_course_progress(&state.db, user.id(), &course_id).await?;
    let completed = input
        .completed_lessons
        .or(previous.map(|p| p.completed_lessons))
        .unwrap_or(0);

    let total = courses::count_lessons(&state.db, &course_id).await?;
    let saved = progress::save_course_progress(
        &state.db,
        user.id(),
        &course_id,
        completed.min(total),
        input.last_lesson_id,
    )
    .await?;

    Ok(Json(CourseProgressResponse::new(course_id, total, Some(saved))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_means_no_filter_for_level_and_category() {
        assert_eq!(filter_value(Some("all".into()), true), None);
        assert_eq!(filter_value(Some(" beginner ".into()), true), Some("beginner".into()));
        assert_eq!(filter_value(Some("all".into()), false), Some("all".into()));
        assert_eq!(filter_value(Some("   ".into()), false), None);
    }

    #[test]
    fn test_course_input_requires_core_fields() {
        let input = CourseInput {
            id: Some("spanish-101".into()),
            language_code: Some("es".into()),
            title: Some("Spanish".into()),
            description: Some("Basics".into()),
            level: Some("beginner".into()),
            category: None,
            flag: None,
            duration: None,
            students: None,
            rating_tenths: None,
            total_lessons: None,
        };
        match input.into_record() {
            Err(ApiError::BadRequest { code, .. }) => assert_eq!(code, "MISSING_FIELDS"),
            other => panic!("expected MISSING_FIELDS, got {:?}", other.map(|r| r.id)),
        }
    }

    #[test]
    fn test_progress_percent() {
        let progress = UserCourseProgress {
            id: 1,
            user_id: "u".into(),
            course_id: "c".into(),
            completed_lessons: 3,
            last_lesson_id: Some(9),
            updated_at: 5,
        };
        let response = CourseProgressResponse::new("c".into(), 4, Some(progress));
        assert_eq!(response.percent_complete, 75.0);
        assert_eq!(response.last_lesson_id, Some(9));

        let empty = CourseProgressResponse::new("c".into(), 0, None);
        assert_eq!(empty.percent_complete, 0.0);
        assert_eq!(empty.updated_at, None);
    }
}
