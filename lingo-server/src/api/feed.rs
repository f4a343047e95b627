//! Change-feed endpoints
//!
//! `GET /api/courses/stream` watches the whole catalog,
//! `GET /api/courses/:course_id/stream` one course. Both are public.

use axum::{
    extract::{Path, State},
    response::Response,
};
use tracing::info;

use crate::error::ApiResult;
use crate::feed::{sse::sse_response, FeedHandle, Scope};
use crate::AppState;

async fn open_stream(state: &AppState, scope: Scope) -> ApiResult<Response> {
    info!("New SSE client connected to {} change feed", scope);
    let handle = FeedHandle::open(state.versions.clone(), scope, state.feed_config).await?;
    Ok(sse_response(handle))
}

/// GET /api/courses/stream
pub async fn catalog_stream(State(state): State<AppState>) -> ApiResult<Response> {
    open_stream(&state, Scope::Global).await
}

/// GET /api/courses/:course_id/stream
pub async fn course_stream(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> ApiResult<Response> {
    open_stream(&state, Scope::Course(course_id)).await
}
