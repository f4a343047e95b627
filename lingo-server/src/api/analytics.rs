//! Analytics summary (instructors and admins; the route guard enforces it)

use axum::{extract::State, Json};

use crate::db::analytics::{self, AnalyticsSummary};
use crate::error::ApiResult;
use crate::AppState;

/// GET /api/analytics/summary
pub async fn summary(State(state): State<AppState>) -> ApiResult<Json<AnalyticsSummary>> {
    Ok(Json(analytics::summary(&state.db).await?))
}
