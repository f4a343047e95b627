//! Caller profile, stats, and admin user management

use axum::{
    extract::{Query, State},
    Json,
};
use lingo_common::db::User;
use lingo_common::{Capability, Role};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentUser;
use crate::db::analytics::{self, UserStats};
use crate::db::users;
use crate::error::{ApiError, ApiResult};
use crate::pagination::{Page, PageParams};
use crate::AppState;

const DEFAULT_USER_LIMIT: i64 = 50;

/// GET /api/user/me
pub async fn get_me(user: CurrentUser) -> Json<User> {
    Json(user.0)
}

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub name: Option<String>,
    pub image: Option<String>,
}

/// PUT /api/user/me
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(input): Json<ProfileInput>,
) -> ApiResult<Json<User>> {
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_NAME", "Name is required"))?;
    let image = input.image.filter(|i| !i.trim().is_empty());

    users::update_profile(&state.db, user.id(), &name, image.as_deref())
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))
}

/// GET /api/user/stats
pub async fn get_stats(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<UserStats>> {
    Ok(Json(analytics::user_stats(&state.db, user.id()).await?))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub limit: i64,
    pub offset: i64,
    /// Rows in this page
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub pagination: PageInfo,
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Json<UserListResponse>> {
    user.require(Capability::UsersRead)?;

    let Page { limit, offset } = PageParams {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve(DEFAULT_USER_LIMIT);
    let search = query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let found = users::list_users(&state.db, search.as_deref(), Page { limit, offset }).await?;
    Ok(Json(UserListResponse {
        pagination: PageInfo {
            limit,
            offset,
            total: found.len(),
        },
        users: found,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UserAccessInput {
    pub user_id: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// PUT /api/admin/users
pub async fn update_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Json(input): Json<UserAccessInput>,
) -> ApiResult<Json<User>> {
    admin.require(Capability::UsersWrite)?;

    let user_id = input
        .user_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("MISSING_USER_ID", "User ID is required"))?;
    let role = input
        .role
        .map(|r| r.parse::<Role>().map_err(|_| ApiError::InvalidRole(r)))
        .transpose()?;

    let updated = users::update_access(&state.db, &user_id, role, input.is_active)
        .await?
        .ok_or_else(|| ApiError::not_found("USER_NOT_FOUND", "User not found"))?;

    info!(
        "Admin {} set user {} to role {} (active: {})",
        admin.id(),
        updated.id,
        updated.role,
        updated.is_active
    );
    Ok(Json(updated))
}
