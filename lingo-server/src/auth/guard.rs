//! Route guard and the authenticated-caller extractor
//!
//! The guard runs on every request: it resolves the session (if any),
//! applies the route policy from `lingo_common::access`, and stores the
//! caller in request extensions for handlers.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use lingo_common::access::{self, AccessDecision};
use lingo_common::db::User;
use lingo_common::Capability;
use tracing::{debug, warn};

use super::session;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Path of the page shown when a signed-in user lacks the role for a page
pub const UNAUTHORIZED_PAGE: &str = "/unauthorized";

/// Authenticated caller, placed in request extensions by [`access_guard`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }

    /// 403 unless the caller's role holds `capability`
    pub fn require(&self, capability: Capability) -> ApiResult<()> {
        if access::has_permission(self.0.role, capability) {
            Ok(())
        } else {
            warn!(
                "User {} ({}) denied {}",
                self.0.id,
                self.0.role,
                capability.as_str()
            );
            Err(ApiError::Forbidden {
                required: capability.permitted_roles(),
                current: self.0.role,
            })
        }
    }

    /// Whose learner records a request targets: the caller by default,
    /// another user only for callers holding USERS_READ
    pub fn target_user(&self, requested: Option<&str>) -> ApiResult<String> {
        match requested {
            Some(other) if other != self.0.id => {
                self.require(Capability::UsersRead)?;
                Ok(other.to_string())
            }
            _ => Ok(self.0.id.clone()),
        }
    }

    /// Whether the caller may act on a record owned by `owner_id`
    pub fn may_access(&self, owner_id: &str) -> bool {
        owner_id == self.0.id || access::has_permission(self.0.role, Capability::UsersRead)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(ApiError::unauthenticated)
    }
}

/// Middleware applying the route access policy
pub async fn access_guard(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = session::resolve_user(&state.db, request.headers()).await?;
    let path = request.uri().path().to_string();

    match access::evaluate(&path, user.as_ref().map(|u| u.role)) {
        AccessDecision::Allow => {
            if let Some(user) = user {
                request.extensions_mut().insert(CurrentUser(user));
            }
            Ok(next.run(request).await)
        }
        AccessDecision::Unauthorized => {
            debug!("Unauthenticated request to {}", path);
            Err(ApiError::unauthenticated())
        }
        AccessDecision::Forbidden {
            capability,
            required,
            current,
        } => {
            warn!("Role {} denied {} on {}", current, capability.as_str(), path);
            Err(ApiError::Forbidden { required, current })
        }
        AccessDecision::RedirectToLogin { location } => Ok(Redirect::temporary(&location).into_response()),
        AccessDecision::RedirectToUnauthorized => {
            Ok(Redirect::temporary(UNAUTHORIZED_PAGE).into_response())
        }
    }
}
