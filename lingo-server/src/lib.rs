//! lingo-server library: HTTP surface of the Lingo language-learning service
//!
//! Course catalog and authoring, learner records, session auth with a
//! role-based route guard, and per-scope change feeds over SSE.

use axum::Router;
use lingo_common::config::{
    Settings, DEFAULT_MIN_PASSWORD_LENGTH, DEFAULT_SESSION_TTL_HOURS,
};
use lingo_common::time::millis_to_duration;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;

pub mod api;
pub mod auth;
pub mod db;
pub mod error;
pub mod feed;
pub mod pagination;

use feed::{FeedConfig, SqliteVersionSource, VersionSource};

/// Session and sign-up policy
#[derive(Debug, Clone, Copy)]
pub struct AuthSettings {
    pub session_ttl_hours: i64,
    pub min_password_length: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Version source used by change feeds
    pub versions: Arc<dyn VersionSource>,
    pub feed_config: FeedConfig,
    pub auth: AuthSettings,
    /// Server start, for `/health` uptime
    pub startup_time: Instant,
}

impl AppState {
    /// State with compiled defaults
    pub fn new(db: SqlitePool) -> Self {
        Self {
            versions: Arc::new(SqliteVersionSource::new(db.clone())),
            db,
            feed_config: FeedConfig::default(),
            auth: AuthSettings::default(),
            startup_time: Instant::now(),
        }
    }

    /// State using resolved settings
    pub fn from_settings(db: SqlitePool, settings: &Settings) -> Self {
        Self {
            feed_config: FeedConfig {
                poll_interval: millis_to_duration(settings.poll_interval_ms),
                keepalive_interval: millis_to_duration(settings.keepalive_interval_ms),
            },
            auth: AuthSettings {
                session_ttl_hours: settings.session_ttl_hours,
                min_password_length: settings.min_password_length,
            },
            ..Self::new(db)
        }
    }
}

/// Build application router
///
/// Every request passes through [`auth::access_guard`]; handlers needing a
/// caller take [`auth::CurrentUser`].
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{get, post, put};

    let auth_routes = Router::new()
        .route("/api/auth/sign-up", post(api::auth::sign_up))
        .route("/api/auth/sign-in", post(api::auth::sign_in))
        .route("/api/auth/sign-out", post(api::auth::sign_out))
        .route("/api/auth/session", get(api::auth::current_session));

    let catalog_routes = Router::new()
        .route(
            "/api/courses",
            get(api::courses::list_courses).post(api::courses::upsert_course),
        )
        .route("/api/courses/stream", get(api::feed::catalog_stream))
        .route(
            "/api/courses/:course_id",
            get(api::courses::get_course).delete(api::courses::delete_course),
        )
        .route("/api/courses/:course_id/stream", get(api::feed::course_stream))
        .route(
            "/api/courses/:course_id/progress",
            get(api::courses::get_course_progress).put(api::courses::save_course_progress),
        )
        .route("/api/courses/:course_id/modules", post(api::content::create_module))
        .route("/api/courses/:course_id/vocabulary", post(api::content::add_vocabulary))
        .route("/api/courses/:course_id/grammar", post(api::content::add_grammar))
        .route("/api/courses/:course_id/culture", post(api::content::add_culture))
        .route("/api/courses/:course_id/quiz", post(api::content::add_quiz_question))
        .route("/api/modules/:module_id", put(api::content::update_module))
        .route("/api/modules/:module_id/lessons", post(api::content::create_lesson))
        .route("/api/lessons/:lesson_id", put(api::content::update_lesson));

    let user_routes = Router::new()
        .route("/api/user/me", get(api::users::get_me).put(api::users::update_me))
        .route("/api/user/stats", get(api::users::get_stats))
        .route(
            "/api/admin/users",
            get(api::users::list_users).put(api::users::update_user),
        )
        .route("/api/analytics/summary", get(api::analytics::summary));

    let learner_routes = Router::new()
        .route(
            "/api/user-progress",
            get(api::progress::get_progress)
                .post(api::progress::upsert_progress)
                .put(api::progress::update_progress)
                .delete(api::progress::delete_progress),
        )
        .route(
            "/api/quiz-results",
            get(api::quiz_results::get_results)
                .post(api::quiz_results::create_result)
                .put(api::quiz_results::update_result)
                .delete(api::quiz_results::delete_result),
        )
        .route(
            "/api/learned-vocabulary",
            get(api::vocabulary::get_words)
                .post(api::vocabulary::add_word)
                .put(api::vocabulary::update_word)
                .delete(api::vocabulary::delete_word),
        );

    Router::new()
        .merge(auth_routes)
        .merge(catalog_routes)
        .merge(user_routes)
        .merge(learner_routes)
        .merge(api::health_routes())
        .fallback(api::fallback)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::access_guard,
        ))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
