//! Shared helpers for lingo-server integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use lingo_common::db::init::init_database;
use lingo_common::Role;
use lingo_server::auth::{password::hash_password, session::issue_session};
use lingo_server::db::users;
use lingo_server::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

/// Router over a fresh database in a temporary directory
pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    _dir: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        let (dir, db) = setup_test_db().await;
        let router = build_router(AppState::new(db.clone()));
        Self {
            router,
            db,
            _dir: dir,
        }
    }

    pub async fn with_state(state: impl FnOnce(SqlitePool) -> AppState) -> Self {
        let (dir, db) = setup_test_db().await;
        let router = build_router(state(db.clone()));
        Self {
            router,
            db,
            _dir: dir,
        }
    }

    /// Account with `role` plus a live session token for it
    pub async fn account(&self, email: &str, role: Role) -> (String, String) {
        let hash = hash_password("correct horse battery").unwrap();
        let user = users::create_user(&self.db, "Test User", email, &hash, role)
            .await
            .unwrap();
        let issued = issue_session(&self.db, &user.id, 24, &HeaderMap::new())
            .await
            .unwrap();
        (user.id, issued.token)
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = self.raw(method, uri, token, body).await;
        let status = response.status();
        (status, extract_json(response.into_body()).await)
    }

    pub async fn raw(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send("GET", uri, token, None).await
    }
}

async fn setup_test_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let db = init_database(&dir.path().join("lingo.db"))
        .await
        .expect("Should initialize test database");
    (dir, db)
}

/// Parse a JSON body; an empty body reads as `null`
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

pub fn course_body(id: &str, title: &str) -> Value {
    serde_json::json!({
        "id": id,
        "language_code": "es",
        "title": title,
        "description": "Everyday Spanish for travellers",
        "level": "beginner",
        "category": "travel",
        "flag": "🇪🇸",
    })
}
