//! Route guard tests
//!
//! Drives the full router to check the guard decisions: unprotected pass
//! through, 401/403 JSON on API paths, redirects on page paths, and session
//! resolution from header or cookie.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestApp;
use lingo_common::Role;
use tower::util::ServiceExt;

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_public_routes_need_no_session() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_without_session_is_401() {
    let app = TestApp::new().await;

    for uri in [
        "/api/user/me",
        "/api/user-progress",
        "/api/quiz-results",
        "/api/learned-vocabulary",
        "/api/admin/users",
        "/api/analytics/summary",
    ] {
        let (status, body) = app.get(uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(body["code"], "UNAUTHORIZED", "{}", uri);
    }
}

#[tokio::test]
async fn test_unknown_token_is_401() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/user/me", Some("not-a-real-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_api_with_wrong_role_is_403() {
    let app = TestApp::new().await;
    let (_, instructor) = app.account("instructor@example.com", Role::Instructor).await;

    let (status, body) = app.get("/api/admin/users", Some(&instructor)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(body["required"], serde_json::json!(["admin"]));
    assert_eq!(body["current"], "instructor");
}

#[tokio::test]
async fn test_page_without_session_redirects_to_login() {
    let app = TestApp::new().await;

    let response = app.raw("GET", "/dashboard", None, None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/login?redirect=%2Fdashboard");
}

#[tokio::test]
async fn test_page_with_wrong_role_redirects_to_unauthorized() {
    let app = TestApp::new().await;
    let (_, learner) = app.account("learner@example.com", Role::User).await;

    let response = app.raw("GET", "/chatbot", Some(&learner), None).await;
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&response), "/unauthorized");
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new().await;
    let (user_id, token) = app.account("learner@example.com", Role::User).await;

    let request = Request::builder()
        .uri("/api/user/me")
        .header(header::COOKIE, format!("theme=dark; lingo.session_token={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let me = common::extract_json(response.into_body()).await;
    assert_eq!(me["id"], user_id.as_str());
}

#[tokio::test]
async fn test_expired_session_is_401() {
    let app = TestApp::new().await;
    let (user_id, token) = app.account("learner@example.com", Role::User).await;

    sqlx::query("UPDATE sessions SET expires_at = 0 WHERE user_id = ?")
        .bind(&user_id)
        .execute(&app.db)
        .await
        .unwrap();

    let (status, _) = app.get("/api/user/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_deactivated_user_is_401() {
    let app = TestApp::new().await;
    let (user_id, token) = app.account("learner@example.com", Role::User).await;

    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(&user_id)
        .execute(&app.db)
        .await
        .unwrap();

    let (status, _) = app.get("/api/user/me", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
