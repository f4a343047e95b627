//! Change-feed integration tests
//!
//! Version computation against a real schema, and the SSE endpoints as
//! served by the router.

mod common;

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use common::{course_body, TestApp};
use futures::StreamExt;
use lingo_common::Role;
use lingo_server::feed::{Scope, SqliteVersionSource, VersionSource};
use lingo_server::AppState;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_empty_scopes_have_version_zero() {
    let app = TestApp::new().await;
    let source = SqliteVersionSource::new(app.db.clone());

    assert_eq!(source.compute_version(&Scope::Global).await.unwrap(), 0);
    assert_eq!(
        source
            .compute_version(&Scope::Course("nope".to_string()))
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_versions_increase_with_catalog_writes() {
    let app = TestApp::new().await;
    let (_, instructor) = app.account("instructor@example.com", Role::Instructor).await;
    let token = Some(instructor.as_str());
    let source = SqliteVersionSource::new(app.db.clone());
    let course = Scope::Course("es-101".to_string());

    app.send("POST", "/api/courses", token, Some(course_body("es-101", "Spanish")))
        .await;
    let global_v1 = source.compute_version(&Scope::Global).await.unwrap();
    let course_v1 = source.compute_version(&course).await.unwrap();
    assert!(global_v1 > 0);
    assert_eq!(course_v1, global_v1);

    // a new module moves the course version but not the catalog version
    let (_, module) = app
        .send("POST", "/api/courses/es-101/modules", token, Some(json!({ "title": "M1" })))
        .await;
    let course_v2 = source.compute_version(&course).await.unwrap();
    assert!(course_v2 > course_v1);
    assert_eq!(source.compute_version(&Scope::Global).await.unwrap(), global_v1);

    let (_, lesson) = app
        .send(
            "POST",
            &format!("/api/modules/{}/lessons", module["id"]),
            token,
            Some(json!({ "title": "Hola" })),
        )
        .await;
    let course_v3 = source.compute_version(&course).await.unwrap();
    assert!(course_v3 > course_v2);

    app.send(
        "POST",
        "/api/courses/es-101/grammar",
        token,
        Some(json!({ "title": "Ser vs estar", "content": "Two verbs for to be" })),
    )
    .await;
    let course_v4 = source.compute_version(&course).await.unwrap();
    assert!(course_v4 > course_v3);

    // in-place edits move the course version too
    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/modules/{}", module["id"]),
            token,
            Some(json!({ "title": "Greetings" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let course_v5 = source.compute_version(&course).await.unwrap();
    assert!(course_v5 > course_v4);
    assert_eq!(source.compute_version(&Scope::Global).await.unwrap(), global_v1);

    let (status, _) = app
        .send(
            "PUT",
            &format!("/api/lessons/{}", lesson["id"]),
            token,
            Some(json!({ "content": "Saying hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let course_v6 = source.compute_version(&course).await.unwrap();
    assert!(course_v6 > course_v5);

    let (status, _) = app
        .send(
            "POST",
            "/api/courses",
            token,
            Some(course_body("es-101", "Spanish, revised")),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let global_v2 = source.compute_version(&Scope::Global).await.unwrap();
    assert!(global_v2 > global_v1);
    let course_v7 = source.compute_version(&course).await.unwrap();
    assert!(course_v7 > course_v6);
    assert_eq!(course_v7, global_v2);

    // reading does not move anything
    assert_eq!(
        source.compute_version(&course).await.unwrap(),
        source.compute_version(&course).await.unwrap()
    );
}

#[tokio::test]
async fn test_catalog_stream_headers_and_init_event() {
    let app = TestApp::new().await;

    let response = app.raw("GET", "/api/courses/stream", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("text/event-stream"), "{}", content_type);
    assert_eq!(headers.get(header::CACHE_CONTROL).unwrap(), "no-cache");
    assert_eq!(headers.get("x-accel-buffering").unwrap(), "no");

    let mut body = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .expect("init should arrive immediately")
        .expect("stream should not end")
        .expect("frame should be readable");
    let frame = String::from_utf8(first.to_vec()).unwrap();

    assert!(frame.starts_with("data: "), "{}", frame);
    let payload: serde_json::Value =
        serde_json::from_str(frame.trim_start_matches("data: ").trim()).unwrap();
    assert_eq!(payload["type"], "init");
    assert_eq!(payload["version"], 0);
    assert!(payload["now"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn test_course_stream_reports_current_version() {
    let app = TestApp::new().await;
    let (_, instructor) = app.account("instructor@example.com", Role::Instructor).await;
    let (_, course) = app
        .send("POST", "/api/courses", Some(&instructor), Some(course_body("es-101", "Spanish")))
        .await;

    let response = app.raw("GET", "/api/courses/es-101/stream", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut body = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(5), body.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let frame = String::from_utf8(first.to_vec()).unwrap();
    let payload: serde_json::Value =
        serde_json::from_str(frame.trim_start_matches("data: ").trim()).unwrap();

    assert_eq!(payload["type"], "init");
    assert_eq!(payload["version"], course["updated_at"]);
}

struct BrokenSource;

#[async_trait]
impl VersionSource for BrokenSource {
    async fn compute_version(&self, _scope: &Scope) -> lingo_common::Result<i64> {
        Err(lingo_common::Error::Internal("database unavailable".to_string()))
    }
}

#[tokio::test]
async fn test_stream_setup_failure_is_500() {
    let app = TestApp::with_state(|db| AppState {
        versions: Arc::new(BrokenSource),
        ..AppState::new(db)
    })
    .await;

    let (status, body) = app.get("/api/courses/stream", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "STREAM_SETUP_FAILED");
}
