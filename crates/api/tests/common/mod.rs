#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use posefill_core::config::InterpolationConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

use posefill_api::config::{LogFormat, ServerConfig};
use posefill_api::router::build_app_router;
use posefill_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        log_format: LogFormat::Pretty,
        interpolation: InterpolationConfig::default(),
    }
}

/// Build the full application router (same middleware stack as `main.rs`).
pub fn build_test_app() -> Router {
    build_test_app_with(test_config())
}

pub fn build_test_app_with(config: ServerConfig) -> Router {
    build_app_router(AppState::new(config))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn post_empty(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A pose document with one person on each of `frames`, the pelvis x
/// coordinate equal to the frame number.
pub fn pose_document(total_frames: usize, fps: f64, frames: &[usize]) -> Value {
    let frames: Vec<Value> = frames
        .iter()
        .map(|&n| {
            json!({
                "frameNumber": n,
                "persons": [{
                    "personId": 0,
                    "confidence": 0.9,
                    "keypoints": [{ "name": "pelvis", "x": n as f64, "y": 0.0, "z": 0.0 }],
                    "meshVertices": [[n as f64, 1.0, 1.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]],
                    "meshFaces": [[0, 1, 2]],
                    "camera": { "tx": 0.0, "ty": 0.0, "tz": 40.0 }
                }]
            })
        })
        .collect();

    json!({ "totalFrames": total_frames, "fps": fps, "frames": frames })
}

/// Ingest `frames` into `video_id` and assert success.
pub async fn ingest(app: &Router, video_id: &str, total_frames: usize, fps: f64, frames: &[usize]) {
    let response = post_json(
        app,
        &format!("/api/v1/videos/{video_id}/ingest"),
        pose_document(total_frames, fps, frames),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
}
