//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use readquest_api::state::AppState;
use readquest_catalog::{Catalog, Mode, UnlockPolicy};
use readquest_core::clock::Clock;
use readquest_core::repository::EventRepository;
use readquest_test_support::{FixedClock, InMemoryEventRepository, MockRng};
use tower::ServiceExt;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Builds state over an in-memory event store with the embedded catalog.
pub fn build_test_state(mode: Mode) -> AppState {
    let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
    AppState::new(
        fixed_clock(),
        Arc::new(Mutex::new(MockRng)),
        repo,
        Arc::new(Catalog::embedded().unwrap()),
        UnlockPolicy::new(mode),
    )
}

/// The full router, as `main.rs` serves it minus the HTTP layers.
pub fn build_test_app(state: &AppState) -> Router {
    readquest_api::app(state.clone())
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    send(app, request).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
