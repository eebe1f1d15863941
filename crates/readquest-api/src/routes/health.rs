//! Liveness endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use readquest_catalog::Mode;
use serde::Serialize;

use crate::state::AppState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the process serves requests.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Unlock mode the server was started in.
    pub mode: Mode,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        mode: state.unlock_policy.mode(),
    })
}

/// Returns the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use readquest_catalog::Mode;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::router;
    use crate::state::test_state;

    #[tokio::test]
    async fn test_health_reports_version_and_mode() {
        // Arrange
        let app = router().with_state(test_state(Mode::Development));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(json["mode"], "development");
    }
}
