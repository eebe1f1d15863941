//! ReadQuest API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use readquest_core::error::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The story catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(#[from] readquest_catalog::CatalogError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error that implements `IntoResponse`.
#[derive(Debug)]
pub enum ApiError {
    /// A failure raised by a bounded context.
    Domain(DomainError),
    /// A lookup that found nothing, with its own error code.
    NotFound {
        /// Machine-readable error code.
        error: &'static str,
        /// Human-readable error message.
        message: String,
    },
}

impl ApiError {
    /// A 404 with a specific error code.
    #[must_use]
    pub fn not_found(error: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            error,
            message: message.into(),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

fn classify(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::AggregateNotFound(_) => (StatusCode::NOT_FOUND, "aggregate_not_found"),
        DomainError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, "concurrency_conflict"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
        DomainError::Infrastructure(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Domain(err) => {
                let (status, error) = classify(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                (
                    status,
                    ErrorBody {
                        error,
                        message: err.to_string(),
                    },
                )
            }
            Self::NotFound { error, message } => {
                (StatusCode::NOT_FOUND, ErrorBody { error, message })
            }
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_aggregate_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::AggregateNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_concurrency_conflict_maps_to_409() {
        assert_eq!(
            status_of(DomainError::ConcurrencyConflict {
                aggregate_id: Uuid::new_v4(),
                expected: 1,
                actual: 2,
            }),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_and_invalid_amount_map_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(DomainError::InvalidAmount(0)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_not_found_carries_its_own_code() {
        // Arrange
        let error = ApiError::not_found("progress_not_found", "no progress");

        // Act
        let response = error.into_response();

        // Assert
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"], "progress_not_found");
        assert_eq!(json["message"], "no progress");
    }
}
