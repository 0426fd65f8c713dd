//! HTTP error presentation
//!
//! `HttpAppError` wraps the domain `AppError` and renders it as a JSON
//! `ErrorResponse`, hiding sensitive details in production.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mediavault_core::{AppError, ErrorMetadata, LogLevel};
use mediavault_storage::StorageError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Structured error response body returned by all endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Client-facing error message
    pub error: String,
    /// Detailed error chain (omitted in production for sensitive errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Error type name (omitted in production for sensitive errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
    /// Whether the client may retry the request
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Newtype so `AppError` can implement Axum's `IntoResponse` from this crate
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => {
                HttpAppError(AppError::NotFound(format!("File not found: {}", key)))
            }
            StorageError::InvalidKey(key) => {
                HttpAppError(AppError::InvalidInput(format!("Invalid storage key: {}", key)))
            }
            other => HttpAppError(AppError::Storage(other.to_string())),
        }
    }
}

impl From<sqlx::Error> for HttpAppError {
    fn from(err: sqlx::Error) -> Self {
        HttpAppError(AppError::Database(err))
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|e| e.eq_ignore_ascii_case("production"))
        .unwrap_or(false)
}

fn log_error(err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %err, error_type = err.error_type(), "Request failed")
        }
        LogLevel::Warn => {
            tracing::warn!(error = %err, error_type = err.error_type(), "Request failed")
        }
        LogLevel::Error => tracing::error!(
            error = %err.detailed_message(),
            error_type = err.error_type(),
            "Request failed"
        ),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let err = self.0;
        log_error(&err);

        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let hide_details = is_production_env() && err.is_sensitive();
        let body = ErrorResponse {
            error: err.client_message(),
            details: if hide_details {
                None
            } else {
                Some(err.detailed_message())
            },
            error_type: if hide_details {
                None
            } else {
                Some(err.error_type().to_string())
            },
            code: err.error_code().to_string(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action().map(str::to_string),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404_with_details() {
        let err = HttpAppError(AppError::NotFound("Video not found".to_string()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn storage_not_found_becomes_404() {
        let err = HttpAppError::from(StorageError::NotFound("media/t/x.mp4".to_string()));
        assert_eq!(err.0.http_status_code(), 404);
    }

    #[test]
    fn storage_backend_error_becomes_500() {
        let err = HttpAppError::from(StorageError::BackendError("boom".to_string()));
        assert_eq!(err.0.http_status_code(), 500);
        assert_eq!(err.0.error_code(), "STORAGE_ERROR");
    }

    #[test]
    fn queue_error_is_500_and_recoverable() {
        let err = HttpAppError(AppError::Queue("enqueue failed".to_string()));
        assert_eq!(err.0.http_status_code(), 500);
        assert!(err.0.is_recoverable());
    }
}
