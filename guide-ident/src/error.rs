//! Error types for guide-ident

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::services::local_classifier::LocalError;

/// Errors surfaced by the identification workflow itself.
///
/// Remote transport failures never appear here: they trigger the
/// on-device fallback instead of failing the capture.
#[derive(Debug, Error)]
pub enum IdentError {
    /// A capture is already in flight (409)
    #[error("Capture {0} is already in flight")]
    WorkflowBusy(Uuid),

    /// The capture was cancelled before an outcome was produced
    #[error("Capture was cancelled")]
    Cancelled,

    /// On-device classification failed after the remote path was exhausted
    #[error("Local classification failed: {0}")]
    Local(#[from] LocalError),

    /// The capture's image bytes could not be read
    #[error("Image resource unavailable: {0}")]
    Image(#[from] std::io::Error),
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., identification already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Request was valid but could not be processed (422)
    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// guide-common error
    #[error("Common error: {0}")]
    Common(#[from] guide_common::Error),
}

impl From<IdentError> for ApiError {
    fn from(err: IdentError) -> Self {
        match err {
            IdentError::WorkflowBusy(id) => {
                ApiError::Conflict(format!("capture {} is already in flight", id))
            }
            IdentError::Cancelled => ApiError::Conflict("capture was cancelled".to_string()),
            IdentError::Local(e) => ApiError::Unprocessable(e.to_string()),
            IdentError::Image(e) => ApiError::BadRequest(format!("unreadable image: {}", e)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
