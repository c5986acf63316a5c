//! Error types for the presentation engine
//!
//! One thiserror enum per concern, plus `AppError` which the HTTP layer
//! turns into JSON error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Storage Error ==
/// Failures of the durable key-value mirror.
///
/// These never escape the cache store; they are logged and counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The backing store refused the write because it is full
    #[error("Storage quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The payload could not be encoded or decoded
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// The backing medium failed
    #[error("Storage I/O failed: {0}")]
    Io(String),
}

// == Source Error ==
/// Failures of the remote collection source.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport-level failure, retryable by the caller
    #[error("Network error: {0}")]
    Network(String),

    /// The caller is not allowed to read or mutate the collection
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Collection or record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A record with the same identifier already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A record failed validation at ingestion
    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] RecordError),
}

// == Record Error ==
/// Validation failures when ingesting raw record payloads.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Payload is not a JSON object
    #[error("Record payload is not an object")]
    NotAnObject,

    /// The identifier field is missing or blank
    #[error("Record is missing its identifier")]
    MissingId,

    /// A known field carries a value of the wrong shape
    #[error("Field '{field}' is invalid: {reason}")]
    InvalidField { field: String, reason: String },
}

// == Render Error ==
/// Construction and usage failures of the viewport renderer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// The rendering surface is not attached to anything scrollable
    #[error("Rendering surface not found: {0}")]
    SurfaceNotFound(String),

    /// Viewport geometry is unusable (non-positive item height, etc.)
    #[error("Invalid viewport configuration: {0}")]
    InvalidConfig(String),

    /// Item index outside the backing list
    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

// == App Error ==
/// Unified error type for the HTTP surface.
#[derive(Error, Debug)]
pub enum AppError {
    /// Remote source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Invalid record payload
    #[error(transparent)]
    Record(#[from] RecordError),

    /// Viewport misuse
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Source(SourceError::NotFound(_)) => StatusCode::NOT_FOUND,
            AppError::Source(SourceError::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            AppError::Source(SourceError::Conflict(_)) => StatusCode::CONFLICT,
            AppError::Source(SourceError::InvalidRecord(_)) => StatusCode::BAD_REQUEST,
            AppError::Source(SourceError::Network(_)) => StatusCode::BAD_GATEWAY,
            AppError::Record(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Render(RenderError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP layer.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_wraps_record_error() {
        let err: SourceError = RecordError::MissingId.into();
        assert_eq!(err.to_string(), "Invalid record: Record is missing its identifier");
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Source(SourceError::NotFound("r1".into())), StatusCode::NOT_FOUND),
            (AppError::Source(SourceError::Network("down".into())), StatusCode::BAD_GATEWAY),
            (AppError::Record(RecordError::NotAnObject), StatusCode::BAD_REQUEST),
            (AppError::InvalidRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                AppError::Render(RenderError::SurfaceNotFound("list".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
