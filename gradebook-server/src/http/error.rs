//! API error types with IntoResponse.
//!
//! Errors are converted to JSON responses with appropriate status codes.
//! Upstream failures are logged here and returned as generic messages;
//! warehouse errors carry connection details that do not belong in
//! response bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::executor::StoreError;
use crate::ingest::IngestError;

/// API error type with automatic HTTP status mapping.
#[derive(Debug)]
pub enum ApiError {
    /// Caller input failed validation (400).
    BadRequest { message: String },

    /// Resource not found (404).
    NotFound { resource: &'static str, id: String },

    /// Destination table state conflicts with the request (409).
    Conflict { message: String },

    /// Warehouse failure (500, logged).
    Store(StoreError),

    /// Internal error (500, logged).
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::BadRequest { message } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_request",
                    "message": message
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Store(e) => {
                // Log the actual error, return generic message
                tracing::error!("Warehouse error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        match e {
            IngestError::FileNotFound { path } => Self::NotFound {
                resource: "file",
                id: path.display().to_string(),
            },
            IngestError::UnsupportedFormat { .. }
            | IngestError::InvalidFormat { .. }
            | IngestError::Identifier(_)
            | IngestError::Csv(_)
            | IngestError::Json { .. } => Self::BadRequest {
                message: e.to_string(),
            },
            IngestError::NotEmpty { .. } => Self::Conflict {
                message: e.to_string(),
            },
            IngestError::Io(e) => Self::Internal {
                message: format!("I/O error: {e}"),
            },
            IngestError::Store(e) => Self::Store(StoreError::Query(e)),
        }
    }
}
