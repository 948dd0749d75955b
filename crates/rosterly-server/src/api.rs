//! Shared API error type for the Rosterly server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rosterly_store::StoreError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
///
/// Duplicate email and duplicate student number map to 400, not 409:
/// the HTTP contract reports every client-side rejection as Bad Request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail(_) => ApiError::Conflict("User already exists".to_string()),
            StoreError::DuplicateStudentNumber(_) => {
                ApiError::Conflict("Student number already exists".to_string())
            }
            StoreError::Io(_) | StoreError::Json(_) | StoreError::PasswordHash(_) => {
                ApiError::Internal(e.to_string())
            }
        }
    }
}
