// ============================
// chatroom-backend-lib/src/error.rs
// ============================
//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed input: empty strings, disallowed kind, non-positive limit
    #[error("Validation error: {0}")]
    Validation(String),

    /// Duplicate active participant name
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown or expired participant
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient backing-store failure; retry later
    #[error("Unavailable: {0}")]
    Unavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::NotFound(_) => "NF_001",
            AppError::Unavailable(_) => "UNAVAILABLE_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(_) => "Invalid input provided".to_string(),
            AppError::Conflict(_) => "Name already in use".to_string(),
            AppError::NotFound(_) => "Participant not found".to_string(),
            AppError::Unavailable(_) => "Service temporarily unavailable".to_string(),
            AppError::Json(_) => "Invalid request format".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        // Use detailed messages in development, sanitized in production
        let message = if cfg!(debug_assertions) {
            self.to_string()
        } else {
            self.sanitized_message()
        };

        let body = serde_json::json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}
