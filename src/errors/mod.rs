//! Error handling module for the Pokédex backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::ReferenceError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const DUPLICATE_KEY: &str = "DUPLICATE_KEY";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Lookup by id found nothing
    NotFound(String),
    /// Primary or unique key already taken
    DuplicateKey(String),
    /// A referenced type or skill does not exist
    MissingReference(ReferenceError),
    /// Field-level validation error
    Validation(String),
    /// Write refused because other rows still depend on the target
    Conflict(String),
    /// Store failure, distinct from a missing row
    Store(String),
    /// Malformed request body or path
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateKey(_) => StatusCode::BAD_REQUEST,
            AppError::MissingReference(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::DuplicateKey(_) => codes::DUPLICATE_KEY,
            AppError::MissingReference(_) => codes::VALIDATION_ERROR,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::Store(_) => codes::DATABASE_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::NotFound(msg) => msg.clone(),
            AppError::DuplicateKey(msg) => msg.clone(),
            AppError::MissingReference(missing) => missing.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => msg.clone(),
            AppError::Store(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::MissingReference(missing) => Some(missing.details()),
            _ => None,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::DuplicateKey(format!("Duplicate key: {}", db_err.message()));
            }
            if db_err.is_foreign_key_violation() {
                return AppError::Conflict(format!(
                    "Foreign key constraint failed: {}",
                    db_err.message()
                ));
            }
        }
        tracing::error!("Database error: {:?}", err);
        AppError::Store(format!("Database error: {}", err))
    }
}

impl From<ReferenceError> for AppError {
    fn from(err: ReferenceError) -> Self {
        AppError::MissingReference(err)
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details: error.details(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reference_maps_to_400_with_details() {
        let err = AppError::from(ReferenceError::MissingType(99));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = ErrorResponse::new(&err);
        assert!(!body.success);
        assert_eq!(body.error.code, codes::VALIDATION_ERROR);
        assert_eq!(body.error.message, "Type 99 does not exist");
        let details = body.error.details.unwrap();
        assert_eq!(details["kind"], "missing_type");
        assert_eq!(details["id"], 99);
    }

    #[test]
    fn test_store_errors_are_not_not_found() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), codes::DATABASE_ERROR);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::NotFound("Pokemon 4 not found".to_string());
        assert_eq!(err.to_string(), "NOT_FOUND: Pokemon 4 not found");
    }
}
