//! Error types for sahayak-planner
//!
//! Three layers:
//! - [`ValidationError`] / [`ControllerError`]: local rejections raised by the
//!   phase controller before any request is issued
//! - [`ServiceError`]: failures talking to the remote content service; these
//!   never leave the controller, they are folded into session state
//! - [`ApiError`]: HTTP-facing error with JSON body

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sahayak_common::events::RequestKind;
use serde_json::json;
use thiserror::Error;

/// Local precondition violation; never reaches the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Extraction submitted with no image
    #[error("missing-file")]
    MissingFile,

    /// Generation submitted with empty text
    #[error("empty-text")]
    EmptyText,

    /// Generation submitted with blank grade level
    #[error("empty-grade-level")]
    EmptyGradeLevel,

    /// Generation submitted with blank subject
    #[error("empty-subject")]
    EmptySubject,

    /// Text edit attempted before any text was extracted
    #[error("no-text")]
    NoExtractedText,
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::MissingFile => "missing-file",
            ValidationError::EmptyText => "empty-text",
            ValidationError::EmptyGradeLevel => "empty-grade-level",
            ValidationError::EmptySubject => "empty-subject",
            ValidationError::NoExtractedText => "no-text",
        }
    }
}

/// Rejection returned synchronously by the phase controller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A request of this kind is already outstanding
    #[error("A {0} request is already in progress")]
    Busy(RequestKind),
}

/// Failure class, used for logging and diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network/connectivity failure
    Transport,
    /// Endpoint reached but signalled failure or returned unusable data
    ServiceFailure,
}

/// Remote content service errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Generation endpoint answered `success: false`
    #[error("Service reported failure")]
    Rejected,

    /// Generation endpoint answered `success: true` without this field
    #[error("Response missing field: {0}")]
    Incomplete(&'static str),
}

impl ServiceError {
    pub fn class(&self) -> FailureClass {
        match self {
            ServiceError::Network(_) => FailureClass::Transport,
            _ => FailureClass::ServiceFailure,
        }
    }
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

    /// Workflow precondition violated (400)
    #[error("Validation failed: {0}")]
    Validation(ValidationError),

    /// Conflict (409) - request of the same kind already outstanding
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upload exceeds the configured limit (413)
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        match err {
            ControllerError::Validation(v) => ApiError::Validation(v),
            busy @ ControllerError::Busy(_) => ApiError::Conflict(busy.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Validation(v) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                v.code().to_string(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg)
            }
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
