//! Error types and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::{RepositoryError, RepositoryErrorKind};
use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Result type alias using the service error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the service
///
/// Large error variants are boxed to reduce stack size
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Document store failure (unreachable, corrupt document)
    #[error("{0}")]
    Store(#[from] StoreError),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(Box<jsonwebtoken::errors::Error>),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// Authorization error
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (malformed body, malformed id)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Field validation failed
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,

    /// Optional error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// HTTP status code
    pub status: u16,
}

impl ErrorResponse {
    /// Create a new error response
    pub fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: None,
            status: status.as_u16(),
        }
    }

    /// Create error response with a code
    pub fn with_code(
        status: StatusCode,
        code: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
            status: status.as_u16(),
        }
    }
}

impl Error {
    /// HTTP status this error is reported with
    ///
    /// Uniqueness conflicts are client-input problems and share 400 with
    /// validation failures.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Jwt(_) | Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BadRequest(_) | Error::Conflict(_) | Error::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Config(_) | Error::Store(_) | Error::Io(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Store(_) => "STORE_ERROR",
            Error::Jwt(_) => "INVALID_TOKEN",
            Error::Io(_) => "IO_ERROR",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::NotFound(_) => "NOT_FOUND",
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Conflict(_) => "CONFLICT",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        // Internal details stay in the logs
        let message = match &self {
            Error::Config(e) => {
                tracing::error!("Configuration error: {}", e);
                "Service misconfigured".to_string()
            }
            Error::Store(e) => {
                tracing::error!(retriable = e.is_retriable(), "Store error: {}", e);
                "Document store operation failed".to_string()
            }
            Error::Io(e) => {
                tracing::error!("I/O error: {}", e);
                "I/O operation failed".to_string()
            }
            Error::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            Error::Jwt(e) => e.to_string(),
            Error::Validation(errors) => errors.to_string(),
            Error::Unauthorized(msg)
            | Error::Forbidden(msg)
            | Error::NotFound(msg)
            | Error::BadRequest(msg)
            | Error::Conflict(msg) => msg.clone(),
        };

        (status, Json(ErrorResponse::with_code(status, code, message))).into_response()
    }
}

// Conversions from external error types
impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::Jwt(Box::new(err))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Error::Validation(errors)
    }
}

impl From<RepositoryError> for Error {
    fn from(err: RepositoryError) -> Self {
        match err.kind {
            RepositoryErrorKind::NotFound => Error::NotFound(format!(
                "{} not found",
                err.entity_type.as_deref().unwrap_or("Entity")
            )),
            RepositoryErrorKind::AlreadyExists => Error::Conflict(err.message),
            RepositoryErrorKind::ValidationFailed => match err.violations {
                Some(violations) => Error::Validation(violations),
                None => Error::BadRequest(err.message),
            },
            RepositoryErrorKind::InvalidId => Error::BadRequest(err.message),
            RepositoryErrorKind::StoreFailed => Error::Store(StoreError::unavailable(err.message)),
            RepositoryErrorKind::SerializationError => Error::Internal(err.to_string()),
        }
    }
}
