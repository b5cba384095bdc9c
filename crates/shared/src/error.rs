//! Application-wide error types.
//!
//! Every business error raised by the core maps onto one of six kinds. The
//! request layer renders an `AppError` without knowing which module raised it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// The error taxonomy shared by every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or incomplete input to a posting or transition rule.
    Validation,
    /// Action illegal from the current status.
    InvalidTransition,
    /// Actor role insufficient for the requested transition.
    Authorization,
    /// Optimistic-concurrency loss, numbering race, already-posted/converted.
    Conflict,
    /// Referenced document or account mapping absent.
    NotFound,
    /// Collaborator failure.
    Store,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::InvalidTransition => 422,
            Self::Authorization => 403,
            Self::Conflict => 409,
            Self::NotFound => 404,
            Self::Store => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::Authorization => "FORBIDDEN",
            Self::Conflict => "CONFLICT",
            Self::NotFound => "NOT_FOUND",
            Self::Store => "STORE_ERROR",
        }
    }
}

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Illegal status transition.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Access denied.
    #[error("Access denied: {0}")]
    Authorization(String),

    /// Conflict (concurrent modification, duplicate, already consumed).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store failure. The message is generic; details are logged at the source.
    #[error("Store error: {0}")]
    Store(String),
}

impl AppError {
    /// Builds an error of the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::InvalidTransition => Self::InvalidTransition(message),
            ErrorKind::Authorization => Self::Authorization(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::Store => Self::Store(message),
        }
    }

    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InvalidTransition(_) => ErrorKind::InvalidTransition,
            Self::Authorization(_) => ErrorKind::Authorization,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        self.kind().error_code()
    }
}
