//! Numbering error types.

use docflow_shared::ErrorKind;
use thiserror::Error;

use super::NumberSeries;
use crate::store::StoreError;

/// Errors that can occur while minting a number.
#[derive(Debug, Error)]
pub enum NumberingError {
    /// The counter stayed contended through every retry.
    #[error("Could not allocate a {series} number for {period} after {attempts} attempts")]
    Contention {
        /// Series requested.
        series: NumberSeries,
        /// Period requested.
        period: i32,
        /// Attempts made.
        attempts: u32,
    },

    /// Non-retryable store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl NumberingError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Contention { .. } => ErrorKind::Conflict,
            Self::Store(err) => err.kind(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Contention { .. } => "NUMBERING_CONFLICT",
            Self::Store(err) => err.error_code(),
        }
    }
}
