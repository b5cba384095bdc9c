//! Variance error types.

use chrono::NaiveDate;
use docflow_shared::ErrorKind;
use docflow_shared::types::DocumentId;
use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur when aggregating.
#[derive(Debug, Error)]
pub enum VarianceError {
    /// Budget not found.
    #[error("Budget {0} not found")]
    BudgetNotFound(DocumentId),

    /// Period end before its start.
    #[error("Invalid period: {start} is after {end}")]
    InvalidPeriod {
        /// Period start.
        start: NaiveDate,
        /// Period end.
        end: NaiveDate,
    },

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl VarianceError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BudgetNotFound(_) => ErrorKind::NotFound,
            Self::InvalidPeriod { .. } => ErrorKind::Validation,
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
            Self::BudgetNotFound(_) => "BUDGET_NOT_FOUND",
            Self::InvalidPeriod { .. } => "INVALID_PERIOD",
            Self::Store(err) => err.error_code(),
        }
    }
}
