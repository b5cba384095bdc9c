//! Document service error types.
//!
//! `ServiceError` wraps the errors of every component the service drives.
//! All of them convert into the application-wide `AppError`.

use docflow_shared::types::DocumentId;
use docflow_shared::{AppError, ErrorKind};
use thiserror::Error;
use tracing::error;

use crate::conversion::ConversionError;
use crate::document::{DocumentStatus, DocumentType};
use crate::identity::{IdentityError, Role};
use crate::ledger::{EventKind, PostingError};
use crate::numbering::NumberingError;
use crate::store::StoreError;
use crate::variance::VarianceError;
use crate::workflow::WorkflowError;

/// Errors raised by the document service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Document not found.
    #[error("{document_type} {id} not found")]
    DocumentNotFound {
        /// Requested type.
        document_type: DocumentType,
        /// Requested ID.
        id: DocumentId,
    },

    /// The actor may not perform the operation.
    #[error("Role {actor_role} may not {operation}")]
    NotAuthorized {
        /// The attempted operation.
        operation: &'static str,
        /// The actor's role.
        actor_role: Role,
    },

    /// The document can no longer be edited or deleted directly.
    #[error("Document {document_id} is {status} and cannot be modified")]
    NotEditable {
        /// The document.
        document_id: DocumentId,
        /// The current status.
        status: DocumentStatus,
    },

    /// The event does not belong to the document's current status.
    #[error("Cannot post {event_kind} for document {document_id} in status {status}")]
    EventNotPostable {
        /// The document.
        document_id: DocumentId,
        /// The requested event.
        event_kind: EventKind,
        /// The current status.
        status: DocumentStatus,
    },

    /// The document changed between read and write.
    #[error("Document {0} was modified concurrently")]
    ConcurrentModification(DocumentId),

    /// Token resolution failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Transition failed.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Posting or reversal failed.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// Conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Aggregation failed.
    #[error(transparent)]
    Variance(#[from] VarianceError),

    /// Numbering failed.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::DocumentNotFound { .. } => ErrorKind::NotFound,
            Self::NotAuthorized { .. } => ErrorKind::Authorization,
            Self::NotEditable { .. } | Self::EventNotPostable { .. } => {
                ErrorKind::InvalidTransition
            }
            Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::Identity(err) => err.kind(),
            Self::Workflow(err) => err.kind(),
            Self::Posting(err) => err.kind(),
            Self::Conversion(err) => err.kind(),
            Self::Variance(err) => err.kind(),
            Self::Numbering(err) => err.kind(),
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
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::NotEditable { .. } => "DOCUMENT_NOT_EDITABLE",
            Self::EventNotPostable { .. } => "EVENT_NOT_POSTABLE",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Identity(err) => err.error_code(),
            Self::Workflow(err) => err.error_code(),
            Self::Posting(err) => err.error_code(),
            Self::Conversion(err) => err.error_code(),
            Self::Variance(err) => err.error_code(),
            Self::Numbering(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }
}

/// Renders a component error as an `AppError`.
///
/// Store failures keep their detail in the log and surface a generic message.
fn to_app_error(kind: ErrorKind, message: String) -> AppError {
    if kind == ErrorKind::Store {
        error!(error = %message, "Store failure");
        return AppError::new(kind, "the document store failed to complete the operation");
    }
    AppError::new(kind, message)
}

macro_rules! impl_into_app_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for AppError {
                fn from(err: $error) -> Self {
                    to_app_error(err.kind(), err.to_string())
                }
            }
        )+
    };
}

impl_into_app_error!(
    ServiceError,
    WorkflowError,
    PostingError,
    ConversionError,
    VarianceError,
    NumberingError,
    StoreError,
    IdentityError,
);
