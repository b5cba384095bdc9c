//! Workflow error types for document lifecycle management.
//!
//! Business rejections carry the document, the attempted action and the
//! status it was attempted from.

use docflow_shared::ErrorKind;
use docflow_shared::types::DocumentId;
use thiserror::Error;

use crate::document::{DocumentStatus, DocumentType};
use crate::identity::Role;
use crate::ledger::PostingError;
use crate::store::StoreError;
use crate::workflow::types::ActionKind;

/// Errors that can occur during workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The action is not declared from the current status.
    #[error("Cannot {action} document {document_id} from status {from}")]
    InvalidTransition {
        /// The document.
        document_id: DocumentId,
        /// The attempted action.
        action: ActionKind,
        /// The current status.
        from: DocumentStatus,
    },

    /// The actor may not perform the action.
    #[error("Role {actor_role} may not {action} document {document_id}; requires {required}")]
    NotAuthorized {
        /// The document.
        document_id: DocumentId,
        /// The attempted action.
        action: ActionKind,
        /// The actor's role.
        actor_role: Role,
        /// What the transition requires.
        required: String,
    },

    /// The action needs a non-blank reason.
    #[error("A reason is required to {action} document {document_id}")]
    ReasonRequired {
        /// The document.
        document_id: DocumentId,
        /// The attempted action.
        action: ActionKind,
    },

    /// The document can no longer be edited or deleted directly.
    #[error("Document {document_id} is {status} and cannot be modified")]
    NotEditable {
        /// The document.
        document_id: DocumentId,
        /// The current status.
        status: DocumentStatus,
    },

    /// The document was converted and its target still depends on it.
    #[error("Document {document_id} has been converted and cannot be cancelled")]
    AlreadyConverted {
        /// The converted source.
        document_id: DocumentId,
        /// The document it was converted into.
        target_id: Option<DocumentId>,
    },

    /// The document changed between read and write.
    #[error("Document {document_id} was modified concurrently; {action} not applied")]
    ConcurrentModification {
        /// The document.
        document_id: DocumentId,
        /// The attempted action.
        action: ActionKind,
    },

    /// Document not found.
    #[error("{document_type} {id} not found")]
    DocumentNotFound {
        /// Requested type.
        document_type: DocumentType,
        /// Requested ID.
        id: DocumentId,
    },

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Posting the transition's ledger effect failed.
    #[error(transparent)]
    Posting(#[from] PostingError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl WorkflowError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. }
            | Self::NotEditable { .. }
            | Self::AlreadyConverted { .. } => ErrorKind::InvalidTransition,
            Self::NotAuthorized { .. } => ErrorKind::Authorization,
            Self::ReasonRequired { .. } | Self::Validation(_) => ErrorKind::Validation,
            Self::ConcurrentModification { .. } => ErrorKind::Conflict,
            Self::DocumentNotFound { .. } => ErrorKind::NotFound,
            Self::Posting(err) => err.kind(),
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
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::ReasonRequired { .. } => "REASON_REQUIRED",
            Self::NotEditable { .. } => "DOCUMENT_NOT_EDITABLE",
            Self::AlreadyConverted { .. } => "ALREADY_CONVERTED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Posting(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_error() {
        let err = WorkflowError::InvalidTransition {
            document_id: DocumentId::new(),
            action: ActionKind::Complete,
            from: DocumentStatus::Draft,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(err.status_code(), 422);
        assert_eq!(err.error_code(), "INVALID_TRANSITION");
        assert!(err.to_string().contains("complete"));
        assert!(err.to_string().contains("draft"));
    }

    #[test]
    fn test_not_authorized_error() {
        let err = WorkflowError::NotAuthorized {
            document_id: DocumentId::new(),
            action: ActionKind::Approve,
            actor_role: Role::Employee,
            required: "manager".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert_eq!(err.status_code(), 403);
        assert!(err.to_string().contains("employee"));
    }

    #[test]
    fn test_reason_required_error() {
        let err = WorkflowError::ReasonRequired {
            document_id: DocumentId::new(),
            action: ActionKind::Reject,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "REASON_REQUIRED");
    }

    #[test]
    fn test_concurrent_modification_error() {
        let err = WorkflowError::ConcurrentModification {
            document_id: DocumentId::new(),
            action: ActionKind::Approve,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_document_not_found_error() {
        let err = WorkflowError::DocumentNotFound {
            document_type: DocumentType::Budget,
            id: DocumentId::new(),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.error_code(), "DOCUMENT_NOT_FOUND");
    }
}
