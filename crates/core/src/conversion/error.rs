//! Conversion error types.

use docflow_shared::ErrorKind;
use docflow_shared::types::DocumentId;
use thiserror::Error;

use crate::document::{DocumentStatus, DocumentType};
use crate::identity::Role;
use crate::numbering::NumberingError;
use crate::store::StoreError;

/// Errors that can occur when converting a document.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The pair is not a supported conversion.
    #[error("Cannot convert {source_type} into {target_type}")]
    Unsupported {
        /// Source type.
        source_type: DocumentType,
        /// Requested target type.
        target_type: DocumentType,
    },

    /// The source is not in a status that allows conversion.
    #[error("Document {document_id} is {status}; only approved documents can be converted")]
    NotConvertible {
        /// The source document.
        document_id: DocumentId,
        /// Its current status.
        status: DocumentStatus,
    },

    /// The actor may not convert the source.
    #[error("Role {actor_role} may not convert document {document_id}")]
    NotAuthorized {
        /// The source document.
        document_id: DocumentId,
        /// The actor's role.
        actor_role: Role,
    },

    /// The source changed between read and write.
    #[error("Document {document_id} was modified concurrently; conversion not applied")]
    ConcurrentModification {
        /// The source document.
        document_id: DocumentId,
    },

    /// Source or recorded target not found.
    #[error("{document_type} {id} not found")]
    DocumentNotFound {
        /// Requested type.
        document_type: DocumentType,
        /// Requested ID.
        id: DocumentId,
    },

    /// Minting the target number failed.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConversionError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unsupported { .. } | Self::NotConvertible { .. } => ErrorKind::Validation,
            Self::NotAuthorized { .. } => ErrorKind::Authorization,
            Self::ConcurrentModification { .. } => ErrorKind::Conflict,
            Self::DocumentNotFound { .. } => ErrorKind::NotFound,
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
            Self::Unsupported { .. } => "UNSUPPORTED_CONVERSION",
            Self::NotConvertible { .. } => "NOT_CONVERTIBLE",
            Self::NotAuthorized { .. } => "NOT_AUTHORIZED",
            Self::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::Numbering(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_is_validation() {
        let err = ConversionError::Unsupported {
            source_type: DocumentType::Invoice,
            target_type: DocumentType::Bill,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Cannot convert invoice into bill");
    }

    #[test]
    fn test_not_convertible_is_validation() {
        let err = ConversionError::NotConvertible {
            document_id: DocumentId::new(),
            status: DocumentStatus::Draft,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "NOT_CONVERTIBLE");
    }

    #[test]
    fn test_concurrent_modification_is_conflict() {
        let err = ConversionError::ConcurrentModification {
            document_id: DocumentId::new(),
        };
        assert_eq!(err.status_code(), 409);
    }
}
