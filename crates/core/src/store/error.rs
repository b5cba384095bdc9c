//! Document store error types.

use docflow_shared::ErrorKind;
use docflow_shared::types::DocumentId;
use thiserror::Error;

use crate::document::{DocumentStatus, DocumentType};
use crate::ledger::PostingKey;

use super::CounterKey;

/// Errors reported by a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A compare-and-set write found a different version or status.
    #[error(
        "{document_type} {id} changed concurrently: expected version {expected_version} ({expected_status}), found version {actual_version} ({actual_status})"
    )]
    VersionConflict {
        /// Type of the contested document.
        document_type: DocumentType,
        /// The contested document.
        id: DocumentId,
        /// Version the writer read.
        expected_version: u64,
        /// Status the writer read.
        expected_status: DocumentStatus,
        /// Version currently stored.
        actual_version: u64,
        /// Status currently stored.
        actual_status: DocumentStatus,
    },

    /// The document to update or delete does not exist.
    #[error("{document_type} {id} not found")]
    DocumentMissing {
        /// Requested type.
        document_type: DocumentType,
        /// Requested ID.
        id: DocumentId,
    },

    /// A document with the same ID already exists.
    #[error("Document {0} already exists")]
    DuplicateDocument(DocumentId),

    /// An entry with the same posting key already exists.
    #[error("An entry is already posted for {0}")]
    DuplicatePostingKey(PostingKey),

    /// The same document is written twice in one unit of work.
    #[error("Document {0} is written more than once in one unit of work")]
    DuplicateWrite(DocumentId),

    /// The counter update lost a race. Safe to retry.
    #[error("Counter {0} is contended")]
    CounterContention(String),

    /// A counter advance found the counter already moved.
    #[error("Counter {counter} moved: expected {expected}, found {actual}")]
    CounterMoved {
        /// The contested counter.
        counter: CounterKey,
        /// Value the writer read.
        expected: u64,
        /// Value currently stored.
        actual: u64,
    },

    /// Backend failure.
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::VersionConflict { .. }
            | Self::DuplicateDocument(_)
            | Self::DuplicatePostingKey(_)
            | Self::CounterContention(_)
            | Self::CounterMoved { .. } => ErrorKind::Conflict,
            Self::DocumentMissing { .. } => ErrorKind::NotFound,
            Self::DuplicateWrite(_) | Self::Backend(_) => ErrorKind::Store,
        }
    }

    /// Returns true if repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CounterContention(_))
    }

    /// Returns true if a compare-and-set expectation failed.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. } | Self::DocumentMissing { .. })
    }

    /// Returns true if the unit failed only because numbers it claimed were
    /// taken first. Drawing fresh numbers and committing again may succeed.
    #[must_use]
    pub fn is_counter_moved(&self) -> bool {
        matches!(self, Self::CounterMoved { .. })
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
            Self::VersionConflict { .. } => "VERSION_CONFLICT",
            Self::DocumentMissing { .. } => "DOCUMENT_NOT_FOUND",
            Self::DuplicateDocument(_) => "DUPLICATE_DOCUMENT",
            Self::DuplicatePostingKey(_) => "ALREADY_POSTED",
            Self::CounterContention(_) => "COUNTER_CONTENTION",
            Self::CounterMoved { .. } => "COUNTER_MOVED",
            Self::DuplicateWrite(_) | Self::Backend(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_conflict() {
        let err = StoreError::VersionConflict {
            document_type: DocumentType::Quote,
            id: DocumentId::new(),
            expected_version: 2,
            expected_status: DocumentStatus::Approved,
            actual_version: 3,
            actual_status: DocumentStatus::Approved,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status_code(), 409);
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("expected version 2"));
    }

    #[test]
    fn test_only_counter_contention_is_retryable() {
        assert!(StoreError::CounterContention("JE-2026".into()).is_retryable());
        assert!(!StoreError::Backend("down".into()).is_retryable());
        assert!(!StoreError::DuplicateDocument(DocumentId::new()).is_retryable());
    }

    #[test]
    fn test_counter_moved_is_not_a_document_conflict() {
        let err = StoreError::CounterMoved {
            counter: CounterKey {
                series: crate::numbering::NumberSeries::JournalEntry,
                period: 2026,
            },
            expected: 4,
            actual: 5,
        };
        assert!(err.is_counter_moved());
        assert!(!err.is_conflict());
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.to_string(), "Counter JE-2026 moved: expected 4, found 5");
    }

    #[test]
    fn test_backend_maps_to_store_kind() {
        let err = StoreError::Backend("connection reset".into());
        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "STORE_ERROR");
    }
}
