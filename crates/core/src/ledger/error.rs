//! Ledger posting error types.

use docflow_shared::ErrorKind;
use docflow_shared::types::{DocumentId, EntryId};
use rust_decimal::Decimal;
use thiserror::Error;

use super::entry::EventKind;
use crate::document::DocumentType;
use crate::numbering::NumberingError;
use crate::store::StoreError;

/// Errors that can occur while posting or reversing entries.
#[derive(Debug, Error)]
pub enum PostingError {
    /// No mapping rule for the (document type, event) pair.
    #[error("No account mapping for {document_type} event {event_kind}")]
    MappingMissing {
        /// Document type posted.
        document_type: DocumentType,
        /// Event posted.
        event_kind: EventKind,
    },

    /// A configured mapping rule could not be parsed.
    #[error("Invalid account mapping: {0}")]
    InvalidMapping(String),

    /// Debits and credits do not agree.
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Unbalanced {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    /// Every evaluated line was zero.
    #[error("Posting {event_kind} for document {document_id} produces no non-zero lines")]
    EmptyEntry {
        /// Document posted.
        document_id: DocumentId,
        /// Event posted.
        event_kind: EventKind,
    },

    /// Reversals are not reversed again.
    #[error("Entry {0} is a reversal and cannot be reversed")]
    CannotReverseReversal(EntryId),

    /// Entry not found.
    #[error("Accounting entry {0} not found")]
    EntryNotFound(EntryId),

    /// Entry number could not be minted.
    #[error(transparent)]
    Numbering(#[from] NumberingError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl PostingError {
    /// Returns the taxonomy kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MappingMissing { .. }
            | Self::InvalidMapping(_)
            | Self::Unbalanced { .. }
            | Self::EmptyEntry { .. }
            | Self::CannotReverseReversal(_) => ErrorKind::Validation,
            Self::EntryNotFound(_) => ErrorKind::NotFound,
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
            Self::MappingMissing { .. } => "MAPPING_MISSING",
            Self::InvalidMapping(_) => "INVALID_MAPPING",
            Self::Unbalanced { .. } => "UNBALANCED_ENTRY",
            Self::EmptyEntry { .. } => "EMPTY_ENTRY",
            Self::CannotReverseReversal(_) => "CANNOT_REVERSE_REVERSAL",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::Numbering(err) => err.error_code(),
            Self::Store(err) => err.error_code(),
        }
    }
}
