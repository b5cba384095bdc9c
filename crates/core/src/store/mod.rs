//! Abstract document store.
//!
//! The core never talks to a storage technology directly. Every component
//! receives an `Arc<dyn DocumentStore>` at construction and reads through it;
//! every write goes through an atomic [`UnitOfWork`].

pub mod error;

use async_trait::async_trait;
use chrono::NaiveDate;
use docflow_shared::types::{DocumentId, EntryId, UserId};

pub use error::StoreError;

use crate::document::{Document, DocumentStatus, DocumentType, WorkflowDocument};
use crate::ledger::{AccountingEntry, PostingKey};
use crate::numbering::{NumberBlock, NumberSeries};

/// Key of an atomic counter: one per number series and period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterKey {
    /// Number series.
    pub series: NumberSeries,
    /// Period (calendar year).
    pub period: i32,
}

impl std::fmt::Display for CounterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.series.prefix(), self.period)
    }
}

/// What a compare-and-set write expects to find in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expected {
    /// Version read by the writer.
    pub version: u64,
    /// Status read by the writer.
    pub status: DocumentStatus,
}

impl Expected {
    /// Captures the version and status of a document as read.
    #[must_use]
    pub fn of(document: &impl Document) -> Self {
        Self {
            version: document.header().version,
            status: document.status(),
        }
    }

    /// Returns true if the stored document still matches.
    #[must_use]
    pub fn matches(&self, stored: &impl Document) -> bool {
        stored.header().version == self.version && stored.status() == self.status
    }
}

/// One write inside a unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Insert a new document. Fails if the ID exists.
    CreateDocument(WorkflowDocument),
    /// Replace a document if it still matches `expected`.
    UpdateDocument {
        /// Compare-and-set expectation.
        expected: Expected,
        /// New state of the document.
        document: WorkflowDocument,
    },
    /// Remove a document if it still matches `expected`.
    DeleteDocument {
        /// Type of the document.
        document_type: DocumentType,
        /// Document to delete.
        id: DocumentId,
        /// Compare-and-set expectation.
        expected: Expected,
    },
    /// Insert an accounting entry. Fails if its posting key exists.
    CreateEntry(AccountingEntry),
    /// Move a counter from `from` to `to`. Fails if it no longer reads `from`.
    AdvanceCounter {
        /// Counter to move.
        key: CounterKey,
        /// Value the writer read.
        from: u64,
        /// Value after the commit.
        to: u64,
    },
}

/// Writes applied all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    writes: Vec<Write>,
}

impl UnitOfWork {
    /// Creates an empty unit of work.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document creation.
    #[must_use]
    pub fn create_document(mut self, document: impl Into<WorkflowDocument>) -> Self {
        self.writes.push(Write::CreateDocument(document.into()));
        self
    }

    /// Adds a compare-and-set document update.
    #[must_use]
    pub fn update_document(mut self, expected: Expected, document: WorkflowDocument) -> Self {
        self.writes.push(Write::UpdateDocument { expected, document });
        self
    }

    /// Adds a compare-and-set document deletion.
    #[must_use]
    pub fn delete_document(
        mut self,
        document_type: DocumentType,
        id: DocumentId,
        expected: Expected,
    ) -> Self {
        self.writes.push(Write::DeleteDocument {
            document_type,
            id,
            expected,
        });
        self
    }

    /// Adds accounting entries.
    #[must_use]
    pub fn create_entries(mut self, entries: impl IntoIterator<Item = AccountingEntry>) -> Self {
        self.writes
            .extend(entries.into_iter().map(Write::CreateEntry));
        self
    }

    /// Claims the numbers taken from a block.
    ///
    /// The counter only moves if the rest of the unit commits, so a unit that
    /// loses a race leaves no gap in the series.
    #[must_use]
    pub fn claim_numbers(self, block: &NumberBlock) -> Self {
        match block.advance() {
            Some((from, to)) => self.advance_counter(block.key(), from, to),
            None => self,
        }
    }

    /// Adds a compare-and-set counter advance.
    #[must_use]
    pub fn advance_counter(mut self, key: CounterKey, from: u64, to: u64) -> Self {
        self.writes.push(Write::AdvanceCounter { key, from, to });
        self
    }

    /// The writes, in order.
    #[must_use]
    pub fn writes(&self) -> &[Write] {
        &self.writes
    }

    /// Consumes the unit, returning its writes.
    #[must_use]
    pub fn into_writes(self) -> Vec<Write> {
        self.writes
    }

    /// Returns true if there is nothing to write.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Filter for [`DocumentStore::query_documents`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    /// Only this type.
    pub document_type: Option<DocumentType>,
    /// Only this status.
    pub status: Option<DocumentStatus>,
    /// Only documents owned by this user.
    pub created_by: Option<UserId>,
}

impl DocumentFilter {
    /// Filter selecting one document type.
    #[must_use]
    pub fn of_type(document_type: DocumentType) -> Self {
        Self {
            document_type: Some(document_type),
            ..Self::default()
        }
    }

    /// Returns true if the document passes the filter.
    #[must_use]
    pub fn matches(&self, document: &WorkflowDocument) -> bool {
        self.document_type
            .is_none_or(|t| t == document.document_type())
            && self.status.is_none_or(|s| s == document.status())
            && self.created_by.is_none_or(|u| u == document.owner())
    }
}

/// Filter for [`DocumentStore::query_entries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Only entries originating from this business document.
    pub document_id: Option<DocumentId>,
    /// Only reversals of this entry.
    pub reverses_entry_id: Option<EntryId>,
    /// Only entries with at least one line on these accounts.
    pub account_codes: Vec<String>,
    /// Entry date lower bound (inclusive).
    pub date_from: Option<NaiveDate>,
    /// Entry date upper bound (inclusive).
    pub date_to: Option<NaiveDate>,
}

impl EntryFilter {
    /// Filter selecting entries of one business document.
    #[must_use]
    pub fn for_document(document_id: DocumentId) -> Self {
        Self {
            document_id: Some(document_id),
            ..Self::default()
        }
    }

    /// Returns true if the entry passes the filter.
    #[must_use]
    pub fn matches(&self, entry: &AccountingEntry) -> bool {
        self.document_id.is_none_or(|id| id == entry.document_id)
            && self
                .reverses_entry_id
                .is_none_or(|id| Some(id) == entry.reverses_entry_id)
            && self.date_from.is_none_or(|d| entry.entry_date >= d)
            && self.date_to.is_none_or(|d| entry.entry_date <= d)
            && (self.account_codes.is_empty()
                || entry
                    .lines
                    .iter()
                    .any(|l| self.account_codes.contains(&l.account_code)))
    }
}

/// Persistence boundary of the core.
///
/// Implementations must make [`commit`](Self::commit) all-or-nothing,
/// counter advances included, and
/// [`increment_counter`](Self::increment_counter) atomic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetches a document.
    async fn get_document(
        &self,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Result<Option<WorkflowDocument>, StoreError>;

    /// Lists documents passing a filter, oldest first.
    async fn query_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<WorkflowDocument>, StoreError>;

    /// Fetches an accounting entry.
    async fn get_entry(&self, id: EntryId) -> Result<Option<AccountingEntry>, StoreError>;

    /// Fetches the entry posted under a posting key.
    async fn find_entry(&self, key: &PostingKey) -> Result<Option<AccountingEntry>, StoreError>;

    /// Lists entries passing a filter, in posting order.
    async fn query_entries(&self, filter: &EntryFilter)
    -> Result<Vec<AccountingEntry>, StoreError>;

    /// Atomically increments a counter and returns the new value.
    ///
    /// The first call for a key returns 1.
    async fn increment_counter(&self, key: &CounterKey) -> Result<u64, StoreError>;

    /// Reads a counter without moving it. A counter never advanced reads 0.
    async fn current_counter(&self, key: &CounterKey) -> Result<u64, StoreError>;

    /// Applies every write or none of them.
    async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError>;

    /// Inserts a single document.
    async fn create_document(&self, document: WorkflowDocument) -> Result<(), StoreError> {
        self.commit(UnitOfWork::new().create_document(document))
            .await
    }

    /// Replaces a document if it still matches `expected`.
    async fn update_document_if(
        &self,
        expected: Expected,
        document: WorkflowDocument,
    ) -> Result<(), StoreError> {
        self.commit(UnitOfWork::new().update_document(expected, document))
            .await
    }
}
