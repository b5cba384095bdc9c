//! Ledger posting engine.
//!
//! Turns a document event into a balanced accounting entry and reverses
//! posted entries. Posting is idempotent per (reference type, reference id,
//! event): a repeat returns the entry already stored. Entry numbers are
//! drawn from a [`NumberBlock`] and claimed in the unit that stores the entry.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use docflow_shared::types::{DocumentId, EntryId, UserId};
use tracing::{debug, error, info};

use super::compose::{self, PostingSettings};
use super::entry::{AccountingEntry, AccountingEntryLine, EventKind, PostingKey};
use super::error::PostingError;
use super::mapping::AccountMappingTable;
use super::reversal::ReversalService;
use crate::document::{Document, DocumentType, WorkflowDocument};
use crate::numbering::{NumberBlock, NumberGenerator, NumberSeries};
use crate::store::{DocumentStore, EntryFilter, StoreError, UnitOfWork};

/// Result of preparing a posting without writing it.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    /// The event is already posted.
    Existing(AccountingEntry),
    /// A new entry, not yet persisted.
    New(AccountingEntry),
}

impl Prepared {
    /// The entry, existing or new.
    #[must_use]
    pub fn entry(&self) -> &AccountingEntry {
        match self {
            Self::Existing(entry) | Self::New(entry) => entry,
        }
    }

    /// Returns the entry if it still has to be written.
    #[must_use]
    pub fn into_new(self) -> Option<AccountingEntry> {
        match self {
            Self::Existing(_) => None,
            Self::New(entry) => Some(entry),
        }
    }
}

/// Posts and reverses accounting entries.
#[derive(Clone)]
pub struct LedgerPostingEngine {
    store: Arc<dyn DocumentStore>,
    numbers: NumberGenerator,
    mappings: Arc<AccountMappingTable>,
    settings: PostingSettings,
}

impl LedgerPostingEngine {
    /// Creates an engine.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        numbers: NumberGenerator,
        mappings: Arc<AccountMappingTable>,
        settings: PostingSettings,
    ) -> Self {
        Self {
            store,
            numbers,
            mappings,
            settings,
        }
    }

    /// Returns true if the (document type, event) pair has a mapping rule.
    #[must_use]
    pub fn has_mapping(&self, document_type: DocumentType, event_kind: EventKind) -> bool {
        self.mappings.rule(document_type, event_kind).is_some()
    }

    /// The generator entry numbers are drawn from.
    #[must_use]
    pub fn numbers(&self) -> &NumberGenerator {
        &self.numbers
    }

    /// Starts an empty block of entry numbers for the current year.
    #[must_use]
    pub fn entry_numbers(&self) -> NumberBlock {
        self.numbers
            .block(NumberSeries::JournalEntry, Utc::now().year())
    }

    /// Builds the entry for a document event without writing it.
    ///
    /// Returns `Prepared::Existing` when the event is already posted. A new
    /// entry draws its number from `numbers`.
    pub async fn prepare(
        &self,
        document: &WorkflowDocument,
        event_kind: EventKind,
        actor: UserId,
        numbers: &mut NumberBlock,
    ) -> Result<Prepared, PostingError> {
        let document_type = document.document_type();
        let key = PostingKey::for_document(document_type, document.id(), event_kind);
        if let Some(existing) = self.store.find_entry(&key).await? {
            debug!(entry_id = %existing.id, posting_key = %key, "Event already posted");
            return Ok(Prepared::Existing(existing));
        }

        let rule = self
            .mappings
            .rule(document_type, event_kind)
            .ok_or(PostingError::MappingMissing {
                document_type,
                event_kind,
            })?;
        let lines = compose::balance(compose::evaluate(document, rule), &self.settings)?;
        if lines.is_empty() {
            return Err(PostingError::EmptyEntry {
                document_id: document.id(),
                event_kind,
            });
        }

        let draft = EntryDraft {
            key,
            document_type,
            document_id: document.id(),
            description: format!("{document_type} {} {event_kind}", document.header().number),
            reverses_entry_id: None,
            lines,
        };
        Ok(Prepared::New(self.build_entry(draft, actor, numbers).await?))
    }

    /// Posts a document event.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::MappingMissing` when no rule exists for the
    /// pair, `PostingError::Unbalanced` or `PostingError::EmptyEntry` when
    /// the rule does not produce a valid entry, and store or numbering
    /// failures.
    pub async fn post(
        &self,
        document: &WorkflowDocument,
        event_kind: EventKind,
        actor: UserId,
    ) -> Result<AccountingEntry, PostingError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut numbers = self.entry_numbers();
            let prepared = self
                .prepare(document, event_kind, actor, &mut numbers)
                .await?;
            match self.persist(prepared, &numbers).await {
                Err(PostingError::Store(err)) if err.is_counter_moved() => {
                    self.numbers.retry_claim(&numbers, attempt)?;
                }
                result => return result,
            }
        }
    }

    /// Builds the reversal of an entry without writing it.
    ///
    /// Returns `Prepared::Existing` when the entry is already reversed.
    pub async fn prepare_reversal(
        &self,
        original: &AccountingEntry,
        actor: UserId,
        numbers: &mut NumberBlock,
    ) -> Result<Prepared, PostingError> {
        if original.is_reversal() {
            return Err(PostingError::CannotReverseReversal(original.id));
        }

        let key = PostingKey::reversal_of(original.id);
        if let Some(existing) = self.store.find_entry(&key).await? {
            debug!(entry_id = %existing.id, reversed_entry_id = %original.id, "Entry already reversed");
            return Ok(Prepared::Existing(existing));
        }

        let draft = EntryDraft {
            key,
            document_type: original.document_type,
            document_id: original.document_id,
            description: ReversalService::description(original),
            reverses_entry_id: Some(original.id),
            lines: ReversalService::reversing_lines(original),
        };
        Ok(Prepared::New(self.build_entry(draft, actor, numbers).await?))
    }

    /// Reverses a posted entry.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::CannotReverseReversal` for reversal entries,
    /// and store or numbering failures.
    pub async fn reverse(
        &self,
        original: &AccountingEntry,
        actor: UserId,
    ) -> Result<AccountingEntry, PostingError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let mut numbers = self.entry_numbers();
            let prepared = self.prepare_reversal(original, actor, &mut numbers).await?;
            match self.persist(prepared, &numbers).await {
                Err(PostingError::Store(err)) if err.is_counter_moved() => {
                    self.numbers.retry_claim(&numbers, attempt)?;
                }
                result => return result,
            }
        }
    }

    /// Reverses a posted entry by ID.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::EntryNotFound` if the entry does not exist.
    pub async fn reverse_by_id(
        &self,
        entry_id: EntryId,
        actor: UserId,
    ) -> Result<AccountingEntry, PostingError> {
        let original = self
            .store
            .get_entry(entry_id)
            .await?
            .ok_or(PostingError::EntryNotFound(entry_id))?;
        self.reverse(&original, actor).await
    }

    /// Builds, without writing them, the reversals of every entry posted for
    /// a document that is not reversed yet.
    pub async fn prepare_reversals_for(
        &self,
        document: &WorkflowDocument,
        actor: UserId,
        numbers: &mut NumberBlock,
    ) -> Result<Vec<AccountingEntry>, PostingError> {
        let entries = self
            .store
            .query_entries(&EntryFilter::for_document(document.id()))
            .await?;

        let mut reversals = Vec::new();
        for original in entries.iter().filter(|e| !e.is_reversal()) {
            if let Some(reversal) = self
                .prepare_reversal(original, actor, numbers)
                .await?
                .into_new()
            {
                reversals.push(reversal);
            }
        }
        Ok(reversals)
    }

    async fn persist(
        &self,
        prepared: Prepared,
        numbers: &NumberBlock,
    ) -> Result<AccountingEntry, PostingError> {
        let entry = match prepared {
            Prepared::Existing(entry) => return Ok(entry),
            Prepared::New(entry) => entry,
        };

        let unit = UnitOfWork::new()
            .create_entries([entry.clone()])
            .claim_numbers(numbers);
        match self.store.commit(unit).await {
            Ok(()) => {
                info!(
                    entry_id = %entry.id,
                    entry_number = %entry.entry_number,
                    document_id = %entry.document_id,
                    event = %entry.event_kind,
                    total = %entry.total_debit,
                    "Entry posted"
                );
                Ok(entry)
            }
            Err(StoreError::DuplicatePostingKey(key)) => {
                debug!(posting_key = %key, "Concurrent posting won, returning its entry");
                self.store.find_entry(&key).await?.ok_or_else(|| {
                    PostingError::Store(StoreError::Backend(format!(
                        "entry for {key} reported as duplicate but not found"
                    )))
                })
            }
            Err(err) if err.is_counter_moved() => Err(err.into()),
            Err(err) => {
                error!(
                    error = %err,
                    document_id = %entry.document_id,
                    event = %entry.event_kind,
                    "Failed to persist entry"
                );
                Err(err.into())
            }
        }
    }

    async fn build_entry(
        &self,
        draft: EntryDraft,
        actor: UserId,
        numbers: &mut NumberBlock,
    ) -> Result<AccountingEntry, PostingError> {
        let entry_date = Utc::now().date_naive();
        let number = self.numbers.take(numbers).await?;
        let (total_debit, total_credit) = compose::totals(&draft.lines);
        let now = Utc::now();

        Ok(AccountingEntry {
            id: EntryId::new(),
            entry_number: number.formatted,
            entry_date,
            description: draft.description,
            reference_type: draft.key.reference_type,
            reference_id: draft.key.reference_id,
            document_type: draft.document_type,
            document_id: draft.document_id,
            event_kind: draft.key.event_kind,
            reverses_entry_id: draft.reverses_entry_id,
            lines: draft.lines,
            total_debit,
            total_credit,
            created_by: actor,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Everything an entry needs except its number and timestamps.
struct EntryDraft {
    key: PostingKey,
    document_type: DocumentType,
    document_id: DocumentId,
    description: String,
    reverses_entry_id: Option<EntryId>,
    lines: Vec<AccountingEntryLine>,
}
