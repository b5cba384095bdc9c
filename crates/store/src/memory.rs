//! In-memory document store.
//!
//! Documents and entries live behind one `RwLock`; a commit validates every
//! write under the write lock before applying any of them. Counters live in
//! a `DashMap` so standalone increments run side by side under the read lock,
//! while a commit holding the write lock checks and moves them with the rest
//! of its unit.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use dashmap::DashMap;
use docflow_core::document::{Document, DocumentType, WorkflowDocument};
use docflow_core::ledger::{AccountingEntry, PostingKey};
use docflow_core::store::{
    CounterKey, DocumentFilter, DocumentStore, EntryFilter, Expected, StoreError, UnitOfWork,
    Write,
};
use docflow_shared::types::{DocumentId, EntryId};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct State {
    documents: HashMap<DocumentId, WorkflowDocument>,
    entries: Vec<AccountingEntry>,
    entry_index: HashMap<EntryId, usize>,
    posting_keys: HashMap<PostingKey, usize>,
}

impl State {
    fn stored(
        &self,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Option<&WorkflowDocument> {
        self.documents
            .get(&id)
            .filter(|d| d.document_type() == document_type)
    }

    fn check_expected(
        &self,
        document_type: DocumentType,
        id: DocumentId,
        expected: Expected,
    ) -> Result<(), StoreError> {
        let stored = self
            .stored(document_type, id)
            .ok_or(StoreError::DocumentMissing { document_type, id })?;
        if expected.matches(stored) {
            Ok(())
        } else {
            Err(StoreError::VersionConflict {
                document_type,
                id,
                expected_version: expected.version,
                expected_status: expected.status,
                actual_version: stored.header().version,
                actual_status: stored.status(),
            })
        }
    }

    /// Checks every write against the current state and against the other
    /// writes of the same unit.
    fn validate(
        &self,
        writes: &[Write],
        counters: &DashMap<CounterKey, u64>,
    ) -> Result<(), StoreError> {
        let mut touched = HashSet::new();
        let mut keys = HashSet::new();
        let mut claimed = HashSet::new();

        for write in writes {
            match write {
                Write::CreateDocument(document) => {
                    let id = document.id();
                    if !touched.insert(id) {
                        return Err(StoreError::DuplicateWrite(id));
                    }
                    if self.documents.contains_key(&id) {
                        return Err(StoreError::DuplicateDocument(id));
                    }
                }
                Write::UpdateDocument { expected, document } => {
                    let id = document.id();
                    if !touched.insert(id) {
                        return Err(StoreError::DuplicateWrite(id));
                    }
                    self.check_expected(document.document_type(), id, *expected)?;
                }
                Write::DeleteDocument {
                    document_type,
                    id,
                    expected,
                } => {
                    if !touched.insert(*id) {
                        return Err(StoreError::DuplicateWrite(*id));
                    }
                    self.check_expected(*document_type, *id, *expected)?;
                }
                Write::CreateEntry(entry) => {
                    let key = entry.posting_key();
                    if self.posting_keys.contains_key(&key) || !keys.insert(key) {
                        return Err(StoreError::DuplicatePostingKey(key));
                    }
                    if self.entry_index.contains_key(&entry.id) {
                        return Err(StoreError::Backend(format!(
                            "entry {} already exists",
                            entry.id
                        )));
                    }
                }
                Write::AdvanceCounter { key, from, to } => {
                    if !claimed.insert(*key) || to <= from {
                        return Err(StoreError::Backend(format!(
                            "invalid advance of counter {key} in one unit"
                        )));
                    }
                    let actual = counters.get(key).map_or(0, |value| *value);
                    if actual != *from {
                        return Err(StoreError::CounterMoved {
                            counter: *key,
                            expected: *from,
                            actual,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, writes: Vec<Write>, counters: &DashMap<CounterKey, u64>) {
        for write in writes {
            match write {
                Write::CreateDocument(document) | Write::UpdateDocument { document, .. } => {
                    self.documents.insert(document.id(), document);
                }
                Write::DeleteDocument { id, .. } => {
                    self.documents.remove(&id);
                }
                Write::CreateEntry(entry) => {
                    let position = self.entries.len();
                    self.entry_index.insert(entry.id, position);
                    self.posting_keys.insert(entry.posting_key(), position);
                    self.entries.push(entry);
                }
                Write::AdvanceCounter { key, to, .. } => {
                    counters.insert(key, to);
                }
            }
        }
    }
}

/// Thread-safe in-memory [`DocumentStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
    counters: DashMap<CounterKey, u64>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.state.read().await.documents.len()
    }

    /// Number of stored entries.
    pub async fn entry_count(&self) -> usize {
        self.state.read().await.entries.len()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_document(
        &self,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Result<Option<WorkflowDocument>, StoreError> {
        Ok(self.state.read().await.stored(document_type, id).cloned())
    }

    async fn query_documents(
        &self,
        filter: &DocumentFilter,
    ) -> Result<Vec<WorkflowDocument>, StoreError> {
        let state = self.state.read().await;
        let mut documents: Vec<WorkflowDocument> = state
            .documents
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect();
        documents.sort_by_key(|d| (d.header().created_at, d.id()));
        Ok(documents)
    }

    async fn get_entry(&self, id: EntryId) -> Result<Option<AccountingEntry>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .entry_index
            .get(&id)
            .and_then(|&i| state.entries.get(i))
            .cloned())
    }

    async fn find_entry(&self, key: &PostingKey) -> Result<Option<AccountingEntry>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .posting_keys
            .get(key)
            .and_then(|&i| state.entries.get(i))
            .cloned())
    }

    async fn query_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<Vec<AccountingEntry>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn increment_counter(&self, key: &CounterKey) -> Result<u64, StoreError> {
        let _shared = self.state.read().await;
        let mut value = self.counters.entry(*key).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn current_counter(&self, key: &CounterKey) -> Result<u64, StoreError> {
        Ok(self.counters.get(key).map_or(0, |value| *value))
    }

    async fn commit(&self, unit: UnitOfWork) -> Result<(), StoreError> {
        if unit.is_empty() {
            return Ok(());
        }
        let mut state = self.state.write().await;
        state.validate(unit.writes(), &self.counters)?;
        let writes = unit.into_writes();
        debug!(writes = writes.len(), "Unit of work committed");
        state.apply(writes, &self.counters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_core::document::{DocumentHeader, DocumentStatus, LineItem, Quote, Totals};
    use docflow_core::numbering::NumberSeries;
    use docflow_shared::types::{Precision, UserId};
    use rust_decimal_macros::dec;

    fn quote() -> WorkflowDocument {
        let lines = vec![LineItem::new("Widget", dec!(1), dec!(10), Precision::CENTS)];
        let totals = Totals::compute(&lines, dec!(0), dec!(0), Precision::CENTS);
        Quote {
            header: DocumentHeader::draft("QUO-2026-00001", UserId::new()),
            customer: "Acme".to_string(),
            valid_until: None,
            lines,
            totals,
            conversion: docflow_core::document::ConversionState::default(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = InMemoryStore::new();
        let document = quote();
        store.create_document(document.clone()).await.unwrap();

        let fetched = store
            .get_document(DocumentType::Quote, document.id())
            .await
            .unwrap();
        assert_eq!(fetched, Some(document.clone()));

        let wrong_type = store
            .get_document(DocumentType::Invoice, document.id())
            .await
            .unwrap();
        assert!(wrong_type.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let store = InMemoryStore::new();
        let document = quote();
        store.create_document(document.clone()).await.unwrap();
        let err = store.create_document(document).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDocument(_)));
    }

    #[tokio::test]
    async fn test_update_if_checks_version_and_status() {
        let store = InMemoryStore::new();
        let document = quote();
        store.create_document(document.clone()).await.unwrap();

        let mut submitted = document.clone();
        submitted.header_mut().status = DocumentStatus::PendingApproval;
        submitted.header_mut().touch();
        store
            .update_document_if(Expected::of(&document), submitted.clone())
            .await
            .unwrap();

        let err = store
            .update_document_if(Expected::of(&document), submitted)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict {
                expected_version: 1,
                actual_version: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_failed_unit_applies_nothing() {
        let store = InMemoryStore::new();
        let existing = quote();
        store.create_document(existing.clone()).await.unwrap();

        let mut stale = existing.clone();
        stale.header_mut().version = 7;
        let fresh = quote();
        let unit = UnitOfWork::new()
            .create_document(fresh.clone())
            .update_document(Expected::of(&stale), existing.clone());

        let err = store.commit(unit).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.document_count().await, 1);
        assert!(
            store
                .get_document(DocumentType::Quote, fresh.id())
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_document_written_twice_in_one_unit() {
        let store = InMemoryStore::new();
        let document = quote();
        store.create_document(document.clone()).await.unwrap();

        let unit = UnitOfWork::new()
            .update_document(Expected::of(&document), document.clone())
            .delete_document(DocumentType::Quote, document.id(), Expected::of(&document));
        let err = store.commit(unit).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateWrite(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_document() {
        let store = InMemoryStore::new();
        let document = quote();
        let unit =
            UnitOfWork::new().delete_document(DocumentType::Quote, document.id(), Expected::of(&document));
        let err = store.commit(unit).await.unwrap_err();
        assert!(matches!(err, StoreError::DocumentMissing { .. }));
    }

    #[tokio::test]
    async fn test_counter_starts_at_one_per_key() {
        let store = InMemoryStore::new();
        let quotes = CounterKey {
            series: NumberSeries::Document(DocumentType::Quote),
            period: 2026,
        };
        let entries = CounterKey {
            series: NumberSeries::JournalEntry,
            period: 2026,
        };
        assert_eq!(store.increment_counter(&quotes).await.unwrap(), 1);
        assert_eq!(store.increment_counter(&quotes).await.unwrap(), 2);
        assert_eq!(store.increment_counter(&entries).await.unwrap(), 1);
    }

    fn quote_counter() -> CounterKey {
        CounterKey {
            series: NumberSeries::Document(DocumentType::Quote),
            period: 2026,
        }
    }

    fn claim(key: CounterKey, from: u64, to: u64) -> UnitOfWork {
        UnitOfWork::new().advance_counter(key, from, to)
    }

    #[tokio::test]
    async fn test_counter_moves_only_with_its_unit() {
        let store = InMemoryStore::new();
        let key = quote_counter();
        let document = quote();

        let unit = claim(key, 0, 1).create_document(document.clone());
        store.commit(unit).await.unwrap();
        assert_eq!(store.current_counter(&key).await.unwrap(), 1);

        // A valid claim rides on a failing write and does not move.
        let unit = UnitOfWork::new()
            .create_document(document)
            .advance_counter(key, 1, 2);
        let err = store.commit(unit).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDocument(_)));
        assert_eq!(store.current_counter(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_counter_claimed_twice_in_one_unit() {
        let store = InMemoryStore::new();
        let key = quote_counter();
        let unit = claim(key, 0, 1).advance_counter(key, 1, 2);

        let err = store.commit(unit).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert_eq!(store.current_counter(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_counter_claim_applies_nothing() {
        let store = InMemoryStore::new();
        let key = quote_counter();
        store.increment_counter(&key).await.unwrap();

        let unit = claim(key, 0, 1).create_document(quote());
        let err = store.commit(unit).await.unwrap_err();

        assert!(matches!(
            err,
            StoreError::CounterMoved {
                expected: 0,
                actual: 1,
                ..
            }
        ));
        assert_eq!(store.document_count().await, 0);
        assert_eq!(store.current_counter(&key).await.unwrap(), 1);
    }
}
