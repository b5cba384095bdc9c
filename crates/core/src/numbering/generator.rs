//! Number generator backed by the store's counters.
//!
//! [`NumberGenerator::next_number`] advances a counter on its own. Writers
//! that create a numbered record instead draw from a [`NumberBlock`] and
//! claim it in the unit of work that creates the record, so a number is
//! consumed only when that record is stored.

use std::sync::Arc;

use docflow_shared::config::NumberingConfig;
use tracing::{debug, warn};

use super::{DocumentNumber, NumberSeries, NumberingError};
use crate::store::{CounterKey, DocumentStore};

/// Numbers drawn for one unit of work, not yet claimed.
///
/// The counter is read on the first draw. Claim the block with
/// [`UnitOfWork::claim_numbers`](crate::store::UnitOfWork::claim_numbers).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberBlock {
    key: CounterKey,
    base: Option<u64>,
    taken: u64,
}

impl NumberBlock {
    /// Counter the block draws from.
    #[must_use]
    pub fn key(&self) -> CounterKey {
        self.key
    }

    /// Number of sequences drawn so far.
    #[must_use]
    pub fn taken(&self) -> u64 {
        self.taken
    }

    /// Counter values before and after the claim, if anything was drawn.
    #[must_use]
    pub fn advance(&self) -> Option<(u64, u64)> {
        self.base
            .filter(|_| self.taken > 0)
            .map(|base| (base, base + self.taken))
    }
}

/// Mints sequential numbers per series and period.
#[derive(Clone)]
pub struct NumberGenerator {
    store: Arc<dyn DocumentStore>,
    pad_width: usize,
    max_retries: u32,
}

impl NumberGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, config: &NumberingConfig) -> Self {
        Self {
            store,
            pad_width: config.pad_width,
            max_retries: config.max_retries.max(1),
        }
    }

    /// Returns the next number of a series in a period.
    ///
    /// Contended counter updates are retried up to the configured limit.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::Contention` when every attempt lost a race,
    /// or `NumberingError::Store` for any other store failure.
    pub async fn next_number(
        &self,
        series: impl Into<NumberSeries>,
        period: i32,
    ) -> Result<DocumentNumber, NumberingError> {
        let key = CounterKey {
            series: series.into(),
            period,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.increment_counter(&key).await {
                Ok(sequence) => {
                    let number = DocumentNumber::new(key.series, period, sequence, self.pad_width);
                    debug!(number = %number, "Number allocated");
                    return Ok(number);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    warn!(counter = %key, attempt, error = %err, "Counter contended, retrying");
                }
                Err(err) if err.is_retryable() => {
                    warn!(counter = %key, attempts = attempt, "Counter contended, giving up");
                    return Err(NumberingError::Contention {
                        series: key.series,
                        period,
                        attempts: attempt,
                    });
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Starts an empty block on a series and period. Nothing is read yet.
    #[must_use]
    pub fn block(&self, series: impl Into<NumberSeries>, period: i32) -> NumberBlock {
        NumberBlock {
            key: CounterKey {
                series: series.into(),
                period,
            },
            base: None,
            taken: 0,
        }
    }

    /// Draws the next number of a block.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::Store` if the counter cannot be read.
    pub async fn take(&self, block: &mut NumberBlock) -> Result<DocumentNumber, NumberingError> {
        let base = match block.base {
            Some(base) => base,
            None => {
                let current = self.store.current_counter(&block.key).await?;
                block.base = Some(current);
                current
            }
        };
        block.taken += 1;
        let number = DocumentNumber::new(
            block.key.series,
            block.key.period,
            base + block.taken,
            self.pad_width,
        );
        debug!(number = %number, "Number drawn");
        Ok(number)
    }

    /// Decides whether a unit whose claim lost a race may draw again.
    ///
    /// # Errors
    ///
    /// Returns `NumberingError::Contention` once `attempt` reaches the
    /// configured limit.
    pub fn retry_claim(&self, block: &NumberBlock, attempt: u32) -> Result<(), NumberingError> {
        let key = block.key;
        if attempt < self.max_retries {
            warn!(counter = %key, attempt, "Numbers taken concurrently, drawing again");
            Ok(())
        } else {
            warn!(counter = %key, attempts = attempt, "Numbers taken concurrently, giving up");
            Err(NumberingError::Contention {
                series: key.series,
                period: key.period,
                attempts: attempt,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentType;
    use crate::store::{MockDocumentStore, StoreError};
    use docflow_shared::ErrorKind;
    use mockall::Sequence;

    fn generator(store: MockDocumentStore, max_retries: u32) -> NumberGenerator {
        let config = NumberingConfig {
            pad_width: 5,
            max_retries,
        };
        NumberGenerator::new(Arc::new(store), &config)
    }

    #[tokio::test]
    async fn test_next_number_formats_counter_value() {
        let mut store = MockDocumentStore::new();
        store
            .expect_increment_counter()
            .withf(|key| key.series == NumberSeries::Document(DocumentType::Quote) && key.period == 2026)
            .times(1)
            .returning(|_| Ok(1));

        let number = generator(store, 3)
            .next_number(DocumentType::Quote, 2026)
            .await
            .unwrap();
        assert_eq!(number.formatted, "QUO-2026-00001");
        assert_eq!(number.sequence, 1);
    }

    #[tokio::test]
    async fn test_contention_is_retried() {
        let mut store = MockDocumentStore::new();
        let mut seq = Sequence::new();
        store
            .expect_increment_counter()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|key| Err(StoreError::CounterContention(key.to_string())));
        store
            .expect_increment_counter()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(7));

        let number = generator(store, 3)
            .next_number(NumberSeries::JournalEntry, 2026)
            .await
            .unwrap();
        assert_eq!(number.formatted, "JE-2026-00007");
    }

    #[tokio::test]
    async fn test_contention_exhausts_retries() {
        let mut store = MockDocumentStore::new();
        store
            .expect_increment_counter()
            .times(3)
            .returning(|key| Err(StoreError::CounterContention(key.to_string())));

        let err = generator(store, 3)
            .next_number(DocumentType::Invoice, 2026)
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::Contention { attempts: 3, .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_backend_failure_is_not_retried() {
        let mut store = MockDocumentStore::new();
        store
            .expect_increment_counter()
            .times(1)
            .returning(|_| Err(StoreError::Backend("disk full".into())));

        let err = generator(store, 3)
            .next_number(DocumentType::Bill, 2026)
            .await
            .unwrap_err();
        assert!(matches!(err, NumberingError::Store(_)));
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[tokio::test]
    async fn test_block_reads_counter_once() {
        let mut store = MockDocumentStore::new();
        store
            .expect_current_counter()
            .withf(|key| key.series == NumberSeries::JournalEntry && key.period == 2026)
            .times(1)
            .returning(|_| Ok(41));
        store.expect_increment_counter().never();
        let numbers = generator(store, 3);

        let mut block = numbers.block(NumberSeries::JournalEntry, 2026);
        assert_eq!(block.advance(), None);
        let first = numbers.take(&mut block).await.unwrap();
        let second = numbers.take(&mut block).await.unwrap();

        assert_eq!(first.formatted, "JE-2026-00042");
        assert_eq!(second.formatted, "JE-2026-00043");
        assert_eq!(block.taken(), 2);
        assert_eq!(block.advance(), Some((41, 43)));
    }

    #[test]
    fn test_retry_claim_gives_up_at_limit() {
        let numbers = generator(MockDocumentStore::new(), 2);
        let block = numbers.block(DocumentType::Invoice, 2026);

        assert!(numbers.retry_claim(&block, 1).is_ok());
        let err = numbers.retry_claim(&block, 2).unwrap_err();
        assert!(matches!(
            err,
            NumberingError::Contention {
                series: NumberSeries::Document(DocumentType::Invoice),
                attempts: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_zero_retries_still_attempts_once() {
        let mut store = MockDocumentStore::new();
        store
            .expect_increment_counter()
            .times(1)
            .returning(|_| Ok(3));

        let number = generator(store, 0)
            .next_number(DocumentType::Payment, 2025)
            .await
            .unwrap();
        assert_eq!(number.formatted, "PAY-2025-00003");
    }
}
