//! Conversion service.
//!
//! A quote becomes an invoice and a purchase order becomes a bill at most
//! once. The target is created in the same unit of work that marks the
//! source as consumed.

use std::sync::Arc;

use chrono::{Datelike, Utc};
use docflow_shared::types::{DocumentId, UserId};
use tracing::{debug, error, info, warn};

use super::error::ConversionError;
use crate::document::{
    Bill, Document, DocumentHeader, DocumentStatus, DocumentType, Invoice, WorkflowDocument,
};
use crate::identity::Actor;
use crate::notify::{self, Notification, NotificationSink};
use crate::numbering::NumberGenerator;
use crate::store::{DocumentStore, Expected, UnitOfWork};

/// Result of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutcome {
    /// The source, as stored after the call.
    pub source: WorkflowDocument,
    /// The target document.
    pub target: WorkflowDocument,
    /// False when the source had already been converted.
    pub created: bool,
}

/// Converts approved quotes and purchase orders.
#[derive(Clone)]
pub struct ConversionService {
    store: Arc<dyn DocumentStore>,
    numbers: NumberGenerator,
    notifier: Arc<dyn NotificationSink>,
}

impl ConversionService {
    /// Creates a conversion service.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        numbers: NumberGenerator,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            numbers,
            notifier,
        }
    }

    /// Converts `source` into a new document of `target_type`.
    ///
    /// An already converted source returns its existing target and creates
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns `ConversionError::Unsupported` for a pair that is not a
    /// conversion, `NotConvertible` when the source is not approved,
    /// `NotAuthorized` when the actor is neither the owner nor a manager,
    /// and `ConcurrentModification` when the source changed after it was read.
    pub async fn convert(
        &self,
        source: &WorkflowDocument,
        target_type: DocumentType,
        actor: &Actor,
    ) -> Result<ConversionOutcome, ConversionError> {
        let source_type = source.document_type();
        if source_type.conversion_target() != Some(target_type) {
            return Err(ConversionError::Unsupported {
                source_type,
                target_type,
            });
        }

        if actor.id != source.owner() && !actor.is_manager_or_admin() {
            return Err(ConversionError::NotAuthorized {
                document_id: source.id(),
                actor_role: actor.role,
            });
        }

        if let Some(target_id) = source
            .conversion()
            .filter(|state| state.is_converted)
            .and_then(|state| state.converted_to_id)
        {
            return self.existing(source, target_type, target_id).await;
        }

        if source.status() != DocumentStatus::Approved {
            return Err(ConversionError::NotConvertible {
                document_id: source.id(),
                status: source.status(),
            });
        }

        let mut attempt = 0;
        let (updated, target) = loop {
            attempt += 1;
            let mut numbers = self.numbers.block(target_type, Utc::now().year());
            let number = self.numbers.take(&mut numbers).await?;
            let target = build_target(source, number.formatted, actor.id).ok_or(
                ConversionError::Unsupported {
                    source_type,
                    target_type,
                },
            )?;

            let mut updated = source.clone();
            if let Some(state) = updated.conversion_mut() {
                state.mark_converted(target.id());
            }
            updated.header_mut().touch();

            let unit = UnitOfWork::new()
                .update_document(Expected::of(source), updated.clone())
                .create_document(target.clone())
                .claim_numbers(&numbers);
            match self.store.commit(unit).await {
                Ok(()) => break (updated, target),
                Err(err) if err.is_conflict() => {
                    warn!(source_id = %source.id(), error = %err, "Conversion lost a concurrent write");
                    return Err(ConversionError::ConcurrentModification {
                        document_id: source.id(),
                    });
                }
                Err(err) if err.is_counter_moved() => self.numbers.retry_claim(&numbers, attempt)?,
                Err(err) => {
                    error!(source_id = %source.id(), target_type = %target_type, error = %err, "Failed to commit conversion");
                    return Err(err.into());
                }
            }
        };

        info!(
            source_id = %source.id(),
            source_number = %source.header().number,
            target_id = %target.id(),
            target_number = %target.header().number,
            "Document converted"
        );

        notify::dispatch(
            self.notifier.as_ref(),
            Notification::Converted {
                source_type,
                source_id: source.id(),
                target_type,
                target_id: target.id(),
                target_number: target.header().number.clone(),
                actor: actor.id,
            },
        )
        .await;

        Ok(ConversionOutcome {
            source: updated,
            target,
            created: true,
        })
    }

    async fn existing(
        &self,
        source: &WorkflowDocument,
        target_type: DocumentType,
        target_id: DocumentId,
    ) -> Result<ConversionOutcome, ConversionError> {
        let target = self
            .store
            .get_document(target_type, target_id)
            .await?
            .ok_or(ConversionError::DocumentNotFound {
                document_type: target_type,
                id: target_id,
            })?;
        debug!(source_id = %source.id(), target_id = %target_id, "Document already converted");
        Ok(ConversionOutcome {
            source: source.clone(),
            target,
            created: false,
        })
    }
}

/// Builds the draft target of a conversion, copying lines and totals.
fn build_target(
    source: &WorkflowDocument,
    number: String,
    owner: UserId,
) -> Option<WorkflowDocument> {
    let header = DocumentHeader::draft(number, owner);
    match source {
        WorkflowDocument::Quote(quote) => Some(
            Invoice {
                header,
                customer: quote.customer.clone(),
                due_date: None,
                source_quote_id: Some(quote.header.id),
                lines: quote.lines.clone(),
                totals: quote.totals,
            }
            .into(),
        ),
        WorkflowDocument::PurchaseOrder(order) => Some(
            Bill {
                header,
                vendor: order.vendor.clone(),
                due_date: None,
                source_order_id: Some(order.header.id),
                lines: order.lines.clone(),
                totals: order.totals,
            }
            .into(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ConversionState, LineItem, PurchaseOrder, Quote, Totals};
    use crate::notify::MockNotificationSink;
    use crate::store::{MockDocumentStore, StoreError, Write};
    use docflow_shared::ErrorKind;
    use docflow_shared::config::NumberingConfig;
    use docflow_shared::types::Precision;
    use rust_decimal_macros::dec;

    fn service(store: MockDocumentStore, notifier: MockNotificationSink) -> ConversionService {
        let store: Arc<dyn DocumentStore> = Arc::new(store);
        let numbers = NumberGenerator::new(Arc::clone(&store), &NumberingConfig::default());
        ConversionService::new(store, numbers, Arc::new(notifier))
    }

    fn quiet_notifier() -> MockNotificationSink {
        let mut notifier = MockNotificationSink::new();
        notifier.expect_notify().returning(|_| Ok(()));
        notifier
    }

    fn quote(owner: UserId, status: DocumentStatus) -> WorkflowDocument {
        let lines = vec![
            LineItem::new("Widget", dec!(2), dec!(100.00), Precision::CENTS),
            LineItem::new("Setup", dec!(1), dec!(50.00), Precision::CENTS),
        ];
        let totals = Totals::compute(&lines, dec!(0.10), dec!(0), Precision::CENTS);
        let mut header = DocumentHeader::draft("QUO-2026-00001", owner);
        header.status = status;
        Quote {
            header,
            customer: "Acme".to_string(),
            valid_until: None,
            lines,
            totals,
            conversion: ConversionState::default(),
        }
        .into()
    }

    #[tokio::test]
    async fn test_convert_quote_creates_invoice_atomically() {
        let owner = Actor::employee();
        let source = quote(owner.id, DocumentStatus::Approved);
        let source_id = source.id();

        let mut store = MockDocumentStore::new();
        store.expect_current_counter().returning(|_| Ok(6));
        store
            .expect_commit()
            .withf(move |unit| {
                matches!(
                    unit.writes(),
                    [
                        Write::UpdateDocument { expected, document },
                        Write::CreateDocument(target),
                        Write::AdvanceCounter { from: 6, to: 7, .. }
                    ]
                        if expected.status == DocumentStatus::Approved
                            && document.is_converted()
                            && target.converted_from() == Some(source_id)
                )
            })
            .times(1)
            .returning(|_| Ok(()));

        let outcome = service(store, quiet_notifier())
            .convert(&source, DocumentType::Invoice, &owner)
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.target.document_type(), DocumentType::Invoice);
        assert_eq!(outcome.target.status(), DocumentStatus::Draft);
        assert!(outcome.target.header().number.starts_with("INV-"));
        assert!(outcome.target.header().number.ends_with("-00007"));
        assert_eq!(outcome.target.lines(), source.lines());
        assert_eq!(outcome.target.totals().total, dec!(275.00));
        assert_eq!(
            outcome.source.conversion().unwrap().converted_to_id,
            Some(outcome.target.id())
        );
    }

    #[tokio::test]
    async fn test_converted_source_returns_existing_target() {
        let owner = Actor::employee();
        let mut source = quote(owner.id, DocumentStatus::Approved);
        let existing: WorkflowDocument = Invoice {
            header: DocumentHeader::draft("INV-2026-00001", owner.id),
            customer: "Acme".to_string(),
            due_date: None,
            source_quote_id: Some(source.id()),
            lines: source.lines().to_vec(),
            totals: *source.totals(),
        }
        .into();
        let target_id = existing.id();
        source.conversion_mut().unwrap().mark_converted(target_id);

        let mut store = MockDocumentStore::new();
        store
            .expect_get_document()
            .withf(move |t, id| *t == DocumentType::Invoice && *id == target_id)
            .returning(move |_, _| Ok(Some(existing.clone())));

        let outcome = service(store, MockNotificationSink::new())
            .convert(&source, DocumentType::Invoice, &owner)
            .await
            .unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.target.id(), target_id);
    }

    #[tokio::test]
    async fn test_unapproved_source_is_rejected() {
        let owner = Actor::employee();
        let source = quote(owner.id, DocumentStatus::PendingApproval);
        let err = service(MockDocumentStore::new(), MockNotificationSink::new())
            .convert(&source, DocumentType::Invoice, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::NotConvertible { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unsupported_pair() {
        let owner = Actor::employee();
        let source = quote(owner.id, DocumentStatus::Approved);
        let err = service(MockDocumentStore::new(), MockNotificationSink::new())
            .convert(&source, DocumentType::Bill, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_stranger_may_not_convert() {
        let source = quote(UserId::new(), DocumentStatus::Approved);
        let err = service(MockDocumentStore::new(), MockNotificationSink::new())
            .convert(&source, DocumentType::Invoice, &Actor::employee())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[tokio::test]
    async fn test_lost_race_is_conflict() {
        let owner = Actor::manager();
        let source = quote(UserId::new(), DocumentStatus::Approved);
        let id = source.id();

        let mut store = MockDocumentStore::new();
        store.expect_current_counter().returning(|_| Ok(0));
        store.expect_commit().times(1).returning(move |_| {
            Err(StoreError::VersionConflict {
                document_type: DocumentType::Quote,
                id,
                expected_version: 1,
                expected_status: DocumentStatus::Approved,
                actual_version: 2,
                actual_status: DocumentStatus::Approved,
            })
        });

        let err = service(store, MockNotificationSink::new())
            .convert(&source, DocumentType::Invoice, &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, ConversionError::ConcurrentModification { .. }));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_taken_number_is_drawn_again() {
        let owner = Actor::employee();
        let source = quote(owner.id, DocumentStatus::Approved);

        let mut store = MockDocumentStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_current_counter()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0));
        store
            .expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|unit| match unit.writes().last() {
                Some(Write::AdvanceCounter { key, from, .. }) => Err(StoreError::CounterMoved {
                    counter: *key,
                    expected: *from,
                    actual: from + 1,
                }),
                _ => Err(StoreError::Backend("no counter claim".into())),
            });
        store
            .expect_current_counter()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(1));
        store
            .expect_commit()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let outcome = service(store, quiet_notifier())
            .convert(&source, DocumentType::Invoice, &owner)
            .await
            .unwrap();
        assert!(outcome.target.header().number.ends_with("-00002"));
    }

    #[test]
    fn test_purchase_order_becomes_bill() {
        let lines = vec![LineItem::new("Paper", dec!(10), dec!(4.50), Precision::CENTS).with_category("6200")];
        let totals = Totals::compute(&lines, dec!(0), dec!(0), Precision::CENTS);
        let order: WorkflowDocument = PurchaseOrder {
            header: DocumentHeader::draft("PO-2026-00001", UserId::new()),
            vendor: "Paper Co".to_string(),
            expected_date: None,
            lines,
            totals,
            conversion: ConversionState::default(),
        }
        .into();

        let bill = build_target(&order, "BILL-2026-00001".to_string(), UserId::new()).unwrap();
        assert_eq!(bill.document_type(), DocumentType::Bill);
        assert_eq!(bill.converted_from(), Some(order.id()));
        assert_eq!(bill.lines()[0].category.as_deref(), Some("6200"));
        assert_eq!(bill.totals(), order.totals());
    }
}
