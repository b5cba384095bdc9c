//! The document service.
//!
//! Entry point for the request layer: every operation takes the caller's
//! token, resolves it to an actor and drives the component that owns the
//! behavior.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use docflow_shared::AppConfig;
use docflow_shared::types::{DocumentId, EntryId, Precision};
use tracing::{error, info, warn};

use super::error::ServiceError;
use super::input::{DraftInput, LinesInput};
use crate::conversion::{ConversionOutcome, ConversionService};
use crate::document::{Document, DocumentStatus, DocumentType, WorkflowDocument};
use crate::identity::{Actor, ActorToken, IdentityProvider, Role};
use crate::ledger::{
    AccountMappingTable, AccountingEntry, EventKind, LedgerPostingEngine, PostingSettings,
};
use crate::notify::NotificationSink;
use crate::numbering::NumberGenerator;
use crate::store::{DocumentFilter, DocumentStore, EntryFilter, Expected, StoreError, UnitOfWork};
use crate::variance::{BudgetVariance, ClaimTotals, VarianceService};
use crate::workflow::{
    ApprovalPolicy, ApprovalStateMachine, TransitionOutcome, WorkflowAction, posted_events,
};

/// Facade over numbering, posting, workflow, conversion and variance.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    numbers: NumberGenerator,
    ledger: LedgerPostingEngine,
    workflow: ApprovalStateMachine,
    conversions: ConversionService,
    variance: VarianceService,
    precision: Precision,
}

impl DocumentService {
    /// Wires every component to the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Posting` if the configured account mappings
    /// are invalid.
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self, ServiceError> {
        let mappings = AccountMappingTable::from_config_or_standard(&config.account_mappings)?;
        let numbers = NumberGenerator::new(Arc::clone(&store), &config.numbering);
        let ledger = LedgerPostingEngine::new(
            Arc::clone(&store),
            numbers.clone(),
            Arc::new(mappings),
            PostingSettings::from(&config.posting),
        );
        let workflow =
            ApprovalStateMachine::new(Arc::clone(&store), ledger.clone(), Arc::clone(&notifier));
        let conversions = ConversionService::new(Arc::clone(&store), numbers.clone(), notifier);
        let variance = VarianceService::new(Arc::clone(&store));

        Ok(Self {
            store,
            identity,
            numbers,
            ledger,
            workflow,
            conversions,
            variance,
            precision: config.posting.precision(),
        })
    }

    /// Replaces the approval policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.workflow = self.workflow.with_policy(policy);
        self
    }

    /// The approval state machine.
    #[must_use]
    pub fn workflow(&self) -> &ApprovalStateMachine {
        &self.workflow
    }

    /// The number generator.
    #[must_use]
    pub fn numbers(&self) -> &NumberGenerator {
        &self.numbers
    }

    /// Resolves a token into an actor.
    pub async fn authenticate(&self, token: &ActorToken) -> Result<Actor, ServiceError> {
        Ok(self.identity.resolve(token).await?)
    }

    /// Creates a draft owned by the caller, numbered in its period.
    pub async fn create_draft(
        &self,
        token: &ActorToken,
        input: DraftInput,
    ) -> Result<WorkflowDocument, ServiceError> {
        let actor = self.authenticate(token).await?;
        let document_type = input.document_type();
        let period = input.details.period().unwrap_or_else(|| Utc::now().year());

        // Validate before drawing a number.
        input.clone().build(String::new(), actor.id, self.precision)?;

        let mut attempt = 0;
        let document = loop {
            attempt += 1;
            let mut numbers = self.numbers.block(document_type, period);
            let number = self.numbers.take(&mut numbers).await?;
            let document = input
                .clone()
                .build(number.formatted, actor.id, self.precision)?;

            let unit = UnitOfWork::new()
                .create_document(document.clone())
                .claim_numbers(&numbers);
            match self.store.commit(unit).await {
                Ok(()) => break document,
                Err(err) if err.is_counter_moved() => self.numbers.retry_claim(&numbers, attempt)?,
                Err(err) => {
                    error!(document_type = %document_type, error = %err, "Failed to create draft");
                    return Err(err.into());
                }
            }
        };

        info!(
            document_id = %document.id(),
            number = %document.header().number,
            document_type = %document_type,
            owner = %actor.id,
            "Draft created"
        );
        Ok(document)
    }

    /// Fetches a document.
    pub async fn get(
        &self,
        token: &ActorToken,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Result<WorkflowDocument, ServiceError> {
        self.authenticate(token).await?;
        self.load(document_type, id).await
    }

    async fn load(
        &self,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Result<WorkflowDocument, ServiceError> {
        self.store
            .get_document(document_type, id)
            .await?
            .ok_or(ServiceError::DocumentNotFound { document_type, id })
    }

    /// Lists documents passing a filter.
    pub async fn list(
        &self,
        token: &ActorToken,
        filter: &DocumentFilter,
    ) -> Result<Vec<WorkflowDocument>, ServiceError> {
        self.authenticate(token).await?;
        Ok(self.store.query_documents(filter).await?)
    }

    /// Replaces the lines of a draft and recomputes its totals.
    pub async fn update_draft_lines(
        &self,
        token: &ActorToken,
        document_type: DocumentType,
        id: DocumentId,
        lines: LinesInput,
    ) -> Result<WorkflowDocument, ServiceError> {
        let actor = self.authenticate(token).await?;
        let document = self.load(document_type, id).await?;
        Self::ensure_owner(&actor, &document, "edit this document")?;
        Self::ensure_editable(&document)?;

        let (items, totals) = lines.build(document_type, self.precision)?;
        let mut updated = document.clone();
        updated.set_lines(items, totals);
        updated.header_mut().touch();

        self.store
            .update_document_if(Expected::of(&document), updated.clone())
            .await
            .map_err(|err| Self::write_error(id, err))?;

        info!(document_id = %id, total = %updated.totals().total, "Draft lines updated");
        Ok(updated)
    }

    /// Deletes a draft that has no postings and is not part of a conversion.
    pub async fn delete_draft(
        &self,
        token: &ActorToken,
        document_type: DocumentType,
        id: DocumentId,
    ) -> Result<(), ServiceError> {
        let actor = self.authenticate(token).await?;
        let document = self.load(document_type, id).await?;
        Self::ensure_owner(&actor, &document, "delete this document")?;
        Self::ensure_editable(&document)?;

        if document.is_converted() || document.converted_from().is_some() {
            return Err(ServiceError::Validation(format!(
                "document {id} is part of a conversion and cannot be deleted"
            )));
        }
        if !self
            .store
            .query_entries(&EntryFilter::for_document(id))
            .await?
            .is_empty()
        {
            return Err(ServiceError::Validation(format!(
                "document {id} has posted entries and cannot be deleted"
            )));
        }

        let unit = UnitOfWork::new().delete_document(document_type, id, Expected::of(&document));
        self.store
            .commit(unit)
            .await
            .map_err(|err| Self::write_error(id, err))?;

        info!(document_id = %id, number = %document.header().number, "Draft deleted");
        Ok(())
    }

    /// Applies a workflow action to a stored document.
    pub async fn transition(
        &self,
        token: &ActorToken,
        document_type: DocumentType,
        id: DocumentId,
        action: WorkflowAction,
    ) -> Result<TransitionOutcome, ServiceError> {
        let actor = self.authenticate(token).await?;
        let document = self.load(document_type, id).await?;
        Ok(self.workflow.execute(&document, action, &actor).await?)
    }

    /// Converts a stored quote or purchase order.
    pub async fn convert(
        &self,
        token: &ActorToken,
        source_type: DocumentType,
        id: DocumentId,
        target_type: DocumentType,
    ) -> Result<ConversionOutcome, ServiceError> {
        let actor = self.authenticate(token).await?;
        let source = self.load(source_type, id).await?;
        Ok(self.conversions.convert(&source, target_type, &actor).await?)
    }

    /// Posts a document event outside a transition. Managers and admins only.
    ///
    /// Only an event the document's current status has already posted is
    /// accepted, so a repeat returns the stored entry and a missing one is
    /// repaired.
    pub async fn post(
        &self,
        token: &ActorToken,
        document_type: DocumentType,
        id: DocumentId,
        event_kind: EventKind,
    ) -> Result<AccountingEntry, ServiceError> {
        let actor = self.authenticate(token).await?;
        Self::ensure_manager(&actor, "post entries")?;
        let document = self.load(document_type, id).await?;
        if !posted_events(document_type, document.status()).contains(&event_kind) {
            return Err(ServiceError::EventNotPostable {
                document_id: id,
                event_kind,
                status: document.status(),
            });
        }
        Ok(self.ledger.post(&document, event_kind, actor.id).await?)
    }

    /// Reverses a posted entry. Managers and admins only.
    pub async fn reverse(
        &self,
        token: &ActorToken,
        entry_id: EntryId,
    ) -> Result<AccountingEntry, ServiceError> {
        let actor = self.authenticate(token).await?;
        Self::ensure_manager(&actor, "reverse entries")?;
        Ok(self.ledger.reverse_by_id(entry_id, actor.id).await?)
    }

    /// Entries posted for a document, reversals included.
    pub async fn entries_for(
        &self,
        token: &ActorToken,
        id: DocumentId,
    ) -> Result<Vec<AccountingEntry>, ServiceError> {
        self.authenticate(token).await?;
        Ok(self.store.query_entries(&EntryFilter::for_document(id)).await?)
    }

    /// Planned-vs-actual report of a budget.
    pub async fn budget_variance(
        &self,
        token: &ActorToken,
        budget_id: DocumentId,
        as_of: NaiveDate,
    ) -> Result<BudgetVariance, ServiceError> {
        self.authenticate(token).await?;
        Ok(self.variance.variance(budget_id, as_of).await?)
    }

    /// Expense claim aggregates over a period.
    pub async fn claim_totals(
        &self,
        token: &ActorToken,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<ClaimTotals, ServiceError> {
        self.authenticate(token).await?;
        Ok(self.variance.claim_totals(period_start, period_end).await?)
    }

    fn ensure_owner(
        actor: &Actor,
        document: &WorkflowDocument,
        operation: &'static str,
    ) -> Result<(), ServiceError> {
        if actor.id == document.owner() || actor.role == Role::Admin {
            Ok(())
        } else {
            Err(ServiceError::NotAuthorized {
                operation,
                actor_role: actor.role,
            })
        }
    }

    fn ensure_manager(actor: &Actor, operation: &'static str) -> Result<(), ServiceError> {
        if actor.is_manager_or_admin() {
            Ok(())
        } else {
            Err(ServiceError::NotAuthorized {
                operation,
                actor_role: actor.role,
            })
        }
    }

    fn ensure_editable(document: &WorkflowDocument) -> Result<(), ServiceError> {
        if document.status() == DocumentStatus::Draft {
            Ok(())
        } else {
            Err(ServiceError::NotEditable {
                document_id: document.id(),
                status: document.status(),
            })
        }
    }

    fn write_error(id: DocumentId, err: StoreError) -> ServiceError {
        if err.is_conflict() {
            warn!(document_id = %id, error = %err, "Write lost a concurrent update");
            ServiceError::ConcurrentModification(id)
        } else {
            error!(document_id = %id, error = %err, "Failed to write document");
            err.into()
        }
    }
}
