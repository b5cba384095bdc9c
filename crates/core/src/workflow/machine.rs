//! The approval state machine.
//!
//! A transition is checked for legality, authorization and justification,
//! then its status change and ledger effects are committed in one unit of
//! work guarded by the version and status the caller read.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};

use super::error::WorkflowError;
use super::policy::ApprovalPolicy;
use super::table::{Effect, TransitionRule, TransitionTables};
use super::types::{ActionKind, WorkflowAction};
use crate::document::{Document, DocumentStatus, WorkflowDocument};
use crate::identity::Actor;
use crate::ledger::{AccountingEntry, LedgerPostingEngine, PostingError, Prepared};
use crate::notify::{self, Notification, NotificationSink};
use crate::numbering::NumberBlock;
use crate::store::{DocumentStore, Expected, StoreError, UnitOfWork};

/// Result of a committed transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The document as stored after the transition.
    pub document: WorkflowDocument,
    /// Status before the transition.
    pub from: DocumentStatus,
    /// Entries posted or reversed by the transition.
    pub entries: Vec<AccountingEntry>,
}

/// Applies workflow actions to documents.
#[derive(Clone)]
pub struct ApprovalStateMachine {
    store: Arc<dyn DocumentStore>,
    ledger: LedgerPostingEngine,
    tables: Arc<TransitionTables>,
    policy: Arc<ApprovalPolicy>,
    notifier: Arc<dyn NotificationSink>,
}

impl ApprovalStateMachine {
    /// Creates a state machine with the canonical tables and no amount rules.
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ledger: LedgerPostingEngine,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            store,
            ledger,
            tables: Arc::new(TransitionTables::standard()),
            policy: Arc::new(ApprovalPolicy::default()),
            notifier,
        }
    }

    /// Replaces the approval policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ApprovalPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Checks that an action is legal, authorized and justified.
    ///
    /// Returns the matching transition rule. Nothing is read or written.
    pub fn check(
        &self,
        document: &WorkflowDocument,
        action: &WorkflowAction,
        actor: &Actor,
    ) -> Result<&TransitionRule, WorkflowError> {
        let kind = action.kind();
        let from = document.status();
        let rule = self
            .tables
            .get(document.document_type())
            .and_then(|table| table.find(kind, from))
            .ok_or(WorkflowError::InvalidTransition {
                document_id: document.id(),
                action: kind,
                from,
            })?;

        self.policy.authorize(rule, document, actor)?;

        if kind == ActionKind::Cancel && document.is_converted() {
            return Err(WorkflowError::AlreadyConverted {
                document_id: document.id(),
                target_id: document.conversion().and_then(|c| c.converted_to_id),
            });
        }

        if rule.requires_reason && action.reason().is_none() {
            return Err(WorkflowError::ReasonRequired {
                document_id: document.id(),
                action: kind,
            });
        }
        Ok(rule)
    }

    /// Applies an action and returns the updated document.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition`, `NotAuthorized`,
    /// `ReasonRequired` or `AlreadyConverted` when the action is refused, and
    /// `ConcurrentModification` when the document changed after it was read.
    pub async fn apply(
        &self,
        document: &WorkflowDocument,
        action: WorkflowAction,
        actor: &Actor,
    ) -> Result<WorkflowDocument, WorkflowError> {
        Ok(self.execute(document, action, actor).await?.document)
    }

    /// Applies an action and returns the document together with the entries
    /// the transition posted or reversed.
    ///
    /// # Errors
    ///
    /// See [`apply`](Self::apply).
    pub async fn execute(
        &self,
        document: &WorkflowDocument,
        action: WorkflowAction,
        actor: &Actor,
    ) -> Result<TransitionOutcome, WorkflowError> {
        let rule = self.check(document, &action, actor)?;
        let kind = rule.action;
        let from = document.status();

        let mut attempt = 0;
        let (updated, entries) = loop {
            attempt += 1;
            let mut numbers = self.ledger.entry_numbers();
            let staged = self
                .stage(document, rule, &action, actor, &mut numbers)
                .await?;

            let unit = UnitOfWork::new()
                .update_document(Expected::of(document), staged.document.clone())
                .create_entries(staged.pending)
                .claim_numbers(&numbers);
            match self.store.commit(unit).await {
                Ok(()) => break (staged.document, staged.entries),
                Err(err) if err.is_conflict() || matches!(err, StoreError::DuplicatePostingKey(_)) => {
                    warn!(
                        document_id = %document.id(),
                        action = %kind,
                        error = %err,
                        "Transition lost a concurrent write"
                    );
                    return Err(WorkflowError::ConcurrentModification {
                        document_id: document.id(),
                        action: kind,
                    });
                }
                Err(err) if err.is_counter_moved() => {
                    self.ledger
                        .numbers()
                        .retry_claim(&numbers, attempt)
                        .map_err(PostingError::from)?;
                }
                Err(err) => {
                    error!(
                        document_id = %document.id(),
                        action = %kind,
                        error = %err,
                        "Failed to commit transition"
                    );
                    return Err(err.into());
                }
            }
        };

        info!(
            document_id = %updated.id(),
            number = %updated.header().number,
            action = %kind,
            from = %from,
            to = %updated.status(),
            entries = entries.len(),
            "Document transitioned"
        );

        notify::dispatch(
            self.notifier.as_ref(),
            Notification::Transitioned {
                document_type: updated.document_type(),
                document_id: updated.id(),
                number: updated.header().number.clone(),
                action: kind,
                from,
                to: updated.status(),
                actor: actor.id,
                owner: updated.owner(),
            },
        )
        .await;

        Ok(TransitionOutcome {
            document: updated,
            from,
            entries,
        })
    }

    /// Builds the updated document and the entries a rule's effects produce.
    async fn stage(
        &self,
        document: &WorkflowDocument,
        rule: &TransitionRule,
        action: &WorkflowAction,
        actor: &Actor,
        numbers: &mut NumberBlock,
    ) -> Result<Staged, WorkflowError> {
        let mut updated = document.clone();
        {
            let header = updated.header_mut();
            header.status = rule.to;
            header.touch();
        }

        let mut pending = Vec::new();
        let mut entries = Vec::new();
        for effect in &rule.effects {
            match *effect {
                Effect::Post(event_kind) => {
                    match self
                        .ledger
                        .prepare(&updated, event_kind, actor.id, numbers)
                        .await?
                    {
                        Prepared::Existing(entry) => entries.push(entry),
                        Prepared::New(entry) => {
                            pending.push(entry.clone());
                            entries.push(entry);
                        }
                    }
                }
                Effect::ReverseAll => {
                    let reversals = self
                        .ledger
                        .prepare_reversals_for(document, actor.id, numbers)
                        .await?;
                    entries.extend(reversals.iter().cloned());
                    pending.extend(reversals);
                }
                Effect::RecordApprover => {
                    let header = updated.header_mut();
                    header.approved_by = Some(actor.id);
                    header.approved_at = Some(Utc::now());
                    if let WorkflowAction::Approve { notes } = action {
                        header.approval_notes.clone_from(notes);
                    }
                }
                Effect::ClearApprover => {
                    let header = updated.header_mut();
                    header.approved_by = None;
                    header.approved_at = None;
                    header.approval_notes = None;
                }
                Effect::RecordRejection => {
                    updated.header_mut().rejection_reason = action.reason().map(str::to_string);
                }
                Effect::ClearRejection => updated.header_mut().rejection_reason = None,
                Effect::RecordCancellation => {
                    updated.header_mut().cancellation_reason = action.reason().map(str::to_string);
                }
            }
        }

        Ok(Staged {
            document: updated,
            pending,
            entries,
        })
    }
}

/// A transition built but not yet committed.
struct Staged {
    document: WorkflowDocument,
    pending: Vec<AccountingEntry>,
    entries: Vec<AccountingEntry>,
}
