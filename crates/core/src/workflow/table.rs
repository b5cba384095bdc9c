//! Declarative transition tables.
//!
//! Every document type shares the same status graph:
//!
//! - Draft → PendingApproval (submit, owner)
//! - PendingApproval → Approved (approve, manager or admin)
//! - PendingApproval → Rejected (reject, manager or admin, reason required)
//! - Rejected → Draft (revise, owner)
//! - Approved → Paid or Closed (complete, manager or admin)
//! - Approved → Cancelled (cancel, manager or admin)
//!
//! Types differ only in their completion status and in the ledger events
//! posted on approval and completion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::types::ActionKind;
use crate::document::{DocumentStatus, DocumentType};
use crate::ledger::EventKind;

/// Who may perform a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRequirement {
    /// The document's creator (admins may act on anyone's behalf).
    DocumentOwner,
    /// A manager or an admin.
    ManagerOrAdmin,
}

/// Side effect of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Post the event to the ledger.
    Post(EventKind),
    /// Reverse every entry posted for the document.
    ReverseAll,
    /// Record the acting user as approver.
    RecordApprover,
    /// Clear the approver.
    ClearApprover,
    /// Record the rejection reason.
    RecordRejection,
    /// Clear the rejection reason.
    ClearRejection,
    /// Record the cancellation reason.
    RecordCancellation,
}

/// One legal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRule {
    /// Action performing the transition.
    pub action: ActionKind,
    /// Required current status.
    pub from: DocumentStatus,
    /// Resulting status.
    pub to: DocumentStatus,
    /// Who may perform it.
    pub requirement: RoleRequirement,
    /// Whether a non-blank reason is required.
    pub requires_reason: bool,
    /// Side effects, applied in order.
    pub effects: Vec<Effect>,
}

/// Transitions of one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    document_type: DocumentType,
    rules: Vec<TransitionRule>,
}

impl TransitionTable {
    /// Builds the canonical table of a document type.
    #[must_use]
    pub fn for_type(document_type: DocumentType) -> Self {
        use ActionKind::{Approve, Cancel, Complete, Reject, Revise, Submit};
        use DocumentStatus::{Approved, Cancelled, Draft, PendingApproval, Rejected};
        use RoleRequirement::{DocumentOwner, ManagerOrAdmin};

        let rule = |action, from, to, requirement, requires_reason, effects: Vec<Effect>| TransitionRule {
            action,
            from,
            to,
            requirement,
            requires_reason,
            effects,
        };

        let mut approve_effects = vec![Effect::RecordApprover];
        approve_effects.extend(approval_event(document_type).map(Effect::Post));
        let complete_effects: Vec<Effect> = completion_event(document_type)
            .map(Effect::Post)
            .into_iter()
            .collect();

        let rules = vec![
            rule(Submit, Draft, PendingApproval, DocumentOwner, false, vec![]),
            rule(Approve, PendingApproval, Approved, ManagerOrAdmin, false, approve_effects),
            rule(
                Reject,
                PendingApproval,
                Rejected,
                ManagerOrAdmin,
                true,
                vec![Effect::ClearApprover, Effect::RecordRejection],
            ),
            rule(Revise, Rejected, Draft, DocumentOwner, false, vec![Effect::ClearRejection]),
            rule(
                Complete,
                Approved,
                document_type.completion_status(),
                ManagerOrAdmin,
                false,
                complete_effects,
            ),
            rule(
                Cancel,
                Approved,
                Cancelled,
                ManagerOrAdmin,
                false,
                vec![Effect::ReverseAll, Effect::RecordCancellation],
            ),
        ];

        Self {
            document_type,
            rules,
        }
    }

    /// The document type this table governs.
    #[must_use]
    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// Finds the rule for an action from a status.
    #[must_use]
    pub fn find(&self, action: ActionKind, from: DocumentStatus) -> Option<&TransitionRule> {
        self.rules
            .iter()
            .find(|r| r.action == action && r.from == from)
    }

    /// Actions legal from a status.
    #[must_use]
    pub fn allowed_actions(&self, from: DocumentStatus) -> Vec<ActionKind> {
        self.rules
            .iter()
            .filter(|r| r.from == from)
            .map(|r| r.action)
            .collect()
    }

    /// Every rule.
    #[must_use]
    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }
}

/// Ledger event posted when a document of this type is approved.
#[must_use]
pub fn approval_event(document_type: DocumentType) -> Option<EventKind> {
    match document_type {
        DocumentType::Invoice => Some(EventKind::InvoiceIssued),
        DocumentType::Bill => Some(EventKind::BillReceived),
        DocumentType::ExpenseClaim => Some(EventKind::ExpenseApproved),
        DocumentType::SalesReceipt => Some(EventKind::ReceiptRecorded),
        DocumentType::Payment => Some(EventKind::PaymentReceived),
        DocumentType::Budget | DocumentType::PurchaseOrder | DocumentType::Quote => None,
    }
}

/// Ledger event posted when a document of this type completes.
#[must_use]
pub fn completion_event(document_type: DocumentType) -> Option<EventKind> {
    match document_type {
        DocumentType::Invoice => Some(EventKind::PaymentReceived),
        DocumentType::Bill => Some(EventKind::BillPaid),
        DocumentType::ExpenseClaim => Some(EventKind::ExpenseReimbursed),
        _ => None,
    }
}

/// Ledger events a document of this type has posted on reaching `status`.
///
/// Cancelled documents have had their postings reversed and report none.
#[must_use]
pub fn posted_events(document_type: DocumentType, status: DocumentStatus) -> Vec<EventKind> {
    if status == DocumentStatus::Approved {
        approval_event(document_type).into_iter().collect()
    } else if status == document_type.completion_status() {
        approval_event(document_type)
            .into_iter()
            .chain(completion_event(document_type))
            .collect()
    } else {
        Vec::new()
    }
}

/// Transition tables of every document type.
#[derive(Debug, Clone)]
pub struct TransitionTables {
    tables: HashMap<DocumentType, TransitionTable>,
}

impl TransitionTables {
    /// Canonical tables for all types.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            tables: DocumentType::ALL
                .into_iter()
                .map(|t| (t, TransitionTable::for_type(t)))
                .collect(),
        }
    }

    /// Table of one type.
    #[must_use]
    pub fn get(&self, document_type: DocumentType) -> Option<&TransitionTable> {
        self.tables.get(&document_type)
    }
}

impl Default for TransitionTables {
    fn default() -> Self {
        Self::standard()
    }
}
