//! Authorization policy for transitions.
//!
//! The transition table states who may act. Amount-based approval rules can
//! then raise the role needed to approve a document above its total.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::WorkflowError;
use super::table::{RoleRequirement, TransitionRule};
use super::types::ActionKind;
use crate::document::{Document, DocumentType, WorkflowDocument};
use crate::identity::{Actor, Role};

/// An approval rule that raises the role required to approve.
///
/// Rules are matched by document type and amount range.
/// When multiple rules match, the one with lowest priority value wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    /// Human-readable name for the rule.
    pub name: String,
    /// Document types this rule applies to (empty = all).
    pub document_types: Vec<DocumentType>,
    /// Minimum total for this rule to apply (inclusive, None = no minimum).
    pub min_amount: Option<Decimal>,
    /// Maximum total for this rule to apply (inclusive, None = no maximum).
    pub max_amount: Option<Decimal>,
    /// The role required to approve matching documents.
    pub required_role: Role,
    /// Priority for rule selection (lower = higher priority).
    pub priority: i16,
}

impl ApprovalRule {
    fn applies(&self, document_type: DocumentType, total: Decimal) -> bool {
        let type_matches =
            self.document_types.is_empty() || self.document_types.contains(&document_type);
        let above_min = self.min_amount.is_none_or(|min| total >= min);
        let below_max = self.max_amount.is_none_or(|max| total <= max);
        type_matches && above_min && below_max
    }
}

/// Decides whether an actor may perform a transition.
#[derive(Debug, Clone, Default)]
pub struct ApprovalPolicy {
    rules: Vec<ApprovalRule>,
}

impl ApprovalPolicy {
    /// Creates a policy with amount-based approval rules.
    #[must_use]
    pub fn new(rules: Vec<ApprovalRule>) -> Self {
        Self { rules }
    }

    /// Determine the role an approval rule requires for a document.
    ///
    /// Returns `None` when no rule matches.
    #[must_use]
    pub fn required_approval(&self, document_type: DocumentType, total: Decimal) -> Option<Role> {
        self.rules
            .iter()
            .filter(|r| r.applies(document_type, total))
            .min_by_key(|r| r.priority)
            .map(|r| r.required_role)
    }

    /// Check if an actor may perform a transition on a document.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotAuthorized` when the actor is neither the
    /// owner (for owner transitions) nor of a sufficient role.
    pub fn authorize(
        &self,
        rule: &TransitionRule,
        document: &WorkflowDocument,
        actor: &Actor,
    ) -> Result<(), WorkflowError> {
        let required = match rule.requirement {
            RoleRequirement::DocumentOwner => {
                if actor.id == document.owner() || actor.role == Role::Admin {
                    return Ok(());
                }
                None
            }
            RoleRequirement::ManagerOrAdmin => {
                let mut required = Role::Manager;
                if rule.action == ActionKind::Approve
                    && let Some(role) =
                        self.required_approval(document.document_type(), document.totals().total)
                {
                    required = required.max(role);
                }
                Some(required)
            }
        };

        match required {
            Some(role) if actor.role.satisfies(role) => Ok(()),
            _ => Err(WorkflowError::NotAuthorized {
                document_id: document.id(),
                action: rule.action,
                actor_role: actor.role,
                required: required.map_or_else(|| "document owner".to_string(), |r| r.to_string()),
            }),
        }
    }
}
