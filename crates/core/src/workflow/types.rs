//! Workflow domain types for document lifecycle management.
//!
//! This module defines the actions that move a document between statuses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of workflow action, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Send a draft for approval.
    Submit,
    /// Approve a pending document.
    Approve,
    /// Reject a pending document.
    Reject,
    /// Return a rejected document to draft.
    Revise,
    /// Finish an approved document's lifecycle.
    Complete,
    /// Cancel an approved document.
    Cancel,
}

impl ActionKind {
    /// Every action kind.
    pub const ALL: [Self; 6] = [
        Self::Submit,
        Self::Approve,
        Self::Reject,
        Self::Revise,
        Self::Complete,
        Self::Cancel,
    ];

    /// Returns the string representation of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Approve => "approve",
            Self::Reject => "reject",
            Self::Revise => "revise",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        }
    }

    /// Parses an action from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "submit" => Some(Self::Submit),
            "approve" => Some(Self::Approve),
            "reject" => Some(Self::Reject),
            "revise" => Some(Self::Revise),
            "complete" => Some(Self::Complete),
            "cancel" => Some(Self::Cancel),
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A workflow action with its payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkflowAction {
    /// Send a draft for approval.
    Submit,
    /// Approve a pending document.
    Approve {
        /// Optional notes from the approver.
        notes: Option<String>,
    },
    /// Reject a pending document. The reason must not be blank.
    Reject {
        /// Why the document was rejected.
        reason: String,
    },
    /// Return a rejected document to draft.
    Revise,
    /// Finish an approved document's lifecycle.
    Complete,
    /// Cancel an approved document, reversing its postings.
    Cancel {
        /// Optional cancellation reason.
        reason: Option<String>,
    },
}

impl WorkflowAction {
    /// Returns the kind of this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Submit => ActionKind::Submit,
            Self::Approve { .. } => ActionKind::Approve,
            Self::Reject { .. } => ActionKind::Reject,
            Self::Revise => ActionKind::Revise,
            Self::Complete => ActionKind::Complete,
            Self::Cancel { .. } => ActionKind::Cancel,
        }
    }

    /// The justification carried by the action, trimmed, if not blank.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        let reason = match self {
            Self::Reject { reason } => Some(reason.as_str()),
            Self::Cancel { reason } => reason.as_deref(),
            _ => None,
        }?;
        let trimmed = reason.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_names() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ActionKind::parse("post"), None);
    }

    #[test]
    fn test_reason_is_trimmed() {
        let action = WorkflowAction::Reject {
            reason: "  missing receipt ".to_string(),
        };
        assert_eq!(action.reason(), Some("missing receipt"));
        assert_eq!(action.kind(), ActionKind::Reject);
    }

    #[test]
    fn test_blank_reason_is_none() {
        let action = WorkflowAction::Reject {
            reason: "   ".to_string(),
        };
        assert_eq!(action.reason(), None);
        assert_eq!(WorkflowAction::Cancel { reason: None }.reason(), None);
        assert_eq!(WorkflowAction::Submit.reason(), None);
    }

    #[test]
    fn test_action_serde() {
        let json = serde_json::to_value(WorkflowAction::Approve { notes: None }).unwrap();
        assert_eq!(json["action"], "approve");
    }
}
