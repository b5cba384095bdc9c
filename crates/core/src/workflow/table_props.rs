//! Property-based tests for the transition tables and policy.
//!
//! Only declared transitions are legal, terminal statuses have no exits,
//! and only managers or admins may move a document out of pending approval.

use proptest::prelude::*;

use super::policy::ApprovalPolicy;
use super::table::{Effect, RoleRequirement, TransitionTable};
use super::types::ActionKind;
use crate::document::{
    DocumentHeader, DocumentStatus, DocumentType, LineItem, Quote, Totals, WorkflowDocument,
};
use crate::identity::{Actor, Role};
use docflow_shared::types::{Precision, UserId};
use rust_decimal::Decimal;

fn arb_document_type() -> impl Strategy<Value = DocumentType> {
    prop::sample::select(DocumentType::ALL.to_vec())
}

fn arb_status() -> impl Strategy<Value = DocumentStatus> {
    prop_oneof![
        Just(DocumentStatus::Draft),
        Just(DocumentStatus::PendingApproval),
        Just(DocumentStatus::Approved),
        Just(DocumentStatus::Rejected),
        Just(DocumentStatus::Paid),
        Just(DocumentStatus::Closed),
        Just(DocumentStatus::Cancelled),
    ]
}

fn arb_action() -> impl Strategy<Value = ActionKind> {
    prop::sample::select(ActionKind::ALL.to_vec())
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Employee), Just(Role::Manager), Just(Role::Admin)]
}

fn quote(owner: UserId, status: DocumentStatus) -> WorkflowDocument {
    let lines = vec![LineItem::new("Item", Decimal::ONE, Decimal::TEN, Precision::CENTS)];
    let totals = Totals::compute(&lines, Decimal::ZERO, Decimal::ZERO, Precision::CENTS);
    let mut header = DocumentHeader::draft("QUO-2026-00001", owner);
    header.status = status;
    Quote {
        header,
        customer: "c".to_string(),
        valid_until: None,
        lines,
        totals,
        conversion: crate::document::ConversionState::default(),
    }
    .into()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Terminal statuses have no outgoing transitions.
    #[test]
    fn prop_terminal_statuses_have_no_exits(
        document_type in arb_document_type(),
        status in arb_status(),
        action in arb_action(),
    ) {
        let table = TransitionTable::for_type(document_type);
        if status.is_terminal() {
            prop_assert!(table.find(action, status).is_none());
        }
    }

    /// A status has at most one rule per action.
    #[test]
    fn prop_rules_are_deterministic(
        document_type in arb_document_type(),
        status in arb_status(),
        action in arb_action(),
    ) {
        let table = TransitionTable::for_type(document_type);
        let matching = table
            .rules()
            .iter()
            .filter(|r| r.action == action && r.from == status)
            .count();
        prop_assert!(matching <= 1);
    }

    /// Every rule requiring a reason also records it.
    #[test]
    fn prop_reason_rules_record_reason(document_type in arb_document_type()) {
        let table = TransitionTable::for_type(document_type);
        for rule in table.rules().iter().filter(|r| r.requires_reason) {
            prop_assert!(rule.effects.contains(&Effect::RecordRejection));
        }
    }

    /// Leaving pending approval needs a manager or an admin.
    #[test]
    fn prop_pending_exits_need_manager(
        role in arb_role(),
        action in prop_oneof![Just(ActionKind::Approve), Just(ActionKind::Reject)],
    ) {
        let owner = Actor::new(UserId::new(), role);
        let document = quote(owner.id, DocumentStatus::PendingApproval);
        let table = TransitionTable::for_type(DocumentType::Quote);
        let rule = table.find(action, DocumentStatus::PendingApproval).unwrap();
        prop_assert_eq!(rule.requirement, RoleRequirement::ManagerOrAdmin);

        let allowed = ApprovalPolicy::default().authorize(rule, &document, &owner).is_ok();
        prop_assert_eq!(allowed, role != Role::Employee);
    }
}

mod edge_case_tests {
    use super::*;

    #[test]
    fn test_owner_rules_reject_strangers() {
        let table = TransitionTable::for_type(DocumentType::Invoice);
        let submit = table.find(ActionKind::Submit, DocumentStatus::Draft).unwrap();
        let document = quote(UserId::new(), DocumentStatus::Draft);
        assert!(ApprovalPolicy::default().authorize(submit, &document, &Actor::manager()).is_err());
    }

    #[test]
    fn test_cancel_reverses_before_recording() {
        let table = TransitionTable::for_type(DocumentType::Bill);
        let cancel = table.find(ActionKind::Cancel, DocumentStatus::Approved).unwrap();
        assert_eq!(cancel.effects, vec![Effect::ReverseAll, Effect::RecordCancellation]);
    }
}
