//! Shared fixtures for the store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use docflow_core::document::WorkflowDocument;
use docflow_core::identity::{Actor, ActorToken, StaticIdentityProvider};
use docflow_core::notify::TracingNotifier;
use docflow_core::service::{DocumentDetails, DraftInput, LineInput, LinesInput};
use docflow_core::store::DocumentStore;
use docflow_core::workflow::WorkflowAction;
use docflow_core::DocumentService;
use docflow_shared::AppConfig;
use docflow_store::InMemoryStore;
use rust_decimal_macros::dec;

pub const OWNER: &str = "owner";
pub const OTHER: &str = "other-employee";
pub const MANAGER: &str = "manager";
pub const ADMIN: &str = "admin";

/// A service wired to a fresh in-memory store with four known actors.
pub struct Harness {
    pub store: Arc<InMemoryStore>,
    pub service: DocumentService,
    pub owner: Actor,
    pub manager: Actor,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let owner = Actor::employee();
        let manager = Actor::manager();
        let identity = StaticIdentityProvider::new()
            .with_actor(OWNER, owner)
            .with_actor(OTHER, Actor::employee())
            .with_actor(MANAGER, manager)
            .with_actor(ADMIN, Actor::admin());
        let dyn_store: Arc<dyn DocumentStore> = store.clone();
        let service = DocumentService::new(
            &AppConfig::default(),
            dyn_store,
            Arc::new(identity),
            Arc::new(TracingNotifier),
        )
        .expect("standard mappings are valid");
        Self {
            store,
            service,
            owner,
            manager,
        }
    }

    pub async fn create(&self, input: DraftInput) -> WorkflowDocument {
        self.service
            .create_draft(&token(OWNER), input)
            .await
            .expect("draft is valid")
    }

    pub async fn act(
        &self,
        who: &str,
        document: &WorkflowDocument,
        action: WorkflowAction,
    ) -> WorkflowDocument {
        use docflow_core::document::Document;
        self.service
            .transition(&token(who), document.document_type(), document.id(), action)
            .await
            .expect("transition is legal")
            .document
    }

    /// Drives a draft to approved.
    pub async fn approve(&self, document: &WorkflowDocument) -> WorkflowDocument {
        let submitted = self.act(OWNER, document, WorkflowAction::Submit).await;
        self.act(MANAGER, &submitted, WorkflowAction::Approve { notes: None })
            .await
    }
}

pub fn token(who: &str) -> ActorToken {
    ActorToken::new(who)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

/// 2 x 100.00 + 1 x 50.00 at 10 % tax.
pub fn quote_input() -> DraftInput {
    DraftInput::new(
        DocumentDetails::Quote {
            customer: "Acme Corp".to_string(),
            valid_until: None,
        },
        LinesInput::new(vec![
            LineInput::new("Widget", dec!(2), dec!(100.00)),
            LineInput::new("Installation", dec!(1), dec!(50.00)),
        ])
        .with_tax_rate(dec!(0.10)),
    )
}

pub fn invoice_input() -> DraftInput {
    DraftInput::new(
        DocumentDetails::Invoice {
            customer: "Acme Corp".to_string(),
            due_date: None,
        },
        quote_input().lines,
    )
}

pub fn claim_input(expense_date: NaiveDate, lines: Vec<LineInput>) -> DraftInput {
    DraftInput::new(
        DocumentDetails::ExpenseClaim {
            expense_date,
            merchant: None,
        },
        LinesInput::new(lines),
    )
}
