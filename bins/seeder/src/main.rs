//! Docflow sample data seeder.
//!
//! Seeds an in-memory store with a budget, a quote converted to an invoice,
//! a purchase order converted to a bill and a few expense claims, driving
//! each through the workflow so the ledger and variance report have content.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::{Datelike, NaiveDate, Utc};
use docflow_core::document::{Document, DocumentType, WorkflowDocument};
use docflow_core::identity::{Actor, ActorToken, StaticIdentityProvider};
use docflow_core::notify::TracingNotifier;
use docflow_core::service::{DocumentDetails, DraftInput, LineInput, LinesInput};
use docflow_core::store::DocumentStore;
use docflow_core::workflow::WorkflowAction;
use docflow_core::DocumentService;
use docflow_shared::AppConfig;
use docflow_shared::telemetry::init_tracing;
use docflow_store::InMemoryStore;
use rust_decimal_macros::dec;
use tracing::info;

const EMPLOYEE: &str = "seed-employee";
const MANAGER: &str = "seed-manager";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let store = Arc::new(InMemoryStore::new());
    let identity = StaticIdentityProvider::new()
        .with_actor(EMPLOYEE, Actor::employee())
        .with_actor(MANAGER, Actor::manager());
    let dyn_store: Arc<dyn DocumentStore> = store.clone();
    let service = DocumentService::new(
        &config,
        dyn_store,
        Arc::new(identity),
        Arc::new(TracingNotifier),
    )?;

    let employee = ActorToken::new(EMPLOYEE);
    let manager = ActorToken::new(MANAGER);
    let today = Utc::now().date_naive();

    info!("Seeding budget...");
    let budget = service
        .create_draft(&employee, budget(today.year())?)
        .await?;

    info!("Seeding sales cycle...");
    let quote = service.create_draft(&employee, quote()).await?;
    let quote = approve(&service, &employee, &manager, &quote).await?;
    let invoice = service
        .convert(&employee, DocumentType::Quote, quote.id(), DocumentType::Invoice)
        .await?
        .target;
    let invoice = approve(&service, &employee, &manager, &invoice).await?;
    service
        .transition(&manager, DocumentType::Invoice, invoice.id(), WorkflowAction::Complete)
        .await?;

    info!("Seeding purchasing cycle...");
    let order = service.create_draft(&employee, purchase_order()).await?;
    let order = approve(&service, &employee, &manager, &order).await?;
    let bill = service
        .convert(&manager, DocumentType::PurchaseOrder, order.id(), DocumentType::Bill)
        .await?
        .target;
    approve(&service, &manager, &manager, &bill).await?;

    info!("Seeding expense claims...");
    let travel = service
        .create_draft(
            &employee,
            claim(today, LineInput::new("Client visit flight", dec!(1), dec!(412.80)), "6100"),
        )
        .await?;
    approve(&service, &employee, &manager, &travel).await?;

    let supplies = service
        .create_draft(
            &employee,
            claim(today, LineInput::new("Printer toner", dec!(2), dec!(38.45)), "6200"),
        )
        .await?;
    let submitted = service
        .transition(&employee, DocumentType::ExpenseClaim, supplies.id(), WorkflowAction::Submit)
        .await?
        .document;
    service
        .transition(
            &manager,
            DocumentType::ExpenseClaim,
            submitted.id(),
            WorkflowAction::Reject {
                reason: "missing receipt".to_string(),
            },
        )
        .await?;

    let report = service
        .budget_variance(&manager, budget.id(), today)
        .await?;
    for category in &report.categories {
        info!(
            category = %category.category,
            planned = %category.figures.planned,
            actual = %category.figures.actual,
            variance = %category.figures.variance,
            status = ?category.figures.status,
            "Budget category"
        );
    }

    info!(
        documents = store.document_count().await,
        entries = store.entry_count().await,
        "Seeding complete"
    );
    Ok(())
}

/// Submits as `owner` and approves as `approver`.
async fn approve(
    service: &DocumentService,
    owner: &ActorToken,
    approver: &ActorToken,
    document: &WorkflowDocument,
) -> anyhow::Result<WorkflowDocument> {
    let document_type = document.document_type();
    service
        .transition(owner, document_type, document.id(), WorkflowAction::Submit)
        .await?;
    let outcome = service
        .transition(
            approver,
            document_type,
            document.id(),
            WorkflowAction::Approve { notes: None },
        )
        .await?;
    info!(
        number = %outcome.document.header().number,
        entries = outcome.entries.len(),
        "Approved"
    );
    Ok(outcome.document)
}

fn budget(year: i32) -> anyhow::Result<DraftInput> {
    let period_start = NaiveDate::from_ymd_opt(year, 1, 1).context("invalid budget start")?;
    let period_end = NaiveDate::from_ymd_opt(year, 12, 31).context("invalid budget end")?;
    Ok(DraftInput::new(
        DocumentDetails::Budget {
            name: format!("Operations {year}"),
            period_start,
            period_end,
        },
        LinesInput::new(vec![
            LineInput::new("Travel", dec!(1), dec!(12000.00)).with_category("6100"),
            LineInput::new("Office supplies", dec!(1), dec!(2500.00)).with_category("6200"),
        ]),
    ))
}

fn quote() -> DraftInput {
    DraftInput::new(
        DocumentDetails::Quote {
            customer: "Northwind Traders".to_string(),
            valid_until: None,
        },
        LinesInput::new(vec![
            LineInput::new("Implementation", dec!(12), dec!(150.00)),
            LineInput::new("Training day", dec!(1), dec!(900.00)),
        ])
        .with_tax_rate(dec!(0.10))
        .with_discount(dec!(100.00)),
    )
}

fn purchase_order() -> DraftInput {
    DraftInput::new(
        DocumentDetails::PurchaseOrder {
            vendor: "Office Depot".to_string(),
            expected_date: None,
        },
        LinesInput::new(vec![
            LineInput::new("Desk chairs", dec!(4), dec!(189.99)).with_category("6200"),
        ])
        .with_tax_rate(dec!(0.08)),
    )
}

fn claim(expense_date: NaiveDate, line: LineInput, category: &str) -> DraftInput {
    DraftInput::new(
        DocumentDetails::ExpenseClaim {
            expense_date,
            merchant: None,
        },
        LinesInput::new(vec![line.with_category(category)]),
    )
}
