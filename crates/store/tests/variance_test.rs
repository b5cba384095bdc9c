//! Budget variance and claim aggregation against posted entries.

mod common;

use chrono::{Datelike, NaiveDate, Utc};
use common::{Harness, MANAGER, OWNER, claim_input, date, token};
use docflow_core::document::{Document, DocumentStatus};
use docflow_core::service::{DocumentDetails, DraftInput, LineInput, LinesInput};
use docflow_core::variance::{VarianceError, VarianceStatus};
use docflow_core::workflow::WorkflowAction;
use docflow_core::ServiceError;
use docflow_shared::types::DocumentId;
use rust_decimal_macros::dec;

fn budget_input(year: i32) -> DraftInput {
    DraftInput::new(
        DocumentDetails::Budget {
            name: "Operations".to_string(),
            period_start: date(year, 1, 1),
            period_end: date(year, 12, 31),
        },
        LinesInput::new(vec![
            LineInput::new("Travel", dec!(1), dec!(1000.00)).with_category("6100"),
            LineInput::new("Supplies", dec!(1), dec!(500.00)).with_category("6200"),
        ]),
    )
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[tokio::test]
async fn test_variance_counts_posted_claims_and_nets_reversals() {
    let h = Harness::new();
    let year = today().year();
    let budget = h.create(budget_input(year)).await;
    assert!(budget.header().number.starts_with(&format!("BUD-{year}-")));

    let kept = h
        .create(claim_input(
            today(),
            vec![LineInput::new("Flight", dec!(1), dec!(300.00)).with_category("6100")],
        ))
        .await;
    h.approve(&kept).await;

    let cancelled = h
        .create(claim_input(
            today(),
            vec![LineInput::new("Hotel", dec!(1), dec!(200.00)).with_category("6100")],
        ))
        .await;
    let approved = h.approve(&cancelled).await;
    h.act(
        MANAGER,
        &approved,
        WorkflowAction::Cancel {
            reason: Some("trip called off".to_string()),
        },
    )
    .await;

    let report = h
        .service
        .budget_variance(&token(OWNER), budget.id(), today())
        .await
        .unwrap();
    assert_eq!(report.budget_number, budget.header().number);
    assert_eq!(report.categories.len(), 2);

    let travel = &report.categories[0];
    assert_eq!(travel.category, "6100");
    assert_eq!(travel.figures.planned, dec!(1000.00));
    assert_eq!(travel.figures.actual, dec!(300.00));
    assert_eq!(travel.figures.variance, dec!(-700.00));
    assert_eq!(travel.figures.utilization_percent, dec!(30.00));
    assert_eq!(travel.figures.status, VarianceStatus::Favorable);

    let supplies = &report.categories[1];
    assert_eq!(supplies.category, "6200");
    assert_eq!(supplies.figures.actual, dec!(0));
    assert_eq!(supplies.figures.variance_percent, dec!(-100.00));

    assert_eq!(report.total.planned, dec!(1500.00));
    assert_eq!(report.total.actual, dec!(300.00));
    assert_eq!(report.total.utilization_percent, dec!(20.00));
}

#[tokio::test]
async fn test_variance_ignores_entries_outside_the_period() {
    let h = Harness::new();
    let last_year = today().year() - 1;
    let budget = h.create(budget_input(last_year)).await;

    let claim = h
        .create(claim_input(
            today(),
            vec![LineInput::new("Flight", dec!(1), dec!(300.00)).with_category("6100")],
        ))
        .await;
    h.approve(&claim).await;

    let report = h
        .service
        .budget_variance(&token(OWNER), budget.id(), today())
        .await
        .unwrap();
    assert_eq!(report.total.actual, dec!(0));
    assert_eq!(report.total.status, VarianceStatus::Favorable);
}

#[tokio::test]
async fn test_missing_budget() {
    let h = Harness::new();
    let err = h
        .service
        .budget_variance(&token(OWNER), DocumentId::new(), today())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Variance(VarianceError::BudgetNotFound(_))
    ));
}

#[tokio::test]
async fn test_claim_totals_group_by_status_and_category() {
    let h = Harness::new();
    let march = |d| date(2026, 3, d);

    let taxi = h
        .create(claim_input(
            march(2),
            vec![LineInput::new("Taxi", dec!(1), dec!(40.00)).with_category("6100")],
        ))
        .await;
    h.approve(&taxi).await;

    h.create(claim_input(
        march(9),
        vec![
            LineInput::new("Train", dec!(1), dec!(60.00)).with_category("6100"),
            LineInput::new("Pens", dec!(4), dec!(2.50)),
        ],
    ))
    .await;

    // Outside the period.
    h.create(claim_input(
        date(2026, 4, 1),
        vec![LineInput::new("Lunch", dec!(1), dec!(15.00))],
    ))
    .await;

    let totals = h
        .service
        .claim_totals(&token(MANAGER), march(1), march(31))
        .await
        .unwrap();
    assert_eq!(totals.count, 2);
    assert_eq!(totals.amount, dec!(110.00));

    let statuses: Vec<_> = totals
        .by_status
        .iter()
        .map(|s| (s.status, s.count, s.amount))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (DocumentStatus::Draft, 1, dec!(70.00)),
            (DocumentStatus::Approved, 1, dec!(40.00)),
        ]
    );

    let categories: Vec<_> = totals
        .by_category
        .iter()
        .map(|c| (c.category.as_str(), c.line_count, c.amount))
        .collect();
    assert_eq!(
        categories,
        vec![("6000", 1, dec!(10.00)), ("6100", 2, dec!(100.00))]
    );
}

#[tokio::test]
async fn test_claim_totals_reject_inverted_period() {
    let h = Harness::new();
    let err = h
        .service
        .claim_totals(&token(MANAGER), date(2026, 3, 31), date(2026, 3, 1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Variance(VarianceError::InvalidPeriod { .. })
    ));
}
