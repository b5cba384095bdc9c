//! Variance and aggregate report types.

use chrono::NaiveDate;
use docflow_shared::types::DocumentId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::document::DocumentStatus;

/// Variance status (spending under plan is favorable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarianceStatus {
    /// Actual is below plan.
    Favorable,
    /// Actual exceeds plan.
    Unfavorable,
    /// Actual equals plan.
    OnBudget,
}

/// Planned-vs-actual figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceFigures {
    /// Planned amount.
    pub planned: Decimal,
    /// Actual amount (debits minus credits).
    pub actual: Decimal,
    /// `actual - planned`.
    pub variance: Decimal,
    /// Variance as a percentage of plan, zero when nothing was planned.
    pub variance_percent: Decimal,
    /// Actual as a percentage of plan, zero when nothing was planned.
    pub utilization_percent: Decimal,
    /// Favorable, unfavorable or on budget.
    pub status: VarianceStatus,
}

impl VarianceFigures {
    /// Computes variance figures.
    ///
    /// Percentages are rounded to 2 decimal places.
    #[must_use]
    pub fn compute(planned: Decimal, actual: Decimal) -> Self {
        let variance = actual - planned;

        let status = match variance.cmp(&Decimal::ZERO) {
            std::cmp::Ordering::Less => VarianceStatus::Favorable,
            std::cmp::Ordering::Greater => VarianceStatus::Unfavorable,
            std::cmp::Ordering::Equal => VarianceStatus::OnBudget,
        };

        let (variance_percent, utilization_percent) = if planned.is_zero() {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            (
                (variance / planned * Decimal::ONE_HUNDRED).round_dp(2),
                (actual / planned * Decimal::ONE_HUNDRED).round_dp(2),
            )
        };

        Self {
            planned,
            actual,
            variance,
            variance_percent,
            utilization_percent,
            status,
        }
    }
}

/// Variance of one tracked category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryVariance {
    /// Account code of the category.
    pub category: String,
    /// Figures for the category.
    #[serde(flatten)]
    pub figures: VarianceFigures,
}

/// Planned-vs-actual report of a budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetVariance {
    /// Budget ID.
    pub budget_id: DocumentId,
    /// Budget number.
    pub budget_number: String,
    /// Budget name.
    pub name: String,
    /// First day of the budget period.
    pub period_start: NaiveDate,
    /// Last day of the budget period.
    pub period_end: NaiveDate,
    /// Postings after this date are ignored.
    pub as_of: NaiveDate,
    /// Per-category variance, ordered by account code.
    pub categories: Vec<CategoryVariance>,
    /// Figures over all categories.
    pub total: VarianceFigures,
}

/// Claim count and amount for one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotal {
    /// Status.
    pub status: DocumentStatus,
    /// Number of claims.
    pub count: usize,
    /// Sum of claim totals.
    pub amount: Decimal,
}

/// Claimed line count and amount for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// Account code of the category.
    pub category: String,
    /// Number of claim lines.
    pub line_count: usize,
    /// Sum of line subtotals.
    pub amount: Decimal,
}

/// Expense claim aggregates over a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimTotals {
    /// First expense date included.
    pub period_start: NaiveDate,
    /// Last expense date included.
    pub period_end: NaiveDate,
    /// Number of claims.
    pub count: usize,
    /// Sum of claim totals.
    pub amount: Decimal,
    /// Totals per status, in workflow order; statuses without claims are omitted.
    pub by_status: Vec<StatusTotal>,
    /// Totals per category, ordered by account code.
    pub by_category: Vec<CategoryTotal>,
}
