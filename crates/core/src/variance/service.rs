//! Variance and claim aggregation over the store. Read-only.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use docflow_shared::types::DocumentId;
use rust_decimal::Decimal;
use tracing::debug;

use super::error::VarianceError;
use super::types::{
    BudgetVariance, CategoryTotal, CategoryVariance, ClaimTotals, StatusTotal, VarianceFigures,
};
use crate::document::{Budget, Document, DocumentStatus, DocumentType, WorkflowDocument};
use crate::ledger::mapping::accounts;
use crate::store::{DocumentFilter, DocumentStore, EntryFilter};

/// Computes budget variance and claim totals.
#[derive(Clone)]
pub struct VarianceService {
    store: Arc<dyn DocumentStore>,
}

impl VarianceService {
    /// Creates a variance service.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Planned-vs-actual report of a stored budget.
    ///
    /// # Errors
    ///
    /// Returns `VarianceError::BudgetNotFound` if the budget does not exist.
    pub async fn variance(
        &self,
        budget_id: DocumentId,
        as_of: NaiveDate,
    ) -> Result<BudgetVariance, VarianceError> {
        let budget = match self
            .store
            .get_document(DocumentType::Budget, budget_id)
            .await?
        {
            Some(WorkflowDocument::Budget(budget)) => budget,
            _ => return Err(VarianceError::BudgetNotFound(budget_id)),
        };
        self.variance_for(&budget, as_of).await
    }

    /// Planned-vs-actual report of a budget.
    ///
    /// Actuals are debits minus credits of posted lines on the tracked
    /// categories, dated within the budget period and not after `as_of`.
    pub async fn variance_for(
        &self,
        budget: &Budget,
        as_of: NaiveDate,
    ) -> Result<BudgetVariance, VarianceError> {
        let mut planned: BTreeMap<String, Decimal> = BTreeMap::new();
        for line in &budget.lines {
            if let Some(category) = &line.category {
                *planned.entry(category.clone()).or_default() += line.amount;
            }
        }

        let filter = EntryFilter {
            account_codes: planned.keys().cloned().collect(),
            date_from: Some(budget.period_start),
            date_to: Some(as_of.min(budget.period_end)),
            ..EntryFilter::default()
        };
        let mut actual: BTreeMap<&str, Decimal> = BTreeMap::new();
        let entries = if planned.is_empty() {
            Vec::new()
        } else {
            self.store.query_entries(&filter).await?
        };
        for line in entries.iter().flat_map(|e| &e.lines) {
            if planned.contains_key(&line.account_code) {
                *actual.entry(line.account_code.as_str()).or_default() += line.net();
            }
        }

        let categories: Vec<CategoryVariance> = planned
            .iter()
            .map(|(category, planned)| CategoryVariance {
                category: category.clone(),
                figures: VarianceFigures::compute(
                    *planned,
                    actual.get(category.as_str()).copied().unwrap_or_default(),
                ),
            })
            .collect();

        let total = VarianceFigures::compute(
            categories.iter().map(|c| c.figures.planned).sum(),
            categories.iter().map(|c| c.figures.actual).sum(),
        );

        debug!(
            budget_id = %budget.header.id,
            entries = entries.len(),
            categories = categories.len(),
            "Budget variance computed"
        );

        Ok(BudgetVariance {
            budget_id: budget.header.id,
            budget_number: budget.header.number.clone(),
            name: budget.name.clone(),
            period_start: budget.period_start,
            period_end: budget.period_end,
            as_of,
            categories,
            total,
        })
    }

    /// Count and amount of expense claims whose expense date falls in the
    /// period, per status and per category.
    ///
    /// Lines without a category count under the general expenses account.
    ///
    /// # Errors
    ///
    /// Returns `VarianceError::InvalidPeriod` if `period_start` is after
    /// `period_end`.
    pub async fn claim_totals(
        &self,
        period_start: NaiveDate,
        period_end: NaiveDate,
    ) -> Result<ClaimTotals, VarianceError> {
        if period_start > period_end {
            return Err(VarianceError::InvalidPeriod {
                start: period_start,
                end: period_end,
            });
        }

        let claims = self
            .store
            .query_documents(&DocumentFilter::of_type(DocumentType::ExpenseClaim))
            .await?;

        let mut count = 0;
        let mut amount = Decimal::ZERO;
        let mut by_status: BTreeMap<usize, StatusTotal> = BTreeMap::new();
        let mut by_category: BTreeMap<String, CategoryTotal> = BTreeMap::new();

        for claim in claims.iter().filter_map(WorkflowDocument::as_expense_claim) {
            if claim.expense_date < period_start || claim.expense_date > period_end {
                continue;
            }
            count += 1;
            amount += claim.totals.total;

            let status = claim.status();
            let slot = by_status
                .entry(status_order(status))
                .or_insert_with(|| StatusTotal {
                    status,
                    count: 0,
                    amount: Decimal::ZERO,
                });
            slot.count += 1;
            slot.amount += claim.totals.total;

            for line in &claim.lines {
                let category = line
                    .category
                    .clone()
                    .unwrap_or_else(|| accounts::EXPENSES.0.to_string());
                let slot = by_category
                    .entry(category.clone())
                    .or_insert_with(|| CategoryTotal {
                        category,
                        line_count: 0,
                        amount: Decimal::ZERO,
                    });
                slot.line_count += 1;
                slot.amount += line.amount;
            }
        }

        Ok(ClaimTotals {
            period_start,
            period_end,
            count,
            amount,
            by_status: by_status.into_values().collect(),
            by_category: by_category.into_values().collect(),
        })
    }
}

fn status_order(status: DocumentStatus) -> usize {
    DocumentStatus::ALL
        .iter()
        .position(|s| *s == status)
        .unwrap_or(DocumentStatus::ALL.len())
}
