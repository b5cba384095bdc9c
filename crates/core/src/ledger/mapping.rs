//! Account mapping rules.
//!
//! A rule maps a (document type, event) pair onto the lines of the entry it
//! produces. Each line names an account, a side and an amount expression
//! evaluated against the document.

use std::collections::HashMap;

use docflow_shared::config::AccountMappingConfig;
use rust_decimal::Decimal;

use super::entry::{EntrySide, EventKind};
use super::error::PostingError;
use crate::document::{DocumentType, Totals};

/// A document total usable as a line amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountField {
    /// Sum of line subtotals.
    Subtotal,
    /// Tax amount.
    TaxAmount,
    /// Discount amount.
    DiscountAmount,
    /// Amount due.
    Total,
}

impl AmountField {
    /// Reads the field from totals.
    #[must_use]
    pub fn value(self, totals: &Totals) -> Decimal {
        match self {
            Self::Subtotal => totals.subtotal,
            Self::TaxAmount => totals.tax_amount,
            Self::DiscountAmount => totals.discount_amount,
            Self::Total => totals.total,
        }
    }
}

/// Amount expression of a mapping line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountExpr {
    /// One line carrying a document total.
    Field(AmountField),
    /// One line per document line item, on the item's category account.
    LineItems,
}

impl AmountExpr {
    /// Parses an expression from its configuration name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "subtotal" => Some(Self::Field(AmountField::Subtotal)),
            "tax_amount" | "tax" => Some(Self::Field(AmountField::TaxAmount)),
            "discount_amount" | "discount" => Some(Self::Field(AmountField::DiscountAmount)),
            "total" => Some(Self::Field(AmountField::Total)),
            "line_items" => Some(Self::LineItems),
            _ => None,
        }
    }
}

/// One line of a mapping rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingLine {
    /// Account code. For `LineItems`, the fallback for uncategorised items.
    pub account_code: String,
    /// Account display name.
    pub account_name: String,
    /// Side.
    pub side: EntrySide,
    /// Amount expression.
    pub amount: AmountExpr,
}

impl MappingLine {
    fn new(code: &str, name: &str, side: EntrySide, amount: AmountExpr) -> Self {
        Self {
            account_code: code.to_string(),
            account_name: name.to_string(),
            side,
            amount,
        }
    }
}

/// Lines produced for one (document type, event) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingRule {
    /// Document type.
    pub document_type: DocumentType,
    /// Event.
    pub event_kind: EventKind,
    /// Lines, in posting order.
    pub lines: Vec<MappingLine>,
}

/// Read-only table of mapping rules, loaded once at start.
#[derive(Debug, Clone, Default)]
pub struct AccountMappingTable {
    rules: HashMap<(DocumentType, EventKind), MappingRule>,
}

/// Codes and names of the built-in chart of accounts.
pub mod accounts {
    /// Cash.
    pub const CASH: (&str, &str) = ("1000", "Cash");
    /// Accounts receivable.
    pub const ACCOUNTS_RECEIVABLE: (&str, &str) = ("1200", "Accounts Receivable");
    /// Input tax recoverable.
    pub const TAX_RECEIVABLE: (&str, &str) = ("1300", "Tax Receivable");
    /// Accounts payable.
    pub const ACCOUNTS_PAYABLE: (&str, &str) = ("2000", "Accounts Payable");
    /// Amounts owed to employees.
    pub const REIMBURSEMENTS_PAYABLE: (&str, &str) = ("2100", "Employee Reimbursements Payable");
    /// Output tax owed.
    pub const TAX_PAYABLE: (&str, &str) = ("2200", "Tax Payable");
    /// Sales revenue.
    pub const SALES_REVENUE: (&str, &str) = ("4000", "Sales Revenue");
    /// Discounts granted.
    pub const SALES_DISCOUNTS: (&str, &str) = ("4100", "Sales Discounts");
    /// Discounts received.
    pub const PURCHASE_DISCOUNTS: (&str, &str) = ("5100", "Purchase Discounts");
    /// Uncategorised expenses.
    pub const EXPENSES: (&str, &str) = ("6000", "Expenses");
}

impl AccountMappingTable {
    /// The built-in table.
    #[must_use]
    pub fn standard() -> Self {
        use AmountExpr::{Field, LineItems};
        use AmountField::{DiscountAmount, Subtotal, TaxAmount, Total};
        use EntrySide::{Credit, Debit};
        use self::accounts::*;

        let line = |(code, name): (&str, &str), side, amount| MappingLine::new(code, name, side, amount);

        let sale = |receivable| {
            vec![
                line(receivable, Debit, Field(Total)),
                line(SALES_DISCOUNTS, Debit, Field(DiscountAmount)),
                line(SALES_REVENUE, Credit, Field(Subtotal)),
                line(TAX_PAYABLE, Credit, Field(TaxAmount)),
            ]
        };
        let purchase = |payable| {
            vec![
                line(EXPENSES, Debit, LineItems),
                line(TAX_RECEIVABLE, Debit, Field(TaxAmount)),
                line(payable, Credit, Field(Total)),
                line(PURCHASE_DISCOUNTS, Credit, Field(DiscountAmount)),
            ]
        };
        let settle = |debit, credit| vec![line(debit, Debit, Field(Total)), line(credit, Credit, Field(Total))];

        let rules = [
            (DocumentType::Invoice, EventKind::InvoiceIssued, sale(ACCOUNTS_RECEIVABLE)),
            (
                DocumentType::Invoice,
                EventKind::PaymentReceived,
                settle(CASH, ACCOUNTS_RECEIVABLE),
            ),
            (DocumentType::SalesReceipt, EventKind::ReceiptRecorded, sale(CASH)),
            (
                DocumentType::Payment,
                EventKind::PaymentReceived,
                settle(CASH, ACCOUNTS_RECEIVABLE),
            ),
            (DocumentType::Bill, EventKind::BillReceived, purchase(ACCOUNTS_PAYABLE)),
            (DocumentType::Bill, EventKind::BillPaid, settle(ACCOUNTS_PAYABLE, CASH)),
            (
                DocumentType::ExpenseClaim,
                EventKind::ExpenseApproved,
                purchase(REIMBURSEMENTS_PAYABLE),
            ),
            (
                DocumentType::ExpenseClaim,
                EventKind::ExpenseReimbursed,
                settle(REIMBURSEMENTS_PAYABLE, CASH),
            ),
        ];

        let mut table = Self::default();
        for (document_type, event_kind, lines) in rules {
            table.insert(MappingRule {
                document_type,
                event_kind,
                lines,
            });
        }
        table
    }

    /// Builds a table from configuration.
    ///
    /// # Errors
    ///
    /// Returns `PostingError::InvalidMapping` for unknown document types,
    /// events, sides or amount expressions, for rules without lines and for
    /// duplicated (document type, event) pairs.
    pub fn from_config(configs: &[AccountMappingConfig]) -> Result<Self, PostingError> {
        let mut table = Self::default();
        for config in configs {
            let document_type = DocumentType::parse(&config.document_type).ok_or_else(|| {
                PostingError::InvalidMapping(format!("unknown document type '{}'", config.document_type))
            })?;
            let event_kind = EventKind::parse(&config.event).ok_or_else(|| {
                PostingError::InvalidMapping(format!("unknown event '{}'", config.event))
            })?;
            if config.lines.is_empty() {
                return Err(PostingError::InvalidMapping(format!(
                    "{document_type}/{event_kind} has no lines"
                )));
            }

            let lines = config
                .lines
                .iter()
                .map(|l| {
                    let side = EntrySide::parse(&l.side).ok_or_else(|| {
                        PostingError::InvalidMapping(format!("unknown side '{}'", l.side))
                    })?;
                    let amount = AmountExpr::parse(&l.amount).ok_or_else(|| {
                        PostingError::InvalidMapping(format!("unknown amount '{}'", l.amount))
                    })?;
                    Ok(MappingLine::new(&l.account_code, &l.account_name, side, amount))
                })
                .collect::<Result<Vec<_>, PostingError>>()?;

            let rule = MappingRule {
                document_type,
                event_kind,
                lines,
            };
            if table.insert(rule).is_some() {
                return Err(PostingError::InvalidMapping(format!(
                    "{document_type}/{event_kind} is mapped twice"
                )));
            }
        }
        Ok(table)
    }

    /// Builds the configured table, or the built-in one when none is configured.
    ///
    /// # Errors
    ///
    /// See [`from_config`](Self::from_config).
    pub fn from_config_or_standard(configs: &[AccountMappingConfig]) -> Result<Self, PostingError> {
        if configs.is_empty() {
            Ok(Self::standard())
        } else {
            Self::from_config(configs)
        }
    }

    /// Adds a rule, returning the one it replaced.
    pub fn insert(&mut self, rule: MappingRule) -> Option<MappingRule> {
        self.rules
            .insert((rule.document_type, rule.event_kind), rule)
    }

    /// Looks up the rule for a (document type, event) pair.
    #[must_use]
    pub fn rule(&self, document_type: DocumentType, event_kind: EventKind) -> Option<&MappingRule> {
        self.rules.get(&(document_type, event_kind))
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
