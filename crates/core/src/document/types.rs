//! Document domain types shared by every workflow document.
//!
//! This module defines document kinds, statuses, line items, totals
//! and the header carried by every document.

use chrono::{DateTime, Utc};
use docflow_shared::types::{DocumentId, Precision, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of business document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Planned spending per category over a period.
    Budget,
    /// Employee expense reimbursement claim.
    ExpenseClaim,
    /// Order placed with a vendor.
    PurchaseOrder,
    /// Price offer made to a customer.
    Quote,
    /// Sales invoice issued to a customer.
    Invoice,
    /// Vendor bill.
    Bill,
    /// Cash sale recorded at the point of payment.
    SalesReceipt,
    /// Incoming customer payment.
    Payment,
}

impl DocumentType {
    /// Every document type.
    pub const ALL: [Self; 8] = [
        Self::Budget,
        Self::ExpenseClaim,
        Self::PurchaseOrder,
        Self::Quote,
        Self::Invoice,
        Self::Bill,
        Self::SalesReceipt,
        Self::Payment,
    ];

    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Budget => "budget",
            Self::ExpenseClaim => "expense_claim",
            Self::PurchaseOrder => "purchase_order",
            Self::Quote => "quote",
            Self::Invoice => "invoice",
            Self::Bill => "bill",
            Self::SalesReceipt => "sales_receipt",
            Self::Payment => "payment",
        }
    }

    /// Parses a document type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "budget" => Some(Self::Budget),
            "expense_claim" => Some(Self::ExpenseClaim),
            "purchase_order" => Some(Self::PurchaseOrder),
            "quote" => Some(Self::Quote),
            "invoice" => Some(Self::Invoice),
            "bill" => Some(Self::Bill),
            "sales_receipt" => Some(Self::SalesReceipt),
            "payment" => Some(Self::Payment),
            _ => None,
        }
    }

    /// Prefix used in document numbers.
    #[must_use]
    pub fn number_prefix(&self) -> &'static str {
        match self {
            Self::Budget => "BUD",
            Self::ExpenseClaim => "EXP",
            Self::PurchaseOrder => "PO",
            Self::Quote => "QUO",
            Self::Invoice => "INV",
            Self::Bill => "BILL",
            Self::SalesReceipt => "SR",
            Self::Payment => "PAY",
        }
    }

    /// The type this document converts into, if it is convertible.
    #[must_use]
    pub fn conversion_target(&self) -> Option<Self> {
        match self {
            Self::Quote => Some(Self::Invoice),
            Self::PurchaseOrder => Some(Self::Bill),
            _ => None,
        }
    }

    /// The status an approved document reaches when its lifecycle completes.
    #[must_use]
    pub fn completion_status(&self) -> DocumentStatus {
        match self {
            Self::Invoice | Self::Bill | Self::ExpenseClaim => DocumentStatus::Paid,
            Self::Budget
            | Self::PurchaseOrder
            | Self::Quote
            | Self::SalesReceipt
            | Self::Payment => DocumentStatus::Closed,
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Document status in the approval workflow.
///
/// The canonical graph is:
/// - Draft → PendingApproval (submit)
/// - PendingApproval → Approved (approve)
/// - PendingApproval → Rejected (reject)
/// - Rejected → Draft (revise)
/// - Approved → Paid or Closed (complete)
/// - Approved → Cancelled (cancel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Being drafted by its owner; lines can change.
    Draft,
    /// Submitted and waiting for a manager.
    PendingApproval,
    /// Approved and authoritative.
    Approved,
    /// Rejected with a reason; can be revised back to draft.
    Rejected,
    /// Settled (invoices, bills, expense claims).
    Paid,
    /// Lifecycle finished without a payment event.
    Closed,
    /// Cancelled after approval; postings are reversed.
    Cancelled,
}

impl DocumentStatus {
    /// Every status.
    pub const ALL: [Self; 7] = [
        Self::Draft,
        Self::PendingApproval,
        Self::Approved,
        Self::Rejected,
        Self::Paid,
        Self::Closed,
        Self::Cancelled,
    ];

    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingApproval => "pending_approval",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Paid => "paid",
            Self::Closed => "closed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(Self::Draft),
            "pending_approval" => Some(Self::PendingApproval),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "paid" => Some(Self::Paid),
            "closed" => Some(Self::Closed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Returns true if the document's lines can be modified.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns true if no further transition leaves this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Closed | Self::Cancelled)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document line item.
///
/// `amount` is the computed subtotal (`quantity × unit_price`) rounded to
/// currency precision when the line is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Free-text description.
    pub description: String,
    /// Quantity.
    pub quantity: Decimal,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Computed subtotal of the line.
    pub amount: Decimal,
    /// Account code the line is categorised under (expenses, bills, budgets).
    pub category: Option<String>,
}

impl LineItem {
    /// Creates a line item, computing its subtotal.
    #[must_use]
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        precision: Precision,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            amount: precision.round(quantity * unit_price),
            category: None,
        }
    }

    /// Sets the category account code.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Monetary totals of a document.
///
/// `total = subtotal - discount_amount + tax_amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of line subtotals.
    pub subtotal: Decimal,
    /// Tax charged.
    pub tax_amount: Decimal,
    /// Discount granted.
    pub discount_amount: Decimal,
    /// Amount due.
    pub total: Decimal,
}

impl Totals {
    /// Computes totals from line items.
    ///
    /// Tax is charged on the discounted subtotal at `tax_rate` (e.g. `0.10`).
    #[must_use]
    pub fn compute(
        lines: &[LineItem],
        tax_rate: Decimal,
        discount_amount: Decimal,
        precision: Precision,
    ) -> Self {
        let subtotal: Decimal = lines.iter().map(|l| l.amount).sum();
        let tax_amount = precision.round((subtotal - discount_amount) * tax_rate);
        Self::from_parts(subtotal, tax_amount, discount_amount)
    }

    /// Builds totals from already-known parts.
    #[must_use]
    pub fn from_parts(subtotal: Decimal, tax_amount: Decimal, discount_amount: Decimal) -> Self {
        Self {
            subtotal,
            tax_amount,
            discount_amount,
            total: subtotal - discount_amount + tax_amount,
        }
    }
}

/// Fields carried by every workflow document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader {
    /// Document ID.
    pub id: DocumentId,
    /// Human-readable number, unique per type and period.
    pub number: String,
    /// Current workflow status.
    pub status: DocumentStatus,
    /// Owner who created the document.
    pub created_by: UserId,
    /// Manager who approved the document.
    pub approved_by: Option<UserId>,
    /// When the document was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Optional notes from the approver.
    pub approval_notes: Option<String>,
    /// Reason given for the last rejection.
    pub rejection_reason: Option<String>,
    /// Reason given for cancellation.
    pub cancellation_reason: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency version, incremented on every write.
    pub version: u64,
}

impl DocumentHeader {
    /// Creates the header of a new draft.
    #[must_use]
    pub fn draft(number: impl Into<String>, created_by: UserId) -> Self {
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            number: number.into(),
            status: DocumentStatus::Draft,
            created_by,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            rejection_reason: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }

    /// Marks the header as written once more.
    pub fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
