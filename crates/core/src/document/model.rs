//! Concrete workflow documents.
//!
//! Each document type is its own struct. They all share a header, line items
//! and totals through the [`Document`] trait, and are stored as the tagged
//! [`WorkflowDocument`] enum.

use chrono::NaiveDate;
use docflow_shared::types::{DocumentId, UserId};
use serde::{Deserialize, Serialize};

use super::types::{DocumentHeader, DocumentStatus, DocumentType, LineItem, Totals};

/// Behaviour shared by every workflow document.
pub trait Document {
    /// The document's type.
    fn document_type(&self) -> DocumentType;
    /// Common header fields.
    fn header(&self) -> &DocumentHeader;
    /// Mutable access to the header.
    fn header_mut(&mut self) -> &mut DocumentHeader;
    /// Ordered line items.
    fn lines(&self) -> &[LineItem];
    /// Monetary totals.
    fn totals(&self) -> &Totals;

    /// Document ID.
    fn id(&self) -> DocumentId {
        self.header().id
    }

    /// Current status.
    fn status(&self) -> DocumentStatus {
        self.header().status
    }

    /// Owner of the document.
    fn owner(&self) -> UserId {
        self.header().created_by
    }
}

/// One-time conversion bookkeeping for convertible documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionState {
    /// Document created from this one.
    pub converted_to_id: Option<DocumentId>,
    /// Set once the document has been consumed; never cleared.
    pub is_converted: bool,
}

impl ConversionState {
    /// Records the conversion target.
    pub fn mark_converted(&mut self, target: DocumentId) {
        self.converted_to_id = Some(target);
        self.is_converted = true;
    }
}

/// Budget: planned amount per category (line category = account code).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Common header.
    pub header: DocumentHeader,
    /// Budget name.
    pub name: String,
    /// First day covered.
    pub period_start: NaiveDate,
    /// Last day covered.
    pub period_end: NaiveDate,
    /// Planned amounts.
    pub lines: Vec<LineItem>,
    /// Totals (total = overall planned amount).
    pub totals: Totals,
}

/// Employee expense claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseClaim {
    /// Common header.
    pub header: DocumentHeader,
    /// Date the expense was incurred.
    pub expense_date: NaiveDate,
    /// Merchant the expense was paid to.
    pub merchant: Option<String>,
    /// Claimed expenses.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
}

/// Purchase order placed with a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    /// Common header.
    pub header: DocumentHeader,
    /// Vendor name.
    pub vendor: String,
    /// Expected delivery date.
    pub expected_date: Option<NaiveDate>,
    /// Ordered items.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
    /// Conversion into a bill.
    pub conversion: ConversionState,
}

/// Quote offered to a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Common header.
    pub header: DocumentHeader,
    /// Customer name.
    pub customer: String,
    /// Last day the offer is valid.
    pub valid_until: Option<NaiveDate>,
    /// Quoted items.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
    /// Conversion into an invoice.
    pub conversion: ConversionState,
}

/// Sales invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Common header.
    pub header: DocumentHeader,
    /// Customer name.
    pub customer: String,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Quote this invoice was converted from.
    pub source_quote_id: Option<DocumentId>,
    /// Invoiced items.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
}

/// Vendor bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bill {
    /// Common header.
    pub header: DocumentHeader,
    /// Vendor name.
    pub vendor: String,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Purchase order this bill was converted from.
    pub source_order_id: Option<DocumentId>,
    /// Billed items.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
}

/// Cash sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesReceipt {
    /// Common header.
    pub header: DocumentHeader,
    /// Customer name.
    pub customer: String,
    /// How the customer paid.
    pub payment_method: String,
    /// Sold items.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
}

/// Incoming customer payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Common header.
    pub header: DocumentHeader,
    /// Who paid.
    pub payer: String,
    /// Invoice the payment settles, if known.
    pub invoice_id: Option<DocumentId>,
    /// How the payer paid.
    pub payment_method: String,
    /// Payment lines.
    pub lines: Vec<LineItem>,
    /// Totals.
    pub totals: Totals,
}

macro_rules! impl_document {
    ($name:ident, $document_type:expr) => {
        impl Document for $name {
            fn document_type(&self) -> DocumentType {
                $document_type
            }

            fn header(&self) -> &DocumentHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut DocumentHeader {
                &mut self.header
            }

            fn lines(&self) -> &[LineItem] {
                &self.lines
            }

            fn totals(&self) -> &Totals {
                &self.totals
            }
        }

        impl From<$name> for WorkflowDocument {
            fn from(document: $name) -> Self {
                Self::$name(document)
            }
        }
    };
}

impl_document!(Budget, DocumentType::Budget);
impl_document!(ExpenseClaim, DocumentType::ExpenseClaim);
impl_document!(PurchaseOrder, DocumentType::PurchaseOrder);
impl_document!(Quote, DocumentType::Quote);
impl_document!(Invoice, DocumentType::Invoice);
impl_document!(Bill, DocumentType::Bill);
impl_document!(SalesReceipt, DocumentType::SalesReceipt);
impl_document!(Payment, DocumentType::Payment);

/// Any workflow document, tagged by type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum WorkflowDocument {
    /// A budget.
    Budget(Budget),
    /// An expense claim.
    ExpenseClaim(ExpenseClaim),
    /// A purchase order.
    PurchaseOrder(PurchaseOrder),
    /// A quote.
    Quote(Quote),
    /// An invoice.
    Invoice(Invoice),
    /// A bill.
    Bill(Bill),
    /// A sales receipt.
    SalesReceipt(SalesReceipt),
    /// A payment.
    Payment(Payment),
}

macro_rules! each_document {
    ($value:expr, $doc:ident => $body:expr) => {
        match $value {
            WorkflowDocument::Budget($doc) => $body,
            WorkflowDocument::ExpenseClaim($doc) => $body,
            WorkflowDocument::PurchaseOrder($doc) => $body,
            WorkflowDocument::Quote($doc) => $body,
            WorkflowDocument::Invoice($doc) => $body,
            WorkflowDocument::Bill($doc) => $body,
            WorkflowDocument::SalesReceipt($doc) => $body,
            WorkflowDocument::Payment($doc) => $body,
        }
    };
}

impl Document for WorkflowDocument {
    fn document_type(&self) -> DocumentType {
        each_document!(self, d => d.document_type())
    }

    fn header(&self) -> &DocumentHeader {
        each_document!(self, d => &d.header)
    }

    fn header_mut(&mut self) -> &mut DocumentHeader {
        each_document!(self, d => &mut d.header)
    }

    fn lines(&self) -> &[LineItem] {
        each_document!(self, d => &d.lines)
    }

    fn totals(&self) -> &Totals {
        each_document!(self, d => &d.totals)
    }
}

impl WorkflowDocument {
    /// Conversion state, for convertible documents.
    #[must_use]
    pub fn conversion(&self) -> Option<&ConversionState> {
        match self {
            Self::Quote(q) => Some(&q.conversion),
            Self::PurchaseOrder(po) => Some(&po.conversion),
            _ => None,
        }
    }

    /// Mutable conversion state, for convertible documents.
    pub fn conversion_mut(&mut self) -> Option<&mut ConversionState> {
        match self {
            Self::Quote(q) => Some(&mut q.conversion),
            Self::PurchaseOrder(po) => Some(&mut po.conversion),
            _ => None,
        }
    }

    /// Returns true if the document has been consumed by a conversion.
    #[must_use]
    pub fn is_converted(&self) -> bool {
        self.conversion().is_some_and(|c| c.is_converted)
    }

    /// The document this one was converted from, if any.
    #[must_use]
    pub fn converted_from(&self) -> Option<DocumentId> {
        match self {
            Self::Invoice(inv) => inv.source_quote_id,
            Self::Bill(bill) => bill.source_order_id,
            _ => None,
        }
    }

    /// Replaces line items and totals.
    pub fn set_lines(&mut self, lines: Vec<LineItem>, totals: Totals) {
        each_document!(self, d => {
            d.lines = lines;
            d.totals = totals;
        });
    }

    /// Returns the budget, if this is one.
    #[must_use]
    pub fn as_budget(&self) -> Option<&Budget> {
        match self {
            Self::Budget(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the expense claim, if this is one.
    #[must_use]
    pub fn as_expense_claim(&self) -> Option<&ExpenseClaim> {
        match self {
            Self::ExpenseClaim(c) => Some(c),
            _ => None,
        }
    }
}
