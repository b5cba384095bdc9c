//! Accounting entries and their lines.

use chrono::{DateTime, NaiveDate, Utc};
use docflow_shared::types::{DocumentId, EntryId, EntryLineId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::document::DocumentType;

/// Business event that produces an accounting entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An invoice was approved and issued.
    InvoiceIssued,
    /// Cash was received against an invoice or as a payment.
    PaymentReceived,
    /// A cash sale was recorded.
    ReceiptRecorded,
    /// A vendor bill was approved.
    BillReceived,
    /// A vendor bill was paid.
    BillPaid,
    /// An expense claim was approved.
    ExpenseApproved,
    /// An approved expense claim was reimbursed.
    ExpenseReimbursed,
    /// A posted entry was reversed.
    Reversal,
}

impl EventKind {
    /// Returns the string representation of the event.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvoiceIssued => "invoice_issued",
            Self::PaymentReceived => "payment_received",
            Self::ReceiptRecorded => "receipt_recorded",
            Self::BillReceived => "bill_received",
            Self::BillPaid => "bill_paid",
            Self::ExpenseApproved => "expense_approved",
            Self::ExpenseReimbursed => "expense_reimbursed",
            Self::Reversal => "reversal",
        }
    }

    /// Parses an event from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "invoice_issued" => Some(Self::InvoiceIssued),
            "payment_received" => Some(Self::PaymentReceived),
            "receipt_recorded" => Some(Self::ReceiptRecorded),
            "bill_received" => Some(Self::BillReceived),
            "bill_paid" => Some(Self::BillPaid),
            "expense_approved" => Some(Self::ExpenseApproved),
            "expense_reimbursed" => Some(Self::ExpenseReimbursed),
            "reversal" => Some(Self::Reversal),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Side of an entry line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySide {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

impl EntrySide {
    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Debit => Self::Credit,
            Self::Credit => Self::Debit,
        }
    }

    /// Parses a side from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debit" => Some(Self::Debit),
            "credit" => Some(Self::Credit),
            _ => None,
        }
    }
}

/// What an entry's `reference_id` points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ReferenceType {
    /// A business document of the given type.
    Document(DocumentType),
    /// Another accounting entry (reversals).
    AccountingEntry,
}

impl ReferenceType {
    /// Returns the string representation of the reference type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document(document_type) => document_type.as_str(),
            Self::AccountingEntry => "accounting_entry",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ReferenceType> for String {
    fn from(reference_type: ReferenceType) -> Self {
        reference_type.as_str().to_string()
    }
}

impl TryFrom<String> for ReferenceType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value == "accounting_entry" {
            return Ok(Self::AccountingEntry);
        }
        DocumentType::parse(&value)
            .map(Self::Document)
            .ok_or_else(|| format!("unknown reference type: {value}"))
    }
}

/// Idempotency key of a posting: at most one entry exists per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingKey {
    /// What the entry references.
    pub reference_type: ReferenceType,
    /// ID of the referenced document or entry.
    pub reference_id: Uuid,
    /// Event posted.
    pub event_kind: EventKind,
}

impl PostingKey {
    /// Key of a document event.
    #[must_use]
    pub fn for_document(document_type: DocumentType, id: DocumentId, event_kind: EventKind) -> Self {
        Self {
            reference_type: ReferenceType::Document(document_type),
            reference_id: id.into_inner(),
            event_kind,
        }
    }

    /// Key of the reversal of an entry.
    #[must_use]
    pub fn reversal_of(entry_id: EntryId) -> Self {
        Self {
            reference_type: ReferenceType::AccountingEntry,
            reference_id: entry_id.into_inner(),
            event_kind: EventKind::Reversal,
        }
    }
}

impl fmt::Display for PostingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.reference_type, self.reference_id, self.event_kind
        )
    }
}

/// One debit or credit line of an entry.
///
/// Exactly one of `debit_amount` and `credit_amount` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntryLine {
    /// Line ID.
    pub id: EntryLineId,
    /// Account code.
    pub account_code: String,
    /// Account display name.
    pub account_name: String,
    /// Debit amount (zero for credit lines).
    pub debit_amount: Decimal,
    /// Credit amount (zero for debit lines).
    pub credit_amount: Decimal,
    /// Optional description.
    pub description: Option<String>,
}

impl AccountingEntryLine {
    /// Creates a line on the given side. `amount` must be positive.
    #[must_use]
    pub fn new(
        account_code: impl Into<String>,
        account_name: impl Into<String>,
        side: EntrySide,
        amount: Decimal,
        description: Option<String>,
    ) -> Self {
        let (debit_amount, credit_amount) = match side {
            EntrySide::Debit => (amount, Decimal::ZERO),
            EntrySide::Credit => (Decimal::ZERO, amount),
        };
        Self {
            id: EntryLineId::new(),
            account_code: account_code.into(),
            account_name: account_name.into(),
            debit_amount,
            credit_amount,
            description,
        }
    }

    /// Side carrying the amount.
    #[must_use]
    pub fn side(&self) -> EntrySide {
        if self.debit_amount.is_zero() {
            EntrySide::Credit
        } else {
            EntrySide::Debit
        }
    }

    /// The non-zero amount.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        self.debit_amount + self.credit_amount
    }

    /// Net effect on the account (`debit - credit`).
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit_amount - self.credit_amount
    }
}

/// A balanced double-entry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntry {
    /// Entry ID.
    pub id: EntryId,
    /// Entry number, e.g. `JE-2026-00001`.
    pub entry_number: String,
    /// Accounting date.
    pub entry_date: NaiveDate,
    /// Description.
    pub description: String,
    /// What `reference_id` points at.
    pub reference_type: ReferenceType,
    /// Referenced document or entry.
    pub reference_id: Uuid,
    /// Type of the originating business document.
    pub document_type: DocumentType,
    /// Originating business document.
    pub document_id: DocumentId,
    /// Event posted.
    pub event_kind: EventKind,
    /// For reversals, the reversed entry.
    pub reverses_entry_id: Option<EntryId>,
    /// Lines.
    pub lines: Vec<AccountingEntryLine>,
    /// Sum of debit amounts.
    pub total_debit: Decimal,
    /// Sum of credit amounts.
    pub total_credit: Decimal,
    /// User who caused the posting.
    pub created_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl AccountingEntry {
    /// Idempotency key of this entry.
    #[must_use]
    pub fn posting_key(&self) -> PostingKey {
        PostingKey {
            reference_type: self.reference_type,
            reference_id: self.reference_id,
            event_kind: self.event_kind,
        }
    }

    /// Returns true if this entry reverses another.
    #[must_use]
    pub fn is_reversal(&self) -> bool {
        self.reverses_entry_id.is_some()
    }

    /// Returns true if totals agree with each other and with the lines.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let debit: Decimal = self.lines.iter().map(|l| l.debit_amount).sum();
        let credit: Decimal = self.lines.iter().map(|l| l.credit_amount).sum();
        debit == self.total_debit && credit == self.total_credit && debit == credit
    }
}
