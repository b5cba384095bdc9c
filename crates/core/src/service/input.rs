//! Inputs accepted by the document service.
//!
//! Inputs are validated and turned into documents here so the service only
//! deals with well-formed drafts.

use chrono::{Datelike, NaiveDate};
use docflow_shared::types::{DocumentId, Precision, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ServiceError;
use crate::document::{
    Bill, Budget, ConversionState, DocumentHeader, DocumentType, ExpenseClaim, Invoice, LineItem,
    Payment, PurchaseOrder, Quote, SalesReceipt, Totals, WorkflowDocument,
};

/// One line of a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineInput {
    /// Free-text description.
    pub description: String,
    /// Quantity, must be positive.
    pub quantity: Decimal,
    /// Price per unit, must not be negative.
    pub unit_price: Decimal,
    /// Category account code.
    #[serde(default)]
    pub category: Option<String>,
}

impl LineInput {
    /// Creates an uncategorised line.
    #[must_use]
    pub fn new(description: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
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

/// Line items plus the amounts applied on top of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LinesInput {
    /// Lines, in order.
    pub lines: Vec<LineInput>,
    /// Tax rate between 0 and 1, charged on the discounted subtotal.
    #[serde(default)]
    pub tax_rate: Decimal,
    /// Discount granted, at most the subtotal.
    #[serde(default)]
    pub discount_amount: Decimal,
}

impl LinesInput {
    /// Lines without tax or discount.
    #[must_use]
    pub fn new(lines: Vec<LineInput>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    /// Sets the tax rate.
    #[must_use]
    pub fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Sets the discount.
    #[must_use]
    pub fn with_discount(mut self, discount_amount: Decimal) -> Self {
        self.discount_amount = discount_amount;
        self
    }

    /// Validates the input and computes line subtotals and totals.
    ///
    /// Budgets require every line to name its category.
    pub fn build(
        &self,
        document_type: DocumentType,
        precision: Precision,
    ) -> Result<(Vec<LineItem>, Totals), ServiceError> {
        if self.lines.is_empty() {
            return Err(ServiceError::Validation(
                "a document needs at least one line".to_string(),
            ));
        }
        if self.tax_rate < Decimal::ZERO || self.tax_rate > Decimal::ONE {
            return Err(ServiceError::Validation(format!(
                "tax rate {} must be between 0 and 1",
                self.tax_rate
            )));
        }

        let mut items = Vec::with_capacity(self.lines.len());
        for (index, line) in self.lines.iter().enumerate() {
            let position = index + 1;
            if line.description.trim().is_empty() {
                return Err(ServiceError::Validation(format!(
                    "line {position}: description is required"
                )));
            }
            if line.quantity <= Decimal::ZERO {
                return Err(ServiceError::Validation(format!(
                    "line {position}: quantity must be positive"
                )));
            }
            if line.unit_price < Decimal::ZERO {
                return Err(ServiceError::Validation(format!(
                    "line {position}: unit price must not be negative"
                )));
            }
            let category = line
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty());
            if document_type == DocumentType::Budget && category.is_none() {
                return Err(ServiceError::Validation(format!(
                    "line {position}: budget lines must name a category"
                )));
            }

            let item = LineItem::new(
                line.description.trim(),
                line.quantity,
                line.unit_price,
                precision,
            );
            items.push(match category {
                Some(category) => item.with_category(category),
                None => item,
            });
        }

        let subtotal: Decimal = items.iter().map(|l| l.amount).sum();
        if self.discount_amount < Decimal::ZERO || self.discount_amount > subtotal {
            return Err(ServiceError::Validation(format!(
                "discount {} must be between 0 and the subtotal {subtotal}",
                self.discount_amount
            )));
        }

        let discount = precision.round(self.discount_amount);
        let totals = Totals::compute(&items, self.tax_rate, discount, precision);
        Ok((items, totals))
    }
}

/// Type-specific fields of a new draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "document_type", rename_all = "snake_case")]
pub enum DocumentDetails {
    /// Budget fields.
    Budget {
        /// Budget name.
        name: String,
        /// First day covered.
        period_start: NaiveDate,
        /// Last day covered.
        period_end: NaiveDate,
    },
    /// Expense claim fields.
    ExpenseClaim {
        /// Date the expense was incurred.
        expense_date: NaiveDate,
        /// Merchant.
        merchant: Option<String>,
    },
    /// Purchase order fields.
    PurchaseOrder {
        /// Vendor name.
        vendor: String,
        /// Expected delivery date.
        expected_date: Option<NaiveDate>,
    },
    /// Quote fields.
    Quote {
        /// Customer name.
        customer: String,
        /// Last day the offer is valid.
        valid_until: Option<NaiveDate>,
    },
    /// Invoice fields.
    Invoice {
        /// Customer name.
        customer: String,
        /// Payment due date.
        due_date: Option<NaiveDate>,
    },
    /// Bill fields.
    Bill {
        /// Vendor name.
        vendor: String,
        /// Payment due date.
        due_date: Option<NaiveDate>,
    },
    /// Sales receipt fields.
    SalesReceipt {
        /// Customer name.
        customer: String,
        /// How the customer paid.
        payment_method: String,
    },
    /// Payment fields.
    Payment {
        /// Who paid.
        payer: String,
        /// Invoice the payment settles.
        invoice_id: Option<DocumentId>,
        /// How the payer paid.
        payment_method: String,
    },
}

impl DocumentDetails {
    /// The document type these fields describe.
    #[must_use]
    pub fn document_type(&self) -> DocumentType {
        match self {
            Self::Budget { .. } => DocumentType::Budget,
            Self::ExpenseClaim { .. } => DocumentType::ExpenseClaim,
            Self::PurchaseOrder { .. } => DocumentType::PurchaseOrder,
            Self::Quote { .. } => DocumentType::Quote,
            Self::Invoice { .. } => DocumentType::Invoice,
            Self::Bill { .. } => DocumentType::Bill,
            Self::SalesReceipt { .. } => DocumentType::SalesReceipt,
            Self::Payment { .. } => DocumentType::Payment,
        }
    }

    /// Numbering period implied by the fields, if any.
    ///
    /// Budgets number in the year their period starts, claims in the year
    /// of the expense. Other documents number in the current year.
    #[must_use]
    pub fn period(&self) -> Option<i32> {
        match self {
            Self::Budget { period_start, .. } => Some(period_start.year()),
            Self::ExpenseClaim { expense_date, .. } => Some(expense_date.year()),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), ServiceError> {
        let required = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(ServiceError::Validation(format!("{field} is required")))
            } else {
                Ok(())
            }
        };
        match self {
            Self::Budget {
                name,
                period_start,
                period_end,
            } => {
                required("name", name)?;
                if period_start > period_end {
                    return Err(ServiceError::Validation(format!(
                        "budget period starts {period_start} after it ends {period_end}"
                    )));
                }
                Ok(())
            }
            Self::ExpenseClaim { .. } => Ok(()),
            Self::PurchaseOrder { vendor, .. } | Self::Bill { vendor, .. } => {
                required("vendor", vendor)
            }
            Self::Quote { customer, .. } | Self::Invoice { customer, .. } => {
                required("customer", customer)
            }
            Self::SalesReceipt {
                customer,
                payment_method,
            } => {
                required("customer", customer)?;
                required("payment method", payment_method)
            }
            Self::Payment {
                payer,
                payment_method,
                ..
            } => {
                required("payer", payer)?;
                required("payment method", payment_method)
            }
        }
    }
}

/// Everything needed to create a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftInput {
    /// Type-specific fields.
    pub details: DocumentDetails,
    /// Lines and amounts.
    #[serde(flatten)]
    pub lines: LinesInput,
}

impl DraftInput {
    /// Creates a draft input.
    #[must_use]
    pub fn new(details: DocumentDetails, lines: LinesInput) -> Self {
        Self { details, lines }
    }

    /// The document type being drafted.
    #[must_use]
    pub fn document_type(&self) -> DocumentType {
        self.details.document_type()
    }

    /// Validates the input and builds the draft.
    pub fn build(
        self,
        number: String,
        owner: UserId,
        precision: Precision,
    ) -> Result<WorkflowDocument, ServiceError> {
        self.details.validate()?;
        let (lines, totals) = self.lines.build(self.details.document_type(), precision)?;
        let header = DocumentHeader::draft(number, owner);

        let document = match self.details {
            DocumentDetails::Budget {
                name,
                period_start,
                period_end,
            } => Budget {
                header,
                name,
                period_start,
                period_end,
                lines,
                totals,
            }
            .into(),
            DocumentDetails::ExpenseClaim {
                expense_date,
                merchant,
            } => ExpenseClaim {
                header,
                expense_date,
                merchant,
                lines,
                totals,
            }
            .into(),
            DocumentDetails::PurchaseOrder {
                vendor,
                expected_date,
            } => PurchaseOrder {
                header,
                vendor,
                expected_date,
                lines,
                totals,
                conversion: ConversionState::default(),
            }
            .into(),
            DocumentDetails::Quote {
                customer,
                valid_until,
            } => Quote {
                header,
                customer,
                valid_until,
                lines,
                totals,
                conversion: ConversionState::default(),
            }
            .into(),
            DocumentDetails::Invoice { customer, due_date } => Invoice {
                header,
                customer,
                due_date,
                source_quote_id: None,
                lines,
                totals,
            }
            .into(),
            DocumentDetails::Bill { vendor, due_date } => Bill {
                header,
                vendor,
                due_date,
                source_order_id: None,
                lines,
                totals,
            }
            .into(),
            DocumentDetails::SalesReceipt {
                customer,
                payment_method,
            } => SalesReceipt {
                header,
                customer,
                payment_method,
                lines,
                totals,
            }
            .into(),
            DocumentDetails::Payment {
                payer,
                invoice_id,
                payment_method,
            } => Payment {
                header,
                payer,
                invoice_id,
                payment_method,
                lines,
                totals,
            }
            .into(),
        };
        Ok(document)
    }
}
