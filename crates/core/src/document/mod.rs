//! Business documents routed through the approval workflow.
//!
//! # Modules
//!
//! - `types` - Document kinds, statuses, line items, totals and headers
//! - `model` - Concrete document structs and the tagged `WorkflowDocument`

pub mod model;
pub mod types;

pub use model::{
    Bill, Budget, ConversionState, Document, ExpenseClaim, Invoice, Payment, PurchaseOrder, Quote,
    SalesReceipt, WorkflowDocument,
};
pub use types::{DocumentHeader, DocumentStatus, DocumentType, LineItem, Totals};
