//! One-way document conversions: quote to invoice, purchase order to bill.

pub mod error;
pub mod service;

pub use error::ConversionError;
pub use service::{ConversionOutcome, ConversionService};
