//! Planned-vs-actual and period aggregates.
//!
//! # Modules
//!
//! - `types` - Variance figures and report shapes
//! - `service` - Reads postings and claims through the store
//! - `error` - Variance-specific error types

pub mod error;
pub mod service;
pub mod types;

pub use error::VarianceError;
pub use service::VarianceService;
pub use types::{
    BudgetVariance, CategoryTotal, CategoryVariance, ClaimTotals, StatusTotal, VarianceFigures,
    VarianceStatus,
};
