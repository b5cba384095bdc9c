//! Core business logic for Docflow.
//!
//! This crate contains pure business logic with ZERO storage or web
//! dependencies. Collaborators (document store, identity provider,
//! notification sink) are traits injected at construction.
//!
//! # Modules
//!
//! - `document` - Workflow documents, line items and totals
//! - `store` - The abstract document store and units of work
//! - `numbering` - Sequential document numbers per type and period
//! - `ledger` - Balanced posting and reversal of accounting entries
//! - `workflow` - The approval state machine
//! - `conversion` - Quote to invoice and purchase order to bill
//! - `variance` - Budget variance and claim aggregates
//! - `identity` - Actors, roles and token resolution
//! - `notify` - Fire-and-forget notifications
//! - `service` - The facade used by the request layer

pub mod conversion;
pub mod document;
pub mod identity;
pub mod ledger;
pub mod notify;
pub mod numbering;
pub mod service;
pub mod store;
pub mod variance;
pub mod workflow;

pub use service::{DocumentService, ServiceError};
