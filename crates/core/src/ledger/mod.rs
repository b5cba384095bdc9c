//! Ledger posting.
//!
//! This module turns business document events into balanced double-entry
//! accounting entries and reverses them.
//!
//! # Modules
//!
//! - `entry` - Accounting entries, lines, events and posting keys
//! - `mapping` - (document type, event) to account mapping rules
//! - `compose` - Pure evaluation, rounding and balancing of entry lines
//! - `reversal` - Reversing lines
//! - `engine` - The posting engine
//! - `error` - Posting error types

pub mod compose;
pub mod engine;
pub mod entry;
pub mod error;
pub mod mapping;
pub mod reversal;

#[cfg(test)]
mod compose_props;

pub use compose::PostingSettings;
pub use engine::{LedgerPostingEngine, Prepared};
pub use entry::{
    AccountingEntry, AccountingEntryLine, EntrySide, EventKind, PostingKey, ReferenceType,
};
pub use error::PostingError;
pub use mapping::{AccountMappingTable, AmountExpr, AmountField, MappingLine, MappingRule};
pub use reversal::ReversalService;
