//! Approval workflow for business documents.
//!
//! # Modules
//!
//! - `types` - Workflow actions
//! - `table` - Declarative transition tables
//! - `policy` - Role and amount based authorization
//! - `machine` - Applies transitions atomically with their ledger effects
//! - `error` - Workflow-specific error types

pub mod error;
pub mod machine;
pub mod policy;
pub mod table;
pub mod types;

#[cfg(test)]
mod table_props;

pub use error::WorkflowError;
pub use machine::{ApprovalStateMachine, TransitionOutcome};
pub use policy::{ApprovalPolicy, ApprovalRule};
pub use table::{
    Effect, RoleRequirement, TransitionRule, TransitionTable, TransitionTables, approval_event,
    completion_event, posted_events,
};
pub use types::{ActionKind, WorkflowAction};
