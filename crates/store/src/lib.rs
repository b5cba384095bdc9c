//! Document store implementations for Docflow.
//!
//! This crate provides:
//! - `InMemoryStore`, a thread-safe store honoring every primitive of
//!   `docflow_core::store::DocumentStore`

pub mod memory;

pub use memory::InMemoryStore;
