//! Sequential, human-readable document numbers.
//!
//! Numbers look like `INV-2026-00042`: a per-series prefix, the period and a
//! zero-padded sequence. Sequences are per (series, period) and start at 1.
//! A sequence is consumed in the same unit of work that stores the numbered
//! record, so sequences never repeat or skip.

pub mod error;
pub mod generator;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::DocumentType;

pub use error::NumberingError;
pub use generator::{NumberBlock, NumberGenerator};

/// Prefix of accounting entry numbers.
pub const JOURNAL_ENTRY_PREFIX: &str = "JE";

/// A numbering series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberSeries {
    /// Business documents of one type.
    Document(DocumentType),
    /// Accounting entries.
    JournalEntry,
}

impl NumberSeries {
    /// Prefix used in formatted numbers.
    #[must_use]
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Document(document_type) => document_type.number_prefix(),
            Self::JournalEntry => JOURNAL_ENTRY_PREFIX,
        }
    }
}

impl From<DocumentType> for NumberSeries {
    fn from(document_type: DocumentType) -> Self {
        Self::Document(document_type)
    }
}

impl fmt::Display for NumberSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A minted document number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentNumber {
    /// Series the number belongs to.
    pub series: NumberSeries,
    /// Period (calendar year).
    pub period: i32,
    /// Sequence within the series and period, starting at 1.
    pub sequence: u64,
    /// Formatted number, e.g. `QUO-2026-00001`.
    pub formatted: String,
}

impl DocumentNumber {
    /// Builds a number, padding the sequence to `pad_width` digits.
    ///
    /// Sequences wider than `pad_width` are never truncated.
    #[must_use]
    pub fn new(series: NumberSeries, period: i32, sequence: u64, pad_width: usize) -> Self {
        let formatted = format!(
            "{}-{}-{:0width$}",
            series.prefix(),
            period,
            sequence,
            width = pad_width
        );
        Self {
            series,
            period,
            sequence,
            formatted,
        }
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted)
    }
}

impl From<DocumentNumber> for String {
    fn from(number: DocumentNumber) -> Self {
        number.formatted
    }
}
