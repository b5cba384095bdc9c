//! Reversing entry lines.
//!
//! A reversal mirrors a posted entry: every debit becomes a credit of the
//! same amount on the same account and vice versa. The original is never
//! touched.

use super::entry::{AccountingEntry, AccountingEntryLine};
use docflow_shared::types::EntryLineId;

/// Stateless builder of reversing lines.
pub struct ReversalService;

impl ReversalService {
    /// Creates reversing lines by swapping debits and credits.
    ///
    /// For each original line:
    /// - Debits become credits
    /// - Credits become debits
    /// - Account and description are preserved
    #[must_use]
    pub fn reversing_lines(original: &AccountingEntry) -> Vec<AccountingEntryLine> {
        original
            .lines
            .iter()
            .map(|line| AccountingEntryLine {
                id: EntryLineId::new(),
                account_code: line.account_code.clone(),
                account_name: line.account_name.clone(),
                debit_amount: line.credit_amount,
                credit_amount: line.debit_amount,
                description: line.description.clone(),
            })
            .collect()
    }

    /// Description of the reversal of an entry.
    #[must_use]
    pub fn description(original: &AccountingEntry) -> String {
        format!("Reversal of {}", original.entry_number)
    }
}
