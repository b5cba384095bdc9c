//! Pure composition of balanced entry lines.
//!
//! Evaluates a mapping rule against a document, rounds every line to currency
//! precision and assigns the remaining sub-unit difference to the rounding
//! account so the entry balances exactly.

use docflow_shared::config::PostingConfig;
use docflow_shared::types::Precision;
use rust_decimal::Decimal;

use super::entry::{AccountingEntryLine, EntrySide};
use super::error::PostingError;
use super::mapping::{AmountExpr, MappingRule};
use crate::document::Document;

/// Posting parameters taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingSettings {
    /// Currency precision.
    pub precision: Precision,
    /// Account receiving rounding remainders.
    pub rounding_account_code: String,
    /// Display name of the rounding account.
    pub rounding_account_name: String,
}

impl Default for PostingSettings {
    fn default() -> Self {
        Self::from(&PostingConfig::default())
    }
}

impl From<&PostingConfig> for PostingSettings {
    fn from(config: &PostingConfig) -> Self {
        Self {
            precision: config.precision(),
            rounding_account_code: config.rounding_account_code.clone(),
            rounding_account_name: config.rounding_account_name.clone(),
        }
    }
}

/// A mapping line evaluated against a document, before rounding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Account code.
    pub account_code: String,
    /// Account display name.
    pub account_name: String,
    /// Side.
    pub side: EntrySide,
    /// Unrounded amount. May be negative or zero.
    pub amount: Decimal,
    /// Optional description.
    pub description: Option<String>,
}

impl RawLine {
    fn signed(&self) -> Decimal {
        match self.side {
            EntrySide::Debit => self.amount,
            EntrySide::Credit => -self.amount,
        }
    }
}

/// Evaluates every line of a rule against a document.
#[must_use]
pub fn evaluate(document: &impl Document, rule: &MappingRule) -> Vec<RawLine> {
    let mut raw = Vec::new();
    for mapping in &rule.lines {
        match mapping.amount {
            AmountExpr::Field(field) => raw.push(RawLine {
                account_code: mapping.account_code.clone(),
                account_name: mapping.account_name.clone(),
                side: mapping.side,
                amount: field.value(document.totals()),
                description: None,
            }),
            AmountExpr::LineItems => {
                for item in document.lines() {
                    let (account_code, account_name) = match &item.category {
                        Some(category) => (
                            category.clone(),
                            format!("{} ({category})", mapping.account_name),
                        ),
                        None => (mapping.account_code.clone(), mapping.account_name.clone()),
                    };
                    raw.push(RawLine {
                        account_code,
                        account_name,
                        side: mapping.side,
                        amount: item.amount,
                        description: Some(item.description.clone()),
                    });
                }
            }
        }
    }
    raw
}

/// Turns raw lines into balanced entry lines.
///
/// 1. The unrounded lines must balance exactly.
/// 2. Each line is rounded; negative amounts move to the opposite side.
/// 3. Zero lines are dropped. If nothing is left the result is empty.
/// 4. The remaining difference goes to the rounding account. It may not exceed
///    half a minor unit per evaluated line.
///
/// # Errors
///
/// Returns `PostingError::Unbalanced` when the raw lines do not balance or the
/// rounding remainder is out of tolerance.
pub fn balance(
    raw: Vec<RawLine>,
    settings: &PostingSettings,
) -> Result<Vec<AccountingEntryLine>, PostingError> {
    let (debit, credit) = raw.iter().fold((Decimal::ZERO, Decimal::ZERO), |(d, c), l| {
        let signed = l.signed();
        if signed.is_sign_negative() {
            (d, c - signed)
        } else {
            (d + signed, c)
        }
    });
    if debit != credit {
        return Err(PostingError::Unbalanced { debit, credit });
    }

    let precision = settings.precision;
    let evaluated = raw.len();
    let mut lines: Vec<AccountingEntryLine> = raw
        .into_iter()
        .filter_map(|l| {
            let rounded = precision.round(l.amount);
            if rounded.is_zero() {
                return None;
            }
            let (side, amount) = if rounded.is_sign_negative() {
                (l.side.opposite(), -rounded)
            } else {
                (l.side, rounded)
            };
            Some(AccountingEntryLine::new(
                l.account_code,
                l.account_name,
                side,
                amount,
                l.description,
            ))
        })
        .collect();

    if lines.is_empty() {
        return Ok(lines);
    }

    let (debit, credit) = totals(&lines);
    let residual = debit - credit;
    if !residual.is_zero() {
        let tolerance = precision.minor_unit() / Decimal::TWO * Decimal::from(evaluated);
        if residual.abs() > tolerance {
            return Err(PostingError::Unbalanced { debit, credit });
        }
        let side = if residual.is_sign_positive() {
            EntrySide::Credit
        } else {
            EntrySide::Debit
        };
        lines.push(AccountingEntryLine::new(
            settings.rounding_account_code.clone(),
            settings.rounding_account_name.clone(),
            side,
            residual.abs(),
            Some("Rounding difference".to_string()),
        ));
    }

    let (debit, credit) = totals(&lines);
    if debit != credit {
        return Err(PostingError::Unbalanced { debit, credit });
    }
    Ok(lines)
}

/// Sums debit and credit amounts of lines.
#[must_use]
pub fn totals(lines: &[AccountingEntryLine]) -> (Decimal, Decimal) {
    lines.iter().fold((Decimal::ZERO, Decimal::ZERO), |(d, c), l| {
        (d + l.debit_amount, c + l.credit_amount)
    })
}
