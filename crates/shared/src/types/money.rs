//! Money rounding with decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` and are rounded with Banker's Rounding
//! to the configured currency precision.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currency precision expressed as a number of decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Precision(u32);

impl Precision {
    /// Two decimal places, the default for every supported currency.
    pub const CENTS: Self = Self(2);

    /// Creates a precision with the given number of decimal places.
    #[must_use]
    pub const fn new(decimal_places: u32) -> Self {
        Self(decimal_places)
    }

    /// Returns the number of decimal places.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        self.0
    }

    /// Returns the minimum currency unit (e.g. `0.01` for two places).
    #[must_use]
    pub fn minor_unit(self) -> Decimal {
        Decimal::new(1, self.0)
    }

    /// Rounds an amount to this precision using Banker's Rounding.
    #[must_use]
    pub fn round(self, amount: Decimal) -> Decimal {
        round_money(amount, self)
    }

    /// Returns true if the amount has no digits beyond this precision.
    #[must_use]
    pub fn is_exact(self, amount: Decimal) -> bool {
        self.round(amount) == amount
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::CENTS
    }
}

/// Rounds an amount to the given precision using Banker's Rounding.
#[must_use]
pub fn round_money(amount: Decimal, precision: Precision) -> Decimal {
    amount.round_dp_with_strategy(
        precision.decimal_places(),
        RoundingStrategy::MidpointNearestEven,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_unit() {
        assert_eq!(Precision::CENTS.minor_unit(), dec!(0.01));
        assert_eq!(Precision::new(0).minor_unit(), dec!(1));
        assert_eq!(Precision::new(3).minor_unit(), dec!(0.001));
    }

    #[test]
    fn test_round_bankers() {
        assert_eq!(round_money(dec!(2.345), Precision::CENTS), dec!(2.34));
        assert_eq!(round_money(dec!(2.355), Precision::CENTS), dec!(2.36));
        assert_eq!(round_money(dec!(33.3333), Precision::CENTS), dec!(33.33));
    }

    #[test]
    fn test_is_exact() {
        assert!(Precision::CENTS.is_exact(dec!(10.25)));
        assert!(Precision::CENTS.is_exact(dec!(10)));
        assert!(!Precision::CENTS.is_exact(dec!(10.255)));
    }

    #[test]
    fn test_default_is_cents() {
        assert_eq!(Precision::default(), Precision::CENTS);
    }
}
