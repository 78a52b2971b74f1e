//! Monetary arithmetic with precise decimals
//!
//! Every amount that flows through billing is a `rust_decimal::Decimal`.
//! Rounding happens only where a stored figure is produced (`round2`), never
//! on intermediate values, so that a GST amount and the final amount derived
//! from the same pre-tax base always agree with each other.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Percentage must be between 0 and 100, got {0}")]
    PercentageOutOfRange(Decimal),

    #[error("Percentage allows at most two decimal places, got {0}")]
    PercentageTooPrecise(Decimal),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Rounds an amount to two decimal places, half away from zero, and fixes
/// the scale at two so stored figures always print with cents.
///
/// `1.005 -> 1.01`, `-1.405 -> -1.41`, `-1.4 -> -1.40`.
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Sums a sequence of amounts without rounding
pub fn sum<'a>(amounts: impl IntoIterator<Item = &'a Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, |acc, a| acc + *a)
}

/// A percentage rate in the closed range 0..=100 (e.g. 7 for 7%), with at
/// most two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    /// Creates a percentage, rejecting values outside 0..=100 or finer
    /// than hundredths. Trailing zeros do not count (`7.100` is `7.1`).
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        if value < Decimal::ZERO || value > dec!(100) {
            return Err(MoneyError::PercentageOutOfRange(value));
        }
        if value.normalize().scale() > 2 {
            return Err(MoneyError::PercentageTooPrecise(value));
        }
        Ok(Self(value))
    }

    /// The zero rate
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the percentage value (7 for 7%)
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true for the zero rate
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Applies the rate to an amount: `amount * value / 100`, unrounded
    pub fn of(&self, amount: Decimal) -> Decimal {
        amount * self.0 / dec!(100)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(p: Percentage) -> Decimal {
        p.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(-1.405)), dec!(-1.41));
        assert_eq!(round2(dec!(-1.4)), dec!(-1.40));
        assert_eq!(round2(dec!(70)).to_string(), "70.00");
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(Percentage::new(dec!(0)).is_ok());
        assert!(Percentage::new(dec!(100)).is_ok());
        assert_eq!(
            Percentage::new(dec!(100.01)),
            Err(MoneyError::PercentageOutOfRange(dec!(100.01)))
        );
        assert!(Percentage::new(dec!(-1)).is_err());
    }

    #[test]
    fn test_percentage_precision() {
        assert!(Percentage::new(dec!(7.25)).is_ok());
        assert!(Percentage::new(dec!(7.100)).is_ok());
        assert_eq!(
            Percentage::new(dec!(7.125)),
            Err(MoneyError::PercentageTooPrecise(dec!(7.125)))
        );
        assert!(serde_json::from_str::<Percentage>("7.125").is_err());
    }

    #[test]
    fn test_percentage_application() {
        let rate = Percentage::new(dec!(7)).unwrap();
        assert_eq!(rate.of(dec!(1000)), dec!(70));
        assert_eq!(rate.of(dec!(-20)), dec!(-1.4));
        assert_eq!(rate.to_string(), "7%");
    }

    #[test]
    fn test_percentage_deserialize_rejects_out_of_range() {
        let ok: Percentage = serde_json::from_str("18").unwrap();
        assert_eq!(ok.value(), dec!(18));
        assert!(serde_json::from_str::<Percentage>("150").is_err());
    }
}
