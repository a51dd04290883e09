//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from validating a unit price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("price must not be negative: {0}")]
    Negative(Decimal),

    #[error("price exceeds {max}: {0}", max = Price::MAX.0)]
    TooLarge(Decimal),
}

/// A unit price in the store currency.
///
/// Wraps a [`Decimal`] so cart arithmetic never goes through floating point.
/// Deserializes from either a JSON number or a decimal string, which keeps
/// older snapshots (plain numbers) readable. Deserialized amounts must lie in
/// `0..=Price::MAX`. Arithmetic saturates instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Largest accepted unit price, the range of the `NUMERIC(12, 2)` column.
    pub const MAX: Self = Self(Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2));

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Get the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Create a price, rejecting negative or oversized amounts.
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if `amount` is outside `0..=Price::MAX`.
    pub fn try_new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        if amount > Self::MAX.0 {
            return Err(PriceError::TooLarge(amount));
        }
        Ok(Self(amount))
    }

    /// Price of `quantity` units, saturating at the largest decimal.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_cents(1000).times(3), Price::from_cents(250).times(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_cents(3500));
    }

    #[test]
    fn test_display_two_decimals() {
        assert_eq!(Price::from_cents(3000).to_string(), "$30.00");
        assert_eq!(Price::new(Decimal::new(5, 0)).to_string(), "$5.00");
    }

    #[test]
    fn test_max_is_column_range() {
        assert_eq!(Price::MAX.to_string(), "$9999999999.99");
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Price::new(Decimal::MAX);
        assert_eq!(huge.times(2), huge);
        assert_eq!(huge + Price::from_cents(1), huge);
        let total: Price = [huge, huge, Price::from_cents(100)].into_iter().sum();
        assert_eq!(total, huge);
    }

    #[test]
    fn test_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Price>("\"79228162514264337593543950335\"").is_err());
        assert!(serde_json::from_str::<Price>("\"10000000000.00\"").is_err());
        assert!(serde_json::from_str::<Price>("-1").is_err());
        assert!(matches!(
            Price::try_new(Decimal::new(-1, 2)),
            Err(PriceError::Negative(_))
        ));
        let max: Price = serde_json::from_str("\"9999999999.99\"").unwrap();
        assert_eq!(max, Price::MAX);
        let zero: Price = serde_json::from_str("0").unwrap();
        assert_eq!(zero, Price::ZERO);
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Price = serde_json::from_str("10").unwrap();
        let from_float: Price = serde_json::from_str("10.5").unwrap();
        let from_string: Price = serde_json::from_str("\"10.50\"").unwrap();
        assert_eq!(from_number, Price::from_cents(1000));
        assert_eq!(from_float, from_string);
    }
}
