//! Decimal money amounts.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Money amount backed by an exact decimal.
///
/// Serializes as a decimal string (e.g. `"49.99"`) so totals never pass
/// through binary floating point on the way to a client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Creates a money amount from a decimal value in currency units.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from cents (e.g. `4999` = `$49.99`).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the amount in currency units.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies by a quantity.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money(self.0 * Decimal::from(quantity))
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = self.0.round_dp(2);
        if self.is_negative() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${rounded:.2}")
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_keeps_two_decimal_places() {
        let money = Money::from_cents(4999);
        assert_eq!(money.amount(), Decimal::new(4999, 2));
        assert_eq!(money.to_string(), "$49.99");
    }

    #[test]
    fn display_pads_and_signs() {
        assert_eq!(Money::from_cents(100).to_string(), "$1.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn multiply_is_exact() {
        // 0.1 * 3 drifts in binary floating point
        let money = Money::from_cents(10).multiply(3);
        assert_eq!(money, Money::from_cents(30));
    }

    #[test]
    fn sum_of_line_totals() {
        let total: Money = [Money::from_cents(1995), Money::from_cents(8999).multiply(2)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(19993));
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(29999)).unwrap();
        assert_eq!(json, "\"299.99\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(29999));
    }

    #[test]
    fn zero_is_not_negative() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(-1).is_negative());
    }
}
