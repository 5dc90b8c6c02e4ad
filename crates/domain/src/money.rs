//! Currency amounts.

use serde::{Deserialize, Serialize};

/// Internal currency amount in minor units.
///
/// Balances and prices are whole numbers; there is no fractional currency.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from minor units.
    pub const fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts `other`, returning `None` on overflow.
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Self(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_checks() {
        assert!(Money::new(1).is_positive());
        assert!(!Money::zero().is_positive());
        assert!(!Money::new(-1).is_positive());
    }

    #[test]
    fn test_checked_arithmetic() {
        assert_eq!(Money::new(700).checked_sub(Money::new(500)), Some(Money::new(200)));
        assert_eq!(Money::new(1000).checked_add(Money::new(500)), Some(Money::new(1500)));
        assert_eq!(Money::new(i64::MAX).checked_add(Money::new(1)), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
    }

    #[test]
    fn test_ordering() {
        assert!(Money::new(200) < Money::new(500));
        assert_eq!(Money::new(500).max(Money::new(700)), Money::new(700));
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::new(500)).unwrap();
        assert_eq!(json, "500");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::new(500));
    }
}
