//! Whole, non-negative unit counts.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);

    /// Validate a signed count coming from the outside world.
    pub fn new(value: i64) -> DomainResult<Self> {
        u64::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::validation("quantity cannot be negative"))
    }

    /// Like [`Quantity::new`] but also rejects zero.
    pub fn positive(value: i64) -> DomainResult<Self> {
        let qty = Self::new(value)?;
        if qty.is_zero() {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }
        Ok(qty)
    }

    pub const fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn add(&self, other: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or_else(|| DomainError::validation("quantity overflow"))
    }

    /// Subtract, failing if the result would be negative.
    pub fn checked_sub(&self, other: Quantity) -> DomainResult<Quantity> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or_else(|| DomainError::invariant("quantity cannot go below zero"))
    }

    pub fn saturating_sub(&self, other: Quantity) -> Quantity {
        Self(self.0.saturating_sub(other.0))
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

impl ValueObject for Quantity {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_values() {
        assert!(matches!(Quantity::new(-1), Err(DomainError::Validation(_))));
        assert_eq!(Quantity::new(0).unwrap(), Quantity::ZERO);
    }

    #[test]
    fn positive_rejects_zero() {
        assert!(Quantity::positive(0).is_err());
        assert_eq!(Quantity::positive(3).unwrap().value(), 3);
    }

    #[test]
    fn subtraction_below_zero_fails() {
        let five = Quantity::from(5);
        assert_eq!(five.checked_sub(Quantity::from(2)).unwrap().value(), 3);
        assert!(matches!(
            five.checked_sub(Quantity::from(6)),
            Err(DomainError::InvariantViolation(_))
        ));
    }
}
