//! Monetary amounts.
//!
//! `Money` is a non-negative decimal amount tagged with a currency. Arithmetic
//! across currencies fails; there is no conversion.

use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::quantity::Quantity;
use crate::value_object::ValueObject;

/// Number of decimal places monetary results are rounded to.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// ISO-4217 style currency code: three upper-case ASCII letters.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; 3]);

impl Currency {
    pub const BRL: Currency = Currency(*b"BRL");
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");

    /// Parse a currency code (case-insensitive, surrounding whitespace ignored).
    pub fn new(code: &str) -> DomainResult<Self> {
        let code = code.trim();
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(DomainError::validation(format!(
                "currency code must be three letters, got '{code}'"
            )));
        }
        let mut out = [0u8; 3];
        for (dst, src) in out.iter_mut().zip(bytes) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self(out))
    }

    pub fn code(&self) -> &str {
        // Only ASCII letters are ever stored.
        core::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl core::fmt::Debug for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Currency({})", self.code())
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(value: Currency) -> Self {
        value.code().to_string()
    }
}

impl ValueObject for Currency {}

#[derive(Deserialize)]
struct MoneyRepr {
    amount: Decimal,
    currency: Currency,
}

/// Non-negative amount of a given currency.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoneyRepr")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl TryFrom<MoneyRepr> for Money {
    type Error = DomainError;

    fn try_from(value: MoneyRepr) -> Result<Self, Self::Error> {
        Money::new(value.amount, value.currency)
    }
}

impl Money {
    pub fn new(amount: Decimal, currency: Currency) -> DomainResult<Self> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::validation("amount cannot be negative"));
        }
        Ok(Self { amount, currency })
    }

    pub fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    fn ensure_same_currency(&self, other: &Money) -> DomainResult<()> {
        if self.currency != other.currency {
            return Err(DomainError::validation(format!(
                "currency mismatch: {} vs {}",
                self.currency, other.currency
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::validation("monetary amount out of range"))?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// Subtract, failing if the result would be negative.
    pub fn checked_sub(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        let amount = self.amount - other.amount;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(DomainError::invariant("monetary result cannot be negative"));
        }
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// `max(0, self - other)`.
    pub fn saturating_sub(&self, other: &Money) -> DomainResult<Money> {
        self.ensure_same_currency(other)?;
        Ok(Self {
            amount: (self.amount - other.amount).max(Decimal::ZERO),
            currency: self.currency,
        })
    }

    /// `self × quantity`; fails when the product does not fit a decimal.
    pub fn multiply(&self, quantity: Quantity) -> DomainResult<Money> {
        let amount = self
            .amount
            .checked_mul(Decimal::from(quantity.value()))
            .ok_or_else(|| DomainError::validation("monetary amount out of range"))?;
        Ok(Self {
            amount,
            currency: self.currency,
        })
    }

    /// `percent`% of this amount, rounded to minor units (midpoint away from
    /// zero) and never larger than the amount itself.
    pub fn percent(&self, percent: Decimal) -> Money {
        let raw = match self.amount.checked_mul(percent) {
            Some(scaled) => scaled / Decimal::ONE_HUNDRED,
            None => self.amount / Decimal::ONE_HUNDRED * percent.min(Decimal::ONE_HUNDRED),
        };
        let rounded = raw
            .round_dp_with_strategy(MINOR_UNIT_SCALE, RoundingStrategy::MidpointAwayFromZero)
            .max(Decimal::ZERO);
        Self {
            amount: rounded.min(self.amount),
            currency: self.currency,
        }
    }

    /// `min(self, cap)`, with a negative cap treated as zero.
    pub fn capped_at(&self, cap: Decimal) -> Money {
        Self {
            amount: self.amount.min(cap.max(Decimal::ZERO)),
            currency: self.currency,
        }
    }

    /// Sum amounts of a single currency. An empty iterator yields zero.
    pub fn sum<'a>(currency: Currency, items: impl IntoIterator<Item = &'a Money>) -> DomainResult<Money> {
        items
            .into_iter()
            .try_fold(Money::zero(currency), |acc, m| acc.add(m))
    }

    pub fn is_greater_than(&self, other: &Money) -> DomainResult<bool> {
        self.ensure_same_currency(other)?;
        Ok(self.amount > other.amount)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

impl ValueObject for Money {}
