use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, Money, ValueObject};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    Percentage,
    Fixed,
}

#[derive(Deserialize)]
struct DiscountRepr {
    kind: DiscountKind,
    value: Decimal,
}

/// A reduction applied to a base amount.
///
/// `Percentage` values lie in `0..=100`; `Fixed` values are non-negative
/// amounts in the currency of whatever they are applied to and never reduce
/// that base below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "DiscountRepr")]
pub struct Discount {
    kind: DiscountKind,
    value: Decimal,
}

impl Discount {
    pub fn percentage(value: Decimal) -> DomainResult<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(DomainError::validation(format!(
                "percentage discount must be between 0 and 100, got {value}"
            )));
        }
        Ok(Self {
            kind: DiscountKind::Percentage,
            value,
        })
    }

    pub fn fixed(value: Decimal) -> DomainResult<Self> {
        if value < Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "fixed discount cannot be negative, got {value}"
            )));
        }
        Ok(Self {
            kind: DiscountKind::Fixed,
            value,
        })
    }

    /// Build a discount from optional request fields. A fixed amount takes
    /// precedence when both are present.
    pub fn from_inputs(
        percentage: Option<Decimal>,
        fixed: Option<Decimal>,
    ) -> DomainResult<Option<Self>> {
        match (percentage, fixed) {
            (_, Some(fixed)) => Self::fixed(fixed).map(Some),
            (Some(percentage), None) => Self::percentage(percentage).map(Some),
            (None, None) => Ok(None),
        }
    }

    pub fn kind(&self) -> DiscountKind {
        self.kind
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Amount taken off `base`. Always between zero and `base`.
    pub fn calculate(&self, base: &Money) -> Money {
        match self.kind {
            DiscountKind::Percentage => base.percent(self.value),
            DiscountKind::Fixed => base.capped_at(self.value),
        }
    }
}

impl TryFrom<DiscountRepr> for Discount {
    type Error = DomainError;

    fn try_from(value: DiscountRepr) -> Result<Self, Self::Error> {
        match value.kind {
            DiscountKind::Percentage => Self::percentage(value.value),
            DiscountKind::Fixed => Self::fixed(value.value),
        }
    }
}

impl ValueObject for Discount {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vendora_core::Currency;

    fn brl(amount: Decimal) -> Money {
        Money::new(amount, Currency::BRL).unwrap()
    }

    #[test]
    fn percentage_outside_range_is_rejected() {
        assert!(Discount::percentage(dec!(-1)).is_err());
        assert!(Discount::percentage(dec!(100.01)).is_err());
        assert!(Discount::percentage(dec!(100)).is_ok());
        assert!(Discount::fixed(dec!(-0.01)).is_err());
    }

    #[test]
    fn percentage_rounds_to_cents() {
        let discount = Discount::percentage(dec!(15)).unwrap();
        assert_eq!(discount.calculate(&brl(dec!(33.33))).amount(), dec!(5.00));
        assert_eq!(discount.calculate(&brl(dec!(0.10))).amount(), dec!(0.02));
    }

    #[test]
    fn fixed_is_capped_at_base() {
        let discount = Discount::fixed(dec!(50)).unwrap();
        assert_eq!(discount.calculate(&brl(dec!(30))).amount(), dec!(30));
        assert_eq!(discount.calculate(&brl(dec!(80))).amount(), dec!(50));
    }

    #[test]
    fn fixed_wins_over_percentage() {
        let discount = Discount::from_inputs(Some(dec!(10)), Some(dec!(3)))
            .unwrap()
            .unwrap();
        assert_eq!(discount.kind(), DiscountKind::Fixed);
        assert_eq!(Discount::from_inputs(None, None).unwrap(), None);
    }

    #[test]
    fn deserialization_revalidates() {
        let ok: Discount = serde_json::from_str(r#"{"kind":"PERCENTAGE","value":"10"}"#).unwrap();
        assert_eq!(ok.value(), dec!(10));
        assert!(serde_json::from_str::<Discount>(r#"{"kind":"PERCENTAGE","value":"120"}"#).is_err());
    }
}
