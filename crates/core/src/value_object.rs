//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one. Every constructor validates, so an invalid instance can
/// never exist:
///
/// ```ignore
/// let price = Money::new(dec!(10.00), Currency::BRL)?;   // validated here
/// let doubled = price.multiply(Quantity::new(2)?)?;       // new value, `price` untouched
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
