//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Sale items, payments and stock movements are entities owned by an
/// aggregate: they have an identity, but are only reachable through their root.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
