//! `vendora-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! errors, identifiers, aggregate traits and the monetary/quantity scalars every
//! other domain crate builds on.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod quantity;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, EntityId, TenantId, UserId};
pub use money::{Currency, Money};
pub use quantity::Quantity;
pub use value_object::ValueObject;
