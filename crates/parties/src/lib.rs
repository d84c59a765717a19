//! Parties module: customers as a sale precondition.
//!
//! Only identity, display name, contact email and the active flag are
//! modelled; profile bookkeeping (addresses, credit) lives elsewhere.

pub mod customer;

pub use customer::{Customer, CustomerId, CustomerStatus, Email};
