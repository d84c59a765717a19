//! Products module: the slice of the catalog a sale depends on.
//!
//! Catalog management lives elsewhere; this crate only models what a sale
//! reads (sku, name, price, active flag) with validated value types.

pub mod product;

pub use product::{Product, ProductId, ProductStatus, Sku};
