//! In-memory, tenant-isolated adapters for the persistence ports (tests/dev).

pub mod directory;
pub mod sale_store;
pub mod stock_store;
pub mod tenant_store;

pub use directory::{InMemoryCustomerDirectory, InMemoryProductCatalog};
pub use sale_store::InMemorySaleStore;
pub use stock_store::InMemoryStockStore;
pub use tenant_store::InMemoryTenantStore;

use core::fmt::Display;

use vendora_core::ExpectedVersion;

use crate::error::StoreError;

/// Optimistic write check: the stored version (0 when the row is absent) must
/// equal the version the writer loaded.
pub(crate) fn check_version(
    kind: &str,
    id: impl Display,
    stored: Option<u64>,
    persisted: u64,
) -> Result<(), StoreError> {
    ExpectedVersion::Exact(persisted)
        .check(stored.unwrap_or(0))
        .map_err(|e| StoreError::Conflict(format!("{kind} {id}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_rows_count_as_version_zero() {
        assert!(check_version("sale", "s-1", None, 0).is_ok());
        assert!(check_version("sale", "s-1", Some(3), 3).is_ok());

        let err = check_version("sale", "s-1", None, 2).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(ref m) if m.starts_with("sale s-1:")));
        assert!(matches!(
            check_version("stock", "k-9", Some(4), 3),
            Err(StoreError::Conflict(_))
        ));
    }
}
