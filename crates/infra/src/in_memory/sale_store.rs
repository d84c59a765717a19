use vendora_core::TenantId;
use vendora_sales::{Sale, SaleId, SaleSnapshot};

use crate::error::StoreError;
use crate::in_memory::check_version;
use crate::in_memory::tenant_store::InMemoryTenantStore;
use crate::ports::{SaleStore, StoreResult};

/// Sales stored as snapshots (items and payments inline), restored on read.
#[derive(Debug, Default)]
pub struct InMemorySaleStore {
    sales: InMemoryTenantStore<SaleId, SaleSnapshot>,
}

impl InMemorySaleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, tenant_id: TenantId) -> StoreResult<Vec<Sale>> {
        self.sales
            .list(tenant_id)?
            .into_iter()
            .map(restore)
            .collect()
    }
}

fn restore(snapshot: SaleSnapshot) -> StoreResult<Sale> {
    let id = snapshot.id;
    Sale::restore(snapshot).map_err(|e| StoreError::Corrupt(format!("sale {id}: {e}")))
}

impl SaleStore for InMemorySaleStore {
    fn find_by_id(&self, tenant_id: TenantId, id: SaleId) -> StoreResult<Option<Sale>> {
        self.sales.get(tenant_id, &id)?.map(restore).transpose()
    }

    fn save(&self, sale: &Sale) -> StoreResult<()> {
        let expected = sale.persisted_version();
        self.sales.upsert_if(
            sale.tenant_id(),
            sale.id_typed(),
            sale.snapshot(),
            |current| {
                check_version("sale", sale.id_typed(), current.map(|s| s.version), expected)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vendora_core::{AggregateRoot, Currency, Money, Quantity, UserId};
    use vendora_parties::{Customer, CustomerId};
    use vendora_products::{Product, ProductId};

    fn draft(tenant: TenantId) -> Sale {
        let customer = Customer::create(CustomerId::generate(), tenant, "Bruno", None).unwrap();
        Sale::create(SaleId::generate(), tenant, &customer, UserId::new(), Currency::BRL, None).unwrap()
    }

    #[test]
    fn round_trips_items_and_totals() {
        let store = InMemorySaleStore::new();
        let tenant = TenantId::new();
        let mut sale = draft(tenant);
        let product = Product::create(
            ProductId::generate(),
            tenant,
            "TEA-01",
            "Green tea",
            Money::new(dec!(12.00), Currency::BRL).unwrap(),
        )
        .unwrap();
        sale.add_item(&product, Quantity::from_u64(3), None).unwrap();

        store.save(&sale).unwrap();
        let loaded = store.find_by_id(tenant, sale.id_typed()).unwrap().unwrap();

        assert_eq!(loaded.total(), sale.total());
        assert_eq!(loaded.items(), sale.items());
        assert_eq!(loaded.version(), sale.version());
        assert!(loaded.domain_events().is_empty());
        assert!(store.find_by_id(TenantId::new(), sale.id_typed()).unwrap().is_none());
    }

    #[test]
    fn concurrent_edits_of_one_sale_conflict() {
        let store = InMemorySaleStore::new();
        let tenant = TenantId::new();
        let sale = draft(tenant);
        store.save(&sale).unwrap();

        let mut a = store.find_by_id(tenant, sale.id_typed()).unwrap().unwrap();
        let mut b = a.clone();
        a.cancel(Some("customer left")).unwrap();
        store.save(&a).unwrap();

        b.cancel(None).unwrap();
        assert!(matches!(store.save(&b), Err(StoreError::Conflict(_))));
        assert_eq!(
            store.find_by_id(tenant, sale.id_typed()).unwrap().unwrap().cancellation_reason(),
            Some("customer left")
        );
    }
}
