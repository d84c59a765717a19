use std::collections::HashMap;
use std::sync::RwLock;

use vendora_core::TenantId;
use vendora_inventory::{Stock, StockId, StockMovement, StockSnapshot};
use vendora_products::ProductId;

use crate::error::StoreError;
use crate::in_memory::check_version;
use crate::ports::{StockChange, StockStore, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    stocks: HashMap<(TenantId, StockId), StockSnapshot>,
    movements: HashMap<(TenantId, StockId), Vec<StockMovement>>,
}

/// Stocks and their ledgers behind one lock, so an aggregate and the
/// movements it produced are written together.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    tables: RwLock<Tables>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn select(
        &self,
        tenant_id: TenantId,
        predicate: impl Fn(&StockSnapshot) -> bool,
    ) -> StoreResult<Vec<Stock>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        let mut found = tables
            .stocks
            .iter()
            .filter(|((t, _), s)| *t == tenant_id && predicate(s))
            .map(|(_, s)| restore(s.clone()))
            .collect::<StoreResult<Vec<_>>>()?;
        found.sort_by(|a, b| a.location().code().cmp(b.location().code()));
        Ok(found)
    }
}

fn restore(snapshot: StockSnapshot) -> StoreResult<Stock> {
    let id = snapshot.id;
    Stock::restore(snapshot).map_err(|e| StoreError::Corrupt(format!("stock {id}: {e}")))
}

fn check_write(tables: &Tables, stock: &Stock) -> StoreResult<()> {
    let key = (stock.tenant_id(), stock.id_typed());
    let expected = stock.persisted_version();

    let stored = tables.stocks.get(&key).map(|s| s.version);
    check_version("stock", stock.id_typed(), stored, expected)?;

    if stored.is_none() {
        let clash = tables.stocks.iter().any(|((t, _), s)| {
            *t == stock.tenant_id()
                && s.product_id == stock.product_id()
                && s.location.code() == stock.location().code()
        });
        if clash {
            return Err(duplicate_location(stock));
        }
    }
    Ok(())
}

/// Within one batch a stock appears once, and no two stocks share a product
/// and location code.
fn check_batch(earlier: &[StockChange<'_>], stock: &Stock) -> StoreResult<()> {
    for other in earlier.iter().map(|c| c.stock) {
        if other.tenant_id() != stock.tenant_id() {
            continue;
        }
        if other.id_typed() == stock.id_typed() {
            return Err(StoreError::Conflict(format!(
                "stock {} appears twice in one batch",
                stock.id_typed()
            )));
        }
        if other.product_id() == stock.product_id() && other.location() == stock.location() {
            return Err(duplicate_location(stock));
        }
    }
    Ok(())
}

fn duplicate_location(stock: &Stock) -> StoreError {
    StoreError::Duplicate(format!(
        "stock for product {} at location {}",
        stock.product_id(),
        stock.location().code()
    ))
}

impl StockStore for InMemoryStockStore {
    fn find_by_id(&self, tenant_id: TenantId, id: StockId) -> StoreResult<Option<Stock>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        tables
            .stocks
            .get(&(tenant_id, id))
            .cloned()
            .map(restore)
            .transpose()
    }

    fn find_by_product_and_location(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        location_code: &str,
    ) -> StoreResult<Option<Stock>> {
        let code = location_code.trim().to_uppercase();
        Ok(self
            .select(tenant_id, |s| s.product_id == product_id && s.location.code() == code)?
            .into_iter()
            .next())
    }

    fn find_by_product(&self, tenant_id: TenantId, product_id: ProductId) -> StoreResult<Vec<Stock>> {
        self.select(tenant_id, |s| s.product_id == product_id)
    }

    fn list_low_level(&self, tenant_id: TenantId) -> StoreResult<Vec<Stock>> {
        self.select(tenant_id, |s| s.quantity <= s.minimum_quantity)
    }

    fn movements(&self, tenant_id: TenantId, stock_id: StockId) -> StoreResult<Vec<StockMovement>> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(tables
            .movements
            .get(&(tenant_id, stock_id))
            .cloned()
            .unwrap_or_default())
    }

    fn save_batch(&self, changes: &[StockChange<'_>]) -> StoreResult<()> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;

        for (index, change) in changes.iter().enumerate() {
            check_write(&tables, change.stock)?;
            check_batch(&changes[..index], change.stock)?;
            if let Some(foreign) = change
                .movements
                .iter()
                .find(|m| m.stock_id() != change.stock.id_typed() || m.tenant_id() != change.stock.tenant_id())
            {
                return Err(StoreError::Corrupt(format!(
                    "movement {} does not belong to stock {}",
                    foreign.id_typed(),
                    change.stock.id_typed()
                )));
            }
        }

        for change in changes {
            let key = (change.stock.tenant_id(), change.stock.id_typed());
            tables.stocks.insert(key, change.stock.snapshot());
            tables
                .movements
                .entry(key)
                .or_default()
                .extend(change.movements.iter().cloned());
        }

        tracing::debug!(stocks = changes.len(), "stock batch persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vendora_core::{AggregateRoot, Quantity, UserId};
    use vendora_inventory::{Location, LocationKind};

    fn stock(tenant: TenantId, product: ProductId, code: &str, quantity: u64) -> Stock {
        Stock::create(
            StockId::generate(),
            tenant,
            product,
            Location::new("Main", code, LocationKind::Warehouse).unwrap(),
            Quantity::from_u64(quantity),
            Quantity::from_u64(2),
            None,
        )
        .unwrap()
    }

    #[test]
    fn saves_and_restores_with_ledger() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let mut s = stock(tenant, ProductId::generate(), "wh-1", 10);
        let movement = s.increase_stock(Quantity::from_u64(5), UserId::new()).unwrap();

        store.save(&s, std::slice::from_ref(&movement)).unwrap();

        let loaded = store.find_by_id(tenant, s.id_typed()).unwrap().unwrap();
        assert_eq!(loaded.quantity(), Quantity::from_u64(15));
        assert_eq!(loaded.version(), s.version());
        assert_eq!(store.movements(tenant, s.id_typed()).unwrap(), vec![movement]);
        assert!(store.find_by_id(TenantId::new(), s.id_typed()).unwrap().is_none());
    }

    #[test]
    fn stale_write_is_a_conflict() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let s = stock(tenant, ProductId::generate(), "WH-1", 10);
        store.save(&s, &[]).unwrap();

        let mut first = store.find_by_id(tenant, s.id_typed()).unwrap().unwrap();
        let mut second = first.clone();

        let m1 = first.increase_stock(Quantity::from_u64(1), UserId::new()).unwrap();
        store.save(&first, &[m1]).unwrap();

        let m2 = second.increase_stock(Quantity::from_u64(2), UserId::new()).unwrap();
        assert!(matches!(store.save(&second, &[m2]), Err(StoreError::Conflict(_))));
        assert_eq!(store.movements(tenant, s.id_typed()).unwrap().len(), 1);
    }

    #[test]
    fn one_stock_per_product_and_location() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        store.save(&stock(tenant, product, "WH-1", 1), &[]).unwrap();

        let err = store.save(&stock(tenant, product, "wh-1", 3), &[]).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(
            store
                .find_by_product_and_location(tenant, product, " wh-1 ")
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn failed_batch_writes_nothing() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        let existing = stock(tenant, product, "WH-1", 4);
        store.save(&existing, &[]).unwrap();

        let fresh = stock(tenant, product, "WH-2", 4);
        let clash = stock(tenant, product, "WH-1", 1);
        let result = store.save_batch(&[
            StockChange { stock: &fresh, movements: &[] },
            StockChange { stock: &clash, movements: &[] },
        ]);

        assert!(result.is_err());
        assert_eq!(store.find_by_product(tenant, product).unwrap().len(), 1);
    }

    #[test]
    fn batch_cannot_open_one_location_twice() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        let first = stock(tenant, product, "WH-7", 2);
        let twin = stock(tenant, product, " wh-7", 5);

        let err = store
            .save_batch(&[
                StockChange { stock: &first, movements: &[] },
                StockChange { stock: &twin, movements: &[] },
            ])
            .unwrap_err();

        assert!(matches!(err, StoreError::Duplicate(_)));
        assert!(store.find_by_product(tenant, product).unwrap().is_empty());

        let again = store.save_batch(&[
            StockChange { stock: &first, movements: &[] },
            StockChange { stock: &first, movements: &[] },
        ]);
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn totals_and_low_levels_are_tenant_scoped() {
        let store = InMemoryStockStore::new();
        let tenant = TenantId::new();
        let product = ProductId::generate();
        store.save(&stock(tenant, product, "WH-1", 6), &[]).unwrap();
        store.save(&stock(tenant, product, "WH-2", 1), &[]).unwrap();
        store.save(&stock(TenantId::new(), product, "WH-1", 50), &[]).unwrap();

        assert_eq!(
            store.total_available_by_product(tenant, product).unwrap(),
            Quantity::from_u64(7)
        );
        let low = store.list_low_level(tenant).unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].location().code(), "WH-2");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Availability is the sum over locations of on-hand minus reserved.
            #[test]
            fn total_available_sums_every_location(
                levels in prop::collection::vec((0u64..1_000, 0u64..1_000), 1..8),
            ) {
                let store = InMemoryStockStore::new();
                let tenant = TenantId::new();
                let product = ProductId::generate();
                let mut expected = 0u64;

                for (index, (on_hand, hold)) in levels.iter().enumerate() {
                    let mut s = stock(tenant, product, &format!("LOC-{index}"), *on_hand);
                    let held = (*hold).min(*on_hand);
                    if held > 0 {
                        s.reserve_stock(Quantity::from_u64(held)).unwrap();
                    }
                    store.save(&s, &[]).unwrap();
                    expected += on_hand - held;
                }
                store.save(&stock(TenantId::new(), product, "LOC-0", 999), &[]).unwrap();

                prop_assert_eq!(
                    store.total_available_by_product(tenant, product).unwrap(),
                    Quantity::from_u64(expected)
                );
            }
        }
    }
}
