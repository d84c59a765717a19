//! Persistence ports consumed by the use cases.
//!
//! Every lookup takes the tenant explicitly; an adapter must never return a
//! record owned by another tenant, even when the id matches.

use std::sync::Arc;

use vendora_core::{Quantity, TenantId};
use vendora_inventory::{Stock, StockId, StockMovement};
use vendora_parties::{Customer, CustomerId, Email};
use vendora_products::{Product, ProductId, Sku};
use vendora_sales::{Sale, SaleId};

use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

pub trait CustomerLookup: Send + Sync {
    fn find_by_id(&self, tenant_id: TenantId, id: CustomerId) -> StoreResult<Option<Customer>>;
    fn find_by_email(&self, tenant_id: TenantId, email: &Email) -> StoreResult<Option<Customer>>;
}

pub trait ProductLookup: Send + Sync {
    fn find_by_id(&self, tenant_id: TenantId, id: ProductId) -> StoreResult<Option<Product>>;
    fn find_by_sku(&self, tenant_id: TenantId, sku: &Sku) -> StoreResult<Option<Product>>;
}

/// One stock aggregate together with the ledger entries its pending events
/// produced.
#[derive(Debug, Clone, Copy)]
pub struct StockChange<'a> {
    pub stock: &'a Stock,
    pub movements: &'a [StockMovement],
}

pub trait StockStore: Send + Sync {
    fn find_by_id(&self, tenant_id: TenantId, id: StockId) -> StoreResult<Option<Stock>>;

    fn find_by_product_and_location(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        location_code: &str,
    ) -> StoreResult<Option<Stock>>;

    fn find_by_product(&self, tenant_id: TenantId, product_id: ProductId) -> StoreResult<Vec<Stock>>;

    /// Available quantity of `product_id` summed over every location.
    fn total_available_by_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> StoreResult<Quantity> {
        self.find_by_product(tenant_id, product_id)?
            .iter()
            .try_fold(Quantity::ZERO, |acc, stock| acc.add(stock.available_quantity()))
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    /// Stocks at or below their minimum level.
    fn list_low_level(&self, tenant_id: TenantId) -> StoreResult<Vec<Stock>>;

    /// Ledger of one stock, oldest first.
    fn movements(&self, tenant_id: TenantId, stock_id: StockId) -> StoreResult<Vec<StockMovement>>;

    /// Persist every change or none of them.
    ///
    /// Each stock is checked against its stored version
    /// (`Stock::persisted_version`); a mismatch fails the whole batch with
    /// `StoreError::Conflict`.
    fn save_batch(&self, changes: &[StockChange<'_>]) -> StoreResult<()>;

    fn save(&self, stock: &Stock, movements: &[StockMovement]) -> StoreResult<()> {
        self.save_batch(&[StockChange { stock, movements }])
    }
}

pub trait SaleStore: Send + Sync {
    fn find_by_id(&self, tenant_id: TenantId, id: SaleId) -> StoreResult<Option<Sale>>;

    /// Persist the sale with its items and payments as one unit, rejecting
    /// stale versions.
    fn save(&self, sale: &Sale) -> StoreResult<()>;
}

impl<S> CustomerLookup for Arc<S>
where
    S: CustomerLookup + ?Sized,
{
    fn find_by_id(&self, tenant_id: TenantId, id: CustomerId) -> StoreResult<Option<Customer>> {
        (**self).find_by_id(tenant_id, id)
    }

    fn find_by_email(&self, tenant_id: TenantId, email: &Email) -> StoreResult<Option<Customer>> {
        (**self).find_by_email(tenant_id, email)
    }
}

impl<S> ProductLookup for Arc<S>
where
    S: ProductLookup + ?Sized,
{
    fn find_by_id(&self, tenant_id: TenantId, id: ProductId) -> StoreResult<Option<Product>> {
        (**self).find_by_id(tenant_id, id)
    }

    fn find_by_sku(&self, tenant_id: TenantId, sku: &Sku) -> StoreResult<Option<Product>> {
        (**self).find_by_sku(tenant_id, sku)
    }
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn find_by_id(&self, tenant_id: TenantId, id: StockId) -> StoreResult<Option<Stock>> {
        (**self).find_by_id(tenant_id, id)
    }

    fn find_by_product_and_location(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        location_code: &str,
    ) -> StoreResult<Option<Stock>> {
        (**self).find_by_product_and_location(tenant_id, product_id, location_code)
    }

    fn find_by_product(&self, tenant_id: TenantId, product_id: ProductId) -> StoreResult<Vec<Stock>> {
        (**self).find_by_product(tenant_id, product_id)
    }

    fn total_available_by_product(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> StoreResult<Quantity> {
        (**self).total_available_by_product(tenant_id, product_id)
    }

    fn list_low_level(&self, tenant_id: TenantId) -> StoreResult<Vec<Stock>> {
        (**self).list_low_level(tenant_id)
    }

    fn movements(&self, tenant_id: TenantId, stock_id: StockId) -> StoreResult<Vec<StockMovement>> {
        (**self).movements(tenant_id, stock_id)
    }

    fn save_batch(&self, changes: &[StockChange<'_>]) -> StoreResult<()> {
        (**self).save_batch(changes)
    }

    fn save(&self, stock: &Stock, movements: &[StockMovement]) -> StoreResult<()> {
        (**self).save(stock, movements)
    }
}

impl<S> SaleStore for Arc<S>
where
    S: SaleStore + ?Sized,
{
    fn find_by_id(&self, tenant_id: TenantId, id: SaleId) -> StoreResult<Option<Sale>> {
        (**self).find_by_id(tenant_id, id)
    }

    fn save(&self, sale: &Sale) -> StoreResult<()> {
        (**self).save(sale)
    }
}
