use vendora_core::TenantId;
use vendora_parties::{Customer, CustomerId, Email};
use vendora_products::{Product, ProductId, Sku};

use crate::error::StoreError;
use crate::in_memory::tenant_store::InMemoryTenantStore;
use crate::ports::{CustomerLookup, ProductLookup, StoreResult};

/// Customer lookup backed by an in-memory map. Records are keyed by their own
/// tenant.
#[derive(Debug, Default)]
pub struct InMemoryCustomerDirectory {
    customers: InMemoryTenantStore<CustomerId, Customer>,
}

impl InMemoryCustomerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, customer: Customer) -> Result<(), StoreError> {
        self.customers
            .upsert(customer.tenant_id(), customer.id_typed(), customer)
    }
}

impl CustomerLookup for InMemoryCustomerDirectory {
    fn find_by_id(&self, tenant_id: TenantId, id: CustomerId) -> StoreResult<Option<Customer>> {
        self.customers.get(tenant_id, &id)
    }

    fn find_by_email(&self, tenant_id: TenantId, email: &Email) -> StoreResult<Option<Customer>> {
        self.customers
            .find(tenant_id, |c| c.email() == Some(email))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: InMemoryTenantStore<ProductId, Product>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Fails with `Duplicate` when another product of the
    /// tenant already uses the sku.
    pub fn insert(&self, product: Product) -> Result<(), StoreError> {
        let tenant_id = product.tenant_id();
        let taken = self.products.find(tenant_id, |p| {
            p.sku() == product.sku() && p.id_typed() != product.id_typed()
        })?;
        if taken.is_some() {
            return Err(StoreError::Duplicate(format!("sku {}", product.sku())));
        }
        self.products.upsert(tenant_id, product.id_typed(), product)
    }
}

impl ProductLookup for InMemoryProductCatalog {
    fn find_by_id(&self, tenant_id: TenantId, id: ProductId) -> StoreResult<Option<Product>> {
        self.products.get(tenant_id, &id)
    }

    fn find_by_sku(&self, tenant_id: TenantId, sku: &Sku) -> StoreResult<Option<Product>> {
        self.products.find(tenant_id, |p| p.sku() == sku)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use vendora_core::{Currency, Money};

    #[test]
    fn customers_resolve_by_email_within_tenant_only() {
        let directory = InMemoryCustomerDirectory::new();
        let tenant = TenantId::new();
        let customer =
            Customer::create(CustomerId::generate(), tenant, "Ana Lima", Some("Ana@Shop.com")).unwrap();
        directory.insert(customer.clone()).unwrap();

        let email = Email::new("ana@shop.com").unwrap();
        assert_eq!(directory.find_by_email(tenant, &email).unwrap(), Some(customer.clone()));
        assert_eq!(directory.find_by_email(TenantId::new(), &email).unwrap(), None);
        assert_eq!(
            directory.find_by_id(TenantId::new(), customer.id_typed()).unwrap(),
            None
        );
    }

    #[test]
    fn sku_is_unique_per_tenant() {
        let catalog = InMemoryProductCatalog::new();
        let tenant = TenantId::new();
        let price = Money::new(dec!(9.90), Currency::BRL).unwrap();

        let first = Product::create(ProductId::generate(), tenant, "cof-250", "Coffee", price).unwrap();
        catalog.insert(first.clone()).unwrap();

        let clash = Product::create(ProductId::generate(), tenant, "COF-250", "Coffee 2", price).unwrap();
        assert!(matches!(catalog.insert(clash), Err(StoreError::Duplicate(_))));

        let other_tenant =
            Product::create(ProductId::generate(), TenantId::new(), "COF-250", "Coffee", price).unwrap();
        catalog.insert(other_tenant).unwrap();

        let sku = Sku::new("cof-250").unwrap();
        assert_eq!(catalog.find_by_sku(tenant, &sku).unwrap(), Some(first));
    }
}
