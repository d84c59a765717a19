use tracing::instrument;

use vendora_core::{Money, Quantity, TenantId};
use vendora_events::EventBus;
use vendora_products::ProductId;
use vendora_sales::{Discount, Sale, SaleId};

use crate::config::ServiceConfig;
use crate::dto::{
    AddPaymentInput, AddSaleItemInput, ApplySaleDiscountInput, CancelSaleInput, CreateSaleInput,
    RemoveSaleItemInput, SaleOutput, UpdateSaleItemQuantityInput,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{CustomerLookup, ProductLookup, SaleStore, StockStore};
use crate::services::{Envelope, logged, positive_quantity, publish};

pub const SALE_AGGREGATE: &str = "sales.sale";

/// Sale use cases.
///
/// Stock is only *checked* here: adding or growing a line requires enough
/// available quantity across all locations at that moment, but nothing is
/// held. Stock leaves the shelf later through `StockService::remove_stock`.
pub struct SalesService<C, P, K, S, B> {
    customers: C,
    products: P,
    stocks: K,
    sales: S,
    bus: B,
    config: ServiceConfig,
}

impl<C, P, K, S, B> SalesService<C, P, K, S, B>
where
    C: CustomerLookup,
    P: ProductLookup,
    K: StockStore,
    S: SaleStore,
    B: EventBus<Envelope>,
{
    pub fn new(customers: C, products: P, stocks: K, sales: S, bus: B, config: ServiceConfig) -> Self {
        Self {
            customers,
            products,
            stocks,
            sales,
            bus,
            config,
        }
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, customer_id = %input.customer_id))]
    pub fn create_sale(&self, tenant_id: TenantId, input: CreateSaleInput) -> ServiceResult<SaleOutput> {
        logged(|| {
            let customer = self
                .customers
                .find_by_id(tenant_id, input.customer_id)?
                .ok_or_else(|| ServiceError::not_found("Customer", input.customer_id))?;
            if !customer.is_active() {
                return Err(ServiceError::validation("cannot create a sale for an inactive customer"));
            }

            let currency = input.currency.unwrap_or(self.config.default_currency);
            let sale = Sale::create(
                SaleId::generate(),
                tenant_id,
                &customer,
                input.user_id,
                currency,
                input.notes,
            )?;
            self.commit(sale)
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, sale_id = %sale_id))]
    pub fn get_sale(&self, tenant_id: TenantId, sale_id: SaleId) -> ServiceResult<SaleOutput> {
        logged(|| self.load(tenant_id, sale_id).map(|sale| SaleOutput::from(&sale)))
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id, product_id = %input.product_id))]
    pub fn add_sale_item(&self, tenant_id: TenantId, input: AddSaleItemInput) -> ServiceResult<SaleOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;

            let mut sale = self.load(tenant_id, input.sale_id)?;
            if !sale.is_draft() {
                return Err(ServiceError::business_rule(format!(
                    "cannot add items to a {} sale",
                    sale.status()
                )));
            }

            let product = self
                .products
                .find_by_id(tenant_id, input.product_id)?
                .ok_or_else(|| ServiceError::not_found("Product", input.product_id))?;
            if !product.is_active() {
                return Err(ServiceError::validation("cannot add an inactive product to a sale"));
            }

            self.ensure_available(tenant_id, product.id_typed(), quantity)?;

            let discount = Discount::from_inputs(input.discount_percentage, input.discount_fixed)?;
            let item_id = sale.add_item(&product, quantity, discount)?;
            tracing::info!(item_id = %item_id, quantity = %quantity, "sale item added");
            self.commit(sale)
        })
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id, item_id = %input.item_id))]
    pub fn remove_sale_item(&self, tenant_id: TenantId, input: RemoveSaleItemInput) -> ServiceResult<SaleOutput> {
        logged(|| {
            let mut sale = self.load(tenant_id, input.sale_id)?;
            sale.remove_item(input.item_id)?;
            self.commit(sale)
        })
    }

    /// Re-checks availability for the new quantity before changing the line.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id, item_id = %input.item_id))]
    pub fn update_sale_item_quantity(
        &self,
        tenant_id: TenantId,
        input: UpdateSaleItemQuantityInput,
    ) -> ServiceResult<SaleOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            let mut sale = self.load(tenant_id, input.sale_id)?;
            if !sale.is_draft() {
                return Err(ServiceError::business_rule(format!(
                    "cannot change items of a {} sale",
                    sale.status()
                )));
            }

            let product_id = sale
                .item(input.item_id)
                .map(|item| item.product_id())
                .ok_or_else(|| ServiceError::not_found("Sale item", input.item_id))?;
            self.ensure_available(tenant_id, product_id, quantity)?;

            sale.update_item_quantity(input.item_id, quantity)?;
            self.commit(sale)
        })
    }

    /// Sets the sale-level discount, or clears it when the input carries none.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id))]
    pub fn apply_sale_discount(
        &self,
        tenant_id: TenantId,
        input: ApplySaleDiscountInput,
    ) -> ServiceResult<SaleOutput> {
        logged(|| {
            let mut sale = self.load(tenant_id, input.sale_id)?;
            match Discount::from_inputs(input.discount_percentage, input.discount_fixed)? {
                Some(discount) => sale.apply_sale_discount(discount)?,
                None => sale.remove_sale_discount()?,
            }
            self.commit(sale)
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id, sale_id = %sale_id))]
    pub fn confirm_sale(&self, tenant_id: TenantId, sale_id: SaleId) -> ServiceResult<SaleOutput> {
        logged(|| {
            let mut sale = self.load(tenant_id, sale_id)?;
            sale.confirm()?;
            self.commit(sale)
        })
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id, method = ?input.method))]
    pub fn add_payment(&self, tenant_id: TenantId, input: AddPaymentInput) -> ServiceResult<SaleOutput> {
        logged(|| {
            let mut sale = self.load(tenant_id, input.sale_id)?;
            let amount = Money::new(input.amount, sale.currency())?;
            let payment_id =
                sale.add_payment(input.method, amount, input.transaction_id, input.notes)?;
            tracing::info!(payment_id = %payment_id, amount = %amount, paid = sale.is_paid(), "payment added");
            self.commit(sale)
        })
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, sale_id = %input.sale_id))]
    pub fn cancel_sale(&self, tenant_id: TenantId, input: CancelSaleInput) -> ServiceResult<SaleOutput> {
        logged(|| {
            let mut sale = self.load(tenant_id, input.sale_id)?;
            sale.cancel(input.reason.as_deref())?;
            self.commit(sale)
        })
    }

    fn load(&self, tenant_id: TenantId, sale_id: SaleId) -> ServiceResult<Sale> {
        self.sales
            .find_by_id(tenant_id, sale_id)?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))
    }

    /// Point-in-time availability check over every location; takes no hold.
    fn ensure_available(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        requested: Quantity,
    ) -> ServiceResult<()> {
        let available = self.stocks.total_available_by_product(tenant_id, product_id)?;
        if available < requested {
            return Err(ServiceError::business_rule(format!(
                "Insufficient stock. Available: {available}, Requested: {requested}"
            )));
        }
        Ok(())
    }

    fn commit(&self, mut sale: Sale) -> ServiceResult<SaleOutput> {
        self.sales.save(&sale)?;

        let first_sequence = sale.persisted_version() + 1;
        let events = sale.take_domain_events();
        let output = SaleOutput::from(&sale);
        tracing::info!(
            status = %sale.status(),
            total = %sale.total(),
            events = events.len(),
            "sale saved"
        );

        publish(
            &self.bus,
            sale.tenant_id(),
            sale.id_typed().0,
            SALE_AGGREGATE,
            first_sequence,
            &events,
        )?;
        Ok(output)
    }
}
