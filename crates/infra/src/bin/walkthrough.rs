//! Runs one sale end to end against the in-memory adapters and prints the
//! published event stream. Configure with `VENDORA_*` environment variables.

use std::sync::Arc;

use anyhow::Context;
use rust_decimal::Decimal;

use vendora_core::{Money, TenantId, UserId};
use vendora_events::{EventBus, InMemoryEventBus};
use vendora_infra::dto::{
    AddPaymentInput, AddSaleItemInput, ApplySaleDiscountInput, CreateSaleInput, CreateStockInput,
    RemoveStockInput,
};
use vendora_infra::in_memory::{
    InMemoryCustomerDirectory, InMemoryProductCatalog, InMemorySaleStore, InMemoryStockStore,
};
use vendora_infra::{Envelope, SalesService, ServiceConfig, StockService};
use vendora_inventory::LocationKind;
use vendora_parties::{Customer, CustomerId};
use vendora_products::{Product, ProductId};
use vendora_sales::PaymentMethod;

fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();
    vendora_observability::init(&config.log);

    let tenant_id = TenantId::new();
    let user_id = UserId::new();
    tracing::info!(%tenant_id, currency = %config.default_currency, "starting walkthrough");

    let customers = Arc::new(InMemoryCustomerDirectory::new());
    let catalog = Arc::new(InMemoryProductCatalog::new());
    let stocks = Arc::new(InMemoryStockStore::new());
    let bus: Arc<InMemoryEventBus<Envelope>> = Arc::new(InMemoryEventBus::new());
    let events = bus.subscribe();

    let customer = Customer::create(
        CustomerId::generate(),
        tenant_id,
        "Maria Silva",
        Some("maria@example.com"),
    )?;
    let customer_id = customer.id_typed();
    customers.insert(customer).context("seeding customer")?;

    let product = Product::create(
        ProductId::generate(),
        tenant_id,
        "COF-500",
        "Coffee beans 500g",
        Money::new(Decimal::new(5000, 2), config.default_currency)?,
    )?;
    let product_id = product.id_typed();
    catalog.insert(product).context("seeding product")?;

    let stock_service = StockService::new(catalog.clone(), stocks.clone(), bus.clone());
    let sales = SalesService::new(
        customers,
        catalog,
        stocks,
        Arc::new(InMemorySaleStore::new()),
        bus,
        config.clone(),
    );

    let stock = stock_service
        .create_stock(
            tenant_id,
            CreateStockInput {
                product_id,
                location_name: "Main warehouse".into(),
                location_code: "wh-01".into(),
                location_kind: LocationKind::Warehouse,
                initial_quantity: 10,
                minimum_quantity: 8,
                maximum_quantity: Some(100),
            },
        )
        .context("creating stock")?;
    tracing::info!(stock_id = %stock.id, location = %stock.location_code, quantity = stock.quantity, "stock opened");

    let sale = sales
        .create_sale(
            tenant_id,
            CreateSaleInput {
                customer_id,
                user_id,
                currency: None,
                notes: Some("walk-in".into()),
            },
        )
        .context("creating sale")?;
    tracing::info!(sale_id = %sale.id, status = %sale.status, "sale opened");

    let sale = sales
        .add_sale_item(
            tenant_id,
            AddSaleItemInput {
                sale_id: sale.id,
                product_id,
                quantity: 2,
                discount_percentage: None,
                discount_fixed: None,
            },
        )
        .context("adding item")?;
    tracing::info!(subtotal = %sale.subtotal, "item added");

    let sale = sales
        .apply_sale_discount(
            tenant_id,
            ApplySaleDiscountInput {
                sale_id: sale.id,
                discount_percentage: Some(Decimal::TEN),
                discount_fixed: None,
            },
        )
        .context("applying discount")?;
    tracing::info!(discount = %sale.discount_amount, total = %sale.total, "discount applied");

    let sale = sales.confirm_sale(tenant_id, sale.id).context("confirming sale")?;
    let sale = sales
        .add_payment(
            tenant_id,
            AddPaymentInput {
                sale_id: sale.id,
                method: PaymentMethod::Pix,
                amount: sale.total,
                transaction_id: Some("PIX-0001".into()),
                notes: None,
            },
        )
        .context("taking payment")?;
    tracing::info!(status = %sale.status, paid = %sale.total_paid, "payment taken");

    let removed = stock_service
        .remove_stock(
            tenant_id,
            RemoveStockInput {
                stock_id: stock.id,
                product_id,
                quantity: 2,
                user_id,
                reason: None,
                reference_id: Some(sale.id.to_string()),
                notes: None,
            },
        )
        .context("removing sold stock")?;
    tracing::info!(
        quantity = removed.stock.quantity,
        low = removed.stock.is_low_level,
        "stock removed"
    );

    for envelope in events.drain() {
        tracing::info!(
            aggregate = envelope.aggregate_type(),
            sequence = envelope.sequence_number(),
            event = envelope.event_type(),
            "published"
        );
    }
    Ok(())
}
