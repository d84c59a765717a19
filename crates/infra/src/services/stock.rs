use std::slice;

use chrono::Utc;
use tracing::instrument;

use vendora_core::{Quantity, TenantId};
use vendora_events::EventBus;
use vendora_inventory::{
    DecreaseStock, IncreaseStock, Location, MovementReason, Stock, StockEvent, StockId,
    StockMovement, StockMovementId, TransferIn, TransferOut,
};
use vendora_products::{Product, ProductId};

use crate::dto::{
    AddStockInput, AdjustStockInput, CreateStockInput, RemoveStockInput, ReserveStockInput,
    StockChangeOutput, StockMovementOutput, StockOutput, TransferOutput, TransferStockInput,
};
use crate::error::{ServiceError, ServiceResult};
use crate::ports::{ProductLookup, StockChange, StockStore};
use crate::services::{Envelope, logged, positive_quantity, publish};

pub const STOCK_AGGREGATE: &str = "inventory.stock";

const NO_MOVEMENTS: &[StockMovement] = &[];

/// Stock use cases. Every ledger-producing operation persists the stock and
/// its movement in the same store call.
pub struct StockService<P, K, B> {
    products: P,
    stocks: K,
    bus: B,
}

impl<P, K, B> StockService<P, K, B>
where
    P: ProductLookup,
    K: StockStore,
    B: EventBus<Envelope>,
{
    pub fn new(products: P, stocks: K, bus: B) -> Self {
        Self {
            products,
            stocks,
            bus,
        }
    }

    /// Open a stock record for an active product at a location. One record
    /// per product and location code.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, product_id = %input.product_id, location = %input.location_code))]
    pub fn create_stock(&self, tenant_id: TenantId, input: CreateStockInput) -> ServiceResult<StockOutput> {
        logged(|| {
            let product = self.active_product(tenant_id, input.product_id, "create stock for")?;
            let location = Location::new(&input.location_name, &input.location_code, input.location_kind)?;

            if self
                .stocks
                .find_by_product_and_location(tenant_id, product.id_typed(), location.code())?
                .is_some()
            {
                return Err(ServiceError::Conflict(format!(
                    "stock for product {} at location {} already exists",
                    product.id_typed(),
                    location.code()
                )));
            }

            let mut stock = Stock::create(
                StockId::generate(),
                tenant_id,
                product.id_typed(),
                location,
                Quantity::new(input.initial_quantity)?,
                Quantity::new(input.minimum_quantity)?,
                input.maximum_quantity.map(Quantity::new).transpose()?,
            )?;

            self.commit(vec![(&mut stock, NO_MOVEMENTS)])?;
            Ok(StockOutput::from(&stock))
        })
    }

    /// Goods received (PURCHASE unless another inbound reason is given).
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, stock_id = %input.stock_id))]
    pub fn add_stock(&self, tenant_id: TenantId, input: AddStockInput) -> ServiceResult<StockChangeOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            let product = self.active_product(tenant_id, input.product_id, "add stock to")?;
            let mut stock = self.load_for_product(tenant_id, input.stock_id, &product)?;

            let movement = stock.increase(IncreaseStock {
                movement_id: StockMovementId::generate(),
                quantity,
                reason: input.reason.unwrap_or(MovementReason::Purchase),
                user_id: input.user_id,
                reference_id: input.reference_id,
                notes: input.notes,
                occurred_at: Utc::now(),
            })?;
            self.commit_one(stock, movement)
        })
    }

    /// Goods leaving (SALE unless another outbound reason is given). Fails
    /// when the available quantity is short.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, stock_id = %input.stock_id))]
    pub fn remove_stock(&self, tenant_id: TenantId, input: RemoveStockInput) -> ServiceResult<StockChangeOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            let product = self.active_product(tenant_id, input.product_id, "remove stock from")?;
            let mut stock = self.load_for_product(tenant_id, input.stock_id, &product)?;

            let movement = stock.decrease(DecreaseStock {
                movement_id: StockMovementId::generate(),
                quantity,
                reason: input.reason.unwrap_or(MovementReason::Sale),
                user_id: input.user_id,
                reference_id: input.reference_id,
                notes: input.notes,
                occurred_at: Utc::now(),
            })?;
            self.commit_one(stock, movement)
        })
    }

    /// Stock-take: set the absolute on-hand quantity.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, stock_id = %input.stock_id))]
    pub fn adjust_stock(&self, tenant_id: TenantId, input: AdjustStockInput) -> ServiceResult<StockChangeOutput> {
        logged(|| {
            let new_quantity = Quantity::new(input.new_quantity)?;
            let mut stock = self.load(tenant_id, input.stock_id)?;
            let movement = stock.adjust_stock(new_quantity, input.user_id, input.notes)?;
            self.commit_one(stock, movement)
        })
    }

    /// Move quantity between two locations of the same product. Both legs are
    /// saved together or not at all.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, from = %input.from_stock_id, to = %input.to_stock_id))]
    pub fn transfer_stock(&self, tenant_id: TenantId, input: TransferStockInput) -> ServiceResult<TransferOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            if input.from_stock_id == input.to_stock_id {
                return Err(ServiceError::validation("cannot transfer stock to the same location"));
            }

            let mut from = self.load(tenant_id, input.from_stock_id)?;
            let mut to = self.load(tenant_id, input.to_stock_id)?;
            if from.product_id() != to.product_id() {
                return Err(ServiceError::validation(
                    "stock can only be transferred between locations of the same product",
                ));
            }

            let now = Utc::now();
            let out = from.transfer_out(TransferOut {
                movement_id: StockMovementId::generate(),
                quantity,
                user_id: input.user_id,
                reference_id: Some(to.id_typed().to_string()),
                occurred_at: now,
            })?;
            let inbound = to.transfer_in(TransferIn {
                movement_id: StockMovementId::generate(),
                quantity,
                user_id: input.user_id,
                reference_id: Some(from.id_typed().to_string()),
                occurred_at: now,
            })?;

            self.commit(vec![
                (&mut from, slice::from_ref(&out)),
                (&mut to, slice::from_ref(&inbound)),
            ])?;
            Ok(TransferOutput {
                from: change_output(&from, &out),
                to: change_output(&to, &inbound),
            })
        })
    }

    /// Soft hold on available quantity; no ledger entry.
    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, stock_id = %input.stock_id))]
    pub fn reserve_stock(&self, tenant_id: TenantId, input: ReserveStockInput) -> ServiceResult<StockOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            let mut stock = self.load(tenant_id, input.stock_id)?;
            stock.reserve_stock(quantity)?;
            self.commit_without_movement(stock)
        })
    }

    #[instrument(skip(self, input), fields(tenant_id = %tenant_id, stock_id = %input.stock_id))]
    pub fn release_reserved_stock(
        &self,
        tenant_id: TenantId,
        input: ReserveStockInput,
    ) -> ServiceResult<StockOutput> {
        logged(|| {
            let quantity = positive_quantity(input.quantity)?;
            let mut stock = self.load(tenant_id, input.stock_id)?;
            stock.release_reserved_stock(quantity)?;
            self.commit_without_movement(stock)
        })
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id))]
    pub fn low_level_stocks(&self, tenant_id: TenantId) -> ServiceResult<Vec<StockOutput>> {
        logged(|| {
            let stocks = self.stocks.list_low_level(tenant_id)?;
            Ok(stocks.iter().map(StockOutput::from).collect())
        })
    }

    /// Ledger of one stock, oldest first.
    #[instrument(skip(self), fields(tenant_id = %tenant_id, stock_id = %stock_id))]
    pub fn movement_history(
        &self,
        tenant_id: TenantId,
        stock_id: StockId,
    ) -> ServiceResult<Vec<StockMovementOutput>> {
        logged(|| {
            let stock = self.load(tenant_id, stock_id)?;
            let movements = self.stocks.movements(tenant_id, stock.id_typed())?;
            Ok(movements.iter().map(StockMovementOutput::from).collect())
        })
    }

    fn active_product(&self, tenant_id: TenantId, product_id: ProductId, action: &str) -> ServiceResult<Product> {
        let product = self
            .products
            .find_by_id(tenant_id, product_id)?
            .ok_or_else(|| ServiceError::not_found("Product", product_id))?;
        if !product.is_active() {
            return Err(ServiceError::validation(format!("cannot {action} an inactive product")));
        }
        Ok(product)
    }

    fn load(&self, tenant_id: TenantId, stock_id: StockId) -> ServiceResult<Stock> {
        self.stocks
            .find_by_id(tenant_id, stock_id)?
            .ok_or_else(|| ServiceError::not_found("Stock", stock_id))
    }

    fn load_for_product(&self, tenant_id: TenantId, stock_id: StockId, product: &Product) -> ServiceResult<Stock> {
        let stock = self.load(tenant_id, stock_id)?;
        if stock.product_id() != product.id_typed() {
            return Err(ServiceError::validation(format!(
                "stock {stock_id} does not hold product {}",
                product.id_typed()
            )));
        }
        Ok(stock)
    }

    fn commit_one(&self, mut stock: Stock, movement: StockMovement) -> ServiceResult<StockChangeOutput> {
        self.commit(vec![(&mut stock, slice::from_ref(&movement))])?;
        Ok(change_output(&stock, &movement))
    }

    fn commit_without_movement(&self, mut stock: Stock) -> ServiceResult<StockOutput> {
        self.commit(vec![(&mut stock, NO_MOVEMENTS)])?;
        Ok(StockOutput::from(&stock))
    }

    /// Save every stock with its movements in one batch, then publish the
    /// drained events of each.
    fn commit(&self, changes: Vec<(&mut Stock, &[StockMovement])>) -> ServiceResult<()> {
        {
            let batch: Vec<StockChange<'_>> = changes
                .iter()
                .map(|(stock, movements)| StockChange { stock, movements })
                .collect();
            self.stocks.save_batch(&batch)?;
        }

        for (stock, movements) in changes {
            let first_sequence = stock.persisted_version() + 1;
            let events = stock.take_domain_events();

            for event in &events {
                if let StockEvent::StockLowLevel(low) = event {
                    tracing::warn!(
                        stock_id = %low.stock_id,
                        product_id = %low.product_id,
                        location = %low.location_code,
                        quantity = %low.current_quantity,
                        minimum = %low.minimum_quantity,
                        "stock at or below minimum level"
                    );
                }
            }
            tracing::info!(
                stock_id = %stock.id_typed(),
                quantity = %stock.quantity(),
                available = %stock.available_quantity(),
                movements = movements.len(),
                events = events.len(),
                "stock saved"
            );

            publish(
                &self.bus,
                stock.tenant_id(),
                stock.id_typed().0,
                STOCK_AGGREGATE,
                first_sequence,
                &events,
            )?;
        }
        Ok(())
    }
}

fn change_output(stock: &Stock, movement: &StockMovement) -> StockChangeOutput {
    StockChangeOutput {
        stock: StockOutput::from(stock),
        movement: StockMovementOutput::from(movement),
    }
}
