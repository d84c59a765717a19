use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{
    Aggregate, AggregateId, AggregateRoot, DomainError, DomainResult, Quantity, TenantId, UserId,
    typed_id,
};
use vendora_events::{Event, Outbox, execute};
use vendora_products::ProductId;

use crate::location::Location;
use crate::movement::{MovementKind, MovementLine, MovementReason, StockMovement, StockMovementId};

typed_id!(
    StockId(AggregateId),
    "Stock identifier: one product held at one location."
);

/// Aggregate root: Stock.
///
/// Invariants:
/// - `reserved_quantity <= quantity`, so the available quantity is never negative;
/// - quantity only changes through a movement-producing command;
/// - low level means `quantity <= minimum_quantity`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stock {
    id: StockId,
    tenant_id: TenantId,
    product_id: ProductId,
    location: Location,
    quantity: Quantity,
    minimum_quantity: Quantity,
    maximum_quantity: Option<Quantity>,
    reserved_quantity: Quantity,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    outbox: Outbox<StockEvent>,
}

/// Persisted scalar form of a [`Stock`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub id: StockId,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub location: Location,
    pub quantity: Quantity,
    pub minimum_quantity: Quantity,
    pub maximum_quantity: Option<Quantity>,
    pub reserved_quantity: Quantity,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl Stock {
    /// Open a new stock record. Records `StockCreated`.
    pub fn create(
        id: StockId,
        tenant_id: TenantId,
        product_id: ProductId,
        location: Location,
        initial_quantity: Quantity,
        minimum_quantity: Quantity,
        maximum_quantity: Option<Quantity>,
    ) -> DomainResult<Self> {
        ensure_levels(minimum_quantity, maximum_quantity)?;

        let now = Utc::now();
        let created = StockEvent::StockCreated(StockCreated {
            tenant_id,
            stock_id: id,
            product_id,
            location_code: location.code().to_string(),
            initial_quantity,
            minimum_quantity,
            maximum_quantity,
            occurred_at: now,
        });

        let mut stock = Self {
            id,
            tenant_id,
            product_id,
            location,
            quantity: Quantity::ZERO,
            minimum_quantity: Quantity::ZERO,
            maximum_quantity: None,
            reserved_quantity: Quantity::ZERO,
            created_at: now,
            updated_at: now,
            version: 0,
            outbox: Outbox::new(),
        };
        stock.apply(&created);
        stock.outbox.record(created);
        Ok(stock)
    }

    /// Rehydrate from persisted fields. Records no events.
    pub fn restore(snapshot: StockSnapshot) -> DomainResult<Self> {
        ensure_levels(snapshot.minimum_quantity, snapshot.maximum_quantity)?;
        if snapshot.reserved_quantity > snapshot.quantity {
            return Err(DomainError::invariant(format!(
                "stock {} has more reserved ({}) than on hand ({})",
                snapshot.id, snapshot.reserved_quantity, snapshot.quantity
            )));
        }
        Ok(Self {
            id: snapshot.id,
            tenant_id: snapshot.tenant_id,
            product_id: snapshot.product_id,
            location: snapshot.location,
            quantity: snapshot.quantity,
            minimum_quantity: snapshot.minimum_quantity,
            maximum_quantity: snapshot.maximum_quantity,
            reserved_quantity: snapshot.reserved_quantity,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            version: snapshot.version,
            outbox: Outbox::new(),
        })
    }

    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            id: self.id,
            tenant_id: self.tenant_id,
            product_id: self.product_id,
            location: self.location.clone(),
            quantity: self.quantity,
            minimum_quantity: self.minimum_quantity,
            maximum_quantity: self.maximum_quantity,
            reserved_quantity: self.reserved_quantity,
            created_at: self.created_at,
            updated_at: self.updated_at,
            version: self.version,
        }
    }

    pub fn id_typed(&self) -> StockId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn minimum_quantity(&self) -> Quantity {
        self.minimum_quantity
    }

    pub fn maximum_quantity(&self) -> Option<Quantity> {
        self.maximum_quantity
    }

    pub fn reserved_quantity(&self) -> Quantity {
        self.reserved_quantity
    }

    /// On-hand minus reserved.
    pub fn available_quantity(&self) -> Quantity {
        self.quantity.saturating_sub(self.reserved_quantity)
    }

    pub fn has_available_quantity(&self, quantity: Quantity) -> bool {
        self.available_quantity() >= quantity
    }

    pub fn is_low_level(&self) -> bool {
        self.quantity <= self.minimum_quantity
    }

    pub fn is_over_maximum(&self) -> bool {
        self.maximum_quantity.is_some_and(|max| self.quantity > max)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn domain_events(&self) -> &[StockEvent] {
        self.outbox.events()
    }

    pub fn take_domain_events(&mut self) -> Vec<StockEvent> {
        self.outbox.take()
    }

    pub fn clear_domain_events(&mut self) {
        self.outbox.clear();
    }

    /// Version the store last saw: current version minus pending events.
    pub fn persisted_version(&self) -> u64 {
        self.version - self.outbox.len() as u64
    }
}

impl AggregateRoot for Stock {
    type Id = StockId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: IncreaseStock (goods received).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncreaseStock {
    pub movement_id: StockMovementId,
    pub quantity: Quantity,
    pub reason: MovementReason,
    pub user_id: UserId,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DecreaseStock (goods leaving: sale fulfilment, loss, damage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseStock {
    pub movement_id: StockMovementId,
    pub quantity: Quantity,
    pub reason: MovementReason,
    pub user_id: UserId,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock (stock-take; sets an absolute quantity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub movement_id: StockMovementId,
    pub new_quantity: Quantity,
    pub user_id: UserId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReserveStock (soft hold, no ledger entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReleaseReservedStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReservedStock {
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransferOut (outgoing leg of a location transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOut {
    pub movement_id: StockMovementId,
    pub quantity: Quantity,
    pub user_id: UserId,
    /// Counterpart stock of the transfer.
    pub reference_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransferIn (incoming leg of a location transfer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIn {
    pub movement_id: StockMovementId,
    pub quantity: Quantity,
    pub user_id: UserId,
    pub reference_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateLevels. `None` keeps the current value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLevels {
    pub minimum_quantity: Option<Quantity>,
    pub maximum_quantity: Option<Quantity>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    Increase(IncreaseStock),
    Decrease(DecreaseStock),
    Adjust(AdjustStock),
    Reserve(ReserveStock),
    Release(ReleaseReservedStock),
    TransferOut(TransferOut),
    TransferIn(TransferIn),
    UpdateLevels(UpdateLevels),
}

/// Event: StockCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockCreated {
    pub tenant_id: TenantId,
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub location_code: String,
    pub initial_quantity: Quantity,
    pub minimum_quantity: Quantity,
    pub maximum_quantity: Option<Quantity>,
    pub occurred_at: DateTime<Utc>,
}

/// Payload shared by every event that changes on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChanged {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub location_code: String,
    pub movement: MovementLine,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockLowLevel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLowLevel {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub location_code: String,
    pub current_quantity: Quantity,
    pub minimum_quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Payload for reservation changes. `reserved_quantity` is the new total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationChanged {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub reserved_quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockLevelsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevelsUpdated {
    pub stock_id: StockId,
    pub minimum_quantity: Quantity,
    pub maximum_quantity: Option<Quantity>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    StockCreated(StockCreated),
    StockIncreased(QuantityChanged),
    StockDecreased(QuantityChanged),
    StockAdjusted(QuantityChanged),
    StockTransferredOut(QuantityChanged),
    StockTransferredIn(QuantityChanged),
    StockLowLevel(StockLowLevel),
    StockReserved(ReservationChanged),
    ReservedStockReleased(ReservationChanged),
    StockLevelsUpdated(StockLevelsUpdated),
}

impl StockEvent {
    fn quantity_change(&self) -> Option<&QuantityChanged> {
        match self {
            StockEvent::StockIncreased(e)
            | StockEvent::StockDecreased(e)
            | StockEvent::StockAdjusted(e)
            | StockEvent::StockTransferredOut(e)
            | StockEvent::StockTransferredIn(e) => Some(e),
            _ => None,
        }
    }
}

impl Event for StockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockEvent::StockCreated(_) => "inventory.stock.created",
            StockEvent::StockIncreased(_) => "inventory.stock.increased",
            StockEvent::StockDecreased(_) => "inventory.stock.decreased",
            StockEvent::StockAdjusted(_) => "inventory.stock.adjusted",
            StockEvent::StockTransferredOut(_) => "inventory.stock.transferred_out",
            StockEvent::StockTransferredIn(_) => "inventory.stock.transferred_in",
            StockEvent::StockLowLevel(_) => "inventory.stock.low_level",
            StockEvent::StockReserved(_) => "inventory.stock.reserved",
            StockEvent::ReservedStockReleased(_) => "inventory.stock.reservation_released",
            StockEvent::StockLevelsUpdated(_) => "inventory.stock.levels_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::StockCreated(e) => e.occurred_at,
            StockEvent::StockIncreased(e)
            | StockEvent::StockDecreased(e)
            | StockEvent::StockAdjusted(e)
            | StockEvent::StockTransferredOut(e)
            | StockEvent::StockTransferredIn(e) => e.occurred_at,
            StockEvent::StockLowLevel(e) => e.occurred_at,
            StockEvent::StockReserved(e) | StockEvent::ReservedStockReleased(e) => e.occurred_at,
            StockEvent::StockLevelsUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Stock {
    type Command = StockCommand;
    type Event = StockEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockEvent::StockCreated(e) => {
                self.quantity = e.initial_quantity;
                self.minimum_quantity = e.minimum_quantity;
                self.maximum_quantity = e.maximum_quantity;
                self.reserved_quantity = Quantity::ZERO;
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
            StockEvent::StockIncreased(e)
            | StockEvent::StockDecreased(e)
            | StockEvent::StockAdjusted(e)
            | StockEvent::StockTransferredOut(e)
            | StockEvent::StockTransferredIn(e) => {
                self.quantity = e.movement.current_quantity;
                self.updated_at = e.occurred_at;
            }
            StockEvent::StockLowLevel(_) => {}
            StockEvent::StockReserved(e) | StockEvent::ReservedStockReleased(e) => {
                self.reserved_quantity = e.reserved_quantity;
                self.updated_at = e.occurred_at;
            }
            StockEvent::StockLevelsUpdated(e) => {
                self.minimum_quantity = e.minimum_quantity;
                self.maximum_quantity = e.maximum_quantity;
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockCommand::Increase(cmd) => self.handle_increase(cmd),
            StockCommand::Decrease(cmd) => self.handle_decrease(cmd),
            StockCommand::Adjust(cmd) => self.handle_adjust(cmd),
            StockCommand::Reserve(cmd) => self.handle_reserve(cmd),
            StockCommand::Release(cmd) => self.handle_release(cmd),
            StockCommand::TransferOut(cmd) => self.handle_transfer_out(cmd),
            StockCommand::TransferIn(cmd) => self.handle_transfer_in(cmd),
            StockCommand::UpdateLevels(cmd) => self.handle_update_levels(cmd),
        }
    }
}

// Decision logic.
impl Stock {
    fn quantity_changed(&self, movement: MovementLine, occurred_at: DateTime<Utc>) -> QuantityChanged {
        QuantityChanged {
            stock_id: self.id,
            product_id: self.product_id,
            location_code: self.location.code().to_string(),
            movement,
            occurred_at,
        }
    }

    fn low_level_after(&self, new_quantity: Quantity, occurred_at: DateTime<Utc>) -> Option<StockEvent> {
        (new_quantity <= self.minimum_quantity).then(|| {
            StockEvent::StockLowLevel(StockLowLevel {
                stock_id: self.id,
                product_id: self.product_id,
                location_code: self.location.code().to_string(),
                current_quantity: new_quantity,
                minimum_quantity: self.minimum_quantity,
                occurred_at,
            })
        })
    }

    fn ensure_available(&self, quantity: Quantity) -> DomainResult<()> {
        if !self.has_available_quantity(quantity) {
            return Err(DomainError::invariant(format!(
                "insufficient stock at {}: available {}, requested {}",
                self.location.code(),
                self.available_quantity(),
                quantity
            )));
        }
        Ok(())
    }

    fn handle_increase(&self, cmd: &IncreaseStock) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        if !cmd.reason.is_inbound() {
            return Err(DomainError::validation(format!(
                "{:?} is not a valid reason for a stock increase",
                cmd.reason
            )));
        }
        let current = self.quantity.add(cmd.quantity)?;
        let movement = MovementLine {
            movement_id: cmd.movement_id,
            kind: MovementKind::In,
            reason: cmd.reason,
            quantity: cmd.quantity,
            previous_quantity: self.quantity,
            current_quantity: current,
            user_id: cmd.user_id,
            reference_id: cmd.reference_id.clone(),
            notes: cmd.notes.clone(),
        };
        Ok(vec![StockEvent::StockIncreased(
            self.quantity_changed(movement, cmd.occurred_at),
        )])
    }

    fn handle_decrease(&self, cmd: &DecreaseStock) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        if !cmd.reason.is_outbound() {
            return Err(DomainError::validation(format!(
                "{:?} is not a valid reason for a stock decrease",
                cmd.reason
            )));
        }
        self.ensure_available(cmd.quantity)?;

        let current = self.quantity.checked_sub(cmd.quantity)?;
        let movement = MovementLine {
            movement_id: cmd.movement_id,
            kind: MovementKind::Out,
            reason: cmd.reason,
            quantity: cmd.quantity,
            previous_quantity: self.quantity,
            current_quantity: current,
            user_id: cmd.user_id,
            reference_id: cmd.reference_id.clone(),
            notes: cmd.notes.clone(),
        };

        let mut events = vec![StockEvent::StockDecreased(
            self.quantity_changed(movement, cmd.occurred_at),
        )];
        events.extend(self.low_level_after(current, cmd.occurred_at));
        Ok(events)
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> DomainResult<Vec<StockEvent>> {
        if cmd.new_quantity < self.reserved_quantity {
            return Err(DomainError::invariant(format!(
                "cannot adjust stock to {} while {} units are reserved",
                cmd.new_quantity, self.reserved_quantity
            )));
        }

        let difference = if cmd.new_quantity >= self.quantity {
            cmd.new_quantity.saturating_sub(self.quantity)
        } else {
            self.quantity.saturating_sub(cmd.new_quantity)
        };
        let movement = MovementLine {
            movement_id: cmd.movement_id,
            kind: MovementKind::Adjustment,
            reason: MovementReason::Adjustment,
            quantity: difference,
            previous_quantity: self.quantity,
            current_quantity: cmd.new_quantity,
            user_id: cmd.user_id,
            reference_id: None,
            notes: cmd.notes.clone(),
        };

        let mut events = vec![StockEvent::StockAdjusted(
            self.quantity_changed(movement, cmd.occurred_at),
        )];
        events.extend(self.low_level_after(cmd.new_quantity, cmd.occurred_at));
        Ok(events)
    }

    fn handle_reserve(&self, cmd: &ReserveStock) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        self.ensure_available(cmd.quantity)?;
        Ok(vec![StockEvent::StockReserved(ReservationChanged {
            stock_id: self.id,
            product_id: self.product_id,
            quantity: cmd.quantity,
            reserved_quantity: self.reserved_quantity.add(cmd.quantity)?,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_release(&self, cmd: &ReleaseReservedStock) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        if cmd.quantity > self.reserved_quantity {
            return Err(DomainError::invariant(format!(
                "insufficient reserved quantity: reserved {}, requested {}",
                self.reserved_quantity, cmd.quantity
            )));
        }
        Ok(vec![StockEvent::ReservedStockReleased(ReservationChanged {
            stock_id: self.id,
            product_id: self.product_id,
            quantity: cmd.quantity,
            reserved_quantity: self.reserved_quantity.checked_sub(cmd.quantity)?,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transfer_out(&self, cmd: &TransferOut) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        self.ensure_available(cmd.quantity)?;

        let current = self.quantity.checked_sub(cmd.quantity)?;
        let movement = MovementLine {
            movement_id: cmd.movement_id,
            kind: MovementKind::Transfer,
            reason: MovementReason::TransferOut,
            quantity: cmd.quantity,
            previous_quantity: self.quantity,
            current_quantity: current,
            user_id: cmd.user_id,
            reference_id: cmd.reference_id.clone(),
            notes: None,
        };

        let mut events = vec![StockEvent::StockTransferredOut(
            self.quantity_changed(movement, cmd.occurred_at),
        )];
        events.extend(self.low_level_after(current, cmd.occurred_at));
        Ok(events)
    }

    fn handle_transfer_in(&self, cmd: &TransferIn) -> DomainResult<Vec<StockEvent>> {
        ensure_positive(cmd.quantity)?;
        let current = self.quantity.add(cmd.quantity)?;
        let movement = MovementLine {
            movement_id: cmd.movement_id,
            kind: MovementKind::Transfer,
            reason: MovementReason::TransferIn,
            quantity: cmd.quantity,
            previous_quantity: self.quantity,
            current_quantity: current,
            user_id: cmd.user_id,
            reference_id: cmd.reference_id.clone(),
            notes: None,
        };
        Ok(vec![StockEvent::StockTransferredIn(
            self.quantity_changed(movement, cmd.occurred_at),
        )])
    }

    fn handle_update_levels(&self, cmd: &UpdateLevels) -> DomainResult<Vec<StockEvent>> {
        let minimum = cmd.minimum_quantity.unwrap_or(self.minimum_quantity);
        let maximum = cmd.maximum_quantity.or(self.maximum_quantity);
        ensure_levels(minimum, maximum)?;
        Ok(vec![StockEvent::StockLevelsUpdated(StockLevelsUpdated {
            stock_id: self.id,
            minimum_quantity: minimum,
            maximum_quantity: maximum,
            occurred_at: cmd.occurred_at,
        })])
    }
}

// Public mutators: decide, apply, record.
impl Stock {
    fn run(&mut self, command: StockCommand) -> DomainResult<Vec<StockEvent>> {
        let events = execute(self, &command)?;
        self.outbox.extend(events.iter().cloned());
        Ok(events)
    }

    fn run_movement(&mut self, command: StockCommand) -> DomainResult<StockMovement> {
        let events = self.run(command)?;
        let change = events
            .iter()
            .find_map(StockEvent::quantity_change)
            .ok_or_else(|| DomainError::invariant("command did not produce a stock movement"))?;
        Ok(StockMovement::record(
            self.id,
            self.product_id,
            self.tenant_id,
            &change.movement,
            change.occurred_at,
        ))
    }

    /// Goods received. Returns the IN movement.
    pub fn increase(&mut self, cmd: IncreaseStock) -> DomainResult<StockMovement> {
        self.run_movement(StockCommand::Increase(cmd))
    }

    /// Goods leaving. Fails without any change when `available < quantity`.
    pub fn decrease(&mut self, cmd: DecreaseStock) -> DomainResult<StockMovement> {
        self.run_movement(StockCommand::Decrease(cmd))
    }

    /// Stock-take: set the absolute on-hand quantity.
    pub fn adjust(&mut self, cmd: AdjustStock) -> DomainResult<StockMovement> {
        self.run_movement(StockCommand::Adjust(cmd))
    }

    pub fn transfer_out(&mut self, cmd: TransferOut) -> DomainResult<StockMovement> {
        self.run_movement(StockCommand::TransferOut(cmd))
    }

    pub fn transfer_in(&mut self, cmd: TransferIn) -> DomainResult<StockMovement> {
        self.run_movement(StockCommand::TransferIn(cmd))
    }

    /// Purchase receipt of `quantity` units.
    pub fn increase_stock(&mut self, quantity: Quantity, user_id: UserId) -> DomainResult<StockMovement> {
        self.increase(IncreaseStock {
            movement_id: StockMovementId::generate(),
            quantity,
            reason: MovementReason::Purchase,
            user_id,
            reference_id: None,
            notes: None,
            occurred_at: Utc::now(),
        })
    }

    pub fn decrease_stock(
        &mut self,
        quantity: Quantity,
        user_id: UserId,
        reason: MovementReason,
    ) -> DomainResult<StockMovement> {
        self.decrease(DecreaseStock {
            movement_id: StockMovementId::generate(),
            quantity,
            reason,
            user_id,
            reference_id: None,
            notes: None,
            occurred_at: Utc::now(),
        })
    }

    pub fn adjust_stock(
        &mut self,
        new_quantity: Quantity,
        user_id: UserId,
        notes: Option<String>,
    ) -> DomainResult<StockMovement> {
        self.adjust(AdjustStock {
            movement_id: StockMovementId::generate(),
            new_quantity,
            user_id,
            notes,
            occurred_at: Utc::now(),
        })
    }

    /// Soft hold; produces no movement.
    pub fn reserve_stock(&mut self, quantity: Quantity) -> DomainResult<()> {
        self.run(StockCommand::Reserve(ReserveStock {
            quantity,
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    pub fn release_reserved_stock(&mut self, quantity: Quantity) -> DomainResult<()> {
        self.run(StockCommand::Release(ReleaseReservedStock {
            quantity,
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    pub fn update_minimum_quantity(&mut self, quantity: Quantity) -> DomainResult<()> {
        self.run(StockCommand::UpdateLevels(UpdateLevels {
            minimum_quantity: Some(quantity),
            maximum_quantity: None,
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }

    pub fn update_maximum_quantity(&mut self, quantity: Quantity) -> DomainResult<()> {
        self.run(StockCommand::UpdateLevels(UpdateLevels {
            minimum_quantity: None,
            maximum_quantity: Some(quantity),
            occurred_at: Utc::now(),
        }))
        .map(|_| ())
    }
}

fn ensure_positive(quantity: Quantity) -> DomainResult<()> {
    if quantity.is_zero() {
        return Err(DomainError::validation("quantity must be greater than zero"));
    }
    Ok(())
}

fn ensure_levels(minimum: Quantity, maximum: Option<Quantity>) -> DomainResult<()> {
    if let Some(max) = maximum {
        if max < minimum {
            return Err(DomainError::validation(format!(
                "maximum quantity {max} cannot be below minimum quantity {minimum}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::LocationKind;

    fn qty(n: u64) -> Quantity {
        Quantity::from_u64(n)
    }

    fn stock_with(quantity: u64, minimum: u64) -> Stock {
        let mut stock = Stock::create(
            StockId::generate(),
            TenantId::new(),
            ProductId::generate(),
            Location::new("Main", "wh-1", LocationKind::Warehouse).unwrap(),
            qty(quantity),
            qty(minimum),
            None,
        )
        .unwrap();
        stock.clear_domain_events();
        stock
    }

    #[test]
    fn create_records_created_event() {
        let stock = Stock::create(
            StockId::generate(),
            TenantId::new(),
            ProductId::generate(),
            Location::new("Main", "wh-1", LocationKind::Warehouse).unwrap(),
            qty(10),
            qty(2),
            Some(qty(50)),
        )
        .unwrap();
        assert_eq!(stock.quantity(), qty(10));
        assert_eq!(stock.version(), 1);
        assert_eq!(stock.persisted_version(), 0);
        assert!(matches!(stock.domain_events(), [StockEvent::StockCreated(_)]));
    }

    #[test]
    fn create_rejects_maximum_below_minimum() {
        let err = Stock::create(
            StockId::generate(),
            TenantId::new(),
            ProductId::generate(),
            Location::new("Main", "wh-1", LocationKind::Warehouse).unwrap(),
            qty(10),
            qty(5),
            Some(qty(4)),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn decrease_into_low_level_emits_low_stock_event() {
        let mut stock = stock_with(10, 5);
        let user = UserId::new();

        let movement = stock.decrease_stock(qty(6), user, MovementReason::Sale).unwrap();

        assert_eq!(stock.quantity(), qty(4));
        assert_eq!(movement.kind(), MovementKind::Out);
        assert_eq!(movement.reason(), MovementReason::Sale);
        assert_eq!(movement.previous_quantity(), qty(10));
        assert_eq!(movement.current_quantity(), qty(4));
        assert_eq!(movement.quantity(), qty(6));
        assert_eq!(movement.user_id(), user);

        let events = stock.domain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], StockEvent::StockDecreased(_)));
        match &events[1] {
            StockEvent::StockLowLevel(e) => {
                assert_eq!(e.current_quantity, qty(4));
                assert_eq!(e.minimum_quantity, qty(5));
            }
            other => panic!("expected StockLowLevel, got {other:?}"),
        }
    }

    #[test]
    fn decrease_beyond_available_fails_without_mutation() {
        let mut stock = stock_with(10, 0);
        stock.reserve_stock(qty(4)).unwrap();
        stock.clear_domain_events();
        let before = stock.clone();

        let err = stock
            .decrease_stock(qty(7), UserId::new(), MovementReason::Sale)
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(stock, before);
    }

    #[test]
    fn increase_records_purchase_movement() {
        let mut stock = stock_with(3, 1);
        let movement = stock.increase_stock(qty(7), UserId::new()).unwrap();
        assert_eq!(stock.quantity(), qty(10));
        assert_eq!(movement.kind(), MovementKind::In);
        assert_eq!(movement.reason(), MovementReason::Purchase);
        assert_eq!(movement.signed_delta(), 7);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let mut stock = stock_with(3, 1);
        assert!(matches!(
            stock.increase_stock(Quantity::ZERO, UserId::new()),
            Err(DomainError::Validation(_))
        ));
        assert!(stock.reserve_stock(Quantity::ZERO).is_err());
    }

    #[test]
    fn sale_is_not_an_inbound_reason() {
        let mut stock = stock_with(3, 1);
        let err = stock
            .increase(IncreaseStock {
                movement_id: StockMovementId::generate(),
                quantity: qty(1),
                reason: MovementReason::Sale,
                user_id: UserId::new(),
                reference_id: None,
                notes: None,
                occurred_at: Utc::now(),
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn adjust_records_magnitude_and_direction() {
        let mut stock = stock_with(10, 2);
        let down = stock
            .adjust_stock(qty(7), UserId::new(), Some("count".into()))
            .unwrap();
        assert_eq!(down.kind(), MovementKind::Adjustment);
        assert_eq!(down.quantity(), qty(3));
        assert_eq!(down.signed_delta(), -3);
        assert_eq!(down.notes(), Some("count"));

        let up = stock.adjust_stock(qty(12), UserId::new(), None).unwrap();
        assert_eq!(up.quantity(), qty(5));
        assert_eq!(stock.quantity(), qty(12));
    }

    #[test]
    fn adjust_reports_low_level_in_either_direction() {
        let mut stock = stock_with(1, 5);
        stock.take_domain_events();

        stock.adjust_stock(qty(3), UserId::new(), None).unwrap();
        assert!(stock.is_low_level());
        let events = stock.take_domain_events();
        assert!(matches!(events[0], StockEvent::StockAdjusted(_)));
        assert!(matches!(
            events.get(1),
            Some(StockEvent::StockLowLevel(low)) if low.current_quantity == qty(3)
        ));

        stock.adjust_stock(qty(9), UserId::new(), None).unwrap();
        let events = stock.take_domain_events();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn adjust_cannot_drop_below_reserved() {
        let mut stock = stock_with(10, 0);
        stock.reserve_stock(qty(6)).unwrap();
        assert!(stock.adjust_stock(qty(5), UserId::new(), None).is_err());
        assert_eq!(stock.quantity(), qty(10));
    }

    #[test]
    fn reservation_moves_between_available_and_reserved() {
        let mut stock = stock_with(10, 0);

        stock.reserve_stock(qty(4)).unwrap();
        assert_eq!(stock.quantity(), qty(10));
        assert_eq!(stock.reserved_quantity(), qty(4));
        assert_eq!(stock.available_quantity(), qty(6));

        assert!(stock.reserve_stock(qty(7)).is_err());
        assert!(stock.release_reserved_stock(qty(5)).is_err());

        stock.release_reserved_stock(qty(4)).unwrap();
        assert_eq!(stock.available_quantity(), qty(10));
    }

    #[test]
    fn transfer_legs_use_transfer_kind() {
        let mut source = stock_with(8, 0);
        let mut target = stock_with(1, 0);

        let out = source
            .transfer_out(TransferOut {
                movement_id: StockMovementId::generate(),
                quantity: qty(5),
                user_id: UserId::new(),
                reference_id: Some(target.id_typed().to_string()),
                occurred_at: Utc::now(),
            })
            .unwrap();
        let inbound = target
            .transfer_in(TransferIn {
                movement_id: StockMovementId::generate(),
                quantity: qty(5),
                user_id: UserId::new(),
                reference_id: Some(source.id_typed().to_string()),
                occurred_at: Utc::now(),
            })
            .unwrap();

        assert_eq!(out.kind(), MovementKind::Transfer);
        assert_eq!(out.reason(), MovementReason::TransferOut);
        assert_eq!(inbound.reason(), MovementReason::TransferIn);
        assert_eq!(source.quantity(), qty(3));
        assert_eq!(target.quantity(), qty(6));
    }

    #[test]
    fn levels_drive_low_and_over_maximum() {
        let mut stock = stock_with(10, 2);
        assert!(!stock.is_low_level());

        stock.update_minimum_quantity(qty(10)).unwrap();
        assert!(stock.is_low_level());

        stock.update_maximum_quantity(qty(12)).unwrap();
        assert!(!stock.is_over_maximum());
        stock.increase_stock(qty(3), UserId::new()).unwrap();
        assert!(stock.is_over_maximum());

        assert!(stock.update_maximum_quantity(qty(5)).is_err());
    }

    #[test]
    fn restore_reproduces_derived_getters() {
        let mut live = stock_with(10, 5);
        live.reserve_stock(qty(3)).unwrap();
        live.decrease_stock(qty(4), UserId::new(), MovementReason::Sale).unwrap();

        let json = serde_json::to_string(&live.snapshot()).unwrap();
        let restored = Stock::restore(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.quantity(), live.quantity());
        assert_eq!(restored.available_quantity(), live.available_quantity());
        assert_eq!(restored.is_low_level(), live.is_low_level());
        assert_eq!(restored.version(), live.version());
        assert!(restored.domain_events().is_empty());
    }

    #[test]
    fn restore_rejects_reserved_above_on_hand() {
        let mut snapshot = stock_with(2, 0).snapshot();
        snapshot.reserved_quantity = qty(3);
        assert!(Stock::restore(snapshot).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Increase(u64),
            Decrease(u64),
            Adjust(u64),
            Reserve(u64),
            Release(u64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u64..50).prop_map(Op::Increase),
                (0u64..50).prop_map(Op::Decrease),
                (0u64..50).prop_map(Op::Adjust),
                (0u64..50).prop_map(Op::Reserve),
                (0u64..50).prop_map(Op::Release),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 500,
                ..ProptestConfig::default()
            })]

            /// Property: any operation sequence keeps reserved <= on hand, and a
            /// failed operation leaves the aggregate untouched.
            #[test]
            fn quantities_never_go_negative(initial in 0u64..50, ops in prop::collection::vec(op(), 1..40)) {
                let mut stock = stock_with(initial, 5);
                let user = UserId::new();

                for op in ops {
                    let before = stock.clone();
                    let result = match op {
                        Op::Increase(n) => stock.increase_stock(qty(n), user).map(|_| ()),
                        Op::Decrease(n) => stock.decrease_stock(qty(n), user, MovementReason::Sale).map(|_| ()),
                        Op::Adjust(n) => stock.adjust_stock(qty(n), user, None).map(|_| ()),
                        Op::Reserve(n) => stock.reserve_stock(qty(n)),
                        Op::Release(n) => stock.release_reserved_stock(qty(n)),
                    };
                    if result.is_err() {
                        prop_assert_eq!(&stock, &before);
                    }
                    prop_assert!(stock.reserved_quantity() <= stock.quantity());
                    prop_assert_eq!(
                        stock.available_quantity().value(),
                        stock.quantity().value() - stock.reserved_quantity().value()
                    );
                }
            }
        }
    }
}
