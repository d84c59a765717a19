//! Inventory domain module.
//!
//! The `Stock` aggregate owns the on-hand and reserved quantity of one product
//! at one location. Every change to on-hand quantity produces exactly one
//! immutable `StockMovement` (the audit ledger) and one or more domain events.
//! Pure domain logic: no IO, no storage.

pub mod location;
pub mod movement;
pub mod stock;

pub use location::{Location, LocationKind};
pub use movement::{MovementKind, MovementLine, MovementReason, StockMovement, StockMovementId};
pub use stock::{
    AdjustStock, DecreaseStock, IncreaseStock, QuantityChanged, ReleaseReservedStock,
    ReservationChanged, ReserveStock, Stock, StockCommand, StockCreated, StockEvent, StockId,
    StockLevelsUpdated, StockLowLevel, StockSnapshot, TransferIn, TransferOut, UpdateLevels,
};
