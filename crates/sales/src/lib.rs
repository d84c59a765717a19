//! Sales domain module.
//!
//! The `Sale` aggregate runs a sale through DRAFT -> CONFIRMED -> PAID (or
//! CANCELLED), owning its immutable `SaleItem` lines and its `Payment`s and
//! recomputing totals on every change. Pure domain logic: no IO, no storage.

pub mod discount;
pub mod item;
pub mod payment;
pub mod sale;

pub use discount::{Discount, DiscountKind};
pub use item::{SaleItem, SaleItemId, SaleItemRecord};
pub use payment::{Payment, PaymentId, PaymentMethod, PaymentRecord, PaymentStatus};
pub use sale::{
    AddItem, AddPayment, CancelSale, ChangeItemQuantity, ConfirmSale, PaymentAdded, RemoveItem,
    Sale, SaleCancelled, SaleCommand, SaleConfirmed, SaleCreated, SaleDiscountChanged, SaleEvent,
    SaleId, SaleItemAdded, SaleItemRemoved, SaleItemReplaced, SalePaid, SaleSnapshot, SaleStatus,
    SaleTotals, SetItemDiscount, SetSaleDiscount,
};
