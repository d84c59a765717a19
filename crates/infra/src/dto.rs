//! Use-case inputs and outputs.
//!
//! Inputs carry raw caller values (signed quantities, bare decimals) so that
//! range checks happen in one place, inside the use case. Outputs are flat,
//! serializable views of the aggregates.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vendora_core::{AggregateRoot, Currency, UserId};
use vendora_inventory::{
    LocationKind, MovementKind, MovementReason, Stock, StockId, StockMovement, StockMovementId,
};
use vendora_parties::CustomerId;
use vendora_products::ProductId;
use vendora_sales::{
    DiscountKind, Payment, PaymentId, PaymentMethod, PaymentStatus, Sale, SaleId, SaleItem,
    SaleItemId, SaleStatus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: CustomerId,
    pub user_id: UserId,
    /// Falls back to the configured default currency.
    #[serde(default)]
    pub currency: Option<Currency>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddSaleItemInput {
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    /// Wins over `discount_percentage` when both are set.
    #[serde(default)]
    pub discount_fixed: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveSaleItemInput {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSaleItemQuantityInput {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
    pub quantity: i64,
}

/// Leaving both fields empty removes the sale-level discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySaleDiscountInput {
    pub sale_id: SaleId,
    #[serde(default)]
    pub discount_percentage: Option<Decimal>,
    #[serde(default)]
    pub discount_fixed: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPaymentInput {
    pub sale_id: SaleId,
    pub method: PaymentMethod,
    /// In the sale currency.
    pub amount: Decimal,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSaleInput {
    pub sale_id: SaleId,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateStockInput {
    pub product_id: ProductId,
    pub location_name: String,
    pub location_code: String,
    pub location_kind: LocationKind,
    pub initial_quantity: i64,
    pub minimum_quantity: i64,
    #[serde(default)]
    pub maximum_quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStockInput {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub user_id: UserId,
    /// PURCHASE when absent.
    #[serde(default)]
    pub reason: Option<MovementReason>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStockInput {
    pub stock_id: StockId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub user_id: UserId,
    /// SALE when absent.
    #[serde(default)]
    pub reason: Option<MovementReason>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStockInput {
    pub stock_id: StockId,
    pub new_quantity: i64,
    pub user_id: UserId,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStockInput {
    pub from_stock_id: StockId,
    pub to_stock_id: StockId,
    pub quantity: i64,
    pub user_id: UserId,
}

/// Used by both reserve and release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStockInput {
    pub stock_id: StockId,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemOutput {
    pub id: SaleItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: u64,
    pub unit_price: Decimal,
    pub discount_kind: Option<DiscountKind>,
    pub discount_value: Option<Decimal>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

impl From<&SaleItem> for SaleItemOutput {
    fn from(item: &SaleItem) -> Self {
        Self {
            id: item.id(),
            product_id: item.product_id(),
            product_name: item.product_name().to_string(),
            product_sku: item.product_sku().to_string(),
            quantity: item.quantity().value(),
            unit_price: item.unit_price().amount(),
            discount_kind: item.discount().map(|d| d.kind()),
            discount_value: item.discount().map(|d| d.value()),
            subtotal: item.subtotal().amount(),
            discount_amount: item.discount_amount().amount(),
            total: item.total().amount(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOutput {
    pub id: PaymentId,
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub transaction_id: Option<String>,
}

impl From<&Payment> for PaymentOutput {
    fn from(payment: &Payment) -> Self {
        Self {
            id: payment.id_typed(),
            method: payment.method(),
            amount: payment.amount().amount(),
            status: payment.status(),
            paid_at: payment.paid_at(),
            transaction_id: payment.transaction_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleOutput {
    pub id: SaleId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub status: SaleStatus,
    pub currency: Currency,
    pub items: Vec<SaleItemOutput>,
    pub payments: Vec<PaymentOutput>,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub total_paid: Decimal,
    pub remaining_amount: Decimal,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Sale> for SaleOutput {
    fn from(sale: &Sale) -> Self {
        Self {
            id: sale.id_typed(),
            customer_id: sale.customer_id(),
            customer_name: sale.customer_name().to_string(),
            status: sale.status(),
            currency: sale.currency(),
            items: sale.items().iter().map(SaleItemOutput::from).collect(),
            payments: sale.payments().iter().map(PaymentOutput::from).collect(),
            subtotal: sale.subtotal().amount(),
            discount_amount: sale.discount_amount().amount(),
            total: sale.total().amount(),
            total_paid: sale.total_paid().amount(),
            remaining_amount: sale.remaining_amount().amount(),
            notes: sale.notes().map(str::to_string),
            cancellation_reason: sale.cancellation_reason().map(str::to_string),
            version: sale.version(),
            created_at: sale.created_at(),
            updated_at: sale.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockOutput {
    pub id: StockId,
    pub product_id: ProductId,
    pub location_name: String,
    pub location_code: String,
    pub location_kind: LocationKind,
    pub quantity: u64,
    pub available_quantity: u64,
    pub reserved_quantity: u64,
    pub minimum_quantity: u64,
    pub maximum_quantity: Option<u64>,
    pub is_low_level: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<&Stock> for StockOutput {
    fn from(stock: &Stock) -> Self {
        Self {
            id: stock.id_typed(),
            product_id: stock.product_id(),
            location_name: stock.location().name().to_string(),
            location_code: stock.location().code().to_string(),
            location_kind: stock.location().kind(),
            quantity: stock.quantity().value(),
            available_quantity: stock.available_quantity().value(),
            reserved_quantity: stock.reserved_quantity().value(),
            minimum_quantity: stock.minimum_quantity().value(),
            maximum_quantity: stock.maximum_quantity().map(|q| q.value()),
            is_low_level: stock.is_low_level(),
            updated_at: stock.updated_at(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovementOutput {
    pub id: StockMovementId,
    pub stock_id: StockId,
    pub kind: MovementKind,
    pub reason: MovementReason,
    pub quantity: u64,
    pub previous_quantity: u64,
    pub current_quantity: u64,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<&StockMovement> for StockMovementOutput {
    fn from(movement: &StockMovement) -> Self {
        Self {
            id: movement.id_typed(),
            stock_id: movement.stock_id(),
            kind: movement.kind(),
            reason: movement.reason(),
            quantity: movement.quantity().value(),
            previous_quantity: movement.previous_quantity().value(),
            current_quantity: movement.current_quantity().value(),
            reference_id: movement.reference_id().map(str::to_string),
            notes: movement.notes().map(str::to_string),
            user_id: movement.user_id(),
            created_at: movement.created_at(),
        }
    }
}

/// Result of a ledger-producing stock operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockChangeOutput {
    pub stock: StockOutput,
    pub movement: StockMovementOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutput {
    pub from: StockChangeOutput,
    pub to: StockChangeOutput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_input_fields_default_to_none() {
        let input: AddSaleItemInput = serde_json::from_str(&format!(
            r#"{{"sale_id":"{}","product_id":"{}","quantity":2}}"#,
            SaleId::generate(),
            ProductId::generate()
        ))
        .unwrap();
        assert_eq!(input.quantity, 2);
        assert_eq!(input.discount_percentage, None);
        assert_eq!(input.discount_fixed, None);
    }

    #[test]
    fn payment_method_uses_wire_names() {
        let input: AddPaymentInput = serde_json::from_str(&format!(
            r#"{{"sale_id":"{}","method":"CREDIT_CARD","amount":"19.90"}}"#,
            SaleId::generate()
        ))
        .unwrap();
        assert_eq!(input.method, PaymentMethod::CreditCard);
        assert_eq!(input.amount, Decimal::new(1990, 2));
    }
}
