use serde::{Deserialize, Serialize};

use vendora_core::{DomainError, DomainResult, EntityId, Money, Quantity, ValueObject, typed_id};
use vendora_products::{ProductId, Sku};

use crate::discount::Discount;

typed_id!(SaleItemId(EntityId), "Sale line identifier; stable across edits.");

/// One line of a sale.
///
/// Product name, sku and unit price are copied in when the line is created so
/// later catalog changes never rewrite a sale. Lines are values: editing one
/// returns a replacement carrying the same id with every amount recomputed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SaleItemRecord", into = "SaleItemRecord")]
pub struct SaleItem {
    id: SaleItemId,
    product_id: ProductId,
    product_name: String,
    product_sku: Sku,
    quantity: Quantity,
    unit_price: Money,
    discount: Option<Discount>,
    subtotal: Money,
    discount_amount: Money,
    total: Money,
}

/// Stored form of a [`SaleItem`], amounts included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRecord {
    pub id: SaleItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: Sku,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub discount: Option<Discount>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

impl SaleItem {
    pub fn create(
        id: SaleItemId,
        product_id: ProductId,
        product_name: &str,
        product_sku: Sku,
        quantity: Quantity,
        unit_price: Money,
        discount: Option<Discount>,
    ) -> DomainResult<Self> {
        let product_name = product_name.trim();
        if product_name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if quantity.is_zero() {
            return Err(DomainError::validation("item quantity must be greater than zero"));
        }

        let subtotal = unit_price.multiply(quantity)?;
        let discount_amount = discount
            .map(|d| d.calculate(&subtotal))
            .unwrap_or_else(|| Money::zero(unit_price.currency()));
        let total = subtotal.checked_sub(&discount_amount)?;

        Ok(Self {
            id,
            product_id,
            product_name: product_name.to_string(),
            product_sku,
            quantity,
            unit_price,
            discount,
            subtotal,
            discount_amount,
            total,
        })
    }

    /// Rebuild from a stored record, rejecting amounts that no longer match
    /// the recomputation.
    pub fn restore(record: SaleItemRecord) -> DomainResult<Self> {
        let item = Self::create(
            record.id,
            record.product_id,
            &record.product_name,
            record.product_sku,
            record.quantity,
            record.unit_price,
            record.discount,
        )?;
        if item.subtotal != record.subtotal
            || item.discount_amount != record.discount_amount
            || item.total != record.total
        {
            return Err(DomainError::invariant(format!(
                "stored amounts of sale item {} do not match its price, quantity and discount",
                record.id
            )));
        }
        Ok(item)
    }

    pub fn id(&self) -> SaleItemId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn product_sku(&self) -> &Sku {
        &self.product_sku
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// `unit_price * quantity`.
    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    /// `subtotal - discount_amount`.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn change_quantity(&self, quantity: Quantity) -> DomainResult<Self> {
        self.rebuild(quantity, self.discount)
    }

    pub fn apply_discount(&self, discount: Discount) -> DomainResult<Self> {
        self.rebuild(self.quantity, Some(discount))
    }

    pub fn remove_discount(&self) -> DomainResult<Self> {
        self.rebuild(self.quantity, None)
    }

    fn rebuild(&self, quantity: Quantity, discount: Option<Discount>) -> DomainResult<Self> {
        Self::create(
            self.id,
            self.product_id,
            &self.product_name,
            self.product_sku.clone(),
            quantity,
            self.unit_price,
            discount,
        )
    }
}

impl TryFrom<SaleItemRecord> for SaleItem {
    type Error = DomainError;

    fn try_from(value: SaleItemRecord) -> Result<Self, Self::Error> {
        Self::restore(value)
    }
}

impl From<SaleItem> for SaleItemRecord {
    fn from(value: SaleItem) -> Self {
        Self {
            id: value.id,
            product_id: value.product_id,
            product_name: value.product_name,
            product_sku: value.product_sku,
            quantity: value.quantity,
            unit_price: value.unit_price,
            discount: value.discount,
            subtotal: value.subtotal,
            discount_amount: value.discount_amount,
            total: value.total,
        }
    }
}

impl ValueObject for SaleItem {}
