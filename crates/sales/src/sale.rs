use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{
    Aggregate, AggregateId, AggregateRoot, Currency, DomainError, DomainResult, Money, Quantity,
    TenantId, UserId, typed_id,
};
use vendora_events::{Event, Outbox, execute};
use vendora_parties::{Customer, CustomerId};
use vendora_products::{Product, ProductId, Sku};

use crate::discount::Discount;
use crate::item::{SaleItem, SaleItemId, SaleItemRecord};
use crate::payment::{Payment, PaymentId, PaymentMethod, PaymentRecord};

typed_id!(
    SaleId(AggregateId),
    "Sale identifier (tenant-scoped via `tenant_id`)."
);

/// Sale lifecycle.
///
/// `Draft -> Confirmed -> Paid`, and `Draft | Confirmed -> Cancelled`.
/// `Paid` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Draft,
    Confirmed,
    Paid,
    Cancelled,
}

impl core::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            SaleStatus::Draft => "DRAFT",
            SaleStatus::Confirmed => "CONFIRMED",
            SaleStatus::Paid => "PAID",
            SaleStatus::Cancelled => "CANCELLED",
        })
    }
}

/// Derived monetary state of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
}

impl SaleTotals {
    pub fn zero(currency: Currency) -> Self {
        Self {
            subtotal: Money::zero(currency),
            discount_amount: Money::zero(currency),
            total: Money::zero(currency),
        }
    }

    /// `subtotal = Σ item.total`, `discount_amount = discount(subtotal)`,
    /// `total = subtotal - discount_amount`.
    pub fn compute(
        currency: Currency,
        items: &[SaleItem],
        discount: Option<&Discount>,
    ) -> DomainResult<Self> {
        let subtotal = items
            .iter()
            .try_fold(Money::zero(currency), |acc, item| acc.add(&item.total()))?;
        let discount_amount = discount
            .map(|d| d.calculate(&subtotal))
            .unwrap_or_else(|| Money::zero(currency));
        let total = subtotal.checked_sub(&discount_amount)?;
        Ok(Self {
            subtotal,
            discount_amount,
            total,
        })
    }
}

/// Aggregate root: Sale.
///
/// Owns its items and payments. Totals are never assigned directly: every
/// command that changes items or discounts recomputes them from the candidate
/// item list before any event is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    tenant_id: TenantId,
    customer_id: CustomerId,
    customer_name: String,
    user_id: UserId,
    currency: Currency,
    items: Vec<SaleItem>,
    discount: Option<Discount>,
    status: SaleStatus,
    payments: Vec<Payment>,
    totals: SaleTotals,
    total_paid: Money,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    paid_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    cancellation_reason: Option<String>,
    version: u64,
    outbox: Outbox<SaleEvent>,
}

/// Persisted scalar form of a [`Sale`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleSnapshot {
    pub id: SaleId,
    pub tenant_id: TenantId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub user_id: UserId,
    pub currency: Currency,
    pub items: Vec<SaleItemRecord>,
    pub discount: Option<Discount>,
    pub status: SaleStatus,
    pub payments: Vec<PaymentRecord>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub version: u64,
}

impl Sale {
    /// Open a DRAFT sale for `customer`. Records `SaleCreated`.
    pub fn create(
        id: SaleId,
        tenant_id: TenantId,
        customer: &Customer,
        user_id: UserId,
        currency: Currency,
        notes: Option<String>,
    ) -> DomainResult<Self> {
        if customer.tenant_id() != tenant_id {
            return Err(DomainError::validation("customer belongs to another tenant"));
        }

        let now = Utc::now();
        let created = SaleEvent::SaleCreated(SaleCreated {
            tenant_id,
            sale_id: id,
            customer_id: customer.id_typed(),
            customer_name: customer.name().to_string(),
            user_id,
            currency,
            notes: non_blank(notes),
            occurred_at: now,
        });

        let mut sale = Self {
            id,
            tenant_id,
            customer_id: customer.id_typed(),
            customer_name: String::new(),
            user_id,
            currency,
            items: Vec::new(),
            discount: None,
            status: SaleStatus::Draft,
            payments: Vec::new(),
            totals: SaleTotals::zero(currency),
            total_paid: Money::zero(currency),
            notes: None,
            created_at: now,
            updated_at: now,
            confirmed_at: None,
            paid_at: None,
            cancelled_at: None,
            cancellation_reason: None,
            version: 0,
            outbox: Outbox::new(),
        };
        sale.apply(&created);
        sale.outbox.record(created);
        Ok(sale)
    }

    /// Rehydrate from persisted fields. Records no events.
    ///
    /// Fails when the stored totals or paid amount disagree with what the
    /// stored items, discount and payments produce.
    pub fn restore(snapshot: SaleSnapshot) -> DomainResult<Self> {
        let currency = snapshot.currency;
        let items = snapshot
            .items
            .into_iter()
            .map(SaleItem::restore)
            .collect::<DomainResult<Vec<_>>>()?;
        let payments = snapshot
            .payments
            .into_iter()
            .map(Payment::restore)
            .collect::<DomainResult<Vec<_>>>()?;

        for (index, item) in items.iter().enumerate() {
            if items[..index].iter().any(|other| other.product_id() == item.product_id()) {
                return Err(DomainError::invariant(format!(
                    "sale {} lists product {} twice",
                    snapshot.id,
                    item.product_id()
                )));
            }
        }

        let totals = SaleTotals::compute(currency, &items, snapshot.discount.as_ref())?;
        if totals.subtotal != snapshot.subtotal
            || totals.discount_amount != snapshot.discount_amount
            || totals.total != snapshot.total
        {
            return Err(DomainError::invariant(format!(
                "stored totals of sale {} do not match its items and discount",
                snapshot.id
            )));
        }

        let total_paid = confirmed_total(currency, &payments)?;
        if total_paid.is_greater_than(&totals.total)? {
            return Err(DomainError::invariant(format!(
                "sale {} is paid beyond its total",
                snapshot.id
            )));
        }

        Ok(Self {
            id: snapshot.id,
            tenant_id: snapshot.tenant_id,
            customer_id: snapshot.customer_id,
            customer_name: snapshot.customer_name,
            user_id: snapshot.user_id,
            currency,
            items,
            discount: snapshot.discount,
            status: snapshot.status,
            payments,
            totals,
            total_paid,
            notes: snapshot.notes,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            confirmed_at: snapshot.confirmed_at,
            paid_at: snapshot.paid_at,
            cancelled_at: snapshot.cancelled_at,
            cancellation_reason: snapshot.cancellation_reason,
            version: snapshot.version,
            outbox: Outbox::new(),
        })
    }

    pub fn snapshot(&self) -> SaleSnapshot {
        SaleSnapshot {
            id: self.id,
            tenant_id: self.tenant_id,
            customer_id: self.customer_id,
            customer_name: self.customer_name.clone(),
            user_id: self.user_id,
            currency: self.currency,
            items: self.items.iter().cloned().map(SaleItemRecord::from).collect(),
            discount: self.discount,
            status: self.status,
            payments: self.payments.iter().cloned().map(PaymentRecord::from).collect(),
            subtotal: self.totals.subtotal,
            discount_amount: self.totals.discount_amount,
            total: self.totals.total,
            notes: self.notes.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            confirmed_at: self.confirmed_at,
            paid_at: self.paid_at,
            cancelled_at: self.cancelled_at,
            cancellation_reason: self.cancellation_reason.clone(),
            version: self.version,
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn item(&self, item_id: SaleItemId) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.id() == item_id)
    }

    pub fn item_for_product(&self, product_id: ProductId) -> Option<&SaleItem> {
        self.items.iter().find(|i| i.product_id() == product_id)
    }

    pub fn items_count(&self) -> usize {
        self.items.len()
    }

    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn is_draft(&self) -> bool {
        self.status == SaleStatus::Draft
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == SaleStatus::Confirmed
    }

    pub fn is_paid(&self) -> bool {
        self.status == SaleStatus::Paid
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == SaleStatus::Cancelled
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn totals(&self) -> SaleTotals {
        self.totals
    }

    pub fn subtotal(&self) -> Money {
        self.totals.subtotal
    }

    pub fn discount_amount(&self) -> Money {
        self.totals.discount_amount
    }

    pub fn total(&self) -> Money {
        self.totals.total
    }

    /// Sum of confirmed payments.
    pub fn total_paid(&self) -> Money {
        self.total_paid
    }

    /// `max(0, total - total_paid)`.
    pub fn remaining_amount(&self) -> Money {
        // Both amounts are always in the sale currency.
        self.totals
            .total
            .saturating_sub(&self.total_paid)
            .unwrap_or_else(|_| Money::zero(self.currency))
    }

    pub fn is_fully_paid(&self) -> bool {
        self.total_paid.amount() >= self.totals.total.amount()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn paid_at(&self) -> Option<DateTime<Utc>> {
        self.paid_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    pub fn domain_events(&self) -> &[SaleEvent] {
        self.outbox.events()
    }

    pub fn take_domain_events(&mut self) -> Vec<SaleEvent> {
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

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: AddItem. Product data is the snapshot taken at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub item_id: SaleItemId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_sku: Sku,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub discount: Option<Discount>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItem {
    pub item_id: SaleItemId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeItemQuantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeItemQuantity {
    pub item_id: SaleItemId,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetItemDiscount. `None` removes the line discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetItemDiscount {
    pub item_id: SaleItemId,
    pub discount: Option<Discount>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetSaleDiscount. `None` removes the sale-level discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSaleDiscount {
    pub discount: Option<Discount>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ConfirmSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmSale {
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddPayment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPayment {
    pub payment_id: PaymentId,
    pub method: PaymentMethod,
    pub amount: Money,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelSale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelSale {
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleCommand {
    AddItem(AddItem),
    RemoveItem(RemoveItem),
    ChangeItemQuantity(ChangeItemQuantity),
    SetItemDiscount(SetItemDiscount),
    SetSaleDiscount(SetSaleDiscount),
    Confirm(ConfirmSale),
    AddPayment(AddPayment),
    Cancel(CancelSale),
}

/// Event: SaleCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCreated {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub user_id: UserId,
    pub currency: Currency,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemAdded {
    pub sale_id: SaleId,
    pub item: SaleItem,
    pub totals: SaleTotals,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleItemRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemRemoved {
    pub sale_id: SaleId,
    pub item_id: SaleItemId,
    pub product_id: ProductId,
    pub totals: SaleTotals,
    pub occurred_at: DateTime<Utc>,
}

/// Payload for events that replace an existing line with an edited value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItemReplaced {
    pub sale_id: SaleId,
    pub item: SaleItem,
    pub totals: SaleTotals,
    pub occurred_at: DateTime<Utc>,
}

/// Payload for sale-level discount changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDiscountChanged {
    pub sale_id: SaleId,
    pub discount: Option<Discount>,
    pub totals: SaleTotals,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleConfirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfirmed {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub customer_id: CustomerId,
    pub total: Money,
    pub items_count: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PaymentAdded. `total_paid` includes this payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAdded {
    pub sale_id: SaleId,
    pub payment: Payment,
    pub total_paid: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SalePaid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalePaid {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub total_paid: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SaleCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCancelled {
    pub tenant_id: TenantId,
    pub sale_id: SaleId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleEvent {
    SaleCreated(SaleCreated),
    SaleItemAdded(SaleItemAdded),
    SaleItemRemoved(SaleItemRemoved),
    SaleItemQuantityChanged(SaleItemReplaced),
    SaleItemDiscountApplied(SaleItemReplaced),
    SaleItemDiscountRemoved(SaleItemReplaced),
    SaleDiscountApplied(SaleDiscountChanged),
    SaleDiscountRemoved(SaleDiscountChanged),
    SaleConfirmed(SaleConfirmed),
    PaymentAdded(PaymentAdded),
    SalePaid(SalePaid),
    SaleCancelled(SaleCancelled),
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated(_) => "sales.sale.created",
            SaleEvent::SaleItemAdded(_) => "sales.sale.item_added",
            SaleEvent::SaleItemRemoved(_) => "sales.sale.item_removed",
            SaleEvent::SaleItemQuantityChanged(_) => "sales.sale.item_quantity_changed",
            SaleEvent::SaleItemDiscountApplied(_) => "sales.sale.item_discount_applied",
            SaleEvent::SaleItemDiscountRemoved(_) => "sales.sale.item_discount_removed",
            SaleEvent::SaleDiscountApplied(_) => "sales.sale.discount_applied",
            SaleEvent::SaleDiscountRemoved(_) => "sales.sale.discount_removed",
            SaleEvent::SaleConfirmed(_) => "sales.sale.confirmed",
            SaleEvent::PaymentAdded(_) => "sales.sale.payment_added",
            SaleEvent::SalePaid(_) => "sales.sale.paid",
            SaleEvent::SaleCancelled(_) => "sales.sale.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated(e) => e.occurred_at,
            SaleEvent::SaleItemAdded(e) => e.occurred_at,
            SaleEvent::SaleItemRemoved(e) => e.occurred_at,
            SaleEvent::SaleItemQuantityChanged(e)
            | SaleEvent::SaleItemDiscountApplied(e)
            | SaleEvent::SaleItemDiscountRemoved(e) => e.occurred_at,
            SaleEvent::SaleDiscountApplied(e) | SaleEvent::SaleDiscountRemoved(e) => e.occurred_at,
            SaleEvent::SaleConfirmed(e) => e.occurred_at,
            SaleEvent::PaymentAdded(e) => e.occurred_at,
            SaleEvent::SalePaid(e) => e.occurred_at,
            SaleEvent::SaleCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Sale {
    type Command = SaleCommand;
    type Event = SaleEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SaleEvent::SaleCreated(e) => {
                self.customer_id = e.customer_id;
                self.customer_name = e.customer_name.clone();
                self.user_id = e.user_id;
                self.currency = e.currency;
                self.notes = e.notes.clone();
                self.status = SaleStatus::Draft;
                self.totals = SaleTotals::zero(e.currency);
                self.total_paid = Money::zero(e.currency);
                self.created_at = e.occurred_at;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleItemAdded(e) => {
                self.items.push(e.item.clone());
                self.totals = e.totals;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleItemRemoved(e) => {
                self.items.retain(|i| i.id() != e.item_id);
                self.totals = e.totals;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleItemQuantityChanged(e)
            | SaleEvent::SaleItemDiscountApplied(e)
            | SaleEvent::SaleItemDiscountRemoved(e) => {
                if let Some(slot) = self.items.iter_mut().find(|i| i.id() == e.item.id()) {
                    *slot = e.item.clone();
                }
                self.totals = e.totals;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleDiscountApplied(e) | SaleEvent::SaleDiscountRemoved(e) => {
                self.discount = e.discount;
                self.totals = e.totals;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleConfirmed(e) => {
                self.status = SaleStatus::Confirmed;
                self.confirmed_at = Some(e.occurred_at);
                self.updated_at = e.occurred_at;
            }
            SaleEvent::PaymentAdded(e) => {
                self.payments.push(e.payment.clone());
                self.total_paid = e.total_paid;
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SalePaid(e) => {
                self.status = SaleStatus::Paid;
                self.paid_at = Some(e.occurred_at);
                self.updated_at = e.occurred_at;
            }
            SaleEvent::SaleCancelled(e) => {
                self.status = SaleStatus::Cancelled;
                self.cancelled_at = Some(e.occurred_at);
                self.cancellation_reason = e.reason.clone();
                self.updated_at = e.occurred_at;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SaleCommand::AddItem(cmd) => self.handle_add_item(cmd),
            SaleCommand::RemoveItem(cmd) => self.handle_remove_item(cmd),
            SaleCommand::ChangeItemQuantity(cmd) => self.handle_change_quantity(cmd),
            SaleCommand::SetItemDiscount(cmd) => self.handle_set_item_discount(cmd),
            SaleCommand::SetSaleDiscount(cmd) => self.handle_set_sale_discount(cmd),
            SaleCommand::Confirm(cmd) => self.handle_confirm(cmd),
            SaleCommand::AddPayment(cmd) => self.handle_add_payment(cmd),
            SaleCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

// Decision logic.
impl Sale {
    fn ensure_draft(&self, action: &str) -> DomainResult<()> {
        if self.status != SaleStatus::Draft {
            return Err(DomainError::invariant(format!(
                "cannot {action}: sale is {}, only DRAFT sales can be changed",
                self.status
            )));
        }
        Ok(())
    }

    fn item_index(&self, item_id: SaleItemId) -> DomainResult<usize> {
        self.items
            .iter()
            .position(|i| i.id() == item_id)
            .ok_or_else(|| DomainError::not_found(format!("sale item {item_id}")))
    }

    fn totals_for(&self, items: &[SaleItem], discount: Option<&Discount>) -> DomainResult<SaleTotals> {
        SaleTotals::compute(self.currency, items, discount)
    }

    fn handle_add_item(&self, cmd: &AddItem) -> DomainResult<Vec<SaleEvent>> {
        self.ensure_draft("add items")?;
        if cmd.unit_price.currency() != self.currency {
            return Err(DomainError::validation(format!(
                "item priced in {} cannot be added to a sale in {}",
                cmd.unit_price.currency(),
                self.currency
            )));
        }
        if self.item_for_product(cmd.product_id).is_some() {
            return Err(DomainError::invariant(format!(
                "product {} is already in the sale; update its quantity instead",
                cmd.product_id
            )));
        }

        let item = SaleItem::create(
            cmd.item_id,
            cmd.product_id,
            &cmd.product_name,
            cmd.product_sku.clone(),
            cmd.quantity,
            cmd.unit_price,
            cmd.discount,
        )?;

        let mut items = self.items.clone();
        items.push(item.clone());
        let totals = self.totals_for(&items, self.discount.as_ref())?;

        Ok(vec![SaleEvent::SaleItemAdded(SaleItemAdded {
            sale_id: self.id,
            item,
            totals,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_item(&self, cmd: &RemoveItem) -> DomainResult<Vec<SaleEvent>> {
        self.ensure_draft("remove items")?;
        let index = self.item_index(cmd.item_id)?;

        let mut items = self.items.clone();
        let removed = items.remove(index);
        let totals = self.totals_for(&items, self.discount.as_ref())?;

        Ok(vec![SaleEvent::SaleItemRemoved(SaleItemRemoved {
            sale_id: self.id,
            item_id: removed.id(),
            product_id: removed.product_id(),
            totals,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn replace_item(
        &self,
        index: usize,
        item: SaleItem,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<SaleItemReplaced> {
        let mut items = self.items.clone();
        items[index] = item.clone();
        let totals = self.totals_for(&items, self.discount.as_ref())?;
        Ok(SaleItemReplaced {
            sale_id: self.id,
            item,
            totals,
            occurred_at,
        })
    }

    fn handle_change_quantity(&self, cmd: &ChangeItemQuantity) -> DomainResult<Vec<SaleEvent>> {
        self.ensure_draft("update items")?;
        let index = self.item_index(cmd.item_id)?;
        let item = self.items[index].change_quantity(cmd.quantity)?;
        let replaced = self.replace_item(index, item, cmd.occurred_at)?;
        Ok(vec![SaleEvent::SaleItemQuantityChanged(replaced)])
    }

    fn handle_set_item_discount(&self, cmd: &SetItemDiscount) -> DomainResult<Vec<SaleEvent>> {
        self.ensure_draft("change item discounts")?;
        let index = self.item_index(cmd.item_id)?;
        let current = &self.items[index];
        Ok(vec![match cmd.discount {
            Some(discount) => SaleEvent::SaleItemDiscountApplied(self.replace_item(
                index,
                current.apply_discount(discount)?,
                cmd.occurred_at,
            )?),
            None => SaleEvent::SaleItemDiscountRemoved(self.replace_item(
                index,
                current.remove_discount()?,
                cmd.occurred_at,
            )?),
        }])
    }

    fn handle_set_sale_discount(&self, cmd: &SetSaleDiscount) -> DomainResult<Vec<SaleEvent>> {
        self.ensure_draft("change the sale discount")?;
        let changed = SaleDiscountChanged {
            sale_id: self.id,
            discount: cmd.discount,
            totals: self.totals_for(&self.items, cmd.discount.as_ref())?,
            occurred_at: cmd.occurred_at,
        };
        Ok(vec![match cmd.discount {
            Some(_) => SaleEvent::SaleDiscountApplied(changed),
            None => SaleEvent::SaleDiscountRemoved(changed),
        }])
    }

    fn handle_confirm(&self, cmd: &ConfirmSale) -> DomainResult<Vec<SaleEvent>> {
        if self.status != SaleStatus::Draft {
            return Err(DomainError::invariant(format!(
                "only DRAFT sales can be confirmed (current: {})",
                self.status
            )));
        }
        if self.items.is_empty() {
            return Err(DomainError::invariant("cannot confirm a sale without items"));
        }
        Ok(vec![SaleEvent::SaleConfirmed(SaleConfirmed {
            tenant_id: self.tenant_id,
            sale_id: self.id,
            customer_id: self.customer_id,
            total: self.totals.total,
            items_count: self.items.len(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_payment(&self, cmd: &AddPayment) -> DomainResult<Vec<SaleEvent>> {
        match self.status {
            SaleStatus::Cancelled => {
                return Err(DomainError::invariant("cannot add a payment to a cancelled sale"));
            }
            SaleStatus::Draft => {
                return Err(DomainError::invariant(
                    "sale must be confirmed before it can receive payments",
                ));
            }
            SaleStatus::Confirmed | SaleStatus::Paid => {}
        }
        if cmd.amount.currency() != self.currency {
            return Err(DomainError::validation(format!(
                "payment in {} cannot settle a sale in {}",
                cmd.amount.currency(),
                self.currency
            )));
        }

        let mut payment = Payment::create(
            cmd.payment_id,
            cmd.method,
            cmd.amount,
            cmd.transaction_id.clone(),
            cmd.notes.clone(),
            cmd.occurred_at,
        )?;

        let total_paid = self.total_paid.add(&cmd.amount)?;
        if total_paid.is_greater_than(&self.totals.total)? {
            return Err(DomainError::invariant(format!(
                "payment of {} exceeds the remaining amount {}",
                cmd.amount,
                self.remaining_amount()
            )));
        }

        // Settlement is synchronous: payments are confirmed as they are taken.
        payment.confirm(cmd.occurred_at)?;

        let mut events = vec![SaleEvent::PaymentAdded(PaymentAdded {
            sale_id: self.id,
            payment,
            total_paid,
            occurred_at: cmd.occurred_at,
        })];
        if !self.totals.total.is_greater_than(&total_paid)? {
            events.push(SaleEvent::SalePaid(SalePaid {
                tenant_id: self.tenant_id,
                sale_id: self.id,
                total_paid,
                occurred_at: cmd.occurred_at,
            }));
        }
        Ok(events)
    }

    fn handle_cancel(&self, cmd: &CancelSale) -> DomainResult<Vec<SaleEvent>> {
        match self.status {
            SaleStatus::Cancelled => return Err(DomainError::invariant("sale already cancelled")),
            SaleStatus::Paid => {
                return Err(DomainError::invariant("a paid sale cannot be cancelled"));
            }
            SaleStatus::Draft | SaleStatus::Confirmed => {}
        }
        if self.payments.iter().any(Payment::is_confirmed) {
            return Err(DomainError::invariant(
                "a sale with confirmed payments cannot be cancelled",
            ));
        }
        Ok(vec![SaleEvent::SaleCancelled(SaleCancelled {
            tenant_id: self.tenant_id,
            sale_id: self.id,
            reason: non_blank(cmd.reason.clone()),
            occurred_at: cmd.occurred_at,
        })])
    }
}

// Public mutators: decide, apply, record.
impl Sale {
    fn run(&mut self, command: SaleCommand) -> DomainResult<()> {
        let events = execute(self, &command)?;
        self.outbox.extend(events);
        Ok(())
    }

    /// Add `product` as a new line, snapshotting its name, sku and price.
    pub fn add_item(
        &mut self,
        product: &Product,
        quantity: Quantity,
        discount: Option<Discount>,
    ) -> DomainResult<SaleItemId> {
        if product.tenant_id() != self.tenant_id {
            return Err(DomainError::validation("product belongs to another tenant"));
        }
        let item_id = SaleItemId::generate();
        self.run(SaleCommand::AddItem(AddItem {
            item_id,
            product_id: product.id_typed(),
            product_name: product.name().to_string(),
            product_sku: product.sku().clone(),
            quantity,
            unit_price: product.price(),
            discount,
            occurred_at: Utc::now(),
        }))?;
        Ok(item_id)
    }

    pub fn remove_item(&mut self, item_id: SaleItemId) -> DomainResult<()> {
        self.run(SaleCommand::RemoveItem(RemoveItem {
            item_id,
            occurred_at: Utc::now(),
        }))
    }

    pub fn update_item_quantity(&mut self, item_id: SaleItemId, quantity: Quantity) -> DomainResult<()> {
        self.run(SaleCommand::ChangeItemQuantity(ChangeItemQuantity {
            item_id,
            quantity,
            occurred_at: Utc::now(),
        }))
    }

    pub fn apply_item_discount(&mut self, item_id: SaleItemId, discount: Discount) -> DomainResult<()> {
        self.run(SaleCommand::SetItemDiscount(SetItemDiscount {
            item_id,
            discount: Some(discount),
            occurred_at: Utc::now(),
        }))
    }

    pub fn remove_item_discount(&mut self, item_id: SaleItemId) -> DomainResult<()> {
        self.run(SaleCommand::SetItemDiscount(SetItemDiscount {
            item_id,
            discount: None,
            occurred_at: Utc::now(),
        }))
    }

    pub fn apply_sale_discount(&mut self, discount: Discount) -> DomainResult<()> {
        self.run(SaleCommand::SetSaleDiscount(SetSaleDiscount {
            discount: Some(discount),
            occurred_at: Utc::now(),
        }))
    }

    pub fn remove_sale_discount(&mut self) -> DomainResult<()> {
        self.run(SaleCommand::SetSaleDiscount(SetSaleDiscount {
            discount: None,
            occurred_at: Utc::now(),
        }))
    }

    pub fn confirm(&mut self) -> DomainResult<()> {
        self.run(SaleCommand::Confirm(ConfirmSale {
            occurred_at: Utc::now(),
        }))
    }

    /// Take a payment. Flips the sale to PAID when it settles the total.
    pub fn add_payment(
        &mut self,
        method: PaymentMethod,
        amount: Money,
        transaction_id: Option<String>,
        notes: Option<String>,
    ) -> DomainResult<PaymentId> {
        let payment_id = PaymentId::generate();
        self.run(SaleCommand::AddPayment(AddPayment {
            payment_id,
            method,
            amount,
            transaction_id,
            notes,
            occurred_at: Utc::now(),
        }))?;
        Ok(payment_id)
    }

    pub fn cancel(&mut self, reason: Option<&str>) -> DomainResult<()> {
        self.run(SaleCommand::Cancel(CancelSale {
            reason: reason.map(str::to_string),
            occurred_at: Utc::now(),
        }))
    }
}

fn confirmed_total(currency: Currency, payments: &[Payment]) -> DomainResult<Money> {
    payments
        .iter()
        .filter(|p| p.is_confirmed())
        .try_fold(Money::zero(currency), |acc, p| acc.add(&p.amount()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn brl(amount: Decimal) -> Money {
        Money::new(amount, Currency::BRL).unwrap()
    }

    fn draft_sale(tenant_id: TenantId) -> Sale {
        let customer =
            Customer::create(CustomerId::generate(), tenant_id, "Ana Souza", None).unwrap();
        let mut sale = Sale::create(
            SaleId::generate(),
            tenant_id,
            &customer,
            UserId::new(),
            Currency::BRL,
            None,
        )
        .unwrap();
        sale.clear_domain_events();
        sale
    }

    fn product(tenant_id: TenantId, sku: &str, price: Decimal) -> Product {
        Product::create(ProductId::generate(), tenant_id, sku, "Coffee", brl(price)).unwrap()
    }

    fn sale_with_total(total: Decimal) -> Sale {
        let tenant = TenantId::new();
        let mut sale = draft_sale(tenant);
        sale.add_item(&product(tenant, "P-1", total), Quantity::from_u64(1), None)
            .unwrap();
        sale.confirm().unwrap();
        sale.clear_domain_events();
        sale
    }

    #[test]
    fn create_starts_in_draft_with_zero_totals() {
        let tenant = TenantId::new();
        let customer = Customer::create(CustomerId::generate(), tenant, "Ana", None).unwrap();
        let sale = Sale::create(
            SaleId::generate(),
            tenant,
            &customer,
            UserId::new(),
            Currency::BRL,
            Some("  ".into()),
        )
        .unwrap();

        assert!(sale.is_draft());
        assert!(sale.total().is_zero());
        assert_eq!(sale.customer_name(), "Ana");
        assert_eq!(sale.notes(), None);
        assert_eq!(sale.version(), 1);
        assert!(matches!(sale.domain_events(), [SaleEvent::SaleCreated(_)]));
    }

    #[test]
    fn sale_discount_then_full_payment_marks_paid() {
        let tenant = TenantId::new();
        let mut sale = draft_sale(tenant);
        sale.add_item(&product(tenant, "P-1", dec!(100.00)), Quantity::from_u64(1), None)
            .unwrap();
        sale.apply_sale_discount(Discount::percentage(dec!(10)).unwrap())
            .unwrap();

        assert_eq!(sale.discount_amount().amount(), dec!(10.00));
        assert_eq!(sale.total().amount(), dec!(90.00));

        sale.confirm().unwrap();
        sale.add_payment(PaymentMethod::Cash, brl(dec!(90.00)), None, None)
            .unwrap();

        assert_eq!(sale.status(), SaleStatus::Paid);
        assert!(sale.remaining_amount().is_zero());
        assert!(sale.is_fully_paid());
        assert!(sale.paid_at().is_some());
        assert!(sale.payments()[0].is_confirmed());

        let paid_events = sale
            .domain_events()
            .iter()
            .filter(|e| matches!(e, SaleEvent::SalePaid(_)))
            .count();
        assert_eq!(paid_events, 1);
    }

    #[test]
    fn overpayment_fails_without_state_change() {
        let mut sale = sale_with_total(dec!(40));
        let before = sale.clone();

        let err = sale
            .add_payment(PaymentMethod::Pix, brl(dec!(50)), None, None)
            .unwrap_err();

        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(sale, before);
    }

    #[test]
    fn partial_payments_settle_once() {
        let mut sale = sale_with_total(dec!(40));
        sale.add_payment(PaymentMethod::CreditCard, brl(dec!(15)), Some("tx".into()), None)
            .unwrap();
        assert!(sale.is_confirmed());
        assert_eq!(sale.remaining_amount().amount(), dec!(25));

        sale.add_payment(PaymentMethod::Cash, brl(dec!(25)), None, None)
            .unwrap();
        assert!(sale.is_paid());

        assert!(sale.add_payment(PaymentMethod::Cash, brl(dec!(0.01)), None, None).is_err());
    }

    #[test]
    fn payment_requires_confirmed_sale_and_matching_currency() {
        let tenant = TenantId::new();
        let mut draft = draft_sale(tenant);
        draft.add_item(&product(tenant, "P-1", dec!(10)), Quantity::from_u64(1), None)
            .unwrap();
        assert!(draft.add_payment(PaymentMethod::Cash, brl(dec!(10)), None, None).is_err());

        let mut sale = sale_with_total(dec!(10));
        let usd = Money::new(dec!(10), Currency::USD).unwrap();
        assert!(matches!(
            sale.add_payment(PaymentMethod::Cash, usd, None, None),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn confirm_requires_items_and_draft() {
        let mut empty = draft_sale(TenantId::new());
        assert!(empty.confirm().is_err());

        let mut sale = sale_with_total(dec!(10));
        let before = sale.clone();
        assert!(matches!(sale.confirm(), Err(DomainError::InvariantViolation(_))));
        assert_eq!(sale, before);
    }

    #[test]
    fn items_can_only_change_in_draft() {
        let mut sale = sale_with_total(dec!(10));
        let tenant = sale.tenant_id();
        let err = sale
            .add_item(&product(tenant, "P-2", dec!(5)), Quantity::from_u64(1), None)
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));

        let item_id = sale.items()[0].id();
        assert!(sale.update_item_quantity(item_id, Quantity::from_u64(2)).is_err());
        assert!(sale.remove_item(item_id).is_err());
        assert!(sale.apply_sale_discount(Discount::fixed(dec!(1)).unwrap()).is_err());
    }

    #[test]
    fn duplicate_product_is_rejected() {
        let tenant = TenantId::new();
        let mut sale = draft_sale(tenant);
        let coffee = product(tenant, "P-1", dec!(8));
        sale.add_item(&coffee, Quantity::from_u64(1), None).unwrap();

        let err = sale.add_item(&coffee, Quantity::from_u64(2), None).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(sale.items_count(), 1);
    }

    #[test]
    fn editing_an_item_replaces_it_in_place() {
        let tenant = TenantId::new();
        let mut sale = draft_sale(tenant);
        let first = sale
            .add_item(&product(tenant, "A", dec!(10)), Quantity::from_u64(1), None)
            .unwrap();
        let second = sale
            .add_item(&product(tenant, "B", dec!(3)), Quantity::from_u64(2), None)
            .unwrap();

        sale.update_item_quantity(first, Quantity::from_u64(4)).unwrap();
        sale.apply_item_discount(second, Discount::fixed(dec!(1)).unwrap())
            .unwrap();

        let ids: Vec<_> = sale.items().iter().map(SaleItem::id).collect();
        assert_eq!(ids, vec![first, second]);
        assert_eq!(sale.subtotal().amount(), dec!(45));

        sale.remove_item_discount(second).unwrap();
        sale.remove_item(first).unwrap();
        assert_eq!(sale.total().amount(), dec!(6));
        assert!(matches!(
            sale.remove_item(first),
            Err(DomainError::NotFound(_))
        ));
    }

    #[test]
    fn removing_sale_discount_restores_total() {
        let tenant = TenantId::new();
        let mut sale = draft_sale(tenant);
        sale.add_item(&product(tenant, "A", dec!(20)), Quantity::from_u64(1), None)
            .unwrap();
        sale.apply_sale_discount(Discount::fixed(dec!(50)).unwrap())
            .unwrap();
        assert!(sale.total().is_zero());

        sale.remove_sale_discount().unwrap();
        assert_eq!(sale.total().amount(), dec!(20));
        assert!(sale.discount_amount().is_zero());
    }

    #[test]
    fn cancel_twice_fails_without_state_change() {
        let mut sale = sale_with_total(dec!(10));
        sale.cancel(Some("customer gave up")).unwrap();
        assert!(sale.is_cancelled());
        assert_eq!(sale.cancellation_reason(), Some("customer gave up"));

        let before = sale.clone();
        assert!(sale.cancel(None).is_err());
        assert_eq!(sale, before);
        assert!(sale.add_payment(PaymentMethod::Cash, brl(dec!(1)), None, None).is_err());
    }

    #[test]
    fn paid_or_partially_paid_sales_cannot_be_cancelled() {
        let mut partially = sale_with_total(dec!(10));
        partially
            .add_payment(PaymentMethod::Cash, brl(dec!(4)), None, None)
            .unwrap();
        assert!(partially.cancel(None).is_err());

        let mut paid = sale_with_total(dec!(10));
        paid.add_payment(PaymentMethod::Cash, brl(dec!(10)), None, None)
            .unwrap();
        assert!(paid.cancel(None).is_err());
    }

    #[test]
    fn restore_reproduces_derived_getters() {
        let tenant = TenantId::new();
        let mut live = draft_sale(tenant);
        live.add_item(
            &product(tenant, "A", dec!(12.35)),
            Quantity::from_u64(3),
            Some(Discount::percentage(dec!(7.5)).unwrap()),
        )
        .unwrap();
        live.apply_sale_discount(Discount::fixed(dec!(2)).unwrap())
            .unwrap();
        live.confirm().unwrap();
        live.add_payment(PaymentMethod::DebitCard, brl(dec!(5)), None, None)
            .unwrap();

        let json = serde_json::to_string(&live.snapshot()).unwrap();
        let restored = Sale::restore(serde_json::from_str(&json).unwrap()).unwrap();

        assert_eq!(restored.total(), live.total());
        assert_eq!(restored.subtotal(), live.subtotal());
        assert_eq!(restored.total_paid(), live.total_paid());
        assert_eq!(restored.remaining_amount(), live.remaining_amount());
        assert_eq!(restored.status(), live.status());
        assert_eq!(restored.version(), live.version());
        assert!(restored.domain_events().is_empty());
    }

    #[test]
    fn restore_rejects_inconsistent_totals() {
        let mut snapshot = sale_with_total(dec!(10)).snapshot();
        snapshot.total = brl(dec!(9));
        assert!(Sale::restore(snapshot).is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add { price_cents: u32, quantity: u64 },
            ChangeQuantity { slot: usize, quantity: u64 },
            ItemPercent { slot: usize, percent: u8 },
            SalePercent(u8),
            SaleFixed(u32),
            RemoveSaleDiscount,
            Remove { slot: usize },
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (1u32..100_000, 1u64..20).prop_map(|(price_cents, quantity)| Op::Add { price_cents, quantity }),
                (0usize..8, 0u64..20).prop_map(|(slot, quantity)| Op::ChangeQuantity { slot, quantity }),
                (0usize..8, 0u8..=100).prop_map(|(slot, percent)| Op::ItemPercent { slot, percent }),
                (0u8..=100).prop_map(Op::SalePercent),
                (0u32..200_000).prop_map(Op::SaleFixed),
                Just(Op::RemoveSaleDiscount),
                (0usize..8).prop_map(|slot| Op::Remove { slot }),
            ]
        }

        fn cents(value: u32) -> Decimal {
            Decimal::new(i64::from(value), 2)
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: after any item/discount mutation the stored totals equal
            /// the recomputation and the total is never negative.
            #[test]
            fn totals_always_match_recomputation(ops in prop::collection::vec(op(), 1..30)) {
                let tenant = TenantId::new();
                let mut sale = draft_sale(tenant);
                let mut sku = 0u32;

                for op in ops {
                    let slot_id = |slot: usize, sale: &Sale| {
                        sale.items().get(slot % sale.items_count().max(1)).map(SaleItem::id)
                    };
                    let _ = match op {
                        Op::Add { price_cents, quantity } => {
                            sku += 1;
                            let p = product(tenant, &format!("SKU-{sku}"), cents(price_cents));
                            sale.add_item(&p, Quantity::from_u64(quantity), None).map(|_| ())
                        }
                        Op::ChangeQuantity { slot, quantity } => match slot_id(slot, &sale) {
                            Some(id) => sale.update_item_quantity(id, Quantity::from_u64(quantity)),
                            None => Ok(()),
                        },
                        Op::ItemPercent { slot, percent } => match slot_id(slot, &sale) {
                            Some(id) => sale.apply_item_discount(
                                id,
                                Discount::percentage(Decimal::from(percent)).unwrap(),
                            ),
                            None => Ok(()),
                        },
                        Op::SalePercent(p) => {
                            sale.apply_sale_discount(Discount::percentage(Decimal::from(p)).unwrap())
                        }
                        Op::SaleFixed(c) => sale.apply_sale_discount(Discount::fixed(cents(c)).unwrap()),
                        Op::RemoveSaleDiscount => sale.remove_sale_discount(),
                        Op::Remove { slot } => match slot_id(slot, &sale) {
                            Some(id) => sale.remove_item(id),
                            None => Ok(()),
                        },
                    };

                    let expected = SaleTotals::compute(Currency::BRL, sale.items(), sale.discount()).unwrap();
                    prop_assert_eq!(sale.totals(), expected);

                    let item_sum: Decimal = sale.items().iter().map(|i| i.total().amount()).sum();
                    let expected_total = (item_sum - sale.discount_amount().amount()).max(Decimal::ZERO);
                    prop_assert_eq!(sale.total().amount(), expected_total);
                    prop_assert!(sale.total().amount() >= Decimal::ZERO);
                }
            }

            /// Property: payments never exceed the total, and the sale flips to
            /// PAID exactly once.
            #[test]
            fn payments_never_exceed_total(
                total_cents in 1u32..100_000,
                payments in prop::collection::vec(1u32..60_000, 1..12),
            ) {
                let mut sale = sale_with_total(cents(total_cents));
                let mut paid_events = 0;

                for amount in payments {
                    let _ = sale.add_payment(PaymentMethod::Cash, brl(cents(amount)), None, None);
                    paid_events += sale
                        .take_domain_events()
                        .iter()
                        .filter(|e| matches!(e, SaleEvent::SalePaid(_)))
                        .count();

                    prop_assert!(sale.total_paid().amount() <= sale.total().amount());
                    prop_assert_eq!(sale.is_paid(), sale.total_paid() == sale.total());
                }
                prop_assert!(paid_events <= 1);
                prop_assert_eq!(paid_events == 1, sale.is_paid());
            }
        }
    }
}
