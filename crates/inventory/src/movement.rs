//! Stock movements: the append-only inventory ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{Entity, EntityId, Quantity, TenantId, UserId, typed_id};
use vendora_products::ProductId;

use crate::stock::StockId;

typed_id!(StockMovementId(EntityId), "Stock movement (ledger entry) identifier.");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    In,
    Out,
    Adjustment,
    Transfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementReason {
    Purchase,
    Sale,
    Return,
    Adjustment,
    TransferIn,
    TransferOut,
    Loss,
    Damaged,
}

impl MovementReason {
    /// Reasons accepted by a plain stock increase.
    pub fn is_inbound(self) -> bool {
        matches!(self, MovementReason::Purchase | MovementReason::Return)
    }

    /// Reasons accepted by a plain stock decrease.
    pub fn is_outbound(self) -> bool {
        matches!(
            self,
            MovementReason::Sale | MovementReason::Return | MovementReason::Loss | MovementReason::Damaged
        )
    }
}

/// Movement data carried inside the stock events that change on-hand quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementLine {
    pub movement_id: StockMovementId,
    pub kind: MovementKind,
    pub reason: MovementReason,
    /// Magnitude of the change (always non-negative).
    pub quantity: Quantity,
    pub previous_quantity: Quantity,
    pub current_quantity: Quantity,
    pub user_id: UserId,
    pub reference_id: Option<String>,
    pub notes: Option<String>,
}

/// Immutable ledger entry for exactly one quantity change of one stock.
///
/// There are no mutators: entries are created by the `Stock` aggregate and
/// never updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    id: StockMovementId,
    stock_id: StockId,
    product_id: ProductId,
    tenant_id: TenantId,
    kind: MovementKind,
    reason: MovementReason,
    quantity: Quantity,
    previous_quantity: Quantity,
    current_quantity: Quantity,
    reference_id: Option<String>,
    notes: Option<String>,
    user_id: UserId,
    created_at: DateTime<Utc>,
}

impl StockMovement {
    pub(crate) fn record(
        stock_id: StockId,
        product_id: ProductId,
        tenant_id: TenantId,
        line: &MovementLine,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: line.movement_id,
            stock_id,
            product_id,
            tenant_id,
            kind: line.kind,
            reason: line.reason,
            quantity: line.quantity,
            previous_quantity: line.previous_quantity,
            current_quantity: line.current_quantity,
            reference_id: line.reference_id.clone(),
            notes: line.notes.clone(),
            user_id: line.user_id,
            created_at,
        }
    }

    pub fn id_typed(&self) -> StockMovementId {
        self.id
    }

    pub fn stock_id(&self) -> StockId {
        self.stock_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn kind(&self) -> MovementKind {
        self.kind
    }

    pub fn reason(&self) -> MovementReason {
        self.reason
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn previous_quantity(&self) -> Quantity {
        self.previous_quantity
    }

    pub fn current_quantity(&self) -> Quantity {
        self.current_quantity
    }

    /// `current - previous`, negative for outgoing movements.
    pub fn signed_delta(&self) -> i128 {
        i128::from(self.current_quantity.value()) - i128::from(self.previous_quantity.value())
    }

    pub fn reference_id(&self) -> Option<&str> {
        self.reference_id.as_deref()
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for StockMovement {
    type Id = StockMovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
