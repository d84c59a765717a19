use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{
    AggregateId, DomainError, DomainResult, Money, TenantId, ValueObject, typed_id,
};

typed_id!(
    ProductId(AggregateId),
    "Product identifier (tenant-scoped via `tenant_id`)."
);

/// Stock keeping unit: trimmed, upper-cased, non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub const MAX_LEN: usize = 64;

    pub fn new(raw: &str) -> DomainResult<Self> {
        let sku = raw.trim().to_uppercase();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        if sku.len() > Self::MAX_LEN {
            return Err(DomainError::validation(format!(
                "sku cannot exceed {} characters",
                Self::MAX_LEN
            )));
        }
        Ok(Self(sku))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sku {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Sku> for String {
    fn from(value: Sku) -> Self {
        value.0
    }
}

impl core::fmt::Display for Sku {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValueObject for Sku {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

/// Catalog product as seen by a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    tenant_id: TenantId,
    sku: Sku,
    name: String,
    price: Money,
    status: ProductStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Product {
    /// Register a new, active product.
    pub fn create(
        id: ProductId,
        tenant_id: TenantId,
        sku: &str,
        name: &str,
        price: Money,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            tenant_id,
            sku: Sku::new(sku)?,
            name: name.to_string(),
            price,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn sku(&self) -> &Sku {
        &self.sku
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> ProductStatus {
        self.status
    }

    /// Only active products may be sold or stocked.
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Existing sale items keep the price they were added with.
    pub fn change_price(&mut self, price: Money) {
        self.price = price;
        self.updated_at = Utc::now();
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.is_active() {
            return Err(DomainError::invariant("product is already active"));
        }
        self.status = ProductStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn deactivate(&mut self) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant("product is already inactive"));
        }
        self.status = ProductStatus::Inactive;
        self.updated_at = Utc::now();
        Ok(())
    }
}
