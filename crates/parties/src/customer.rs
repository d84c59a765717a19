use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use vendora_core::{AggregateId, DomainError, DomainResult, TenantId, ValueObject, typed_id};

typed_id!(
    CustomerId(AggregateId),
    "Customer identifier (tenant-scoped via `tenant_id`)."
);

/// Contact email: trimmed, lower-cased, `local@domain`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(raw: &str) -> DomainResult<Self> {
        let email = raw.trim().to_lowercase();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(DomainError::validation(format!("invalid email '{email}'")));
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl ValueObject for Email {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomerStatus {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: CustomerId,
    tenant_id: TenantId,
    name: String,
    email: Option<Email>,
    status: CustomerStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn create(
        id: CustomerId,
        tenant_id: TenantId,
        name: &str,
        email: Option<&str>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("customer name cannot be empty"));
        }
        let now = Utc::now();
        Ok(Self {
            id,
            tenant_id,
            name: name.to_string(),
            email: email.map(Email::new).transpose()?,
            status: CustomerStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id_typed(&self) -> CustomerId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&Email> {
        self.email.as_ref()
    }

    pub fn status(&self) -> CustomerStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == CustomerStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn activate(&mut self) -> DomainResult<()> {
        if self.is_active() {
            return Err(DomainError::invariant("customer is already active"));
        }
        self.status = CustomerStatus::Active;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn deactivate(&mut self) -> DomainResult<()> {
        if !self.is_active() {
            return Err(DomainError::invariant("customer is already inactive"));
        }
        self.status = CustomerStatus::Inactive;
        self.updated_at = Utc::now();
        Ok(())
    }
}
