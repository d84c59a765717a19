//! Application-level error model.
//!
//! Domain crates only ever produce `DomainError`; stores only ever produce
//! `StoreError`. Use cases fold both into `ServiceError`, which is what callers
//! (an HTTP layer, a CLI, a worker) map to their own surface.

use thiserror::Error;

use vendora_core::DomainError;

/// Infrastructure fault raised by a store adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Stale write: the stored version moved since the aggregate was loaded.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A uniqueness constraint was violated.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// A stored record could not be turned back into a valid aggregate.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed or missing input; the caller can fix it and retry.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced entity does not exist for the tenant.
    #[error("{0} not found")]
    NotFound(String),

    /// A state-machine guard or cross-aggregate rule rejected the request.
    #[error("business rule violated: {0}")]
    BusinessRule(String),

    /// Concurrent modification detected by the store.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store failure: {0}")]
    Store(#[source] StoreError),

    /// The state change is persisted but its events could not be handed off.
    #[error("event publication failed after save: {0}")]
    Publish(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }

    pub fn not_found(resource: &str, id: impl core::fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id}"))
    }

    /// HTTP-equivalent status class.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::BusinessRule(_) => 422,
            ServiceError::Store(_) => 500,
            ServiceError::Publish(_) => 502,
        }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::BusinessRule(_) => "business_rule_violation",
            ServiceError::Store(_) => "store_error",
            ServiceError::Publish(_) => "publish_error",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                ServiceError::Validation(msg)
            }
            DomainError::InvariantViolation(msg) => ServiceError::BusinessRule(msg),
            DomainError::NotFound(what) => ServiceError::NotFound(what),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) | StoreError::Duplicate(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Store(other),
        }
    }
}

/// Log a failed use case at the level its class deserves.
pub(crate) fn log_failure(err: &ServiceError) {
    match err {
        ServiceError::Validation(_) | ServiceError::NotFound(_) => {
            tracing::debug!(code = err.code(), error = %err, "request rejected");
        }
        ServiceError::BusinessRule(_) | ServiceError::Conflict(_) => {
            tracing::warn!(code = err.code(), error = %err, "request rejected");
        }
        ServiceError::Store(_) | ServiceError::Publish(_) => {
            tracing::error!(code = err.code(), error = %err, "use case failed");
        }
    }
}
