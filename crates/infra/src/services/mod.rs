//! Use cases: load aggregates through the ports, run one domain operation,
//! persist, then hand the drained events to the bus.
//!
//! Events are published only after the save succeeded. A publication failure
//! does not undo the save; it is reported as `ServiceError::Publish`.

pub mod sales;
pub mod stock;

pub use sales::SalesService;
pub use stock::StockService;

use serde::Serialize;
use serde_json::Value as JsonValue;

use vendora_core::{AggregateId, Quantity, TenantId};
use vendora_events::{Event, EventBus, EventEnvelope};

use crate::error::{ServiceError, ServiceResult, log_failure};

/// Envelope type every use case publishes.
pub type Envelope = EventEnvelope<JsonValue>;

/// Run a use case body and log its failure, if any, at the level its class
/// deserves.
fn logged<T>(body: impl FnOnce() -> ServiceResult<T>) -> ServiceResult<T> {
    body().inspect_err(log_failure)
}

/// Publish `events` for one aggregate. `first_sequence` is the sequence number
/// of the first event (the persisted version before the save, plus one).
fn publish<B, E>(
    bus: &B,
    tenant_id: TenantId,
    aggregate_id: AggregateId,
    aggregate_type: &str,
    first_sequence: u64,
    events: &[E],
) -> ServiceResult<()>
where
    B: EventBus<Envelope>,
    E: Event + Serialize,
{
    for (sequence, event) in (first_sequence..).zip(events) {
        let envelope = EventEnvelope::wrap(tenant_id, aggregate_id, aggregate_type, sequence, event)
            .map_err(|e| ServiceError::Publish(format!("serialize {}: {e}", event.event_type())))?;
        bus.publish(envelope)
            .map_err(|e| ServiceError::Publish(format!("{e:?}")))?;
        tracing::debug!(event_type = event.event_type(), sequence, "event published");
    }
    Ok(())
}

/// Parse a caller quantity that must be strictly positive.
fn positive_quantity(raw: i64) -> ServiceResult<Quantity> {
    if raw <= 0 {
        return Err(ServiceError::validation("quantity must be greater than zero"));
    }
    Ok(Quantity::new(raw)?)
}
