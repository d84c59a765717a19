//! Domain events: the trait every aggregate event implements, the outbox an
//! aggregate accumulates them in, and the envelope/bus used to hand them to
//! external consumers once the aggregate has been persisted.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod outbox;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use outbox::{Outbox, execute};
