//! Per-aggregate outbox of recorded domain events.

use vendora_core::Aggregate;

/// Events recorded by an aggregate instance and not yet handed off.
///
/// The aggregate only appends; the service layer drains with [`Outbox::take`]
/// after the aggregate has been persisted. There is no global bus involved at
/// this point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbox<E> {
    pending: Vec<E>,
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<E> Outbox<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: E) {
        self.pending.push(event);
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = E>) {
        self.pending.extend(events);
    }

    pub fn events(&self) -> &[E] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every pending event, oldest first.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Execute an aggregate command deterministically (no IO, no async).
///
/// 1. **Decide**: `aggregate.handle(command)` validates every guard and
///    returns events without touching state.
/// 2. **Evolve**: each event is applied in order.
///
/// If `handle` fails nothing has been applied, which is what makes every
/// public mutator on the aggregates all-or-nothing. The caller records the
/// returned events in its outbox.
pub fn execute<A>(aggregate: &mut A, command: &A::Command) -> Result<Vec<A::Event>, A::Error>
where
    A: Aggregate,
{
    let events = A::handle(aggregate, command)?;
    for ev in &events {
        A::apply(aggregate, ev);
    }
    Ok(events)
}
