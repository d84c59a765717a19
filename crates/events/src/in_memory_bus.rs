//! Channel-backed bus that fans sale and stock envelopes out to local
//! subscribers. Used by the in-memory wiring and the tests.

use std::sync::{Mutex, mpsc};

use thiserror::Error;

use crate::bus::{EventBus, Subscription};

#[derive(Debug, Error)]
pub enum InMemoryBusError {
    /// A publisher panicked while holding the subscriber list.
    #[error("event bus lock poisoned")]
    Poisoned,
}

/// Every subscriber gets its own copy of each envelope, in publish order.
///
/// A subscriber only sees envelopes published after it subscribed. Since the
/// services publish after saving, a subscriber that drains late still sees the
/// envelopes of one aggregate in sequence order.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = InMemoryBusError;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        let mut subs = self.subscribers.lock().map_err(|_| InMemoryBusError::Poisoned)?;

        // A dropped Subscription closes its receiver; forget it here.
        subs.retain(|tx| tx.send(message.clone()).is_ok());

        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();

        // On a poisoned bus the subscription stays empty.
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        } else {
            tracing::warn!("subscribing to a poisoned in-memory bus");
        }

        Subscription::new(rx)
    }
}
