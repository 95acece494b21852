//! Rebroadcast of bus events for listeners that predate the typed bus.
//!
//! [`CompatBridge`] subscribes to selected event types and republishes each
//! emission as a [`LegacyEvent`] (name + JSON detail) on a process-wide
//! broadcast channel. The bridge is purely additive: nothing on the typed bus
//! depends on it.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::bus::{EventBus, Subscription};
use crate::events::{BusEvent, QueryCompleted, StoreChanged, StoreReady, TabActivated};

/// Untyped event as seen by legacy listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyEvent {
    pub name: String,
    pub detail: serde_json::Value,
}

/// Adapter from the typed bus to the legacy broadcast channel.
pub struct CompatBridge {
    bus: EventBus,
    tx: broadcast::Sender<LegacyEvent>,
    subscriptions: Vec<Subscription>,
}

impl CompatBridge {
    /// Create a bridge with its own broadcast channel of `capacity` slots.
    pub fn new(bus: &EventBus, capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self::with_sender(bus, tx)
    }

    /// Create a bridge publishing onto an existing channel.
    pub fn with_sender(bus: &EventBus, tx: broadcast::Sender<LegacyEvent>) -> Self {
        Self {
            bus: bus.clone(),
            tx,
            subscriptions: Vec::new(),
        }
    }

    /// Rebroadcast every emission of `E`.
    pub fn forward<E>(mut self) -> Self
    where
        E: BusEvent + Serialize,
    {
        let tx = self.tx.clone();
        let subscription = self.bus.on::<E, _>(move |event| {
            match serde_json::to_value(event) {
                Ok(detail) => {
                    // No legacy listeners is fine
                    let _ = tx.send(LegacyEvent {
                        name: E::NAME.to_string(),
                        detail,
                    });
                }
                Err(e) => tracing::warn!(event = E::NAME, error = %e, "could not rebroadcast event"),
            }
        });
        self.subscriptions.push(subscription);
        self
    }

    /// Rebroadcast all events defined in [`crate::events`].
    pub fn forward_standard(self) -> Self {
        self.forward::<TabActivated>()
            .forward::<StoreChanged>()
            .forward::<StoreReady>()
            .forward::<QueryCompleted>()
    }

    /// Receive rebroadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<LegacyEvent> {
        self.tx.subscribe()
    }

    pub fn sender(&self) -> broadcast::Sender<LegacyEvent> {
        self.tx.clone()
    }

    /// Stop rebroadcasting.
    pub fn detach(self) {
        for subscription in self.subscriptions {
            subscription.unsubscribe();
        }
    }
}
