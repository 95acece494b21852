//! Synchronous publish/subscribe bus shared by all panes.
//!
//! Panes never hold references to each other; they publish typed events and
//! subscribe to the ones they care about. Delivery is synchronous and fan-out:
//! every handler registered for an event name when [`EventBus::emit`] starts
//! runs once, in subscription order, before `emit` returns.
//!
//! The handler list is snapshotted at the start of each emission, so a handler
//! registered while an emission is in progress only sees later ones. A handler
//! removed mid-emission is not invoked afterwards. The registry lock is never
//! held while a handler runs, which lets handlers subscribe, unsubscribe and
//! emit freely.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::events::BusEvent;

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Identifies one registration on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Entry {
    id: SubscriptionId,
    active: Arc<AtomicBool>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    topics: HashMap<&'static str, Vec<Entry>>,
}

impl Registry {
    fn remove(&mut self, name: &'static str, id: SubscriptionId) -> bool {
        let Some(entries) = self.topics.get_mut(name) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| {
            if entry.id == id {
                entry.active.store(false, Ordering::Release);
                false
            } else {
                true
            }
        });
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.topics.remove(name);
        }
        removed
    }
}

/// Typed event bus. Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `handler` to every future emission of `E`.
    pub fn on<E, F>(&self, handler: F) -> Subscription
    where
        E: BusEvent,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |detail: &dyn Any| {
            if let Some(event) = detail.downcast_ref::<E>() {
                handler(event);
            }
        });
        self.register(E::NAME, handler, Arc::new(AtomicBool::new(true)))
    }

    /// Subscribe `handler` to the next emission of `E` only.
    ///
    /// The registration deactivates itself before the handler runs, so a
    /// handler that re-emits `E` is still invoked at most once.
    pub fn once<E, F>(&self, handler: F) -> Subscription
    where
        E: BusEvent,
        F: FnOnce(&E) + Send + 'static,
    {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let slot = Mutex::new(Some(handler));
        let handler: Handler = Arc::new(move |detail: &dyn Any| {
            let Some(event) = detail.downcast_ref::<E>() else {
                return;
            };
            if flag.swap(false, Ordering::AcqRel) {
                let taken = slot.lock().take();
                if let Some(handler) = taken {
                    handler(event);
                }
            }
        });
        self.register(E::NAME, handler, active)
    }

    /// Remove the registration `id` for `E`. Returns whether it was present.
    pub fn off<E: BusEvent>(&self, id: SubscriptionId) -> bool {
        self.registry.lock().remove(E::NAME, id)
    }

    /// Deliver `detail` to every current subscriber of `E`.
    pub fn emit<E: BusEvent>(&self, detail: E) {
        let snapshot: Vec<Entry> = self
            .registry
            .lock()
            .topics
            .get(E::NAME)
            .cloned()
            .unwrap_or_default();

        tracing::trace!(event = E::NAME, subscribers = snapshot.len(), "emit");

        let detail: &dyn Any = &detail;
        for entry in &snapshot {
            if entry.active.load(Ordering::Acquire) {
                (entry.handler)(detail);
            }
        }

        // Spent `once` registrations
        if snapshot
            .iter()
            .any(|entry| !entry.active.load(Ordering::Acquire))
        {
            let mut registry = self.registry.lock();
            if let Some(entries) = registry.topics.get_mut(E::NAME) {
                entries.retain(|entry| entry.active.load(Ordering::Acquire));
                if entries.is_empty() {
                    registry.topics.remove(E::NAME);
                }
            }
        }
    }

    /// Number of live registrations for `E`.
    pub fn subscriber_count<E: BusEvent>(&self) -> usize {
        self.registry
            .lock()
            .topics
            .get(E::NAME)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.active.load(Ordering::Acquire))
                    .count()
            })
            .unwrap_or(0)
    }

    /// Number of live registrations across all events.
    pub fn total_subscribers(&self) -> usize {
        self.registry
            .lock()
            .topics
            .values()
            .flatten()
            .filter(|entry| entry.active.load(Ordering::Acquire))
            .count()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        let mut registry = self.registry.lock();
        for entry in registry.topics.values().flatten() {
            entry.active.store(false, Ordering::Release);
        }
        registry.topics.clear();
    }

    fn register(
        &self,
        name: &'static str,
        handler: Handler,
        active: Arc<AtomicBool>,
    ) -> Subscription {
        let mut registry = self.registry.lock();
        registry.next_id += 1;
        let id = SubscriptionId(registry.next_id);
        registry.topics.entry(name).or_default().push(Entry {
            id,
            active: Arc::clone(&active),
            handler,
        });

        Subscription {
            registry: Arc::downgrade(&self.registry),
            name,
            id,
            active,
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.total_subscribers())
            .finish()
    }
}

/// Handle returned by [`EventBus::on`] and [`EventBus::once`].
///
/// Dropping the handle does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    name: &'static str,
    id: SubscriptionId,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Event name this subscription listens to.
    pub fn event(&self) -> &'static str {
        self.name
    }

    /// `false` once unsubscribed or, for `once`, after firing.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn unsubscribe(self) {
        self.active.store(false, Ordering::Release);
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(self.name, self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.name)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{StoreAction, StoreChanged, TabActivated};
    use std::sync::atomic::AtomicUsize;

    fn changed(source: &str) -> StoreChanged {
        StoreChanged {
            source: source.into(),
            action: StoreAction::Update,
        }
    }

    #[test]
    fn fan_out_in_subscription_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            let _ = bus.on::<TabActivated, _>(move |event| {
                log.lock().push(format!("{tag}:{}", event.view));
            });
        }

        bus.emit(TabActivated::new("nodes"));
        assert_eq!(
            *log.lock(),
            vec!["first:nodes", "second:nodes", "third:nodes"]
        );
    }

    #[test]
    fn events_are_routed_by_name() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let _sub = bus.on::<StoreChanged, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.emit(TabActivated::new("nodes"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        bus.emit(changed("editor"));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_and_off_remove_handlers() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let first = bus.on::<StoreChanged, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&hits);
        let second = bus.on::<StoreChanged, _>(move |_| {
            counter.fetch_add(10, Ordering::SeqCst);
        });
        assert_eq!(bus.subscriber_count::<StoreChanged>(), 2);

        first.unsubscribe();
        assert!(bus.off::<StoreChanged>(second.id()));
        assert!(!bus.off::<StoreChanged>(second.id()));

        bus.emit(changed("editor"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count::<StoreChanged>(), 0);
    }

    #[test]
    fn subscribers_added_during_delivery_miss_current_emission() {
        let bus = EventBus::new();
        let late_hits = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let counter = Arc::clone(&late_hits);
        let _outer = bus.on::<TabActivated, _>(move |_| {
            let counter = Arc::clone(&counter);
            let _ = inner_bus.on::<TabActivated, _>(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.emit(TabActivated::new("a"));
        assert_eq!(late_hits.load(Ordering::SeqCst), 0);

        bus.emit(TabActivated::new("b"));
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_removed_mid_emission_is_skipped() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = Arc::clone(&victim);
        let _killer = bus.on::<TabActivated, _>(move |_| {
            if let Some(sub) = slot.lock().take() {
                sub.unsubscribe();
            }
        });
        let counter = Arc::clone(&hits);
        *victim.lock() = Some(bus.on::<TabActivated, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        bus.emit(TabActivated::new("a"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn once_fires_at_most_once_even_when_reemitting() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_bus = bus.clone();
        let counter = Arc::clone(&hits);
        let sub = bus.once::<StoreChanged, _>(move |event| {
            counter.fetch_add(1, Ordering::SeqCst);
            inner_bus.emit(event.clone());
        });

        bus.emit(changed("editor"));
        bus.emit(changed("editor"));

        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!sub.is_active());
        assert_eq!(bus.subscriber_count::<StoreChanged>(), 0);
    }

    #[test]
    fn once_can_be_cancelled_before_firing() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let sub = bus.once::<StoreChanged, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sub.unsubscribe();

        bus.emit(changed("editor"));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_drops_everything() {
        let bus = EventBus::new();
        let sub = bus.on::<TabActivated, _>(|_| {});
        let _other = bus.on::<StoreChanged, _>(|_| {});
        assert_eq!(bus.total_subscribers(), 2);

        bus.clear();
        assert_eq!(bus.total_subscribers(), 0);
        assert!(!sub.is_active());
    }
}
