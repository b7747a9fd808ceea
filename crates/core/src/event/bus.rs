use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::net::Envelope;

pub trait Observer: Send + Sync {
    fn notify(&self, envelope: &Envelope);
}

type Entry = (u64, Arc<dyn Observer>);

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn position(&self, observer: &Arc<dyn Observer>) -> Option<usize> {
        let key = identity(observer);
        self.entries.iter().position(|(_, o)| identity(o) == key)
    }
}

fn identity(observer: &Arc<dyn Observer>) -> *const () {
    Arc::as_ptr(observer) as *const ()
}

fn lock(registry: &Mutex<Registry>) -> MutexGuard<'_, Registry> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fans every inbound envelope out to the registered observers, in registration order.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` once per identity. A repeat registration returns an inert handle.
    pub fn subscribe(&self, observer: Arc<dyn Observer>) -> Subscription {
        let mut registry = lock(&self.registry);
        if registry.position(&observer).is_some() {
            log::debug!("Observer already subscribed");
            return Subscription::inert();
        }

        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, observer));
        Subscription {
            id: Some(id),
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn unsubscribe(&self, observer: &Arc<dyn Observer>) {
        let mut registry = lock(&self.registry);
        if let Some(index) = registry.position(observer) {
            registry.entries.remove(index);
        }
    }

    pub fn publish(&self, envelope: &Envelope) {
        // Observers may (un)subscribe while being notified.
        let observers: Vec<Arc<dyn Observer>> = lock(&self.registry)
            .entries
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();

        for observer in observers {
            observer.notify(envelope);
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keeps an observer registered for as long as it lives.
#[must_use = "dropping a Subscription unregisters the observer"]
pub struct Subscription {
    id: Option<u64>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            id: None,
            registry: Weak::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.registry.strong_count() > 0
    }

    /// Leaves the observer registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.id = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let (Some(id), Some(registry)) = (self.id, self.registry.upgrade()) else {
            return;
        };
        lock(&registry).entries.retain(|(entry, _)| *entry != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::KIND_CARRIER;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn count(&self) -> usize {
            self.seen.lock().unwrap().len()
        }
    }

    impl Observer for Recorder {
        fn notify(&self, envelope: &Envelope) {
            self.seen.lock().unwrap().push(envelope.kind.clone());
        }
    }

    fn envelope(kind: &str) -> Envelope {
        Envelope {
            kind: kind.to_string(),
            item_type: None,
            data: None,
        }
    }

    #[test]
    fn duplicate_subscribe_delivers_once() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn Observer> = recorder.clone();

        let first = bus.subscribe(Arc::clone(&observer));
        let second = bus.subscribe(Arc::clone(&observer));
        assert!(first.is_active());
        assert!(!second.is_active());
        assert_eq!(bus.len(), 1);

        bus.publish(&envelope(KIND_CARRIER));
        assert_eq!(recorder.count(), 1);

        drop(second);
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder::default());
        let subscription = bus.subscribe(recorder.clone());
        drop(subscription);

        bus.publish(&envelope(KIND_CARRIER));
        assert_eq!(recorder.count(), 0);
        assert!(bus.is_empty());
    }

    #[test]
    fn detached_subscription_stays_registered() {
        let bus = EventBus::new();
        let recorder = Arc::new(Recorder::default());
        bus.subscribe(recorder.clone()).detach();

        bus.publish(&envelope("scorecard"));
        assert_eq!(recorder.count(), 1);

        let observer: Arc<dyn Observer> = recorder.clone();
        bus.unsubscribe(&observer);
        bus.unsubscribe(&observer);
        bus.publish(&envelope("scorecard"));
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn notifies_in_registration_order() {
        struct Tagged(&'static str, Arc<Mutex<Vec<&'static str>>>);
        impl Observer for Tagged {
            fn notify(&self, _: &Envelope) {
                self.1.lock().unwrap().push(self.0);
            }
        }

        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let _a = bus.subscribe(Arc::new(Tagged("dock", order.clone())));
        let _b = bus.subscribe(Arc::new(Tagged("judge", order.clone())));
        bus.publish(&envelope(KIND_CARRIER));

        assert_eq!(*order.lock().unwrap(), ["dock", "judge"]);
    }

    #[test]
    fn observer_can_unsubscribe_itself_during_publish() {
        struct OneShot {
            bus: EventBus,
            me: Mutex<Option<Arc<dyn Observer>>>,
            hits: Mutex<u32>,
        }
        impl Observer for OneShot {
            fn notify(&self, _: &Envelope) {
                *self.hits.lock().unwrap() += 1;
                if let Some(me) = self.me.lock().unwrap().take() {
                    self.bus.unsubscribe(&me);
                }
            }
        }

        let bus = EventBus::new();
        let one_shot = Arc::new(OneShot {
            bus: bus.clone(),
            me: Mutex::new(None),
            hits: Mutex::new(0),
        });
        let observer: Arc<dyn Observer> = one_shot.clone();
        *one_shot.me.lock().unwrap() = Some(Arc::clone(&observer));
        bus.subscribe(observer).detach();

        bus.publish(&envelope(KIND_CARRIER));
        bus.publish(&envelope(KIND_CARRIER));
        assert_eq!(*one_shot.hits.lock().unwrap(), 1);
        assert!(bus.is_empty());
    }
}
