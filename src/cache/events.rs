//! Cache Events Module
//!
//! Event kinds, event payloads and the listener table used to observe
//! mutations and hits on a [`CacheStore`](crate::cache::CacheStore).

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::{CacheEntry, Snapshot};
use crate::error::{CacheError, ListenerError, Result};

/// String names of the recognized event kinds.
pub mod names {
    pub const SET: &str = "set";
    pub const GET: &str = "get";
    pub const REMOVE: &str = "remove";
}

// == Event Kind ==
/// The operations that dispatch events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Set,
    Get,
    Remove,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Set, EventKind::Get, EventKind::Remove];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Set => names::SET,
            EventKind::Get => names::GET,
            EventKind::Remove => names::REMOVE,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            names::SET => Ok(EventKind::Set),
            names::GET => Ok(EventKind::Get),
            names::REMOVE => Ok(EventKind::Remove),
            other => Err(CacheError::UnknownEvent(other.to_string())),
        }
    }
}

// == Event Payload ==
/// Event delivered to listeners.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEvent<'a, V> {
    pub event_name: EventKind,
    pub data: EventData<'a, V>,
}

/// What the event is about.
///
/// `value` and `cached_object` are `None` only for a `remove` of a key that
/// was not present. `store` is the entry map as it stands after the operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData<'a, V> {
    pub key: &'a str,
    pub value: Option<&'a V>,
    pub cached_object: Option<&'a CacheEntry<V>>,
    pub store: &'a Snapshot<V>,
}

impl<'a, V> CacheEvent<'a, V> {
    pub(crate) fn new(
        event_name: EventKind,
        key: &'a str,
        cached_object: Option<&'a CacheEntry<V>>,
        store: &'a Snapshot<V>,
    ) -> Self {
        Self {
            event_name,
            data: EventData {
                key,
                value: cached_object.map(|entry| &entry.value),
                cached_object,
                store,
            },
        }
    }
}

// == Listener Table ==
type Listener<V> = Arc<dyn Fn(&CacheEvent<'_, V>) -> std::result::Result<(), ListenerError> + Send + Sync>;

struct Registration<V> {
    id: u64,
    listener: Listener<V>,
}

struct ListenerTable<V> {
    next_id: u64,
    set: Vec<Registration<V>>,
    get: Vec<Registration<V>>,
    remove: Vec<Registration<V>>,
}

impl<V> ListenerTable<V> {
    fn slot(&self, kind: EventKind) -> &Vec<Registration<V>> {
        match kind {
            EventKind::Set => &self.set,
            EventKind::Get => &self.get,
            EventKind::Remove => &self.remove,
        }
    }

    fn slot_mut(&mut self, kind: EventKind) -> &mut Vec<Registration<V>> {
        match kind {
            EventKind::Set => &mut self.set,
            EventKind::Get => &mut self.get,
            EventKind::Remove => &mut self.remove,
        }
    }
}

/// Removal side of the table, erased so handles need not carry `V`.
trait Detach: Send + Sync {
    fn detach(&self, kind: EventKind, id: u64);
}

impl<V: 'static> Detach for Mutex<ListenerTable<V>> {
    fn detach(&self, kind: EventKind, id: u64) {
        let mut table = self.lock().unwrap_or_else(PoisonError::into_inner);
        table.slot_mut(kind).retain(|registration| registration.id != id);
    }
}

/// Ordered listener lists, one per event kind.
pub(crate) struct ListenerRegistry<V> {
    table: Arc<Mutex<ListenerTable<V>>>,
}

impl<V: 'static> ListenerRegistry<V> {
    pub(crate) fn new() -> Self {
        Self {
            table: Arc::new(Mutex::new(ListenerTable {
                next_id: 0,
                set: Vec::new(),
                get: Vec::new(),
                remove: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListenerTable<V>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add<F>(&self, kind: EventKind, listener: F) -> ListenerHandle
    where
        F: Fn(&CacheEvent<'_, V>) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = {
            let mut table = self.lock();
            let id = table.next_id;
            table.next_id += 1;
            table.slot_mut(kind).push(Registration {
                id,
                listener: Arc::new(listener),
            });
            id
        };

        let table: Weak<dyn Detach> = Arc::downgrade(&self.table) as Weak<dyn Detach>;
        ListenerHandle { kind, id, table }
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.lock().slot(kind).len()
    }

    /// Invokes every listener for the event's kind in registration order.
    ///
    /// The first failing listener stops dispatch and its error is returned.
    /// Listeners run against a copy of the list taken before the first call,
    /// so registrations made during dispatch apply from the next event on.
    pub(crate) fn dispatch(&self, event: &CacheEvent<'_, V>) -> Result<()> {
        let kind = event.event_name;
        let listeners: Vec<Listener<V>> = self
            .lock()
            .slot(kind)
            .iter()
            .map(|registration| Arc::clone(&registration.listener))
            .collect();

        for listener in listeners {
            if let Err(source) = listener(event) {
                warn!(event = %kind, key = event.data.key, error = %source, "listener failed");
                return Err(CacheError::Listener { event: kind, source });
            }
        }

        Ok(())
    }
}

// == Listener Handle ==
/// Returned by listener registration; unregisters exactly that listener.
#[derive(Clone)]
pub struct ListenerHandle {
    kind: EventKind,
    id: u64,
    table: Weak<dyn Detach>,
}

impl ListenerHandle {
    /// The event kind this listener was registered for.
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Removes the listener. Calling it again, or after the store has been
    /// dropped, does nothing.
    pub fn unsubscribe(&self) {
        if let Some(table) = self.table.upgrade() {
            table.detach(self.kind, self.id);
        }
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn event<'a>(
        kind: EventKind,
        key: &'a str,
        store: &'a Snapshot<i32>,
    ) -> CacheEvent<'a, i32> {
        CacheEvent::new(kind, key, store.get(key), store)
    }

    #[test]
    fn test_event_kind_round_trips_names() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_event_name() {
        let result = "bogus".parse::<EventKind>();
        assert!(matches!(result, Err(CacheError::UnknownEvent(name)) if name == "bogus"));
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let registry = ListenerRegistry::<i32>::new();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let calls = Arc::clone(&calls);
            registry.add(EventKind::Set, move |_| {
                calls.lock().unwrap().push(tag);
                Ok(())
            });
        }

        let store = HashMap::new();
        registry.dispatch(&event(EventKind::Set, "k", &store)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_dispatch_only_reaches_matching_kind() {
        let registry = ListenerRegistry::<i32>::new();
        let calls = Arc::new(Mutex::new(0));

        let counter = Arc::clone(&calls);
        registry.add(EventKind::Get, move |_| {
            *counter.lock().unwrap() += 1;
            Ok(())
        });

        let store = HashMap::new();
        registry.dispatch(&event(EventKind::Set, "k", &store)).unwrap();
        registry.dispatch(&event(EventKind::Remove, "k", &store)).unwrap();

        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_failing_listener_stops_dispatch() {
        let registry = ListenerRegistry::<i32>::new();
        let reached = Arc::new(Mutex::new(false));

        registry.add(EventKind::Remove, |_| Err("listener exploded".into()));
        let flag = Arc::clone(&reached);
        registry.add(EventKind::Remove, move |_| {
            *flag.lock().unwrap() = true;
            Ok(())
        });

        let store = HashMap::new();
        let result = registry.dispatch(&event(EventKind::Remove, "k", &store));

        assert!(matches!(
            result,
            Err(CacheError::Listener { event: EventKind::Remove, .. })
        ));
        assert!(!*reached.lock().unwrap());
    }

    #[test]
    fn test_unsubscribe_is_idempotent_and_targeted() {
        let registry = ListenerRegistry::<i32>::new();
        let first = registry.add(EventKind::Set, |_| Ok(()));
        let _second = registry.add(EventKind::Set, |_| Ok(()));

        first.unsubscribe();
        first.unsubscribe();

        assert_eq!(registry.count(EventKind::Set), 1);
        assert_eq!(first.kind(), EventKind::Set);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let registry = ListenerRegistry::<i32>::new();
        let handle = registry.add(EventKind::Get, |_| Ok(()));
        drop(registry);

        handle.unsubscribe();
    }

    #[test]
    fn test_listener_may_unsubscribe_during_dispatch() {
        let registry = ListenerRegistry::<i32>::new();
        let slot: Arc<Mutex<Option<ListenerHandle>>> = Arc::new(Mutex::new(None));

        let own = Arc::clone(&slot);
        let handle = registry.add(EventKind::Set, move |_| {
            if let Some(handle) = own.lock().unwrap().take() {
                handle.unsubscribe();
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(handle);

        let store = HashMap::new();
        registry.dispatch(&event(EventKind::Set, "k", &store)).unwrap();

        assert_eq!(registry.count(EventKind::Set), 0);
    }

    #[test]
    fn test_event_serializes_with_camel_case_fields() {
        let mut store = HashMap::new();
        store.insert("k".to_string(), CacheEntry::new(7, 100, None));

        let json = serde_json::to_value(event(EventKind::Get, "k", &store)).unwrap();

        assert_eq!(json["eventName"], "get");
        assert_eq!(json["data"]["key"], "k");
        assert_eq!(json["data"]["value"], 7);
        assert_eq!(json["data"]["cachedObject"]["storedAt"], 100);
        assert_eq!(json["data"]["store"]["k"]["value"], 7);
    }
}
