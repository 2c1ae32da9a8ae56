//! Cache Store Module
//!
//! Main cache engine: HashMap storage with lazy TTL expiration, snapshots and
//! listener dispatch.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::cache::events::ListenerRegistry;
use crate::cache::{
    CacheEntry, CacheEvent, CacheStats, Clock, EventKind, ListenerHandle, SystemClock,
};
use crate::error::{ListenerError, Result};

/// Entry map keyed by cache key; the unit of `extract` and `load`.
pub type Snapshot<V> = HashMap<String, CacheEntry<V>>;

// == Cache Store ==
/// In-memory key-value store with per-entry TTL.
///
/// Expiry is lazy: an expired entry stays in the map and is only hidden from
/// reads until it is overwritten, removed, replaced by `load`, or swept by
/// [`purge_expired`](Self::purge_expired).
///
/// The store is single-threaded by design; wrap it in a lock to share it.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: Snapshot<V>,
    /// TTL in milliseconds for entries written without one, None = no expiration
    default_ttl: Option<u64>,
    /// Registered listeners per event kind
    listeners: ListenerRegistry<V>,
    /// Activity counters
    stats: CacheStats,
    clock: Arc<dyn Clock>,
}

impl<V: 'static> CacheStore<V> {
    // == Constructor ==
    /// Creates an empty store whose entries never expire by default.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl: None,
            listeners: ListenerRegistry::new(),
            stats: CacheStats::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets the TTL (milliseconds) applied to writes that carry none.
    pub fn with_default_ttl(mut self, default_ttl: Option<u64>) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    /// Replaces the time source used for stamping and expiry checks.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn default_ttl(&self) -> Option<u64> {
        self.default_ttl
    }

    pub fn set_default_ttl(&mut self, default_ttl: Option<u64>) {
        self.default_ttl = default_ttl;
    }

    // == Set ==
    /// Stores a key-value pair, replacing any previous entry for the key.
    ///
    /// `ttl` is in milliseconds; when None the store's default TTL applies.
    /// The entry is stored before `set` listeners run, so a failing listener
    /// does not undo the write.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Option<u64>) -> Result<()> {
        let key = key.into();
        let ttl = ttl.or(self.default_ttl);
        let stored_at = self.clock.now_ms();

        self.entries
            .insert(key.clone(), CacheEntry::new(value, stored_at, ttl));
        self.stats.record_set();
        self.stats.set_total_entries(self.entries.len());
        debug!(key = %key, ?ttl, stored_at, "cache set");

        let cached = self.entries.get(&key);
        self.listeners
            .dispatch(&CacheEvent::new(EventKind::Set, &key, cached, &self.entries))
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns None when the key is absent or expired; neither case reaches
    /// `get` listeners. An expired entry is left in place.
    pub fn get(&mut self, key: &str) -> Result<Option<&V>> {
        let now = self.clock.now_ms();

        let entry = match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => entry,
            Some(_) => {
                debug!(key, now, "cache get: expired");
                self.stats.record_miss();
                return Ok(None);
            }
            None => {
                self.stats.record_miss();
                return Ok(None);
            }
        };

        self.stats.record_hit();
        self.listeners
            .dispatch(&CacheEvent::new(EventKind::Get, key, Some(entry), &self.entries))?;

        Ok(Some(&entry.value))
    }

    // == Remove ==
    /// Removes an entry by key and returns its value.
    ///
    /// `remove` listeners fire even when the key was absent, with no value.
    pub fn remove(&mut self, key: &str) -> Result<Option<V>> {
        let removed = self.entries.remove(key);
        self.stats.record_remove();
        self.stats.set_total_entries(self.entries.len());
        debug!(key, found = removed.is_some(), "cache remove");

        self.listeners.dispatch(&CacheEvent::new(
            EventKind::Remove,
            key,
            removed.as_ref(),
            &self.entries,
        ))?;

        Ok(removed.map(|entry| entry.value))
    }

    // == Extract ==
    /// Borrows the live entry map, expired entries included.
    ///
    /// Use [`snapshot`](Self::snapshot) for a copy that outlives the borrow.
    pub fn extract(&self) -> &Snapshot<V> {
        &self.entries
    }

    // == Load ==
    /// Replaces every entry with `snapshot`. No listeners fire.
    pub fn load(&mut self, snapshot: Snapshot<V>) {
        self.entries = snapshot;
        self.stats.set_total_entries(self.entries.len());
        debug!(entries = self.entries.len(), "cache loaded from snapshot");
    }

    // == Listeners ==
    /// Registers `listener` for future events of `kind`.
    ///
    /// The returned handle unregisters exactly this registration.
    pub fn add_listener<F>(&self, kind: EventKind, listener: F) -> ListenerHandle
    where
        F: Fn(&CacheEvent<'_, V>) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.listeners.add(kind, listener)
    }

    /// Registers a listener by event name (`"set"`, `"get"` or `"remove"`).
    ///
    /// Fails with [`CacheError::UnknownEvent`](crate::error::CacheError::UnknownEvent)
    /// without registering anything when the name is not recognized.
    pub fn add_listener_named<F>(&self, event_name: &str, listener: F) -> Result<ListenerHandle>
    where
        F: Fn(&CacheEvent<'_, V>) -> std::result::Result<(), ListenerError> + Send + Sync + 'static,
    {
        let kind = EventKind::from_str(event_name)?;
        Ok(self.add_listener(kind, listener))
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.count(kind)
    }

    // == Purge Expired ==
    /// Removes all expired entries from the cache without dispatching events.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let before = self.entries.len();

        self.entries.retain(|_, entry| !entry.is_expired_at(now));

        let removed = before - self.entries.len();
        self.stats.set_total_entries(self.entries.len());
        debug!(removed, "purged expired entries");
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Clone + 'static> CacheStore<V> {
    // == Snapshot ==
    /// Returns an owned copy of the entry map, suitable for `load` on
    /// another store.
    pub fn snapshot(&self) -> Snapshot<V> {
        self.entries.clone()
    }
}

impl<V: 'static> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
