//! Cache Module
//!
//! Provides in-memory caching with lazy TTL expiration, snapshots and
//! synchronous event listeners.

mod clock;
mod entry;
mod events;
mod stats;
mod store;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use events::{names as event_names, CacheEvent, EventData, EventKind, ListenerHandle};
pub use stats::CacheStats;
pub use store::{CacheStore, Snapshot};
