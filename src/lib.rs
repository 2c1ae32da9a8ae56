//! Event Cache - an embeddable in-memory cache
//!
//! Key-value storage with per-entry TTL (checked lazily on read), snapshot
//! extract/load, and synchronous listeners for `set`, `get` and `remove`.
//!
//! ```
//! use event_cache::cache::{CacheStore, EventKind};
//!
//! let mut store: CacheStore<&str> = CacheStore::new();
//! let handle = store.add_listener(EventKind::Set, |event| {
//!     println!("stored {}", event.data.key);
//!     Ok(())
//! });
//!
//! store.set("greeting", "hello", Some(60_000)).unwrap();
//! assert_eq!(store.get("greeting").unwrap(), Some(&"hello"));
//!
//! handle.unsubscribe();
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;

pub use api::AppState;
pub use cache::{CacheEntry, CacheStore, EventKind, ListenerHandle, Snapshot};
pub use config::Config;
pub use error::{CacheError, Result};
