//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use serde::{Deserialize, Serialize};

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
///
/// Serializes as `{"value": .., "storedAt": .., "ttl": ..}`, which is also the
/// per-key shape of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Write timestamp (Unix milliseconds)
    pub stored_at: u64,
    /// Lifetime in milliseconds counted from `stored_at`, None = no expiration
    pub ttl: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stamped at `stored_at`.
    pub fn new(value: V, stored_at: u64, ttl: Option<u64>) -> Self {
        Self {
            value,
            stored_at,
            ttl,
        }
    }

    // == Expires At ==
    /// Last millisecond at which the entry is still readable.
    pub fn expires_at(&self) -> Option<u64> {
        self.ttl.map(|ttl| self.stored_at.saturating_add(ttl))
    }

    // == Is Expired ==
    /// Checks if the entry has expired at time `now`.
    ///
    /// Boundary condition: expiry is strict, so a read at exactly
    /// `stored_at + ttl` is still a hit.
    pub fn is_expired_at(&self, now: u64) -> bool {
        match self.expires_at() {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at time `now`, or None if no
    /// expiration is set. Returns `Some(0)` once expired.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at()
            .map(|expires| expires.saturating_sub(now))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new("test_value".to_string(), 1_000, None);

        assert_eq!(entry.value, "test_value");
        assert!(entry.expires_at().is_none());
        assert!(!entry.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = CacheEntry::new("test_value", 1_000, Some(500));

        assert_eq!(entry.expires_at(), Some(1_500));
        assert!(!entry.is_expired_at(1_000));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("test", 1_000, Some(1_000));

        assert!(!entry.is_expired_at(2_000), "boundary millisecond is a hit");
        assert!(entry.is_expired_at(2_001));
    }

    #[test]
    fn test_zero_ttl_expires_next_millisecond() {
        let entry = CacheEntry::new("test", 1_000, Some(0));

        assert!(!entry.is_expired_at(1_000));
        assert!(entry.is_expired_at(1_001));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new("test", u64::MAX - 1, Some(u64::MAX));

        assert_eq!(entry.expires_at(), Some(u64::MAX));
        assert!(!entry.is_expired_at(u64::MAX));
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::new("test", 1_000, Some(10_000));

        assert_eq!(entry.ttl_remaining_ms(4_000), Some(7_000));
        assert_eq!(entry.ttl_remaining_ms(20_000), Some(0));
        assert!(CacheEntry::new("test", 1_000, None)
            .ttl_remaining_ms(4_000)
            .is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        let entry = CacheEntry::new("value1", 42, None);
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"value": "value1", "storedAt": 42, "ttl": null})
        );
    }

    #[test]
    fn test_deserialize_missing_stored_at_is_rejected() {
        let result: Result<CacheEntry<String>, _> =
            serde_json::from_str(r#"{"value": "v", "ttl": null}"#);
        assert!(result.is_err());
    }
}
