//! TTL-bounded response memoization.
//!
//! Eviction is purely read-triggered: an entry read past its TTL is deleted
//! and reported as a miss, and there is no background sweeper. Entries that
//! are written and never re-read persist until an administrative
//! [`ResponseCache::clear`]. A deliberate simplicity/leak trade-off.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

mod fingerprint;

pub use fingerprint::fingerprint;

/// Memoized model output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub data: String,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedResponse,
    created_at: DateTime<Utc>,
    ttl: TimeDelta,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at >= self.ttl
    }
}

/// Shared, scope-keyed response cache.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a fingerprint. An expired entry is removed and reported as a
    /// miss; `get` never returns a value older than its TTL.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        self.get_at(key, Utc::now())
    }

    fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<CachedResponse> {
        {
            // Ref guard must drop before the remove below, or the shard lock
            // would be held across its own removal.
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.payload.clone());
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn set(&self, key: impl Into<String>, payload: CachedResponse, ttl_minutes: i64) {
        self.set_at(key, payload, ttl_minutes, Utc::now());
    }

    fn set_at(
        &self,
        key: impl Into<String>,
        payload: CachedResponse,
        ttl_minutes: i64,
        now: DateTime<Utc>,
    ) {
        self.entries.insert(
            key.into(),
            CacheEntry {
                payload,
                created_at: now,
                ttl: TimeDelta::minutes(ttl_minutes),
            },
        );
    }

    /// Full flush. Administrative paths only, never per-request logic.
    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(data: &str) -> CachedResponse {
        CachedResponse {
            data: data.into(),
            confidence: Some(0.9),
        }
    }

    #[test]
    fn test_round_trip() {
        let cache = ResponseCache::new();
        cache.set("k1", payload("output"), 15);

        let hit = cache.get("k1").unwrap();
        assert_eq!(hit.data, "output");
        assert_eq!(hit.confidence, Some(0.9));
    }

    #[test]
    fn test_miss_on_unknown_key() {
        let cache = ResponseCache::new();
        assert!(cache.get("nope").is_none());
    }

    #[test]
    fn test_expired_entry_deleted_on_read() {
        let cache = ResponseCache::new();
        let written = Utc::now();
        cache.set_at("k1", payload("stale"), 15, written);

        let later = written + TimeDelta::minutes(15);
        assert!(cache.get_at("k1", later).is_none());
        // Read-side eviction removed the entry.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_entry_alive_within_ttl() {
        let cache = ResponseCache::new();
        let written = Utc::now();
        cache.set_at("k1", payload("fresh"), 15, written);

        let almost = written + TimeDelta::minutes(14);
        assert!(cache.get_at("k1", almost).is_some());
    }

    #[test]
    fn test_clear_flushes_everything() {
        let cache = ResponseCache::new();
        cache.set("a", payload("1"), 15);
        cache.set("b", payload("2"), 15);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn test_overwrite_refreshes_entry() {
        let cache = ResponseCache::new();
        cache.set("k", payload("old"), 15);
        cache.set("k", payload("new"), 15);
        assert_eq!(cache.get("k").unwrap().data, "new");
        assert_eq!(cache.len(), 1);
    }
}
