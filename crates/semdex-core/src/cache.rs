//! Bounded LRU cache with per-entry TTL.
//!
//! One primitive shared by the embedding cache and the search cache. Keys
//! are stable fingerprints (content or query hashes) so identical inputs
//! always collide; values carry an explicit byte weight so the cache can
//! hold an approximate byte budget rather than an entry count.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache hit/miss statistics.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entry_count: usize,
    pub current_bytes: usize,
    pub max_bytes: usize,
}

struct Slot<V> {
    value: V,
    bytes: usize,
    stored_at: Instant,
    last_access: u64,
}

struct Inner<V> {
    slots: HashMap<String, Slot<V>>,
    current_bytes: usize,
    access_counter: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
    expirations: u64,
}

/// LRU + TTL cache bounded by an approximate byte budget.
///
/// Entries expire lazily on access; eviction removes least-recently-used
/// entries until the new entry fits. All operations take one short-lived
/// lock, so hot-path reads never block on I/O.
pub struct BoundedCache<V> {
    inner: Mutex<Inner<V>>,
    max_bytes: usize,
    ttl: Duration,
}

impl<V: Clone> BoundedCache<V> {
    /// Create a cache with the given byte budget and entry TTL.
    #[must_use]
    pub fn new(max_bytes: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                current_bytes: 0,
                access_counter: 0,
                hits: 0,
                misses: 0,
                evictions: 0,
                expirations: 0,
            }),
            max_bytes,
            ttl,
        }
    }

    /// Look up a key, refreshing its LRU position. Expired entries are
    /// removed and reported as misses.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let expired = match inner.slots.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(slot) => slot.stored_at.elapsed() > self.ttl,
        };

        if expired {
            if let Some(slot) = inner.slots.remove(key) {
                inner.current_bytes -= slot.bytes;
            }
            inner.misses += 1;
            inner.expirations += 1;
            return None;
        }

        inner.access_counter += 1;
        let counter = inner.access_counter;
        inner.hits += 1;
        let slot = inner.slots.get_mut(key).expect("checked above");
        slot.last_access = counter;
        Some(slot.value.clone())
    }

    /// Insert a value with its approximate size in bytes, evicting
    /// least-recently-used entries until it fits. Values larger than the
    /// whole budget are not cached at all.
    pub fn insert(&self, key: String, value: V, bytes: usize) {
        if bytes > self.max_bytes {
            return;
        }

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(old) = inner.slots.remove(&key) {
            inner.current_bytes -= old.bytes;
        }

        while inner.current_bytes + bytes > self.max_bytes {
            let lru_key = inner
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(k, _)| k.clone());
            match lru_key {
                Some(k) => {
                    if let Some(slot) = inner.slots.remove(&k) {
                        inner.current_bytes -= slot.bytes;
                        inner.evictions += 1;
                    }
                }
                None => break,
            }
        }

        inner.access_counter += 1;
        let counter = inner.access_counter;
        inner.current_bytes += bytes;
        inner.slots.insert(
            key,
            Slot {
                value,
                bytes,
                stored_at: Instant::now(),
                last_access: counter,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.slots.clear();
        inner.current_bytes = 0;
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .slots
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            evictions: inner.evictions,
            expirations: inner.expirations,
            entry_count: inner.slots.len(),
            current_bytes: inner.current_bytes,
            max_bytes: self.max_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max_bytes: usize) -> BoundedCache<String> {
        BoundedCache::new(max_bytes, Duration::from_secs(3600))
    }

    #[test]
    fn test_get_miss_then_hit() {
        let c = cache(1024);
        assert!(c.get("k").is_none());

        c.insert("k".to_string(), "v".to_string(), 10);
        assert_eq!(c.get("k").as_deref(), Some("v"));

        let stats = c.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_insert_replaces_existing() {
        let c = cache(1024);
        c.insert("k".to_string(), "old".to_string(), 100);
        c.insert("k".to_string(), "new".to_string(), 100);

        assert_eq!(c.get("k").as_deref(), Some("new"));
        assert_eq!(c.len(), 1);
        assert_eq!(c.stats().current_bytes, 100);
    }

    #[test]
    fn test_eviction_respects_lru_order() {
        let c = cache(100);
        c.insert("a".to_string(), "a".to_string(), 40);
        c.insert("b".to_string(), "b".to_string(), 40);

        // Touch "a" so "b" becomes least recently used.
        assert!(c.get("a").is_some());

        c.insert("c".to_string(), "c".to_string(), 40);

        assert!(c.get("a").is_some());
        assert!(c.get("b").is_none());
        assert!(c.get("c").is_some());
        assert_eq!(c.stats().evictions, 1);
    }

    #[test]
    fn test_oversized_value_not_cached() {
        let c = cache(100);
        c.insert("huge".to_string(), "x".to_string(), 200);
        assert!(c.is_empty());
    }

    #[test]
    fn test_ttl_expiry() {
        let c: BoundedCache<String> = BoundedCache::new(1024, Duration::from_millis(0));
        c.insert("k".to_string(), "v".to_string(), 10);
        std::thread::sleep(Duration::from_millis(5));

        assert!(c.get("k").is_none());
        assert_eq!(c.stats().expirations, 1);
        assert!(c.is_empty());
    }

    #[test]
    fn test_clear() {
        let c = cache(1024);
        c.insert("a".to_string(), "a".to_string(), 10);
        c.insert("b".to_string(), "b".to_string(), 10);
        c.clear();

        assert!(c.is_empty());
        assert_eq!(c.stats().current_bytes, 0);
    }

    #[test]
    fn test_byte_budget_held() {
        let c = cache(100);
        for i in 0..20 {
            c.insert(format!("k{i}"), "v".to_string(), 30);
        }
        assert!(c.stats().current_bytes <= 100);
        assert!(c.len() <= 3);
    }
}
