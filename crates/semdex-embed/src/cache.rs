//! Embedding cache.
//!
//! Keyed by `sha256(model_id \0 text)`, so the cache is content-addressed:
//! file operations never invalidate it, identical text always hits. Values
//! weigh roughly `dimension * 4` bytes each.

use semdex_core::{BoundedCache, CacheStats};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Fixed per-entry overhead added to the vector payload weight.
const ENTRY_OVERHEAD_BYTES: usize = 96;

/// Bounded cache of unit-norm embedding vectors.
pub struct EmbeddingCache {
    inner: BoundedCache<Vec<f32>>,
    model_id: String,
}

impl EmbeddingCache {
    /// Create a cache with a megabyte budget and TTL in seconds.
    #[must_use]
    pub fn new(model_id: &str, max_size_mb: usize, ttl_seconds: u64) -> Self {
        Self {
            inner: BoundedCache::new(
                max_size_mb * 1024 * 1024,
                Duration::from_secs(ttl_seconds),
            ),
            model_id: model_id.to_string(),
        }
    }

    fn key(&self, text: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, text: &str) -> Option<Vec<f32>> {
        self.inner.get(&self.key(text))
    }

    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        let bytes = vector.len() * std::mem::size_of::<f32>() + ENTRY_OVERHEAD_BYTES;
        self.inner.insert(self.key(text), vector, bytes);
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}
