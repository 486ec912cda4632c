//! Embedding service: one model behind a cache and a concurrency limit.
//!
//! Constructed once at startup and passed by `Arc`; there is no global
//! model state. `embed_batch` preserves input order, fills cache hits
//! without touching the model, and aggregates all misses into a single
//! model call.

use semdex_core::{EmbedError, Embedder};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::cache::EmbeddingCache;

/// Cache bounds for the embedding cache.
#[derive(Debug, Clone, Copy)]
pub struct EmbedCacheConfig {
    pub max_size_mb: usize,
    pub ttl_seconds: u64,
}

impl Default for EmbedCacheConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 512,
            ttl_seconds: 3600,
        }
    }
}

/// Cached, concurrency-limited facade over an [`Embedder`].
pub struct EmbeddingService {
    embedder: Arc<dyn Embedder>,
    cache: EmbeddingCache,
    permits: Semaphore,
}

impl EmbeddingService {
    /// Wrap an embedder. `max_concurrent` bounds simultaneous model calls.
    #[must_use]
    pub fn new(
        embedder: Arc<dyn Embedder>,
        cache_config: EmbedCacheConfig,
        max_concurrent: usize,
    ) -> Self {
        let cache = EmbeddingCache::new(
            embedder.model_name(),
            cache_config.max_size_mb,
            cache_config.ttl_seconds,
        );
        Self {
            embedder,
            cache,
            permits: Semaphore::new(max_concurrent.max(1)),
        }
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub fn cache_stats(&self) -> semdex_core::CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Embed one string, unit-norm, through the cache.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vectors = self.embed_batch(&[text]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbedError::Inference("empty embedding result".to_string()))
    }

    /// Embed a batch preserving input order. Cache hits are filled from the
    /// cache; all misses go to the model in one call and are written back.
    pub async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        let mut results: Vec<Option<Vec<f32>>> = Vec::with_capacity(texts.len());
        let mut miss_texts: Vec<&str> = Vec::new();
        let mut miss_indices: Vec<usize> = Vec::new();

        for (i, text) in texts.iter().enumerate() {
            match self.cache.get(text) {
                Some(vector) => results.push(Some(vector)),
                None => {
                    results.push(None);
                    miss_texts.push(text);
                    miss_indices.push(i);
                }
            }
        }

        if !miss_texts.is_empty() {
            debug!(
                hits = texts.len() - miss_texts.len(),
                misses = miss_texts.len(),
                "embedding batch"
            );

            let computed = {
                let _permit = self
                    .permits
                    .acquire()
                    .await
                    .map_err(|e| EmbedError::Inference(format!("semaphore closed: {e}")))?;
                self.embedder.embed(&miss_texts).await?
            };

            if computed.len() != miss_texts.len() {
                return Err(EmbedError::Inference(format!(
                    "model returned {} vectors for {} inputs",
                    computed.len(),
                    miss_texts.len()
                )));
            }

            let expected = self.embedder.dimension();
            for (idx, mut vector) in miss_indices.into_iter().zip(computed) {
                if vector.len() != expected {
                    return Err(EmbedError::DimensionMismatch {
                        expected,
                        actual: vector.len(),
                    });
                }
                l2_normalize(&mut vector);
                self.cache.insert(texts[idx], vector.clone());
                results[idx] = Some(vector);
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left alone.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
