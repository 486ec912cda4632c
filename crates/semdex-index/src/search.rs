//! Search orchestration and the search result cache.
//!
//! The search path never touches the indexer: embedding cache → vector
//! store → search cache. The cache key covers everything that changes the
//! result set (normalized query, k, filter, model); the whole cache is
//! dropped whenever any file is indexed, reindexed or removed, so a cached
//! answer can never hide a write.

use semdex_core::{
    BoundedCache, CacheStats, Error, Result, SearchFilter, SearchHit, VectorStore,
};
use semdex_embed::EmbeddingService;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Bounds for the search cache and result sizing.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Upper bound enforced on any request; also the default `top_k`.
    pub max_top_k: usize,
    pub cache_size_mb: usize,
    pub cache_ttl_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_top_k: 8,
            cache_size_mb: 128,
            cache_ttl_seconds: 1800,
        }
    }
}

/// One projected search hit, the wire shape of a result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub score: f32,
    pub file_path: String,
    pub file_name: String,
    pub chunk: String,
    pub chunk_index: u32,
    pub file_type: String,
    pub file_size: u64,
    pub chunk_size: u32,
}

impl From<SearchHit> for SearchResultItem {
    fn from(hit: SearchHit) -> Self {
        Self {
            score: hit.score,
            file_path: hit.payload.file_path,
            file_name: hit.payload.file_name,
            chunk: hit.payload.chunk,
            chunk_index: hit.payload.chunk_index,
            file_type: hit.payload.file_type,
            file_size: hit.payload.file_size,
            chunk_size: hit.payload.chunk_size,
        }
    }
}

/// A completed search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub query: String,
    pub top_k: usize,
    pub results: Vec<SearchResultItem>,
    /// Whether the result list came from the cache
    pub cached: bool,
}

/// Bounded cache of search result lists, invalidated wholesale on writes.
pub struct SearchCache {
    inner: BoundedCache<Vec<SearchResultItem>>,
}

impl SearchCache {
    #[must_use]
    pub fn new(max_size_mb: usize, ttl_seconds: u64) -> Self {
        Self {
            inner: BoundedCache::new(
                max_size_mb * 1024 * 1024,
                Duration::from_secs(ttl_seconds),
            ),
        }
    }

    fn key(query_norm: &str, top_k: usize, filter: &SearchFilter, model_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(query_norm.as_bytes());
        hasher.update([0u8]);
        hasher.update(top_k.to_le_bytes());
        hasher.update([0u8]);
        hasher.update(filter.file_type.as_deref().unwrap_or("").as_bytes());
        hasher.update([0u8]);
        hasher.update(model_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Drop everything. Called after any successful index/reindex/remove;
    /// cheap, and coherence dominates correctness.
    pub fn invalidate_all(&self) {
        self.inner.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

/// Query-side orchestration: normalize, cache, embed, search, project.
pub struct SearchService {
    embedder: Arc<EmbeddingService>,
    store: Arc<dyn VectorStore>,
    cache: Arc<SearchCache>,
    max_top_k: usize,
}

impl SearchService {
    #[must_use]
    pub fn new(
        embedder: Arc<EmbeddingService>,
        store: Arc<dyn VectorStore>,
        cache: Arc<SearchCache>,
        max_top_k: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            cache,
            max_top_k,
        }
    }

    /// Run a semantic search.
    ///
    /// `top_k` is clamped to the configured maximum; a missing `top_k`
    /// uses the maximum. The query is lowercased only for the cache key,
    /// never for embedding.
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        filter: Option<SearchFilter>,
    ) -> Result<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query must not be empty".to_string()));
        }

        let k = top_k.unwrap_or(self.max_top_k).clamp(1, self.max_top_k);
        let filter = filter.unwrap_or_default();
        let normalized = normalize_query(query);
        let key = SearchCache::key(&normalized, k, &filter, self.embedder.model_name());

        if let Some(results) = self.cache.inner.get(&key) {
            debug!(query = %normalized, "search cache hit");
            return Ok(SearchOutcome {
                query: query.to_string(),
                top_k: k,
                results,
                cached: true,
            });
        }

        let query_vec = self.embedder.embed_one(query).await.map_err(Error::from)?;
        let hits = self
            .store
            .search(&query_vec, k, if filter.is_empty() { None } else { Some(&filter) })
            .await
            .map_err(Error::from)?;

        let results: Vec<SearchResultItem> =
            hits.into_iter().map(SearchResultItem::from).collect();

        let bytes = serde_json::to_vec(&results).map(|v| v.len()).unwrap_or(0);
        self.cache.inner.insert(key, results.clone(), bytes);

        Ok(SearchOutcome {
            query: query.to_string(),
            top_k: k,
            results,
            cached: false,
        })
    }

    /// Reconstruct a file's indexed text by stitching its chunks together
    /// in chunk order. Returns `None` when nothing is indexed for the path.
    pub async fn file_content(&self, path: &Path) -> Result<Option<(String, usize)>> {
        let mut hits = self.store.points_by_file(path).await.map_err(Error::from)?;
        if hits.is_empty() {
            return Ok(None);
        }

        hits.sort_by_key(|hit| hit.payload.chunk_index);
        let total = hits.len();
        let content = hits
            .into_iter()
            .map(|hit| hit.payload.chunk)
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(Some((content, total)))
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Collapse whitespace and lowercase, for cache keys only.
#[must_use]
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Assemble the retrieval context handed to an external answering service:
/// chunks in rank order, each prefixed with its source file, truncated at
/// a character budget on a chunk boundary.
#[must_use]
pub fn assemble_context(results: &[SearchResultItem], max_chars: usize) -> String {
    let mut context = String::new();
    for item in results {
        let section = format!("[{}]\n{}\n\n", item.file_name, item.chunk);
        if !context.is_empty() && context.len() + section.len() > max_chars {
            break;
        }
        context.push_str(&section);
    }
    context.trim_end().to_string()
}
