//! Trait seams between semdex components.
//!
//! - [`TextParser`]: extract plain text from one file family
//! - [`Embedder`]: map strings to dense vectors
//! - [`VectorStore`]: persist and search vector points
//!
//! Implementations are swapped behind `Arc<dyn ...>` so tests can run the
//! full pipeline against in-memory fakes.

use async_trait::async_trait;
use std::path::Path;

use crate::error::{EmbedError, ExtractError, StoreError};
use crate::types::{SearchFilter, SearchHit, VectorPoint};

// ============================================================================
// Parsing
// ============================================================================

/// Extracts plain text from files of a fixed set of extensions.
#[async_trait]
pub trait TextParser: Send + Sync {
    /// Lowercased extensions without the dot, e.g. `["txt", "md"]`.
    fn extensions(&self) -> &[&str];

    /// Extract the file's plain-text content.
    ///
    /// An empty string is a valid result (the file then yields no chunks);
    /// errors mean the parser itself failed.
    async fn parse(&self, path: &Path) -> Result<String, ExtractError>;
}

// ============================================================================
// Embedding
// ============================================================================

/// Maps batches of strings to fixed-dimension dense vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier, part of every cache fingerprint.
    fn model_name(&self) -> &str;

    /// Advertised output dimension.
    fn dimension(&self) -> usize;

    /// Encode a batch, preserving input order.
    ///
    /// Vectors are not required to be normalized here; the embedding
    /// service L2-normalizes every output.
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

// ============================================================================
// Vector storage
// ============================================================================

/// Adapter over an external nearest-neighbor store.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if missing, with the given dimension and
    /// cosine similarity. Idempotent; a dimension mismatch on an existing
    /// collection is [`StoreError::Misconfigured`].
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError>;

    /// Insert or replace points by id.
    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), StoreError>;

    /// Remove every point whose payload `file_path` equals `path`.
    /// Returns the number of points removed.
    async fn delete_by_file(&self, path: &Path) -> Result<u64, StoreError>;

    /// k-NN search ordered by descending cosine similarity.
    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Number of points belonging to `path`. Diagnostic.
    async fn count_by_file(&self, path: &Path) -> Result<u64, StoreError>;

    /// All points belonging to `path`, unscored. Used to reconstruct a
    /// file's indexed text in chunk order.
    async fn points_by_file(&self, path: &Path) -> Result<Vec<SearchHit>, StoreError>;
}
