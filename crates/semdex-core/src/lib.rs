//! # semdex-core
//!
//! Core types and traits for semdex, a local semantic-search engine for a
//! user's filesystem.
//!
//! The crate defines the seams the rest of the workspace plugs into:
//!
//! - **Parsing**: [`TextParser`] extracts plain text per file family
//! - **Chunk data**: [`ChunkPayload`] / [`VectorPoint`] / [`SearchHit`]
//! - **Embedding**: [`Embedder`] maps strings to dense vectors
//! - **Storage**: [`VectorStore`] abstracts the external vector database
//! - **Caching**: [`BoundedCache`] is the shared LRU+TTL primitive
//!
//! ## Pipeline
//!
//! ```text
//! File → TextParser → chunker → Embedder → VectorStore
//!                                              ↓
//!                             query vector → SearchHit
//! ```

pub mod cache;
pub mod error;
pub mod traits;
pub mod types;

pub use cache::{BoundedCache, CacheStats};
pub use error::{ChunkError, EmbedError, Error, ExtractError, Result, StoreError};
pub use traits::*;
pub use types::*;
