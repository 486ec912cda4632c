//! # semdex-embed
//!
//! Embedding generation for semdex.
//!
//! [`EmbeddingService`] is the only entry point the rest of the pipeline
//! uses: it wraps an [`Embedder`](semdex_core::Embedder) implementation
//! with the content-addressed [`EmbeddingCache`] and a semaphore bounding
//! concurrent inference. [`FastembedEmbedder`] is the production model
//! backend.

pub mod cache;
pub mod fastembed;
pub mod service;

pub use self::cache::EmbeddingCache;
pub use self::fastembed::FastembedEmbedder;
pub use self::service::{l2_normalize, EmbedCacheConfig, EmbeddingService};
