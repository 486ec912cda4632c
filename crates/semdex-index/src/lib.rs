//! # semdex-index
//!
//! The indexing side of semdex:
//!
//! - [`Indexer`]: file → parse → chunk → embed → store pipeline with
//!   per-path serialization, digest deduplication and replace-on-reindex
//! - [`WatchManager`]: one debounced watcher per registered directory,
//!   coalescing bursts into typed [`FileEvent`](semdex_core::FileEvent)s
//! - [`SearchService`]: query embedding, retrieval, projection and the
//!   write-invalidated [`SearchCache`]

pub mod indexer;
pub mod search;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testutil;

pub use self::indexer::{Indexer, IndexerConfig};
pub use self::search::{
    assemble_context, normalize_query, SearchCache, SearchConfig, SearchOutcome,
    SearchResultItem, SearchService,
};
pub use self::watcher::WatchManager;
