//! HTTP server: router, shared state, graceful shutdown.

use axum::routing::{delete, get, post};
use axum::Router;
use semdex_core::VectorStore;
use semdex_embed::EmbeddingService;
use semdex_index::{Indexer, SearchCache, SearchService, WatchManager};
use semdex_registry::FileRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::handlers;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub indexer: Arc<Indexer>,
    pub search: Arc<SearchService>,
    pub watcher: Arc<WatchManager>,
    pub registry: Arc<FileRegistry>,
    pub embedder: Arc<EmbeddingService>,
    pub store: Arc<dyn VectorStore>,
    pub search_cache: Arc<SearchCache>,
    pub collection_name: String,
    pub embedding_dim: usize,
}

/// Build the API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/index-directory", post(handlers::index_directory))
        .route("/index-file", post(handlers::index_file))
        .route("/reindex-file", post(handlers::reindex_file))
        .route("/remove-file", delete(handlers::remove_file))
        .route("/search", post(handlers::search))
        .route("/file-content", post(handlers::file_content))
        .route("/debug/indexed-files", get(handlers::debug_indexed_files))
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/cache/clear", post(handlers::cache_clear))
        .with_state(state)
}

/// Serve until ctrl-c; in-flight requests drain before exit.
pub async fn serve(state: AppState, bind: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
