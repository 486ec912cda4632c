//! # semdex
//!
//! Local semantic search over your filesystem.
//!
//! Files in registered directories are parsed, chunked, embedded with a
//! local sentence-embedding model and stored in Qdrant; directories stay
//! watched so the index follows creates, edits and deletes.
//!
//! ```bash
//! # Run the worker API (default 127.0.0.1:8081)
//! semdex serve
//!
//! # One-shot index of a directory
//! semdex index ~/Documents
//!
//! # Query from the command line
//! semdex search "quarterly budget meeting" --limit 5
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use semdex_core::Embedder as _;
use semdex_core::VectorStore as _;
use semdex_embed::{EmbedCacheConfig, EmbeddingService, FastembedEmbedder};
use semdex_extract::{OcrConfig, ParserRegistry, TesseractOcr};
use semdex_index::{Indexer, IndexerConfig, SearchCache, SearchService, WatchManager};
use semdex_registry::FileRegistry;
use semdex_store::QdrantStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod server;

use config::Config;
use server::AppState;

#[derive(Parser)]
#[command(name = "semdex")]
#[command(about = "Local semantic search over your filesystem")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP worker API and watch registered directories
    Serve,

    /// Index a directory once and attach no watcher
    Index {
        /// Directory to index
        path: PathBuf,
    },

    /// Query the index
    Search {
        /// Query string
        query: String,

        /// Maximum results
        #[arg(short, long, default_value = "8")]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("semdex=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    if let Err(e) = config::validate(&config) {
        bail!("invalid configuration: {e}");
    }

    match cli.command {
        Commands::Serve => serve(config).await,
        Commands::Index { path } => index_once(config, path).await,
        Commands::Search { query, limit } => search_once(config, query, limit).await,
    }
}

/// Everything the pipeline needs, built once at startup.
struct Pipeline {
    state: AppState,
    config: Config,
}

/// Construct the pipeline. Model loading and a misconfigured collection
/// are fatal here, never later.
async fn bootstrap(config: Config) -> Result<Pipeline> {
    let embedder_backend =
        FastembedEmbedder::new(&config.model_id).context("failed to load embedding model")?;

    if embedder_backend.dimension() != config.embedding_dim {
        bail!(
            "model '{}' produces {}-dim vectors but embedding_dim is {}",
            config.model_id,
            embedder_backend.dimension(),
            config.embedding_dim
        );
    }

    let embedder = Arc::new(EmbeddingService::new(
        Arc::new(embedder_backend),
        EmbedCacheConfig {
            max_size_mb: config.embedding_cache_mb,
            ttl_seconds: config.embedding_cache_ttl_s,
        },
        config.worker_pool_size,
    ));

    let store = Arc::new(
        QdrantStore::new(
            &config.vector_store_url,
            &config.collection_name,
            Duration::from_secs(config.store_timeout_s),
        )
        .context("failed to create vector store client")?,
    );
    store
        .ensure_collection(config.embedding_dim)
        .await
        .context("vector store unavailable or misconfigured")?;

    let registry = Arc::new(
        FileRegistry::new(&config.db_path)
            .await
            .context("failed to open registry database")?,
    );

    let ocr = Arc::new(TesseractOcr::new(OcrConfig {
        psm: config.ocr_psm,
        dpi: config.ocr_dpi,
        language: "eng".to_string(),
    }));
    let parsers = Arc::new(ParserRegistry::with_defaults(ocr));

    let search_cache = Arc::new(SearchCache::new(
        config.search_cache_mb,
        config.search_cache_ttl_s,
    ));

    let indexer = Arc::new(Indexer::new(
        store.clone() as Arc<dyn semdex_core::VectorStore>,
        parsers,
        Arc::clone(&embedder),
        Arc::clone(&registry),
        Arc::clone(&search_cache),
        IndexerConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            max_in_flight: 8,
        },
    )?);

    let search = Arc::new(SearchService::new(
        Arc::clone(&embedder),
        store.clone() as Arc<dyn semdex_core::VectorStore>,
        Arc::clone(&search_cache),
        config.max_top_k,
    ));

    let watcher = WatchManager::new(Arc::clone(&indexer), config.debounce_ms);

    info!(
        model = %config.model_id,
        dimension = config.embedding_dim,
        collection = %config.collection_name,
        "pipeline ready"
    );

    Ok(Pipeline {
        state: AppState {
            indexer,
            search,
            watcher,
            registry,
            embedder,
            store,
            search_cache,
            collection_name: config.collection_name.clone(),
            embedding_dim: config.embedding_dim,
        },
        config,
    })
}

async fn serve(config: Config) -> Result<()> {
    let pipeline = bootstrap(config).await?;
    let state = pipeline.state;

    // Directories registered in earlier runs pick their watchers back up.
    for dir in state.registry.list_directories().await? {
        if dir.path.is_dir() {
            state.watcher.watch(&dir.path).await?;
        } else {
            info!(dir = %dir.path.display(), "registered directory missing, not watching");
        }
    }

    server::serve(state, &pipeline.config.bind, pipeline.config.port).await
}

async fn index_once(config: Config, path: PathBuf) -> Result<()> {
    let pipeline = bootstrap(config).await?;
    let canonical = path.canonicalize().context("directory does not exist")?;

    let summary = pipeline.state.indexer.clone().index_directory(&canonical).await?;
    println!(
        "indexed {} of {} files ({} chunks, {} skipped, {} failed)",
        summary.files_processed,
        summary.total_files,
        summary.chunks_indexed,
        summary.files_skipped,
        summary.files_failed
    );
    Ok(())
}

async fn search_once(config: Config, query: String, limit: usize) -> Result<()> {
    let pipeline = bootstrap(config).await?;

    let outcome = pipeline
        .state
        .search
        .search(&query, Some(limit), None)
        .await?;

    if outcome.results.is_empty() {
        println!("no results");
        return Ok(());
    }
    for (rank, item) in outcome.results.iter().enumerate() {
        println!(
            "{:>2}. [{:.3}] {} #{}",
            rank + 1,
            item.score,
            item.file_path,
            item.chunk_index
        );
        let preview: String = item.chunk.chars().take(160).collect();
        println!("      {preview}");
    }
    Ok(())
}
