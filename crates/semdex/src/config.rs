//! Configuration, loaded from `SEMDEX_*` environment variables over
//! built-in defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Full configuration surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Sentence-embedding model to load
    pub model_id: String,
    /// Asserted vector dimension; must match the model
    pub embedding_dim: usize,

    /// Chunk window in whitespace tokens
    pub chunk_size: usize,
    /// Overlap between consecutive windows
    pub chunk_overlap: usize,

    /// Upper bound enforced on any search request
    pub max_top_k: usize,

    pub embedding_cache_mb: usize,
    pub embedding_cache_ttl_s: u64,
    pub search_cache_mb: usize,
    pub search_cache_ttl_s: u64,

    /// Concurrent embedding calls; defaults to the CPU count
    pub worker_pool_size: usize,

    pub vector_store_url: String,
    pub collection_name: String,
    /// Per-request deadline against the vector store, seconds
    pub store_timeout_s: u64,

    /// Watch-event coalescing window
    pub debounce_ms: u64,

    pub ocr_dpi: u32,
    pub ocr_psm: u8,

    pub bind: String,
    pub port: u16,

    /// SQLite registry path
    pub db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_id: "all-MiniLM-L6-v2".to_string(),
            embedding_dim: 384,
            chunk_size: 800,
            chunk_overlap: 120,
            max_top_k: 8,
            embedding_cache_mb: 512,
            embedding_cache_ttl_s: 3600,
            search_cache_mb: 128,
            search_cache_ttl_s: 1800,
            worker_pool_size: default_workers(),
            vector_store_url: "http://localhost:6333".to_string(),
            collection_name: "files_chunks".to_string(),
            store_timeout_s: 30,
            debounce_ms: 400,
            ocr_dpi: 300,
            ocr_psm: 3,
            bind: "127.0.0.1".to_string(),
            port: 8081,
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Defaults overridden by any `SEMDEX_*` variables present.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        env_string("SEMDEX_MODEL_ID", &mut config.model_id);
        env_parse("SEMDEX_EMBEDDING_DIM", &mut config.embedding_dim);
        env_parse("SEMDEX_CHUNK_SIZE", &mut config.chunk_size);
        env_parse("SEMDEX_CHUNK_OVERLAP", &mut config.chunk_overlap);
        env_parse("SEMDEX_MAX_TOP_K", &mut config.max_top_k);
        env_parse("SEMDEX_EMBEDDING_CACHE_MB", &mut config.embedding_cache_mb);
        env_parse(
            "SEMDEX_EMBEDDING_CACHE_TTL_S",
            &mut config.embedding_cache_ttl_s,
        );
        env_parse("SEMDEX_SEARCH_CACHE_MB", &mut config.search_cache_mb);
        env_parse("SEMDEX_SEARCH_CACHE_TTL_S", &mut config.search_cache_ttl_s);
        env_parse("SEMDEX_WORKER_POOL_SIZE", &mut config.worker_pool_size);
        env_string("SEMDEX_VECTOR_STORE_URL", &mut config.vector_store_url);
        env_string("SEMDEX_COLLECTION_NAME", &mut config.collection_name);
        env_parse("SEMDEX_STORE_TIMEOUT_S", &mut config.store_timeout_s);
        env_parse("SEMDEX_DEBOUNCE_MS", &mut config.debounce_ms);
        env_parse("SEMDEX_OCR_DPI", &mut config.ocr_dpi);
        env_parse("SEMDEX_OCR_PSM", &mut config.ocr_psm);
        env_string("SEMDEX_BIND", &mut config.bind);
        env_parse("SEMDEX_PORT", &mut config.port);
        env_string("SEMDEX_DB_PATH", &mut config.db_path);

        config
    }
}

fn env_string(key: &str, slot: &mut String) {
    if let Ok(value) = std::env::var(key) {
        if !value.is_empty() {
            *slot = value;
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Ok(value) = std::env::var(key) {
        if let Ok(parsed) = value.parse() {
            *slot = parsed;
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "semdex")
        .map(|dirs| {
            let dir = dirs.data_dir();
            let _ = std::fs::create_dir_all(dir);
            dir.join("semdex.db").to_string_lossy().into_owned()
        })
        .unwrap_or_else(|| "semdex.db".to_string())
}

/// Sanity checks that must hold before serving.
pub fn validate(config: &Config) -> Result<(), String> {
    if config.chunk_overlap >= config.chunk_size {
        return Err(format!(
            "chunk_overlap ({}) must be less than chunk_size ({})",
            config.chunk_overlap, config.chunk_size
        ));
    }
    if config.max_top_k == 0 {
        return Err("max_top_k must be at least 1".to_string());
    }
    Ok(())
}
