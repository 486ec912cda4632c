//! Error types for semdex.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for semdex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Text extraction failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractError),

    /// Chunking failed
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkError),

    /// Embedding generation failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbedError),

    /// Vector store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// File/directory registry operation failed
    #[error("registry error: {0}")]
    Registry(String),

    /// Caller supplied an unusable request (missing or relative path, empty query)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Path does not exist on disk at operation time
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// I/O error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error (fatal at startup)
    #[error("config error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Text extraction errors.
///
/// "Unsupported extension" is not an error: the parser registry reports it
/// through [`crate::types::Parsed::Unsupported`] so files are skipped
/// silently. Everything here is a real parse failure.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("ocr error: {0}")]
    Ocr(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chunking errors.
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Embedding errors.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("model loading failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Vector store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connect(String),

    #[error("upsert failed: {0}")]
    Upsert(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("collection misconfigured: {0}")]
    Misconfigured(String),
}

impl StoreError {
    /// Transient failures are worth retrying; a misconfigured collection is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, StoreError::Misconfigured(_))
    }
}

/// Result type alias for semdex operations.
pub type Result<T> = std::result::Result<T, Error>;
