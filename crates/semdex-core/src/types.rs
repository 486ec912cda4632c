//! Core types for semdex.
//!
//! ## File tracking
//! - [`FileRecord`]: registry row for an indexed file
//! - [`FileStatus`]: indexing state machine position
//! - [`FileEvent`]: filesystem events consumed by the watch manager
//!
//! ## Vector data
//! - [`ChunkPayload`]: the metadata stored alongside every vector
//! - [`VectorPoint`]: the unit written to the vector store
//! - [`SearchHit`]: a scored point returned from a search
//!
//! ## Pipeline results
//! - [`Parsed`]: outcome of the parser registry
//! - [`FileReport`]: outcome of a single-file index operation
//! - [`ScanSummary`]: aggregate outcome of a directory scan

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// File records
// ============================================================================

/// Registry metadata about an indexed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size_bytes: u64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
    /// SHA-256 of the raw bytes, hex-encoded
    pub checksum: String,
    /// Lowercased extension including the dot, e.g. ".txt"
    pub file_type: String,
    /// Current indexing status
    pub status: FileStatus,
    /// When the file was last successfully indexed
    pub last_indexed: Option<DateTime<Utc>>,
    /// Number of chunks produced at the last successful index
    pub chunk_count: u32,
}

/// File indexing status.
///
/// `absent → pending → indexed ⇄ pending → absent`, with a side branch
/// `pending → failed` that a later explicit reindex re-enters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Indexed,
    Failed,
}

impl FileStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FileStatus::Pending => "pending",
            FileStatus::Indexed => "indexed",
            FileStatus::Failed => "failed",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(FileStatus::Pending),
            "indexed" => Some(FileStatus::Indexed),
            "failed" => Some(FileStatus::Failed),
            _ => None,
        }
    }
}

// ============================================================================
// Vector data
// ============================================================================

/// Payload stored with every vector point, mirroring the chunk metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Absolute path of the owning file
    pub file_path: String,
    /// File name component
    pub file_name: String,
    /// SHA-256 digest of the file at extraction time
    pub file_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Lowercased extension including the dot
    pub file_type: String,
    /// The chunk text
    pub chunk: String,
    /// Zero-based chunk index within the file
    pub chunk_index: u32,
    /// Chunk length in characters
    pub chunk_size: u32,
}

/// The unit stored in the external vector database.
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Stable id derived from (path, digest, chunk_index)
    pub id: Uuid,
    /// Dense embedding of fixed dimension
    pub vector: Vec<f32>,
    /// Chunk metadata
    pub payload: ChunkPayload,
}

/// A scored point returned from a vector search.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: Uuid,
    /// Raw cosine similarity in [-1, 1]
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Optional metadata filter applied to a vector search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Restrict hits to a file type, e.g. ".pdf"
    pub file_type: Option<String>,
}

impl SearchFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.file_type.is_none()
    }
}

/// Derive the stable point id for a chunk.
///
/// Pure function of `(path, digest, chunk_index)`: reindexing identical
/// content upserts over the same ids, which is what makes replays
/// idempotent. First 16 bytes of a SHA-256, so collisions are negligible.
#[must_use]
pub fn point_id(path: &Path, digest: &str, chunk_index: u32) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update([0u8]);
    hasher.update(digest.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk_index.to_le_bytes());
    let hash = hasher.finalize();

    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);
    Uuid::from_bytes(bytes)
}

/// Hex-encoded SHA-256 of a byte slice, the digest used everywhere a
/// content fingerprint is needed.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ============================================================================
// Pipeline results
// ============================================================================

/// Outcome of asking the parser registry for a file's text.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// Extracted plain text (possibly empty)
    Text(String),
    /// Extension not registered; the file is skipped silently
    Unsupported,
}

/// What happened to a single file during an index operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOutcome {
    /// Chunks were (re)written to the store
    Indexed,
    /// Digest unchanged and already indexed; nothing touched
    Unchanged,
    /// Unsupported extension; nothing touched
    Skipped,
    /// Parsed to no text; record kept with zero chunks
    Empty,
    /// Parser failed; previous chunks retained, record marked failed
    Failed,
}

/// Result of a single-file index / reindex operation.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    pub file_name: String,
    pub file_type: String,
    pub checksum: Option<String>,
    pub size_bytes: u64,
    pub chunks_indexed: u32,
    pub outcome: IndexOutcome,
    /// Soft-failure detail, present when `outcome == Failed`
    pub warning: Option<String>,
}

impl FileReport {
    /// Build a report with the metadata every outcome shares.
    #[must_use]
    pub fn new(path: &Path, outcome: IndexOutcome) -> Self {
        Self {
            path: path.to_path_buf(),
            file_name: file_name_of(path),
            file_type: extension_of(path),
            checksum: None,
            size_bytes: 0,
            chunks_indexed: 0,
            outcome,
            warning: None,
        }
    }
}

/// Aggregate counts for a directory scan.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Supported files found by the walk
    pub total_files: u64,
    /// Files that went through the pipeline (indexed, unchanged or empty)
    pub files_processed: u64,
    /// Chunks written during this scan
    pub chunks_indexed: u64,
    /// Unsupported files skipped
    pub files_skipped: u64,
    /// Files that failed to parse, embed or store
    pub files_failed: u64,
}

// ============================================================================
// File events
// ============================================================================

/// Typed filesystem event dispatched by the watch manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
}

impl FileEvent {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            FileEvent::Created(p) | FileEvent::Modified(p) | FileEvent::Deleted(p) => p,
        }
    }
}

// ============================================================================
// Path helpers
// ============================================================================

/// File name component as a string, lossy.
#[must_use]
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Lowercased extension including the leading dot, or an empty string.
#[must_use]
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}
