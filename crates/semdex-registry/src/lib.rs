//! # semdex-registry
//!
//! SQLite-backed registry of watched directories and indexed files.
//!
//! This is the only state semdex persists outside the vector store:
//!
//! ```sql
//! directories(id, path UNIQUE, added_at)
//! files(path PRIMARY KEY, dir_id, checksum, size, file_type,
//!       status, last_indexed, chunk_count)
//! ```
//!
//! The invariant the indexer maintains: a `files` row exists if and only if
//! the vector store holds at least one chunk for that path (modulo the
//! short in-flight reindex window).

use chrono::{DateTime, Utc};
use semdex_core::{FileRecord, FileStatus};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Registry errors.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid row: {0}")]
    InvalidRow(String),
}

/// A registered directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntry {
    pub id: i64,
    pub path: PathBuf,
    pub added_at: DateTime<Utc>,
}

/// Registry of directories and file records.
pub struct FileRegistry {
    pool: SqlitePool,
}

impl FileRegistry {
    /// Open (or create) the database and create the schema. Pass
    /// `":memory:"` for an ephemeral registry in tests.
    pub async fn new(path: &str) -> Result<Self, RegistryError> {
        let in_memory = path == ":memory:";
        let url = if in_memory {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Each in-memory connection is its own database, so the pool must
        // not fan out in that mode.
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(opts)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS directories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                added_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS files (
                path TEXT PRIMARY KEY,
                dir_id INTEGER REFERENCES directories(id) ON DELETE SET NULL,
                checksum TEXT NOT NULL,
                size INTEGER NOT NULL,
                file_type TEXT NOT NULL,
                status TEXT NOT NULL,
                last_indexed TEXT,
                chunk_count INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    /// Register a directory. Idempotent on the normalized absolute path;
    /// returns the row id either way.
    pub async fn add_directory(&self, path: &Path) -> Result<i64, RegistryError> {
        let path_str = path.to_string_lossy().into_owned();

        sqlx::query("INSERT OR IGNORE INTO directories (path, added_at) VALUES (?, ?)")
            .bind(&path_str)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        let row = sqlx::query("SELECT id FROM directories WHERE path = ?")
            .bind(&path_str)
            .fetch_one(&self.pool)
            .await?;

        let id: i64 = row.get("id");
        debug!(path = %path_str, id, "directory registered");
        Ok(id)
    }

    /// All registered directories, oldest first.
    pub async fn list_directories(&self) -> Result<Vec<DirectoryEntry>, RegistryError> {
        let rows = sqlx::query("SELECT id, path, added_at FROM directories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| {
                let added_at: String = row.get("added_at");
                let added_at = DateTime::parse_from_rfc3339(&added_at)
                    .map_err(|e| RegistryError::InvalidRow(e.to_string()))?
                    .with_timezone(&Utc);
                Ok(DirectoryEntry {
                    id: row.get("id"),
                    path: PathBuf::from(row.get::<String, _>("path")),
                    added_at,
                })
            })
            .collect()
    }

    /// Look up a file record by path.
    pub async fn get_file(&self, path: &Path) -> Result<Option<FileRecord>, RegistryError> {
        let row = sqlx::query(
            "SELECT path, checksum, size, file_type, status, last_indexed, chunk_count
             FROM files WHERE path = ?",
        )
        .bind(path.to_string_lossy().into_owned())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record).transpose()
    }

    /// Insert or update a file record.
    pub async fn upsert_file(
        &self,
        record: &FileRecord,
        dir_id: Option<i64>,
    ) -> Result<(), RegistryError> {
        sqlx::query(
            "INSERT INTO files (path, dir_id, checksum, size, file_type, status, last_indexed, chunk_count)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(path) DO UPDATE SET
                 dir_id = COALESCE(excluded.dir_id, files.dir_id),
                 checksum = excluded.checksum,
                 size = excluded.size,
                 file_type = excluded.file_type,
                 status = excluded.status,
                 last_indexed = excluded.last_indexed,
                 chunk_count = excluded.chunk_count",
        )
        .bind(record.path.to_string_lossy().into_owned())
        .bind(dir_id)
        .bind(&record.checksum)
        .bind(record.size_bytes as i64)
        .bind(&record.file_type)
        .bind(record.status.as_str())
        .bind(record.last_indexed.map(|t| t.to_rfc3339()))
        .bind(i64::from(record.chunk_count))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip a file's status without touching the rest of the record.
    /// No-op when the file was never recorded.
    pub async fn set_status(&self, path: &Path, status: FileStatus) -> Result<(), RegistryError> {
        sqlx::query("UPDATE files SET status = ? WHERE path = ?")
            .bind(status.as_str())
            .bind(path.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// All tracked file records, ordered by path.
    pub async fn list_files(&self) -> Result<Vec<FileRecord>, RegistryError> {
        let rows = sqlx::query(
            "SELECT path, checksum, size, file_type, status, last_indexed, chunk_count
             FROM files ORDER BY path",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// File records belonging to a registered directory, ordered by path.
    pub async fn files_for_directory(&self, dir_id: i64) -> Result<Vec<FileRecord>, RegistryError> {
        let rows = sqlx::query(
            "SELECT path, checksum, size, file_type, status, last_indexed, chunk_count
             FROM files WHERE dir_id = ? ORDER BY path",
        )
        .bind(dir_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    /// Drop a file record. Returns whether a row existed.
    pub async fn remove_file(&self, path: &Path) -> Result<bool, RegistryError> {
        let result = sqlx::query("DELETE FROM files WHERE path = ?")
            .bind(path.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of tracked files. Diagnostic.
    pub async fn file_count(&self) -> Result<u64, RegistryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM files")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<i64, _>("n") as u64)
    }
}

fn row_to_record(row: sqlx::sqlite::SqliteRow) -> Result<FileRecord, RegistryError> {
    let status_str: String = row.get("status");
    let status = FileStatus::parse(&status_str)
        .ok_or_else(|| RegistryError::InvalidRow(format!("unknown status: {status_str}")))?;

    let last_indexed = row
        .get::<Option<String>, _>("last_indexed")
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| RegistryError::InvalidRow(e.to_string()))
        })
        .transpose()?;

    Ok(FileRecord {
        path: PathBuf::from(row.get::<String, _>("path")),
        size_bytes: row.get::<i64, _>("size") as u64,
        modified_at: last_indexed.unwrap_or_else(Utc::now),
        checksum: row.get("checksum"),
        file_type: row.get("file_type"),
        status,
        last_indexed,
        chunk_count: row.get::<i64, _>("chunk_count") as u32,
    })
}
