//! HTTP handlers and wire types.
//!
//! Field casing follows the worker protocol: index/remove operations use
//! camelCase bodies, search uses snake_case.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use semdex_core::{CacheStats, Error, FileReport, FileStatus, IndexOutcome};
use semdex_index::SearchResultItem;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::error;

use crate::server::AppState;

// ============================================================================
// Error mapping
// ============================================================================

/// Error shape returned to clients: `{error, details?}`.
pub struct ApiError {
    status: StatusCode,
    error: String,
    details: Option<String>,
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: msg.into(),
            details: None,
        }
    }

    fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: msg.into(),
            details: None,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("request failed: {e}");
        }
        Self {
            status,
            error: e.to_string(),
            details: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "details": self.details,
        });
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
pub struct PathRequest {
    path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDirectoryResponse {
    success: bool,
    files_processed: u64,
    chunks_indexed: u64,
    total_files: u64,
    directory: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFileResponse {
    success: bool,
    checksum: Option<String>,
    size: u64,
    chunks_indexed: u32,
    file_path: String,
    file_name: String,
    file_type: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    reindexed: bool,
}

impl IndexFileResponse {
    fn from_report(report: FileReport, reindexed: bool) -> Self {
        Self {
            success: !matches!(report.outcome, IndexOutcome::Failed),
            checksum: report.checksum,
            size: report.size_bytes,
            chunks_indexed: report.chunks_indexed,
            file_path: report.path.to_string_lossy().into_owned(),
            file_name: report.file_name,
            file_type: report.file_type,
            skipped: matches!(report.outcome, IndexOutcome::Skipped),
            warning: report.warning,
            reindexed,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFileResponse {
    success: bool,
    chunks_removed: u64,
    file_path: String,
    file_name: String,
}

#[derive(Deserialize)]
pub struct SearchRequest {
    query: String,
    top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    query: String,
    top_k: usize,
    results: Vec<SearchResultItem>,
    total_results: usize,
    cached: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentResponse {
    success: bool,
    file_path: String,
    file_name: String,
    content: String,
    total_chunks: usize,
    content_length: usize,
}

#[derive(Serialize)]
pub struct ModelInfo {
    model_name: String,
    vector_size: usize,
    is_loaded: bool,
    collection_name: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_info: ModelInfo,
    vector_store: &'static str,
}

#[derive(Serialize)]
pub struct CacheStatsResponse {
    success: bool,
    embedding_cache: CacheStats,
    search_cache: CacheStats,
}

#[derive(Serialize)]
pub struct IndexedFileInfo {
    file_path: String,
    file_name: String,
    file_type: String,
    status: FileStatus,
    chunks: u32,
    size: u64,
}

#[derive(Serialize)]
pub struct IndexedFilesResponse {
    total_files: usize,
    total_points: u64,
    files: Vec<IndexedFileInfo>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Paths arriving over the wire must be absolute; anything else is a 400.
fn absolute_path(raw: &str) -> Result<PathBuf, ApiError> {
    if raw.trim().is_empty() {
        return Err(ApiError::bad_request("path must not be empty"));
    }
    let path = PathBuf::from(raw);
    if !path.is_absolute() {
        return Err(ApiError::bad_request(format!(
            "path must be absolute: {raw}"
        )));
    }
    Ok(path)
}

fn require_file(path: &Path) -> Result<(), ApiError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| ApiError::not_found(format!("file not found: {}", path.display())))?;
    if !metadata.is_file() {
        return Err(ApiError::bad_request(format!(
            "path is not a file: {}",
            path.display()
        )));
    }
    Ok(())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let vector_store = match state.store.ensure_collection(state.embedding_dim).await {
        Ok(()) => "ok",
        Err(_) => "unreachable",
    };

    Json(HealthResponse {
        status: if vector_store == "ok" { "healthy" } else { "degraded" },
        model_info: ModelInfo {
            model_name: state.embedder.model_name().to_string(),
            vector_size: state.embedder.dimension(),
            is_loaded: true,
            collection_name: state.collection_name.clone(),
        },
        vector_store,
    })
}

pub async fn index_directory(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<IndexDirectoryResponse>, ApiError> {
    let path = absolute_path(&req.path)?;
    let metadata = std::fs::metadata(&path)
        .map_err(|_| ApiError::not_found(format!("directory not found: {}", path.display())))?;
    if !metadata.is_dir() {
        return Err(ApiError::bad_request(format!(
            "path is not a directory: {}",
            path.display()
        )));
    }

    let canonical = path.canonicalize().unwrap_or(path);
    let summary = state.indexer.clone().index_directory(&canonical).await?;
    state.watcher.watch(&canonical).await?;

    Ok(Json(IndexDirectoryResponse {
        success: true,
        files_processed: summary.files_processed,
        chunks_indexed: summary.chunks_indexed,
        total_files: summary.total_files,
        directory: canonical.to_string_lossy().into_owned(),
    }))
}

pub async fn index_file(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<IndexFileResponse>, ApiError> {
    let path = absolute_path(&req.path)?;
    require_file(&path)?;

    let report = state.indexer.index_file(&path).await?;
    Ok(Json(IndexFileResponse::from_report(report, false)))
}

pub async fn reindex_file(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<IndexFileResponse>, ApiError> {
    let path = absolute_path(&req.path)?;
    require_file(&path)?;

    let report = state.indexer.reindex_file(&path).await?;
    Ok(Json(IndexFileResponse::from_report(report, true)))
}

/// Removal does not require the path to still exist on disk; the usual
/// caller has just watched the file disappear.
pub async fn remove_file(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<RemoveFileResponse>, ApiError> {
    let path = absolute_path(&req.path)?;

    let removed = state.indexer.remove_file(&path).await?;
    Ok(Json(RemoveFileResponse {
        success: true,
        chunks_removed: removed,
        file_name: semdex_core::file_name_of(&path),
        file_path: path.to_string_lossy().into_owned(),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let outcome = state.search.search(&req.query, req.top_k, None).await?;

    Ok(Json(SearchResponse {
        query: outcome.query,
        top_k: outcome.top_k,
        total_results: outcome.results.len(),
        results: outcome.results,
        cached: outcome.cached,
    }))
}

pub async fn file_content(
    State(state): State<AppState>,
    Json(req): Json<PathRequest>,
) -> Result<Json<FileContentResponse>, ApiError> {
    let path = absolute_path(&req.path)?;

    match state.search.file_content(&path).await? {
        Some((content, total_chunks)) => Ok(Json(FileContentResponse {
            success: true,
            file_name: semdex_core::file_name_of(&path),
            file_path: path.to_string_lossy().into_owned(),
            content_length: content.len(),
            content,
            total_chunks,
        })),
        None => Err(ApiError::not_found(format!(
            "no indexed content for: {}",
            path.display()
        ))),
    }
}

/// Introspection: every tracked file with its chunk count, without
/// touching the vector store.
pub async fn debug_indexed_files(
    State(state): State<AppState>,
) -> Result<Json<IndexedFilesResponse>, ApiError> {
    let records = state
        .registry
        .list_files()
        .await
        .map_err(|e| ApiError::from(Error::Registry(e.to_string())))?;

    let total_points = records.iter().map(|r| u64::from(r.chunk_count)).sum();
    let files = records
        .into_iter()
        .map(|record| IndexedFileInfo {
            file_name: semdex_core::file_name_of(&record.path),
            file_path: record.path.to_string_lossy().into_owned(),
            file_type: record.file_type,
            status: record.status,
            chunks: record.chunk_count,
            size: record.size_bytes,
        })
        .collect::<Vec<_>>();

    Ok(Json(IndexedFilesResponse {
        total_files: files.len(),
        total_points,
        files,
    }))
}

pub async fn cache_stats(State(state): State<AppState>) -> Json<CacheStatsResponse> {
    Json(CacheStatsResponse {
        success: true,
        embedding_cache: state.embedder.cache_stats(),
        search_cache: state.search.cache_stats(),
    })
}

pub async fn cache_clear(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.embedder.clear_cache();
    state.search_cache.invalidate_all();
    Json(json!({ "success": true, "message": "all caches cleared" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_path_validation() {
        assert!(absolute_path("/ok/path.txt").is_ok());
        assert!(absolute_path("relative/path.txt").is_err());
        assert!(absolute_path("").is_err());
        assert!(absolute_path("   ").is_err());
    }

    #[test]
    fn test_index_file_response_serialization() {
        let report = FileReport {
            path: PathBuf::from("/docs/a.txt"),
            file_name: "a.txt".to_string(),
            file_type: ".txt".to_string(),
            checksum: Some("abc".to_string()),
            size_bytes: 10,
            chunks_indexed: 2,
            outcome: IndexOutcome::Indexed,
            warning: None,
        };
        let response = IndexFileResponse::from_report(report, true);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["chunksIndexed"], 2);
        assert_eq!(json["filePath"], "/docs/a.txt");
        assert_eq!(json["reindexed"], true);
        assert!(json.get("skipped").is_none());
        assert!(json.get("warning").is_none());
    }

    #[test]
    fn test_skipped_report_serialization() {
        let report = FileReport::new(Path::new("/docs/a.tar"), IndexOutcome::Skipped);
        let response = IndexFileResponse::from_report(report, false);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["skipped"], true);
        assert_eq!(json["chunksIndexed"], 0);
    }

    #[test]
    fn test_failed_report_serialization() {
        let mut report = FileReport::new(Path::new("/docs/bad.pdf"), IndexOutcome::Failed);
        report.warning = Some("parse error: truncated".to_string());
        let response = IndexFileResponse::from_report(report, false);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["warning"], "parse error: truncated");
    }
}
