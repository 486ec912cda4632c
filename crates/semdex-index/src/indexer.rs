//! End-to-end indexing pipeline: file → parse → chunk → embed → store.
//!
//! Operations on the same path are serialized through a per-path lock;
//! different paths proceed in parallel. A file's chunk set is replaced as
//! a whole or not at all: embeddings are computed for the full batch
//! before anything is written, and the old points are deleted only when
//! the digest changed.

use chrono::Utc;
use semdex_chunker::WindowChunker;
use semdex_core::{
    point_id, ChunkPayload, Error, ExtractError, FileRecord, FileReport, FileStatus,
    IndexOutcome, Parsed, Result, ScanSummary, VectorPoint, VectorStore,
};
use semdex_embed::EmbeddingService;
use semdex_extract::ParserRegistry;
use semdex_registry::FileRegistry;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::sync::{Mutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::search::SearchCache;

/// Indexer tuning knobs.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Chunk window in whitespace tokens
    pub chunk_size: usize,
    /// Overlap between consecutive windows
    pub chunk_overlap: usize,
    /// Bound on files in flight during a directory scan
    pub max_in_flight: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            chunk_size: WindowChunker::DEFAULT_CHUNK_SIZE,
            chunk_overlap: WindowChunker::DEFAULT_OVERLAP,
            max_in_flight: 8,
        }
    }
}

/// Serializes operations per path while letting distinct paths run in
/// parallel. Unused entries are pruned on the way in.
#[derive(Default)]
struct PathLocks {
    inner: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(map.entry(path.to_path_buf()).or_default())
        };
        lock.lock_owned().await
    }
}

/// The indexing pipeline.
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    parsers: Arc<ParserRegistry>,
    embedder: Arc<EmbeddingService>,
    registry: Arc<FileRegistry>,
    search_cache: Arc<SearchCache>,
    chunker: WindowChunker,
    locks: PathLocks,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        parsers: Arc<ParserRegistry>,
        embedder: Arc<EmbeddingService>,
        registry: Arc<FileRegistry>,
        search_cache: Arc<SearchCache>,
        config: IndexerConfig,
    ) -> Result<Self> {
        let chunker = WindowChunker::new(config.chunk_size, config.chunk_overlap)?;
        Ok(Self {
            store,
            parsers,
            embedder,
            registry,
            search_cache,
            chunker,
            locks: PathLocks::default(),
            config,
        })
    }

    pub fn parsers(&self) -> &Arc<ParserRegistry> {
        &self.parsers
    }

    /// Index one file. No-op when the digest is unchanged and the file is
    /// already indexed. Files indexed this way have no owning directory
    /// in the registry.
    pub async fn index_file(&self, path: &Path) -> Result<FileReport> {
        self.index_file_in(path, None).await
    }

    /// Like [`Self::index_file`], recording the owning registered
    /// directory. Used by the directory-scan fan-out.
    async fn index_file_in(&self, path: &Path, dir_id: Option<i64>) -> Result<FileReport> {
        let _guard = self.locks.acquire(path).await;
        self.run_pipeline(path, true, dir_id).await
    }

    /// Rebuild a file unconditionally: delete its points, then run the
    /// full pipeline without the unchanged short-circuit. Used when the
    /// caller knows the content changed.
    pub async fn reindex_file(&self, path: &Path) -> Result<FileReport> {
        let _guard = self.locks.acquire(path).await;
        self.store
            .delete_by_file(path)
            .await
            .map_err(Error::from)?;
        self.run_pipeline(path, false, None).await
    }

    /// Drop a file from the index: points, record, search cache.
    pub async fn remove_file(&self, path: &Path) -> Result<u64> {
        let _guard = self.locks.acquire(path).await;

        let removed = self
            .store
            .delete_by_file(path)
            .await
            .map_err(Error::from)?;
        self.registry
            .remove_file(path)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;
        self.search_cache.invalidate_all();

        info!(path = %path.display(), removed, "file removed from index");
        Ok(removed)
    }

    /// Walk a directory tree and index every supported regular file.
    /// Registers the directory; per-file failures are counted, never
    /// propagated. Takes the indexer by `Arc` to fan file work out
    /// across tasks.
    pub async fn index_directory(self: Arc<Self>, root: &Path) -> Result<ScanSummary> {
        if !root.is_dir() {
            return Err(Error::NotFound(root.to_path_buf()));
        }

        let dir_id = self
            .registry
            .add_directory(root)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;

        let files = collect_supported_files(root, Arc::clone(&self.parsers)).await?;
        let total_files = files.len() as u64;
        info!(root = %root.display(), total_files, "directory scan started");

        let permits = Arc::new(Semaphore::new(self.config.max_in_flight.max(1)));
        let mut tasks = JoinSet::new();
        for file in files {
            let indexer = Arc::clone(&self);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                indexer.index_file_in(&file, Some(dir_id)).await
            });
        }

        let mut summary = ScanSummary {
            total_files,
            ..ScanSummary::default()
        };
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => match report.outcome {
                    IndexOutcome::Indexed | IndexOutcome::Unchanged | IndexOutcome::Empty => {
                        summary.files_processed += 1;
                        summary.chunks_indexed += u64::from(report.chunks_indexed);
                    }
                    IndexOutcome::Skipped => summary.files_skipped += 1,
                    IndexOutcome::Failed => summary.files_failed += 1,
                },
                Ok(Err(e)) => {
                    warn!("file failed during scan: {e}");
                    summary.files_failed += 1;
                }
                Err(e) => {
                    warn!("scan task panicked: {e}");
                    summary.files_failed += 1;
                }
            }
        }

        info!(
            processed = summary.files_processed,
            chunks = summary.chunks_indexed,
            skipped = summary.files_skipped,
            failed = summary.files_failed,
            "directory scan finished"
        );
        Ok(summary)
    }

    /// The single-file pipeline. Caller holds the per-path lock.
    async fn run_pipeline(
        &self,
        path: &Path,
        skip_unchanged: bool,
        dir_id: Option<i64>,
    ) -> Result<FileReport> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|_| Error::NotFound(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(Error::InvalidInput(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        if !self.parsers.is_supported(path) {
            return Ok(FileReport::new(path, IndexOutcome::Skipped));
        }

        let digest = file_digest(path).await?;
        let prior = self
            .registry
            .get_file(path)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;

        if skip_unchanged {
            if let Some(existing) = &prior {
                if existing.checksum == digest && existing.status == FileStatus::Indexed {
                    debug!(path = %path.display(), "digest unchanged, skipping");
                    let mut report = FileReport::new(path, IndexOutcome::Unchanged);
                    report.checksum = Some(digest);
                    report.size_bytes = metadata.len();
                    report.chunks_indexed = existing.chunk_count;
                    return Ok(report);
                }
            }
        }

        let modified_at = metadata
            .modified()
            .map(chrono::DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let mut record = FileRecord {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            modified_at,
            checksum: digest.clone(),
            file_type: semdex_core::extension_of(path),
            status: FileStatus::Pending,
            last_indexed: prior.as_ref().and_then(|p| p.last_indexed),
            chunk_count: prior.as_ref().map(|p| p.chunk_count).unwrap_or(0),
        };
        self.registry
            .upsert_file(&record, dir_id)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;

        let text = match self.parsers.parse(path).await {
            Ok(Parsed::Text(text)) => text,
            Ok(Parsed::Unsupported) => {
                return Ok(FileReport::new(path, IndexOutcome::Skipped));
            }
            Err(e) => return self.soft_fail(path, record, e).await,
        };

        let chunks = self.chunker.chunk(&text);
        if chunks.is_empty() {
            return self.finish_empty(path, record, prior.as_ref(), dir_id).await;
        }

        let chunk_refs: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let vectors = match self.embedder.embed_batch(&chunk_refs).await {
            Ok(vectors) => vectors,
            Err(e) => {
                self.mark_failed(path).await;
                return Err(Error::from(e));
            }
        };

        let points = build_points(path, &digest, metadata.len(), &chunks, vectors);

        // On a content change the old chunk set may be longer than the new
        // one; stale ids would survive the upsert, so clear them first. A
        // record that is not cleanly indexed may sit next to points of an
        // older digest, so those are cleared too.
        if let Some(existing) = &prior {
            if existing.checksum != digest || existing.status != FileStatus::Indexed {
                if let Err(e) = self.store.delete_by_file(path).await {
                    self.mark_failed(path).await;
                    return Err(Error::from(e));
                }
            }
        }

        if let Err(e) = self.store.upsert(&points).await {
            self.mark_failed(path).await;
            return Err(Error::from(e));
        }

        record.status = FileStatus::Indexed;
        record.last_indexed = Some(Utc::now());
        record.chunk_count = points.len() as u32;
        self.registry
            .upsert_file(&record, dir_id)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;
        self.search_cache.invalidate_all();

        info!(path = %path.display(), chunks = points.len(), "file indexed");

        let mut report = FileReport::new(path, IndexOutcome::Indexed);
        report.checksum = Some(digest);
        report.size_bytes = metadata.len();
        report.chunks_indexed = points.len() as u32;
        Ok(report)
    }

    /// Parse failure: keep previously indexed chunks, mark failed, report
    /// success with a warning so the batch moves on.
    async fn soft_fail(
        &self,
        path: &Path,
        record: FileRecord,
        cause: ExtractError,
    ) -> Result<FileReport> {
        warn!(path = %path.display(), "parse failed: {cause}");
        self.mark_failed(path).await;

        let mut report = FileReport::new(path, IndexOutcome::Failed);
        report.checksum = Some(record.checksum);
        report.size_bytes = record.size_bytes;
        report.warning = Some(cause.to_string());
        Ok(report)
    }

    /// Zero extractable text: the record stays, with zero points. Stale
    /// points of an older digest are cleared.
    async fn finish_empty(
        &self,
        path: &Path,
        mut record: FileRecord,
        prior: Option<&FileRecord>,
        dir_id: Option<i64>,
    ) -> Result<FileReport> {
        if let Some(existing) = prior {
            if existing.checksum != record.checksum || existing.status != FileStatus::Indexed {
                self.store
                    .delete_by_file(path)
                    .await
                    .map_err(Error::from)?;
            }
        }

        record.status = FileStatus::Indexed;
        record.last_indexed = Some(Utc::now());
        record.chunk_count = 0;
        self.registry
            .upsert_file(&record, dir_id)
            .await
            .map_err(|e| Error::Registry(e.to_string()))?;
        self.search_cache.invalidate_all();

        debug!(path = %path.display(), "no extractable text, indexed with 0 chunks");

        let mut report = FileReport::new(path, IndexOutcome::Empty);
        report.checksum = Some(record.checksum.clone());
        report.size_bytes = record.size_bytes;
        Ok(report)
    }

    async fn mark_failed(&self, path: &Path) {
        if let Err(e) = self.registry.set_status(path, FileStatus::Failed).await {
            warn!(path = %path.display(), "failed to record failure: {e}");
        }
    }
}

/// Streaming SHA-256 of a file's raw bytes; never loads the file whole.
async fn file_digest(path: &Path) -> Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Blocking walk collecting regular files with supported extensions.
async fn collect_supported_files(
    root: &Path,
    parsers: Arc<ParserRegistry>,
) -> Result<Vec<PathBuf>> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && parsers.is_supported(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => warn!("walk error under {}: {e}", root.display()),
            }
        }
        files
    })
    .await
    .map_err(|e| Error::Other(format!("walk task failed: {e}")))
}

/// Assemble vector points with ids derived from (path, digest, index).
fn build_points(
    path: &Path,
    digest: &str,
    file_size: u64,
    chunks: &[String],
    vectors: Vec<Vec<f32>>,
) -> Vec<VectorPoint> {
    let file_path = path.to_string_lossy().into_owned();
    let file_name = semdex_core::file_name_of(path);
    let file_type = semdex_core::extension_of(path);

    chunks
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (chunk, vector))| VectorPoint {
            id: point_id(path, digest, i as u32),
            vector,
            payload: ChunkPayload {
                file_path: file_path.clone(),
                file_name: file_name.clone(),
                file_hash: digest.to_string(),
                file_size,
                file_type: file_type.clone(),
                chunk: chunk.clone(),
                chunk_index: i as u32,
                chunk_size: chunk.chars().count() as u32,
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{noop_ocr, BagOfWordsEmbedder};
    use semdex_embed::EmbedCacheConfig;
    use semdex_store::MemoryStore;
    use tempfile::tempdir;

    async fn test_indexer(store: Arc<MemoryStore>) -> Arc<Indexer> {
        let parsers = Arc::new(ParserRegistry::with_defaults(noop_ocr()));
        let embedder = Arc::new(EmbeddingService::new(
            Arc::new(BagOfWordsEmbedder::new(64)),
            EmbedCacheConfig::default(),
            2,
        ));
        let registry = Arc::new(FileRegistry::new(":memory:").await.unwrap());
        let cache = Arc::new(SearchCache::new(16, 60));

        Arc::new(
            Indexer::new(
                store,
                parsers,
                embedder,
                registry,
                cache,
                IndexerConfig {
                    chunk_size: 16,
                    chunk_overlap: 4,
                    max_in_flight: 4,
                },
            )
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_index_file_writes_points_and_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "the quick brown fox jumps over the lazy dog").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let report = indexer.index_file(&path).await.unwrap();

        assert_eq!(report.outcome, IndexOutcome::Indexed);
        assert_eq!(report.chunks_indexed, 1);
        assert_eq!(store.count_by_file(&path).await.unwrap(), 1);

        let record = indexer.registry.get_file(&path).await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Indexed);
        assert_eq!(record.chunk_count, 1);
        assert_eq!(record.checksum, report.checksum.unwrap());
    }

    #[tokio::test]
    async fn test_index_file_twice_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "stable content that does not change").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let first = indexer.index_file(&path).await.unwrap();
        let points_after_first = store.total_points().await;
        let second = indexer.index_file(&path).await.unwrap();

        assert_eq!(first.outcome, IndexOutcome::Indexed);
        assert_eq!(second.outcome, IndexOutcome::Unchanged);
        assert_eq!(second.chunks_indexed, first.chunks_indexed);
        assert_eq!(store.total_points().await, points_after_first);
    }

    #[tokio::test]
    async fn test_reindex_replaces_old_digest_points() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "the quick brown fox jumps over the lazy dog").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;
        indexer.index_file(&path).await.unwrap();
        let old_digest = indexer
            .registry
            .get_file(&path)
            .await
            .unwrap()
            .unwrap()
            .checksum;

        std::fs::write(&path, "lorem ipsum").unwrap();
        let report = indexer.reindex_file(&path).await.unwrap();

        assert_eq!(report.outcome, IndexOutcome::Indexed);
        assert_eq!(store.count_by_file(&path).await.unwrap(), 1);

        // No surviving point carries the pre-reindex digest.
        for hit in store.points_by_file(&path).await.unwrap() {
            assert_ne!(hit.payload.file_hash, old_digest);
        }
    }

    #[tokio::test]
    async fn test_remove_file_clears_everything() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "soon to be gone").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;
        indexer.index_file(&path).await.unwrap();

        let removed = indexer.remove_file(&path).await.unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.count_by_file(&path).await.unwrap(), 0);
        assert!(indexer.registry.get_file(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unsupported_extension_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("binary.exe");
        std::fs::write(&path, b"\x7fELF").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let report = indexer.index_file(&path).await.unwrap();

        assert_eq!(report.outcome, IndexOutcome::Skipped);
        assert!(indexer.registry.get_file(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_zero_byte_file_indexed_with_zero_chunks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let report = indexer.index_file(&path).await.unwrap();

        assert_eq!(report.outcome, IndexOutcome::Empty);
        assert_eq!(report.chunks_indexed, 0);

        let record = indexer.registry.get_file(&path).await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Indexed);
        assert_eq!(record.chunk_count, 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(store).await;

        let err = indexer.index_file(Path::new("/no/such/file.txt")).await;
        assert!(matches!(err, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_parse_failure_is_soft() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-garbage").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let report = indexer.index_file(&path).await.unwrap();

        assert_eq!(report.outcome, IndexOutcome::Failed);
        assert!(report.warning.is_some());

        let record = indexer.registry.get_file(&path).await.unwrap().unwrap();
        assert_eq!(record.status, FileStatus::Failed);
    }

    #[tokio::test]
    async fn test_index_directory_aggregates() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha beta gamma").unwrap();
        std::fs::write(dir.path().join("b.md"), "delta epsilon").unwrap();
        std::fs::write(dir.path().join("c.bin"), b"\x00\x01").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub/d.txt"), "nested words here").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let summary = Arc::clone(&indexer).index_directory(dir.path()).await.unwrap();

        // The .bin never enters the work list.
        assert_eq!(summary.total_files, 3);
        assert_eq!(summary.files_processed, 3);
        assert_eq!(summary.files_failed, 0);
        assert_eq!(summary.chunks_indexed, 3);
        assert_eq!(store.total_points().await, 3);

        let dirs = indexer.registry.list_directories().await.unwrap();
        assert_eq!(dirs.len(), 1);
    }

    #[tokio::test]
    async fn test_index_directory_records_owning_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha beta").unwrap();
        std::fs::write(dir.path().join("b.txt"), "gamma delta").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        Arc::clone(&indexer)
            .index_directory(dir.path())
            .await
            .unwrap();

        // add_directory is idempotent, so this reads back the scan's id.
        let dir_id = indexer.registry.add_directory(dir.path()).await.unwrap();
        let owned = indexer.registry.files_for_directory(dir_id).await.unwrap();
        assert_eq!(owned.len(), 2);

        // A file indexed directly has no owning directory.
        let loose = dir.path().join("loose.txt");
        std::fs::write(&loose, "standalone words").unwrap();
        indexer.index_file(&loose).await.unwrap();

        let owned = indexer.registry.files_for_directory(dir_id).await.unwrap();
        assert_eq!(owned.len(), 2);
    }

    #[tokio::test]
    async fn test_index_directory_twice_leaves_store_unchanged() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha beta gamma").unwrap();
        std::fs::write(dir.path().join("b.txt"), "delta epsilon zeta").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let first = Arc::clone(&indexer).index_directory(dir.path()).await.unwrap();
        let points_before = store.total_points().await;
        let second = Arc::clone(&indexer).index_directory(dir.path()).await.unwrap();

        assert_eq!(first.files_processed, second.files_processed);
        assert_eq!(store.total_points().await, points_before);
    }

    #[tokio::test]
    async fn test_concurrent_same_path_serialized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contended.txt");
        std::fs::write(&path, "some contended content right here").unwrap();

        let store = Arc::new(MemoryStore::new());
        let indexer = test_indexer(Arc::clone(&store)).await;

        let mut tasks = JoinSet::new();
        for _ in 0..4 {
            let indexer = Arc::clone(&indexer);
            let path = path.clone();
            tasks.spawn(async move { indexer.reindex_file(&path).await });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap().unwrap();
        }

        // Final state equals one clean run.
        assert_eq!(store.count_by_file(&path).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_digest_streams() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.txt");
        std::fs::write(&path, "hello").unwrap();

        let digest = file_digest(&path).await.unwrap();
        assert_eq!(digest, semdex_core::sha256_hex(b"hello"));
    }
}
