//! In-memory store for testing without a running Qdrant.
//!
//! Brute-force cosine search over a hash map of points. Not for
//! production; it exists so the whole pipeline runs in unit and
//! integration tests.

use async_trait::async_trait;
use semdex_core::{SearchFilter, SearchHit, StoreError, VectorPoint, VectorStore};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryStore {
    points: RwLock<HashMap<Uuid, VectorPoint>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Total number of stored points, across all files.
    pub async fn total_points(&self) -> usize {
        self.points.read().await.len()
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot / (norm_a * norm_b)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn ensure_collection(&self, _dimension: usize) -> Result<(), StoreError> {
        Ok(())
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), StoreError> {
        let mut store = self.points.write().await;
        for point in points {
            store.insert(point.id, point.clone());
        }
        Ok(())
    }

    async fn delete_by_file(&self, path: &Path) -> Result<u64, StoreError> {
        let path_str = path.to_string_lossy();
        let mut store = self.points.write().await;
        let before = store.len();
        store.retain(|_, point| point.payload.file_path != path_str);
        Ok((before - store.len()) as u64)
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let store = self.points.read().await;

        let mut scored: Vec<SearchHit> = store
            .values()
            .filter(|point| match filter.and_then(|f| f.file_type.as_ref()) {
                Some(file_type) => &point.payload.file_type == file_type,
                None => true,
            })
            .map(|point| SearchHit {
                id: point.id,
                score: Self::cosine_similarity(query, &point.vector),
                payload: point.payload.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn count_by_file(&self, path: &Path) -> Result<u64, StoreError> {
        let path_str = path.to_string_lossy();
        let store = self.points.read().await;
        Ok(store
            .values()
            .filter(|point| point.payload.file_path == path_str)
            .count() as u64)
    }

    async fn points_by_file(&self, path: &Path) -> Result<Vec<SearchHit>, StoreError> {
        let path_str = path.to_string_lossy();
        let store = self.points.read().await;
        let mut hits: Vec<SearchHit> = store
            .values()
            .filter(|point| point.payload.file_path == path_str)
            .map(|point| SearchHit {
                id: point.id,
                score: 0.0,
                payload: point.payload.clone(),
            })
            .collect();
        hits.sort_by_key(|hit| hit.payload.chunk_index);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semdex_core::{point_id, ChunkPayload};

    fn make_point(path: &str, index: u32, vector: Vec<f32>) -> VectorPoint {
        let chunk = format!("chunk {index} of {path}");
        VectorPoint {
            id: point_id(Path::new(path), "digest", index),
            vector,
            payload: ChunkPayload {
                file_path: path.to_string(),
                file_name: Path::new(path)
                    .file_name()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned(),
                file_hash: "digest".to_string(),
                file_size: 100,
                file_type: ".txt".to_string(),
                chunk_size: chunk.len() as u32,
                chunk,
                chunk_index: index,
            },
        }
    }

    #[tokio::test]
    async fn test_upsert_and_count() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                make_point("/a.txt", 0, vec![1.0, 0.0]),
                make_point("/a.txt", 1, vec![0.0, 1.0]),
                make_point("/b.txt", 0, vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.count_by_file(Path::new("/a.txt")).await.unwrap(), 2);
        assert_eq!(store.count_by_file(Path::new("/b.txt")).await.unwrap(), 1);
        assert_eq!(store.total_points().await, 3);
    }

    #[tokio::test]
    async fn test_upsert_same_id_replaces() {
        let store = MemoryStore::new();
        store
            .upsert(&[make_point("/a.txt", 0, vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert(&[make_point("/a.txt", 0, vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(store.total_points().await, 1);
    }

    #[tokio::test]
    async fn test_delete_by_file() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                make_point("/a.txt", 0, vec![1.0, 0.0]),
                make_point("/b.txt", 0, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let removed = store.delete_by_file(Path::new("/a.txt")).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.count_by_file(Path::new("/a.txt")).await.unwrap(), 0);
        assert_eq!(store.count_by_file(Path::new("/b.txt")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_orders_by_similarity() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                make_point("/a.txt", 0, vec![1.0, 0.0]),
                make_point("/a.txt", 1, vec![0.0, 1.0]),
                make_point("/a.txt", 2, vec![0.7, 0.7]),
            ])
            .await
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2, None).await.unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].payload.chunk_index, 0);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score >= hits[1].score);
    }

    #[tokio::test]
    async fn test_search_with_file_type_filter() {
        let store = MemoryStore::new();
        let mut pdf_point = make_point("/doc.pdf", 0, vec![1.0, 0.0]);
        pdf_point.payload.file_type = ".pdf".to_string();
        store
            .upsert(&[make_point("/a.txt", 0, vec![1.0, 0.0]), pdf_point])
            .await
            .unwrap();

        let filter = SearchFilter {
            file_type: Some(".pdf".to_string()),
        };
        let hits = store.search(&[1.0, 0.0], 10, Some(&filter)).await.unwrap();

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.file_type, ".pdf");
    }

    #[tokio::test]
    async fn test_points_by_file_sorted_by_chunk_index() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                make_point("/a.txt", 2, vec![0.0, 1.0]),
                make_point("/a.txt", 0, vec![1.0, 0.0]),
                make_point("/a.txt", 1, vec![0.5, 0.5]),
            ])
            .await
            .unwrap();

        let hits = store.points_by_file(Path::new("/a.txt")).await.unwrap();
        let indices: Vec<u32> = hits.iter().map(|h| h.payload.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }
}
