//! Qdrant-backed vector store.
//!
//! Writes use `wait=true` so a returning upsert or delete is immediately
//! visible to search, which is what lets the indexer promise read-after-
//! write to its callers.

use async_trait::async_trait;
use qdrant_client::qdrant::vectors_config::Config as VectorsConfigKind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, DeletePointsBuilder, Distance,
    Filter, PointStruct, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value,
    VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use semdex_core::{ChunkPayload, SearchFilter, SearchHit, StoreError, VectorPoint, VectorStore};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use crate::retry::with_retry;

/// Vector store adapter over a Qdrant HTTP/gRPC endpoint.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
}

impl QdrantStore {
    /// Connect to a Qdrant endpoint. The timeout applies to every request.
    pub fn new(url: &str, collection: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Qdrant::from_url(url)
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        Ok(Self {
            client,
            collection: collection.to_string(),
        })
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn file_filter(path: &Path) -> Filter {
        Filter::must([Condition::matches(
            "file_path",
            path.to_string_lossy().into_owned(),
        )])
    }

    /// Read back the configured vector size of an existing collection.
    async fn collection_dimension(&self) -> Result<Option<u64>, StoreError> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| StoreError::Query(e.to_string()))?;

        let size = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|kind| match kind {
                VectorsConfigKind::Params(params) => Some(params.size),
                VectorsConfigKind::ParamsMap(_) => None,
            });

        Ok(size)
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self, dimension: usize) -> Result<(), StoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        if exists {
            if let Some(size) = self.collection_dimension().await? {
                if size != dimension as u64 {
                    return Err(StoreError::Misconfigured(format!(
                        "collection '{}' has vector size {size}, expected {dimension}",
                        self.collection
                    )));
                }
            }
            debug!(collection = %self.collection, "collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| StoreError::Connect(e.to_string()))?;

        info!(collection = %self.collection, dimension, "created collection");
        Ok(())
    }

    async fn upsert(&self, points: &[VectorPoint]) -> Result<(), StoreError> {
        if points.is_empty() {
            return Ok(());
        }

        let structs: Vec<PointStruct> = points
            .iter()
            .map(|point| {
                let payload = payload_to_map(&point.payload)?;
                Ok(PointStruct::new(
                    point.id.to_string(),
                    point.vector.clone(),
                    payload,
                ))
            })
            .collect::<Result<_, StoreError>>()?;

        with_retry("upsert", || {
            let structs = structs.clone();
            async move {
                self.client
                    .upsert_points(
                        UpsertPointsBuilder::new(&self.collection, structs).wait(true),
                    )
                    .await
                    .map_err(|e| StoreError::Upsert(e.to_string()))?;
                Ok(())
            }
        })
        .await?;

        debug!(count = points.len(), "upserted points");
        Ok(())
    }

    async fn delete_by_file(&self, path: &Path) -> Result<u64, StoreError> {
        let removed = self.count_by_file(path).await?;

        with_retry("delete_by_file", || async move {
            self.client
                .delete_points(
                    DeletePointsBuilder::new(&self.collection)
                        .points(Self::file_filter(path))
                        .wait(true),
                )
                .await
                .map_err(|e| StoreError::Delete(e.to_string()))?;
            Ok(())
        })
        .await?;

        debug!(path = %path.display(), removed, "deleted points for file");
        Ok(removed)
    }

    async fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let response = with_retry("search", || {
            let mut builder =
                SearchPointsBuilder::new(&self.collection, query.to_vec(), top_k as u64)
                    .with_payload(true);

            if let Some(f) = filter {
                if let Some(file_type) = &f.file_type {
                    builder = builder.filter(Filter::must([Condition::matches(
                        "file_type",
                        file_type.clone(),
                    )]));
                }
            }

            async move {
                self.client
                    .search_points(builder)
                    .await
                    .map_err(|e| StoreError::Query(e.to_string()))
            }
        })
        .await?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point_uuid(point.id.as_ref())?;
                let payload = payload_from_map(&point.payload)?;
                Some(SearchHit {
                    id,
                    score: point.score,
                    payload,
                })
            })
            .collect())
    }

    async fn count_by_file(&self, path: &Path) -> Result<u64, StoreError> {
        let response = with_retry("count_by_file", || async move {
            self.client
                .count(
                    CountPointsBuilder::new(&self.collection)
                        .filter(Self::file_filter(path))
                        .exact(true),
                )
                .await
                .map_err(|e| StoreError::Query(e.to_string()))
        })
        .await?;

        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }

    async fn points_by_file(&self, path: &Path) -> Result<Vec<SearchHit>, StoreError> {
        let response = with_retry("points_by_file", || async move {
            self.client
                .scroll(
                    ScrollPointsBuilder::new(&self.collection)
                        .filter(Self::file_filter(path))
                        .limit(10_000)
                        .with_payload(true),
                )
                .await
                .map_err(|e| StoreError::Query(e.to_string()))
        })
        .await?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point_uuid(point.id.as_ref())?;
                let payload = payload_from_map(&point.payload)?;
                Some(SearchHit {
                    id,
                    score: 0.0,
                    payload,
                })
            })
            .collect())
    }
}

/// Serialize a chunk payload into Qdrant's payload map.
fn payload_to_map(payload: &ChunkPayload) -> Result<HashMap<String, Value>, StoreError> {
    let json = serde_json::to_value(payload)
        .map_err(|e| StoreError::Upsert(format!("payload serialization failed: {e}")))?;
    serde_json::from_value(json)
        .map_err(|e| StoreError::Upsert(format!("payload conversion failed: {e}")))
}

/// Rebuild a chunk payload from a Qdrant payload map. Points written by
/// anything else (missing fields) are silently dropped by callers.
fn payload_from_map(map: &HashMap<String, Value>) -> Option<ChunkPayload> {
    Some(ChunkPayload {
        file_path: map.get("file_path")?.as_str()?.to_string(),
        file_name: map.get("file_name")?.as_str()?.to_string(),
        file_hash: map.get("file_hash")?.as_str()?.to_string(),
        file_size: map.get("file_size")?.as_integer()? as u64,
        file_type: map.get("file_type")?.as_str()?.to_string(),
        chunk: map.get("chunk")?.as_str()?.to_string(),
        chunk_index: map.get("chunk_index")?.as_integer()? as u32,
        chunk_size: map.get("chunk_size")?.as_integer()? as u32,
    })
}

/// Extract the UUID form of a point id.
fn point_uuid(id: Option<&qdrant_client::qdrant::PointId>) -> Option<Uuid> {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id?.point_id_options.as_ref()? {
        PointIdOptions::Uuid(s) => Uuid::parse_str(s).ok(),
        PointIdOptions::Num(_) => None,
    }
}
