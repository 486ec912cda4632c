//! fastembed-backed sentence embedder.

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use semdex_core::{EmbedError, Embedder};
use std::sync::Arc;
use tracing::info;

/// Local sentence-embedding model loaded through fastembed.
///
/// Model weights are downloaded to the local HuggingFace cache on first
/// use; loading is fatal at startup by design, so a missing model never
/// surfaces mid-pipeline.
pub struct FastembedEmbedder {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimension: usize,
}

impl FastembedEmbedder {
    /// Load a model by id. Supported ids map onto fastembed's bundled
    /// models; all produce normalized-friendly dense vectors.
    pub fn new(model_id: &str) -> Result<Self, EmbedError> {
        let (model, dimension) = match model_id {
            "all-MiniLM-L6-v2" | "all-minilm-l6-v2" => (EmbeddingModel::AllMiniLML6V2, 384),
            "bge-small-en-v1.5" => (EmbeddingModel::BGESmallENV15, 384),
            "bge-base-en-v1.5" => (EmbeddingModel::BGEBaseENV15, 768),
            other => {
                return Err(EmbedError::ModelLoad(format!(
                    "unsupported model id: {other} \
                     (supported: all-MiniLM-L6-v2, bge-small-en-v1.5, bge-base-en-v1.5)"
                )));
            }
        };

        info!(model = model_id, dimension, "loading embedding model");

        let text_embedding =
            TextEmbedding::try_new(InitOptions::new(model).with_show_download_progress(false))
                .map_err(|e| EmbedError::ModelLoad(e.to_string()))?;

        Ok(Self {
            model: Arc::new(text_embedding),
            model_name: model_id.to_string(),
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for FastembedEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // Inference is CPU-bound and blocking; keep it off the runtime.
        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();

        tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| EmbedError::Inference(format!("task join error: {e}")))?
            .map_err(|e| EmbedError::Inference(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_rejected() {
        let err = FastembedEmbedder::new("definitely-not-a-model");
        assert!(matches!(err, Err(EmbedError::ModelLoad(_))));
    }

    #[test]
    #[ignore] // Downloads model weights (~90MB); run with: cargo test -- --ignored
    fn test_load_default_model() {
        let embedder = FastembedEmbedder::new("all-MiniLM-L6-v2").unwrap();
        assert_eq!(embedder.dimension(), 384);
        assert_eq!(embedder.model_name(), "all-MiniLM-L6-v2");
    }

    #[tokio::test]
    #[ignore] // Downloads model weights (~90MB); run with: cargo test -- --ignored
    async fn test_semantic_neighbors_rank_higher() {
        let embedder = FastembedEmbedder::new("all-MiniLM-L6-v2").unwrap();
        let vectors = embedder
            .embed(&[
                "the cat sits on the mat",
                "a feline rests on the rug",
                "rust borrow checker internals",
            ])
            .await
            .unwrap();

        let cos = |a: &[f32], b: &[f32]| -> f32 {
            let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
            let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            dot / (na * nb)
        };

        assert!(cos(&vectors[0], &vectors[1]) > cos(&vectors[0], &vectors[2]));
    }
}
