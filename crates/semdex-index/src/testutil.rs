//! Shared fakes for this crate's tests.

use async_trait::async_trait;
use semdex_core::{EmbedError, Embedder, ExtractError};
use semdex_extract::OcrEngine;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Deterministic bag-of-words embedder: each word lights up one dimension,
/// so texts sharing vocabulary really are cosine-similar. Good enough to
/// exercise ranking end to end without a model.
pub struct BagOfWordsEmbedder {
    dimension: usize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.to_lowercase().split_whitespace() {
            let hash = Sha256::digest(word.as_bytes());
            let slot = usize::from(hash[0]) % self.dimension;
            vector[slot] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for BagOfWordsEmbedder {
    fn model_name(&self) -> &str {
        "bag-of-words"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|t| self.encode(t)).collect())
    }
}

struct NoopOcr;

#[async_trait]
impl OcrEngine for NoopOcr {
    async fn recognize(&self, _image: &image::DynamicImage) -> Result<String, ExtractError> {
        Ok(String::new())
    }
}

/// OCR engine that recognizes nothing.
pub fn noop_ocr() -> Arc<dyn OcrEngine> {
    Arc::new(NoopOcr)
}
