//! Image extractor: decode and hand off to OCR.

use async_trait::async_trait;
use semdex_core::{ExtractError, TextParser};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::ocr::OcrEngine;

/// Parser for raster image files. The extracted "text" is whatever the OCR
/// engine recognizes; an unreadable photo legitimately yields nothing.
pub struct ImageParser {
    ocr: Arc<dyn OcrEngine>,
}

impl ImageParser {
    #[must_use]
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextParser for ImageParser {
    fn extensions(&self) -> &[&str] {
        &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff"]
    }

    async fn parse(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| ExtractError::Parse(format!("task join error: {e}")))?
            .map_err(|e| ExtractError::Parse(format!("image decode failed: {e}")))?;

        let text = self.ocr.recognize(&image).await?;
        debug!(path = %path.display(), chars = text.len(), "image ocr complete");
        Ok(text)
    }
}
