//! OCR engine interface.
//!
//! The engine is injected wherever recognition is needed, so the PDF and
//! image parsers stay testable with a canned fake. The production
//! implementation drives the `tesseract` executable over a pipe.

use async_trait::async_trait;
use image::DynamicImage;
use semdex_core::ExtractError;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Single-method interface to an OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Run one recognition pass over the image and return the trimmed,
    /// whitespace-normalized text. An empty string is a valid result.
    async fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractError>;
}

/// OCR tuning knobs.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Tesseract page-segmentation mode. 3 = fully automatic.
    pub psm: u8,
    /// Rendering resolution hint passed to the engine.
    pub dpi: u32,
    /// Recognition language.
    pub language: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            psm: 3,
            dpi: 300,
            language: "eng".to_string(),
        }
    }
}

/// OCR engine backed by the `tesseract` executable.
///
/// The image is converted to RGB, encoded as PNG and streamed over stdin;
/// recognized text comes back on stdout. No temp files, no ambient setup.
pub struct TesseractOcr {
    config: OcrConfig,
}

impl TesseractOcr {
    #[must_use]
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }
}

impl Default for TesseractOcr {
    fn default() -> Self {
        Self::new(OcrConfig::default())
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &DynamicImage) -> Result<String, ExtractError> {
        let png = encode_rgb_png(image)?;

        let mut child = Command::new("tesseract")
            .arg("stdin")
            .arg("stdout")
            .arg("--psm")
            .arg(self.config.psm.to_string())
            .arg("--dpi")
            .arg(self.config.dpi.to_string())
            .arg("-l")
            .arg(&self.config.language)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExtractError::Ocr(format!("failed to spawn tesseract: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExtractError::Ocr("tesseract stdin unavailable".to_string()))?;
        stdin
            .write_all(&png)
            .await
            .map_err(|e| ExtractError::Ocr(format!("failed to write image: {e}")))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| ExtractError::Ocr(format!("tesseract did not exit: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = normalize_whitespace(&String::from_utf8_lossy(&output.stdout));
        debug!(chars = text.len(), "ocr pass complete");
        Ok(text)
    }
}

/// Convert to RGB and encode as PNG for the engine.
fn encode_rgb_png(image: &DynamicImage) -> Result<Vec<u8>, ExtractError> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    rgb.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        image::ImageFormat::Png,
    )
    .map_err(|e| ExtractError::Ocr(format!("png encoding failed: {e}")))?;
    Ok(bytes)
}

/// Collapse runs of spaces and blank lines, trim the result.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_newline = false;
    for line in text.lines() {
        let mut compact = String::with_capacity(line.len());
        let mut last_space = false;
        for ch in line.chars() {
            if ch.is_whitespace() {
                if !last_space && !compact.is_empty() {
                    compact.push(' ');
                }
                last_space = true;
            } else {
                compact.push(ch);
                last_space = false;
            }
        }
        let compact = compact.trim_end();
        if compact.is_empty() {
            continue;
        }
        if pending_newline {
            out.push('\n');
        }
        out.push_str(compact);
        pending_newline = true;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace_collapses_spaces() {
        assert_eq!(normalize_whitespace("a   b    c"), "a b c");
    }

    #[test]
    fn test_normalize_whitespace_collapses_blank_lines() {
        assert_eq!(normalize_whitespace("a\n\n\n\nb"), "a\nb");
    }

    #[test]
    fn test_normalize_whitespace_trims() {
        assert_eq!(normalize_whitespace("  hello  \n\n  "), "hello");
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace("\n \t \n"), "");
    }

    #[test]
    fn test_normalize_whitespace_mixed() {
        let input = "MEETING   2024\n\n\nBUDGET  \n";
        assert_eq!(normalize_whitespace(input), "MEETING 2024\nBUDGET");
    }

    #[test]
    fn test_encode_rgb_png_roundtrip() {
        let img = DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
            4,
            4,
            image::Luma([128u8]),
        ));
        let png = encode_rgb_png(&img).unwrap();
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 4);
    }

    #[test]
    fn test_ocr_config_defaults() {
        let config = OcrConfig::default();
        assert_eq!(config.psm, 3);
        assert_eq!(config.dpi, 300);
        assert_eq!(config.language, "eng");
    }
}
