//! PDF extractor with per-page OCR fallback.
//!
//! For each page the text layer is extracted first. Pages whose text layer
//! is empty or whitespace-only (scanned pages) fall back to decoding the
//! page's largest embedded raster image and running OCR on it. The two
//! kinds of pages mix freely within one document; per-page outputs are
//! concatenated in page order, separated by blank lines.

use async_trait::async_trait;
use flate2::read::ZlibDecoder;
use image::DynamicImage;
use lopdf::Document;
use semdex_core::{ExtractError, TextParser};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ocr::{normalize_whitespace, OcrEngine};

/// Skip decorative images below this edge length.
const MIN_DIMENSION: i64 = 50;

/// One page after the blocking load pass.
struct PdfPage {
    number: u32,
    text: String,
    /// Largest embedded raster, present only when the text layer is empty
    scan: Option<DynamicImage>,
}

/// Parser for `.pdf` files.
pub struct PdfParser {
    ocr: Arc<dyn OcrEngine>,
}

impl PdfParser {
    #[must_use]
    pub fn new(ocr: Arc<dyn OcrEngine>) -> Self {
        Self { ocr }
    }
}

#[async_trait]
impl TextParser for PdfParser {
    fn extensions(&self) -> &[&str] {
        &["pdf"]
    }

    async fn parse(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;

        let pages = tokio::task::spawn_blocking(move || load_pages(&bytes))
            .await
            .map_err(|e| ExtractError::Parse(format!("task join error: {e}")))??;

        let mut sections = Vec::with_capacity(pages.len());
        for page in pages {
            if !page.text.is_empty() {
                sections.push(page.text);
            } else if let Some(scan) = page.scan {
                debug!(page = page.number, "text layer empty, running ocr");
                let recognized = self.ocr.recognize(&scan).await?;
                if !recognized.is_empty() {
                    sections.push(recognized);
                }
            }
        }

        Ok(sections.join("\n\n"))
    }
}

/// Blocking pass: per-page text layers plus the scan candidate for pages
/// without one.
fn load_pages(bytes: &[u8]) -> Result<Vec<PdfPage>, ExtractError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| ExtractError::Parse(format!("failed to load pdf: {e}")))?;

    let mut pages = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let text = doc
            .extract_text(&[number])
            .map(|t| normalize_whitespace(&t))
            .unwrap_or_else(|e| {
                debug!(page = number, "text layer extraction failed: {e}");
                String::new()
            });

        let scan = if text.is_empty() {
            page_scan(&doc, page_id, number)
        } else {
            None
        };

        pages.push(PdfPage { number, text, scan });
    }

    Ok(pages)
}

/// Decode the largest embedded raster image of a page.
fn page_scan(doc: &Document, page_id: lopdf::ObjectId, number: u32) -> Option<DynamicImage> {
    let images = match doc.get_page_images(page_id) {
        Ok(images) => images,
        Err(e) => {
            debug!(page = number, "no images on page: {e}");
            return None;
        }
    };

    images
        .iter()
        .filter(|img| img.width >= MIN_DIMENSION && img.height >= MIN_DIMENSION)
        .max_by_key(|img| img.width * img.height)
        .and_then(|img| match decode_pdf_image(img) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(page = number, "failed to decode page image: {e}");
                None
            }
        })
}

/// Decode a PDF XObject image into a raster usable by the OCR engine.
fn decode_pdf_image(pdf_image: &lopdf::xobject::PdfImage) -> Result<DynamicImage, String> {
    let filters = pdf_image
        .filters
        .as_ref()
        .ok_or_else(|| "image stream has no filter".to_string())?;

    if filters.iter().any(|f| f == "DCTDecode") {
        // JPEG, the content is the compressed stream itself.
        return image::load_from_memory(pdf_image.content)
            .map_err(|e| format!("jpeg decode failed: {e}"));
    }

    if filters.iter().any(|f| f == "FlateDecode") {
        return decode_flate_image(pdf_image);
    }

    // JPXDecode and friends: let the image crate sniff the format.
    image::load_from_memory(pdf_image.content)
        .map_err(|_| format!("unsupported image filters: {filters:?}"))
}

/// Decompress a FlateDecode stream and rebuild the raw raster.
fn decode_flate_image(pdf_image: &lopdf::xobject::PdfImage) -> Result<DynamicImage, String> {
    let mut decoder = ZlibDecoder::new(pdf_image.content);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| format!("decompression failed: {e}"))?;

    let width = pdf_image.width as u32;
    let height = pdf_image.height as u32;
    let color_space = pdf_image.color_space.as_deref().unwrap_or("DeviceRGB");

    let img = match color_space {
        "DeviceGray" | "Gray" | "CalGray" => {
            image::GrayImage::from_raw(width, height, raw).map(DynamicImage::ImageLuma8)
        }
        "DeviceCMYK" | "CMYK" => {
            let rgb = cmyk_to_rgb(&raw);
            image::RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
        }
        _ => image::RgbImage::from_raw(width, height, raw).map(DynamicImage::ImageRgb8),
    };

    img.ok_or_else(|| format!("raster size mismatch for {width}x{height} {color_space}"))
}

/// Convert CMYK bytes to RGB.
fn cmyk_to_rgb(cmyk: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((cmyk.len() / 4) * 3);
    for px in cmyk.chunks_exact(4) {
        let c = f32::from(px[0]) / 255.0;
        let m = f32::from(px[1]) / 255.0;
        let y = f32::from(px[2]) / 255.0;
        let k = f32::from(px[3]) / 255.0;

        rgb.push((255.0 * (1.0 - c) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - m) * (1.0 - k)) as u8);
        rgb.push((255.0 * (1.0 - y) * (1.0 - k)) as u8);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// OCR fake that returns a canned string and counts invocations.
    struct CannedOcr {
        text: String,
        calls: AtomicUsize,
    }

    impl CannedOcr {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for CannedOcr {
        async fn recognize(&self, _image: &DynamicImage) -> Result<String, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.text.clone())
        }
    }

    /// Minimal single-page PDF with a real text layer.
    fn text_pdf(content: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let ops = format!("BT /F1 24 Tf 72 700 Td ({content}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, ops.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[tokio::test]
    async fn test_text_layer_page_skips_ocr() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, text_pdf("Introduction")).unwrap();

        let ocr = Arc::new(CannedOcr::new("SHOULD NOT APPEAR"));
        let parser = PdfParser::new(ocr.clone());

        let text = parser.parse(&path).await.unwrap();

        assert!(text.contains("Introduction"), "got: {text}");
        assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.pdf");
        std::fs::write(&path, b"%PDF-not really").unwrap();

        let parser = PdfParser::new(Arc::new(CannedOcr::new("")));
        let err = parser.parse(&path).await;
        assert!(matches!(err, Err(ExtractError::Parse(_))));
    }

    #[test]
    fn test_cmyk_to_rgb_black_and_white() {
        // Pure K channel = black.
        let rgb = cmyk_to_rgb(&[0, 0, 0, 255]);
        assert_eq!(rgb, vec![0, 0, 0]);

        // No ink = white.
        let rgb = cmyk_to_rgb(&[0, 0, 0, 0]);
        assert_eq!(rgb, vec![255, 255, 255]);
    }

    #[test]
    fn test_load_pages_counts_pages() {
        let bytes = text_pdf("Hello");
        let pages = load_pages(&bytes).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].number, 1);
        assert!(pages[0].scan.is_none());
    }
}
