//! # semdex-extract
//!
//! Text extraction for the semdex indexing pipeline.
//!
//! Dispatch is by lowercased file extension through [`ParserRegistry`]:
//!
//! - [`PlainTextParser`]: text / source / structured text as lossy UTF-8
//! - [`DocxParser`]: Word documents, paragraph runs joined by newlines
//! - [`PdfParser`]: per-page text layer with OCR fallback for image-only
//!   pages
//! - [`ImageParser`]: raster images through OCR
//!
//! OCR is an injected [`OcrEngine`]; production uses [`TesseractOcr`],
//! tests substitute canned fakes.

pub mod docx;
pub mod image;
pub mod ocr;
pub mod pdf;
pub mod registry;
pub mod text;

pub use self::docx::DocxParser;
pub use self::image::ImageParser;
pub use self::ocr::{normalize_whitespace, OcrConfig, OcrEngine, TesseractOcr};
pub use self::pdf::PdfParser;
pub use self::registry::ParserRegistry;
pub use self::text::PlainTextParser;
