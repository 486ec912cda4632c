//! Parser registry: extension-based dispatch over the registered parsers.

use semdex_core::{ExtractError, Parsed, TextParser};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::ocr::OcrEngine;
use crate::{DocxParser, ImageParser, PdfParser, PlainTextParser};

/// Maps lowercased extensions to parsers.
pub struct ParserRegistry {
    by_extension: HashMap<String, Arc<dyn TextParser>>,
}

impl ParserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_extension: HashMap::new(),
        }
    }

    /// Registry with the full default parser set wired to one OCR engine.
    #[must_use]
    pub fn with_defaults(ocr: Arc<dyn OcrEngine>) -> Self {
        let mut registry = Self::new();
        registry.register(PlainTextParser::new());
        registry.register(DocxParser::new());
        registry.register(PdfParser::new(Arc::clone(&ocr)));
        registry.register(ImageParser::new(ocr));
        registry
    }

    /// Register a parser for every extension it claims.
    pub fn register<P: TextParser + 'static>(&mut self, parser: P) {
        let parser = Arc::new(parser);
        for ext in parser.extensions() {
            self.by_extension
                .insert((*ext).to_string(), Arc::clone(&parser) as Arc<dyn TextParser>);
        }
    }

    /// Whether any parser claims this path's extension. Dispatch is
    /// case-insensitive.
    #[must_use]
    pub fn is_supported(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    /// Parse a file. Unregistered extensions come back as
    /// [`Parsed::Unsupported`] rather than an error so callers can skip
    /// them silently.
    pub async fn parse(&self, path: &Path) -> Result<Parsed, ExtractError> {
        match self.lookup(path) {
            Some(parser) => parser.parse(path).await.map(Parsed::Text),
            None => Ok(Parsed::Unsupported),
        }
    }

    fn lookup(&self, path: &Path) -> Option<&Arc<dyn TextParser>> {
        let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
        self.by_extension.get(&ext)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::DynamicImage;
    use tempfile::tempdir;

    struct NoopOcr;

    #[async_trait]
    impl OcrEngine for NoopOcr {
        async fn recognize(&self, _image: &DynamicImage) -> Result<String, ExtractError> {
            Ok(String::new())
        }
    }

    fn defaults() -> ParserRegistry {
        ParserRegistry::with_defaults(Arc::new(NoopOcr))
    }

    #[test]
    fn test_default_registry_covers_required_families() {
        let registry = defaults();
        for name in [
            "a.txt", "a.md", "a.py", "a.js", "a.ts", "a.json", "a.csv", "a.log", "a.docx",
            "a.pdf", "a.png", "a.jpg", "a.jpeg", "a.gif", "a.bmp", "a.tif", "a.tiff",
        ] {
            assert!(registry.is_supported(Path::new(name)), "missing {name}");
        }
    }

    #[test]
    fn test_uppercase_extension_supported() {
        let registry = defaults();
        assert!(registry.is_supported(Path::new("/docs/NOTES.TXT")));
        assert!(registry.is_supported(Path::new("/docs/Scan.PnG")));
    }

    #[test]
    fn test_unknown_extension_unsupported() {
        let registry = defaults();
        assert!(!registry.is_supported(Path::new("/bin/app.exe")));
        assert!(!registry.is_supported(Path::new("/docs/noext")));
    }

    #[tokio::test]
    async fn test_parse_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello registry").unwrap();

        let registry = defaults();
        match registry.parse(&path).await.unwrap() {
            Parsed::Text(text) => assert_eq!(text, "hello registry"),
            Parsed::Unsupported => panic!("txt should be supported"),
        }
    }

    #[tokio::test]
    async fn test_parse_unsupported_is_not_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("archive.tar");
        std::fs::write(&path, b"whatever").unwrap();

        let registry = defaults();
        assert!(matches!(
            registry.parse(&path).await.unwrap(),
            Parsed::Unsupported
        ));
    }

    #[tokio::test]
    async fn test_empty_registry_supports_nothing() {
        let registry = ParserRegistry::new();
        assert!(!registry.is_supported(Path::new("a.txt")));
        assert!(matches!(
            registry.parse(Path::new("a.txt")).await.unwrap(),
            Parsed::Unsupported
        ));
    }
}
