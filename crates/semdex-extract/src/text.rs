//! Plain text extractor.

use async_trait::async_trait;
use semdex_core::{ExtractError, TextParser};
use std::path::Path;
use tokio::fs;

/// Parser for plain text, source code and structured text files.
///
/// Reads the bytes as UTF-8 with replacement on decoding errors; no other
/// transformation.
pub struct PlainTextParser;

impl PlainTextParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextParser for PlainTextParser {
    fn extensions(&self) -> &[&str] {
        &[
            "txt", "md", "markdown", "py", "js", "ts", "tsx", "jsx", "json", "csv", "log",
            "yaml", "yml", "toml", "xml", "html", "htm", "css", "rs", "go", "java", "c",
            "cpp", "h", "hpp", "sh", "sql", "rb",
        ]
    }

    async fn parse(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
