//! Word document extractor.
//!
//! A .docx is a ZIP archive; the body lives in `word/document.xml`. Text
//! runs (`w:t`) are concatenated in document order and paragraph ends
//! (`w:p`) become newlines.

use async_trait::async_trait;
use quick_xml::events::Event;
use semdex_core::{ExtractError, TextParser};
use std::io::Read;
use std::path::Path;

/// Decompressed cap for the document XML, against zip bombs.
const MAX_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Parser for `.docx` files.
pub struct DocxParser;

impl DocxParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextParser for DocxParser {
    fn extensions(&self) -> &[&str] {
        &["docx"]
    }

    async fn parse(&self, path: &Path) -> Result<String, ExtractError> {
        let bytes = tokio::fs::read(path).await?;
        tokio::task::spawn_blocking(move || extract_docx(&bytes))
            .await
            .map_err(|e| ExtractError::Parse(format!("task join error: {e}")))?
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Parse(format!("not a zip archive: {e}")))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Parse("word/document.xml not found".to_string()))?;

    let mut xml = Vec::new();
    entry
        .take(MAX_XML_BYTES)
        .read_to_end(&mut xml)
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    if xml.len() as u64 >= MAX_XML_BYTES {
        return Err(ExtractError::Parse(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    paragraph_runs(&xml)
}

/// Walk the XML collecting `w:t` text, one output line per `w:p`.
fn paragraph_runs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_text_run = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => {
                    let line = paragraph.trim();
                    if !line.is_empty() {
                        if !out.is_empty() {
                            out.push('\n');
                        }
                        out.push_str(line);
                    }
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                paragraph.push_str(t.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(format!("malformed xml: {e}"))),
            _ => {}
        }
        buf.clear();
    }

    // Text after the final paragraph close, if the document is odd.
    let tail = paragraph.trim();
    if !tail.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(tail);
    }

    Ok(out)
}
