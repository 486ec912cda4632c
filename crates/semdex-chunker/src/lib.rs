//! # semdex-chunker
//!
//! Splits parsed text into overlapping windows sized for embedding.
//!
//! The unit of measure is whitespace tokens: a window holds `chunk_size`
//! tokens and consecutive windows share `overlap` tokens. The split is a
//! pure function of the input text, so chunk indices are stable across
//! reindexes of identical content.

use semdex_core::ChunkError;

/// Sliding-window chunker over whitespace tokens.
#[derive(Debug, Clone)]
pub struct WindowChunker {
    chunk_size: usize,
    overlap: usize,
}

impl WindowChunker {
    /// Default window: 800 tokens with 120 tokens of overlap.
    pub const DEFAULT_CHUNK_SIZE: usize = 800;
    pub const DEFAULT_OVERLAP: usize = 120;

    /// Create a chunker, validating the parameters.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(ChunkError::InvalidConfig(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    /// Split `text` into ordered overlapping chunks, numbered from 0 by
    /// position in the returned vector.
    ///
    /// Whitespace-only input yields no chunks; input shorter than one
    /// window yields a single chunk. Tokens are joined back with single
    /// spaces, which also normalizes the intra-chunk whitespace.
    #[must_use]
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let step = self.chunk_size - self.overlap;
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for WindowChunker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE, Self::DEFAULT_OVERLAP)
            .expect("default parameters are valid")
    }
}
