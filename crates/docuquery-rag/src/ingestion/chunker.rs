//! Token-window chunking with overlap

use std::sync::Arc;

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::{Chunk, ExtractedText};

use super::tokenizer::{HfTokenizer, Tokenizer, WordPieceTokenizer};

/// Splits extracted text into overlapping windows of at most `chunk_size` tokens
pub struct TextChunker {
    /// Target chunk size in tokens
    chunk_size: usize,
    /// Tokens shared by consecutive chunks of the same text
    overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl TextChunker {
    /// Create a chunker using word-piece tokens
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::with_tokenizer(chunk_size, overlap, Arc::new(WordPieceTokenizer))
    }

    /// Create a chunker with an explicit tokenizer
    pub fn with_tokenizer(
        chunk_size: usize,
        overlap: usize,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::Config(format!(
                "invalid chunk window: size {} overlap {}",
                chunk_size, overlap
            )));
        }

        Ok(Self {
            chunk_size,
            overlap,
            tokenizer,
        })
    }

    /// Build from configuration, loading a Hugging Face tokenizer when one is set
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        let tokenizer: Arc<dyn Tokenizer> = match &config.tokenizer_path {
            Some(path) => Arc::new(HfTokenizer::from_file(path)?),
            None => Arc::new(WordPieceTokenizer),
        };
        tracing::debug!(
            "Chunker: {} tokens, overlap {}, tokenizer {}",
            config.chunk_size,
            config.chunk_overlap,
            tokenizer.name()
        );
        Self::with_tokenizer(config.chunk_size, config.chunk_overlap, tokenizer)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Number of chunks a text of `token_count` tokens produces
    pub fn expected_chunks(&self, token_count: usize) -> usize {
        match token_count {
            0 => 0,
            n if n <= self.chunk_size => 1,
            n => {
                let stride = self.chunk_size - self.overlap;
                (n - self.overlap).div_ceil(stride)
            }
        }
    }

    /// Chunk every extracted text
    pub fn chunk(&self, texts: &[ExtractedText]) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        for text in texts {
            chunks.extend(self.chunk_text(text)?);
        }
        Ok(chunks)
    }

    /// Chunk a single extracted text
    pub fn chunk_text(&self, text: &ExtractedText) -> Result<Vec<Chunk>> {
        let content = text.content.as_str();
        let spans = self.tokenizer.token_spans(content)?;
        let total = spans.len();

        let mut chunks = Vec::with_capacity(self.expected_chunks(total));
        let stride = self.chunk_size - self.overlap;
        let mut start = 0usize;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let byte_start = spans[start].start;
            let byte_end = spans[end - 1].end;

            let slice = content.get(byte_start..byte_end).ok_or_else(|| {
                Error::internal(format!(
                    "token span {}..{} is not on a character boundary",
                    byte_start, byte_end
                ))
            })?;

            chunks.push(Chunk::new(
                slice.to_string(),
                text.source.clone(),
                chunks.len() as u32,
                start,
                end,
            ));

            if end == total {
                break;
            }
            start += stride;
        }

        Ok(chunks)
    }
}
