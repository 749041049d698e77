//! Token segmentation used to size chunks

use std::ops::Range;
use std::path::Path;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};

/// Splits text into tokens, reported as byte ranges into the input
pub trait Tokenizer: Send + Sync {
    /// Byte ranges of each token in `text`, in order and non-overlapping
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>>;

    /// Number of tokens in `text`
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.token_spans(text)?.len())
    }

    /// Tokenizer name for logging
    fn name(&self) -> &str;
}

/// Word-boundary tokenizer (UAX #29) with GPT-2 style leading-space tokens
///
/// Whitespace runs are folded into the token that follows them, so
/// `"The sky is blue."` is `["The", " sky", " is", " blue", "."]`. Spans
/// are contiguous: concatenating them reproduces the input exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct WordPieceTokenizer;

impl Tokenizer for WordPieceTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let mut spans: Vec<Range<usize>> = Vec::new();
        let mut pending_ws: Option<usize> = None;

        for (offset, segment) in text.split_word_bound_indices() {
            if segment.chars().all(char::is_whitespace) {
                pending_ws.get_or_insert(offset);
                continue;
            }
            let start = pending_ws.take().unwrap_or(offset);
            spans.push(start..offset + segment.len());
        }

        // Trailing whitespace belongs to the last token
        if pending_ws.is_some() {
            if let Some(last) = spans.last_mut() {
                last.end = text.len();
            }
        }

        Ok(spans)
    }

    fn name(&self) -> &str {
        "word-piece"
    }
}

/// Hugging Face tokenizer loaded from a `tokenizer.json`
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl HfTokenizer {
    /// Load a tokenizer definition from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            Error::Config(format!("Failed to load tokenizer {}: {}", path.display(), e))
        })?;

        Ok(Self {
            inner,
            name: path.display().to_string(),
        })
    }
}

impl Tokenizer for HfTokenizer {
    fn token_spans(&self, text: &str) -> Result<Vec<Range<usize>>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| Error::internal(format!("Tokenization failed: {}", e)))?;

        let mut spans = Vec::with_capacity(encoding.len());
        let mut last_end = 0usize;
        for &(start, end) in encoding.get_offsets() {
            // Offsets may repeat for multi-token characters; keep them monotonic
            let start = start.max(last_end).min(text.len());
            let end = end.max(start).min(text.len());
            spans.push(start..end);
            last_end = end;
        }

        Ok(spans)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens<'a>(text: &'a str) -> Vec<&'a str> {
        WordPieceTokenizer
            .token_spans(text)
            .unwrap()
            .into_iter()
            .map(|r| &text[r])
            .collect()
    }

    #[test]
    fn test_leading_space_tokens() {
        assert_eq!(tokens("The sky is blue."), vec!["The", " sky", " is", " blue", "."]);
    }

    #[test]
    fn test_spans_cover_input() {
        let text = "  Hello,\n\nworld!  ";
        let joined: String = tokens(text).concat();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_blank_text_has_no_tokens() {
        assert!(tokens("").is_empty());
        assert!(tokens(" \n\t ").is_empty());
    }

    #[test]
    fn test_unicode_words() {
        let text = "naïve café über";
        assert_eq!(WordPieceTokenizer.count(text).unwrap(), 3);
        assert_eq!(tokens(text).concat(), text);
    }

    #[test]
    fn test_missing_tokenizer_file_is_config_error() {
        let result = HfTokenizer::from_file("/nonexistent/tokenizer.json");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
