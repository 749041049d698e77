//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;
use crate::error::{Error, Result};

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (nomic-embed-text)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts (batch)
    ///
    /// Default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Get embedding dimensions (768 for nomic-embed-text)
    fn dimensions(&self) -> usize;

    /// Model identity; indexing and querying must agree on it
    fn model(&self) -> &str;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject vectors that are empty, non-finite or of the wrong dimension
pub fn validate_embedding(vector: &[f32], dimensions: usize) -> Result<()> {
    if vector.is_empty() {
        return Err(Error::embedding("backend returned an empty vector"));
    }
    if vector.len() != dimensions {
        return Err(Error::embedding(format!(
            "expected {} dimensions, got {}",
            dimensions,
            vector.len()
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(Error::embedding("vector contains non-finite values"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.1, 0.2, 0.3], 3).is_ok());
        assert!(matches!(validate_embedding(&[], 3), Err(Error::Embedding(_))));
        assert!(matches!(validate_embedding(&[0.1, 0.2], 3), Err(Error::Embedding(_))));
        assert!(matches!(
            validate_embedding(&[0.1, f32::NAN, 0.3], 3),
            Err(Error::Embedding(_))
        ));
    }
}
