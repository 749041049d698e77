//! Query-time retrieval against a built collection

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{EmbeddingProvider, VectorSearchResult, VectorStoreProvider};
use crate::types::SourceRef;

use super::index::IndexHandle;

/// Embeds a question and ranks collection entries against it
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Retriever {
    /// The embedder must be the one the collection was built with
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder }
    }

    /// Up to `k` chunks most similar to `query`, best first
    pub async fn retrieve(
        &self,
        index: &IndexHandle,
        query: &str,
        k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        if index.embedding_model != self.embedder.model() {
            return Err(Error::retrieval(format!(
                "collection '{}' was built with {}, query embedder is {}",
                index.collection,
                index.embedding_model,
                self.embedder.model()
            )));
        }

        if index.store.is_empty().await? {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        if query_embedding.len() != index.dimensions {
            return Err(Error::retrieval(format!(
                "query embedding has {} dimensions, collection '{}' has {}",
                query_embedding.len(),
                index.collection,
                index.dimensions
            )));
        }

        let results = index
            .store
            .search(&query_embedding, k)
            .await
            .map_err(|e| match e {
                Error::Retrieval(_) => e,
                other => Error::retrieval(other.to_string()),
            })?;

        tracing::debug!(
            "Retrieved {} of {} requested chunks from '{}'",
            results.len(),
            k,
            index.collection
        );
        Ok(results)
    }
}

/// Retrieved chunks assembled for the prompt
#[derive(Debug, Clone, Default)]
pub struct RetrievedContext {
    /// Chunk texts joined with newlines, best match first
    pub text: String,
    pub sources: Vec<SourceRef>,
}

impl RetrievedContext {
    pub fn from_results(results: &[VectorSearchResult]) -> Self {
        Self {
            text: PromptBuilder::build_context(results),
            sources: results
                .iter()
                .map(|r| SourceRef::from_chunk(&r.chunk, r.similarity))
                .collect(),
        }
    }

    /// True when nothing usable was retrieved
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
