//! Local vector store over an exact in-memory index

use async_trait::async_trait;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::retrieval::VectorIndex;
use crate::types::Chunk;

use super::vector_store::{VectorSearchResult, VectorStoreProvider};

/// Vector store backed by a [`VectorIndex`]
pub struct LocalVectorStore {
    index: RwLock<VectorIndex>,
}

impl LocalVectorStore {
    /// Wrap an existing index
    pub fn new(index: VectorIndex) -> Self {
        Self {
            index: RwLock::new(index),
        }
    }

    /// Reopen a persisted collection
    pub fn open(dir: &Path, collection: &str) -> Result<Self> {
        Ok(Self::new(VectorIndex::open(dir, collection)?))
    }

    /// Collection name
    pub fn collection(&self) -> String {
        self.index.read().name.clone()
    }

    /// Write the current contents to `dir`
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        self.index.read().persist(dir)
    }
}

#[async_trait]
impl VectorStoreProvider for LocalVectorStore {
    async fn insert_chunk(&self, chunk: &Chunk, embedding: &[f32]) -> Result<()> {
        self.index.write().insert(chunk.clone(), embedding.to_vec())
    }

    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorSearchResult>> {
        self.index.read().search(query_embedding, top_k)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.index.read().len())
    }

    async fn health_check(&self) -> Result<bool> {
        // In-process store is always available
        Ok(true)
    }

    fn name(&self) -> &str {
        "local-exact"
    }
}
