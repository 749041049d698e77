//! Exact cosine index over chunk embeddings, persisted as JSON

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::providers::{
    validate_embedding, EmbeddingProvider, LocalVectorStore, VectorSearchResult,
};
use crate::types::Chunk;

/// A chunk and its embedding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// In-memory collection searched by brute-force cosine similarity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    /// Collection name; also the file stem on disk
    pub name: String,
    /// Identifies one build of the collection
    pub build_id: Uuid,
    pub built_at: DateTime<Utc>,
    /// Model that produced the stored vectors
    pub embedding_model: String,
    pub dimensions: usize,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Create an empty collection
    pub fn new(name: impl Into<String>, embedding_model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            name: name.into(),
            build_id: Uuid::new_v4(),
            built_at: Utc::now(),
            embedding_model: embedding_model.into(),
            dimensions,
            entries: Vec::new(),
        }
    }

    /// Add a chunk; the vector must match the collection's dimensions
    pub fn insert(&mut self, chunk: Chunk, embedding: Vec<f32>) -> Result<()> {
        if embedding.len() != self.dimensions {
            return Err(Error::index(format!(
                "chunk {} has {} dimensions, collection '{}' expects {}",
                chunk.id,
                embedding.len(),
                self.name,
                self.dimensions
            )));
        }
        self.entries.push(IndexEntry { chunk, embedding });
        Ok(())
    }

    /// Up to `top_k` entries by descending cosine similarity
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<VectorSearchResult>> {
        if self.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(Error::retrieval(format!(
                "query has {} dimensions, collection '{}' expects {}",
                query.len(),
                self.name,
                self.dimensions
            )));
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(similarity, entry)| VectorSearchResult {
                chunk: entry.chunk.clone(),
                similarity,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// File that holds collection `name` under `dir`
    pub fn collection_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.json", name))
    }

    /// Write the collection to `<dir>/<name>.json`, replacing any previous build
    ///
    /// The file is written to a temporary sibling and renamed into place, so
    /// readers see either the old build or the new one.
    pub fn persist(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = Self::collection_path(dir, &self.name);

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        tmp.persist(&path)
            .map_err(|e| Error::index(format!("Failed to write {}: {}", path.display(), e)))?;

        tracing::debug!(
            "Persisted collection '{}' ({} entries) to {}",
            self.name,
            self.entries.len(),
            path.display()
        );
        Ok(path)
    }

    /// Reopen a persisted collection
    pub fn open(dir: &Path, name: &str) -> Result<Self> {
        let path = Self::collection_path(dir, name);
        if !path.exists() {
            return Err(Error::index(format!(
                "Collection '{}' not found in {}",
                name,
                dir.display()
            )));
        }
        let bytes = std::fs::read(&path)?;
        let index: VectorIndex = serde_json::from_slice(&bytes)?;
        Ok(index)
    }
}

/// Cosine similarity; zero-length vectors score 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// A built collection, ready for retrieval
#[derive(Clone)]
pub struct IndexHandle {
    pub store: Arc<LocalVectorStore>,
    pub collection: String,
    /// Location on disk, when persisted
    pub path: Option<PathBuf>,
    pub build_id: Uuid,
    pub embedding_model: String,
    pub dimensions: usize,
}

impl IndexHandle {
    /// Delete this build's file from disk; the in-memory store stays usable
    pub fn discard(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match std::fs::remove_file(path) {
            Ok(()) => {
                tracing::debug!("Removed collection file {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Embeds chunks and builds a fresh collection from them
pub struct IndexBuilder {
    embedder: Arc<dyn EmbeddingProvider>,
    versioned: bool,
}

impl IndexBuilder {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            versioned: false,
        }
    }

    /// Suffix each collection name with its build id
    pub fn versioned(mut self, versioned: bool) -> Self {
        self.versioned = versioned;
        self
    }

    /// Build collection `collection` from `chunks`
    ///
    /// Any previous collection of the same name is replaced, never extended.
    /// Versioned builds get a name of their own instead. With `persist_dir`
    /// set the collection is written to disk.
    pub async fn build(
        &self,
        chunks: &[Chunk],
        collection: &str,
        persist_dir: Option<&Path>,
    ) -> Result<IndexHandle> {
        let dimensions = self.embedder.dimensions();
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();

        tracing::info!(
            "Embedding {} chunks with {} ({})",
            texts.len(),
            self.embedder.name(),
            self.embedder.model()
        );
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "requested {} embeddings, backend returned {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut index = VectorIndex::new(collection, self.embedder.model(), dimensions);
        if self.versioned {
            index.name = format!("{}-{}", collection, index.build_id.simple());
        }
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            validate_embedding(&embedding, dimensions)?;
            index.insert(chunk.clone(), embedding)?;
        }

        let path = match persist_dir {
            Some(dir) => Some(index.persist(dir)?),
            None => None,
        };

        tracing::info!(
            "Built collection '{}' ({} entries, build {})",
            index.name,
            index.len(),
            index.build_id
        );

        Ok(IndexHandle {
            collection: index.name.clone(),
            path,
            build_id: index.build_id,
            embedding_model: index.embedding_model.clone(),
            dimensions,
            store: Arc::new(LocalVectorStore::new(index)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn chunk(text: &str, i: u32) -> Chunk {
        Chunk::new(text.to_string(), Some("doc.txt".to_string()), i, 0, 1)
    }

    fn index_with(vectors: &[[f32; 3]]) -> VectorIndex {
        let mut index = VectorIndex::new("test", "mock", 3);
        for (i, v) in vectors.iter().enumerate() {
            index.insert(chunk(&format!("c{}", i), i as u32), v.to_vec()).unwrap();
        }
        index
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_is_sorted_and_truncated() {
        let index = index_with(&[[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.7, 0.7, 0.0]]);

        let results = index.search(&[1.0, 0.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.text, "c1");
        assert_eq!(results[1].chunk.text, "c2");
        assert!(results[0].similarity >= results[1].similarity);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = index_with(&[[1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let texts: Vec<_> = index
            .search(&[1.0, 0.0, 0.0], 3)
            .unwrap()
            .into_iter()
            .map(|r| r.chunk.text)
            .collect();
        assert_eq!(texts, vec!["c0", "c1", "c2"]);
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = VectorIndex::new("empty", "mock", 3);
        assert!(index.search(&[1.0, 0.0, 0.0], 4).unwrap().is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = index_with(&[[1.0, 0.0, 0.0]]);
        assert!(matches!(index.search(&[1.0, 0.0], 4), Err(Error::Retrieval(_))));
    }

    #[test]
    fn test_insert_rejects_wrong_dimension() {
        let mut index = VectorIndex::new("test", "mock", 3);
        assert!(index.insert(chunk("x", 0), vec![1.0]).is_err());
    }

    #[test]
    fn test_persist_and_open() {
        let dir = TempDir::new().unwrap();
        let index = index_with(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        let path = index.persist(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("test.json"));

        let reopened = VectorIndex::open(dir.path(), "test").unwrap();
        assert_eq!(reopened.build_id, index.build_id);
        assert_eq!(reopened.len(), 2);
        assert_eq!(reopened.entries()[1].chunk.text, "c1");
    }

    #[test]
    fn test_persist_replaces_previous_build() {
        let dir = TempDir::new().unwrap();
        index_with(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).persist(dir.path()).unwrap();

        let second = index_with(&[[0.0, 0.0, 1.0]]);
        second.persist(dir.path()).unwrap();

        let reopened = VectorIndex::open(dir.path(), "test").unwrap();
        assert_eq!(reopened.build_id, second.build_id);
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_open_missing_collection() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(VectorIndex::open(dir.path(), "nope"), Err(Error::Index(_))));
    }

    #[test]
    fn test_discard_removes_file_but_keeps_store() {
        let dir = TempDir::new().unwrap();
        let index = index_with(&[[1.0, 0.0, 0.0]]);
        let path = index.persist(dir.path()).unwrap();

        let handle = IndexHandle {
            collection: index.name.clone(),
            path: Some(path.clone()),
            build_id: index.build_id,
            embedding_model: index.embedding_model.clone(),
            dimensions: index.dimensions,
            store: Arc::new(LocalVectorStore::new(index)),
        };

        handle.discard().unwrap();
        assert!(!path.exists());
        assert_eq!(handle.store.collection(), "test");

        // Second discard is a no-op
        handle.discard().unwrap();
    }
}
