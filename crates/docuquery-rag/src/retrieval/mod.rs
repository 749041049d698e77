//! Embedding index and similarity retrieval

mod index;
mod search;

pub use index::{cosine_similarity, IndexBuilder, IndexEntry, IndexHandle, VectorIndex};
pub use search::{RetrievedContext, Retriever};
