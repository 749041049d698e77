//! Provider abstractions for embeddings, answer generation and vector storage
//!
//! Backends are injected as trait objects so the pipeline can run against
//! Ollama in production and deterministic mocks in tests.

pub mod embedding;
pub mod llm;
pub mod local;
pub mod ollama;
pub mod vector_store;

pub use embedding::{validate_embedding, EmbeddingProvider};
pub use llm::LlmProvider;
pub use local::LocalVectorStore;
pub use ollama::{OllamaEmbedder, OllamaLlm, OllamaProvider};
pub use vector_store::{VectorSearchResult, VectorStoreProvider};
