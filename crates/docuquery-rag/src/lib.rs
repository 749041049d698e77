//! docuquery-rag: question answering over uploaded documents
//!
//! Each query extracts text from the uploaded PDF, DOCX and TXT files, splits
//! it into overlapping token windows, embeds the windows into a fresh exact
//! cosine index, retrieves the chunks closest to the question and asks a
//! language model to answer from that context only.
//!
//! Embeddings and generation default to a local Ollama server; both are
//! provider traits and can be swapped out.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{QueryReport, RagPipeline};
pub use types::{
    document::{Chunk, ExtractedText, FileType, UploadedFile},
    query::QueryOptions,
    response::{Answer, QueryOutcome, QueryResponse},
};
