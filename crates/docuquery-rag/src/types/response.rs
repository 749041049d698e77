//! Answer and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::Chunk;

/// Message returned when no files were supplied
pub const NO_FILES_MESSAGE: &str = "No documents uploaded.";
/// Message returned when extraction produced no text
pub const NO_TEXT_MESSAGE: &str = "No text extracted from documents.";
/// Message returned when retrieval produced no usable context
pub const NO_CONTEXT_MESSAGE: &str = "No relevant information found in the uploaded documents.";

/// How a query terminated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutcome {
    /// The model produced an answer from retrieved context
    Answered,
    /// No files were supplied
    NoFiles,
    /// Extraction yielded no text
    NoText,
    /// Retrieval yielded nothing relevant
    NoContext,
}

impl QueryOutcome {
    /// Fixed message for short-circuit outcomes
    pub fn canned_message(&self) -> Option<&'static str> {
        match self {
            Self::Answered => None,
            Self::NoFiles => Some(NO_FILES_MESSAGE),
            Self::NoText => Some(NO_TEXT_MESSAGE),
            Self::NoContext => Some(NO_CONTEXT_MESSAGE),
        }
    }
}

/// Reference to a chunk that grounded an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    /// Chunk ID
    pub chunk_id: Uuid,
    /// Source filename
    pub filename: Option<String>,
    /// Chunk index within its source
    pub chunk_index: u32,
    /// Cosine similarity to the question
    pub similarity: f32,
    /// Leading slice of the chunk text
    pub snippet: String,
}

impl SourceRef {
    const SNIPPET_CHARS: usize = 200;

    /// Create a source reference from a retrieved chunk
    pub fn from_chunk(chunk: &Chunk, similarity: f32) -> Self {
        Self {
            chunk_id: chunk.id,
            filename: chunk.source.clone(),
            chunk_index: chunk.chunk_index,
            similarity,
            snippet: truncate_snippet(&chunk.text, Self::SNIPPET_CHARS),
        }
    }
}

/// Final result of a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Answer text, or the canned message of a short-circuit outcome
    pub text: String,
    /// How the query terminated
    pub outcome: QueryOutcome,
    /// Chunks the answer was grounded on, best first
    pub sources: Vec<SourceRef>,
}

impl Answer {
    /// An answer produced by the model
    pub fn answered(text: String, sources: Vec<SourceRef>) -> Self {
        Self {
            text,
            outcome: QueryOutcome::Answered,
            sources,
        }
    }

    /// A short-circuit outcome with its fixed message
    pub fn short_circuit(outcome: QueryOutcome) -> Self {
        Self {
            text: outcome.canned_message().unwrap_or(NO_CONTEXT_MESSAGE).to_string(),
            outcome,
            sources: Vec::new(),
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Response body of `POST /api/query`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Answer text
    pub answer: String,
    /// How the query terminated
    pub outcome: QueryOutcome,
    /// Grounding chunks
    pub sources: Vec<SourceRef>,
    /// Files skipped because their type is not supported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unsupported_files: Vec<String>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

impl QueryResponse {
    /// Wrap a pipeline answer
    pub fn new(answer: Answer, unsupported_files: Vec<String>, processing_time_ms: u64) -> Self {
        Self {
            answer: answer.text,
            outcome: answer.outcome,
            sources: answer.sources,
            unsupported_files,
            processing_time_ms,
        }
    }
}

/// Truncate a snippet to at most `max_chars` characters, appending "..."
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
