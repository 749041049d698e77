//! Query request types

use serde::{Deserialize, Serialize};

/// Per-request overrides sent alongside a query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Number of chunks to retrieve (default: `retrieval.top_k`)
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Stages a query moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    NoFiles,
    Extracted,
    Chunked,
    Indexed,
    Retrieved,
    Answered,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoFiles => "no_files",
            Self::Extracted => "extracted",
            Self::Chunked => "chunked",
            Self::Indexed => "indexed",
            Self::Retrieved => "retrieved",
            Self::Answered => "answered",
        };
        f.write_str(name)
    }
}
