//! Core types for the query pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{Chunk, ExtractedText, FileType, UploadedFile};
pub use query::{PipelineStage, QueryOptions};
pub use response::{Answer, QueryOutcome, QueryResponse, SourceRef};
