//! Document ingestion: text extraction, tokenization and chunking

mod chunker;
pub mod extractor;
pub mod tokenizer;

pub use chunker::TextChunker;
pub use extractor::{DocumentExtractor, Extraction, ExtractionFailure, TextExtractor};
pub use tokenizer::{HfTokenizer, Tokenizer, WordPieceTokenizer};
