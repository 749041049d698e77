//! Uploaded file, extracted text and chunk types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Plain UTF-8 text file
    Txt,
    /// Anything else; carries the lowercased extension
    Unknown(String),
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            "txt" => Self::Txt,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Detect file type from the final extension of a filename
    pub fn from_filename(filename: &str) -> Self {
        match filename.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => Self::Unknown(String::new()),
        }
    }

    /// Check if this is a supported file type
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Get display name
    pub fn display_name(&self) -> &str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word Document (.docx)",
            Self::Txt => "Text File",
            Self::Unknown(_) => "Unknown",
        }
    }
}

/// A file handed to the pipeline by the caller
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original filename as uploaded
    pub name: String,
    /// Type resolved once from the filename
    pub file_type: FileType,
    /// Raw file content
    pub data: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file, resolving its type from the name
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let name = name.into();
        Self {
            file_type: FileType::from_filename(&name),
            name,
            data: data.into(),
        }
    }

    /// Read a file from disk
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Ok(Self::new(name, data))
    }

    /// File size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Plain text extracted from one uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Name of the file the text came from
    pub source: Option<String>,
    /// Extracted content
    pub content: String,
}

impl ExtractedText {
    /// Create extracted text attributed to a source file
    pub fn new(source: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            content: content.into(),
        }
    }

    /// Create unattributed extracted text
    pub fn anonymous(content: impl Into<String>) -> Self {
        Self {
            source: None,
            content: content.into(),
        }
    }

    /// True when the content holds nothing but whitespace
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A bounded slice of extracted text, the unit of embedding and retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Text content, a verbatim slice of the source text
    pub text: String,
    /// Source filename, if known
    pub source: Option<String>,
    /// Chunk index within its source text
    pub chunk_index: u32,
    /// First token covered (inclusive)
    pub token_start: usize,
    /// Last token covered (exclusive)
    pub token_end: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(
        text: String,
        source: Option<String>,
        chunk_index: u32,
        token_start: usize,
        token_end: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            source,
            chunk_index,
            token_start,
            token_end,
        }
    }

    /// Number of tokens this chunk covers
    pub fn token_len(&self) -> usize {
        self.token_end - self.token_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_filename() {
        assert_eq!(FileType::from_filename("report.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_filename("notes.final.docx"), FileType::Docx);
        assert_eq!(FileType::from_filename("readme.txt"), FileType::Txt);
        assert_eq!(
            FileType::from_filename("sheet.xlsx"),
            FileType::Unknown("xlsx".to_string())
        );
        assert_eq!(FileType::from_filename("Makefile"), FileType::Unknown(String::new()));
    }

    #[test]
    fn test_uploaded_file_resolves_type_once() {
        let file = UploadedFile::new("sky.txt", "The sky is blue.");
        assert_eq!(file.file_type, FileType::Txt);
        assert!(file.file_type.is_supported());
        assert_eq!(file.size(), 16);
    }

    #[test]
    fn test_chunk_serializes_position() {
        let chunk = Chunk::new("hello".into(), Some("a.txt".into()), 2, 10, 15);
        let json = serde_json::to_value(&chunk).unwrap();

        assert_eq!(json["source"], serde_json::json!("a.txt"));
        assert_eq!(json["chunk_index"], serde_json::json!(2));
        assert_eq!(chunk.token_len(), 5);
    }
}
