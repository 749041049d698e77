//! Text extraction for uploaded PDF, DOCX and TXT files

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::types::{ExtractedText, FileType, UploadedFile};

/// Decode capability for one file type
pub trait TextExtractor: Send + Sync {
    /// Convert raw file bytes into plain text
    fn extract(&self, filename: &str, data: &[u8]) -> Result<String>;
}

static PDF_EXTRACTOR: PdfExtractor = PdfExtractor;
static DOCX_EXTRACTOR: DocxExtractor = DocxExtractor;
static TXT_EXTRACTOR: TxtExtractor = TxtExtractor;

impl FileType {
    /// Handler for this file type; `None` means the file is skipped
    pub fn handler(&self) -> Option<&'static dyn TextExtractor> {
        match self {
            FileType::Pdf => Some(&PDF_EXTRACTOR),
            FileType::Docx => Some(&DOCX_EXTRACTOR),
            FileType::Txt => Some(&TXT_EXTRACTOR),
            FileType::Unknown(_) => None,
        }
    }
}

/// Run a handler, turning a decoder panic into an extraction error
///
/// Relies on `panic = "unwind"`; under `abort` the process exits instead.
fn run_handler(handler: &dyn TextExtractor, filename: &str, data: &[u8]) -> Result<String> {
    panic::catch_unwind(AssertUnwindSafe(|| handler.extract(filename, data))).unwrap_or_else(
        |payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::error!("Decoder panicked on {}: {}", filename, reason);
            Err(Error::extraction(filename, format!("Decoder panicked: {}", reason)))
        },
    )
}

/// Replace ligatures and non-breaking spaces that PDF fonts commonly emit
fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ") // Non-breaking space -> space
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// PDF handler: per-page text joined with newlines, in page order
pub struct PdfExtractor;

impl PdfExtractor {
    const TIMEOUT: Duration = Duration::from_secs(60);

    /// Run pdf-extract on a worker thread so problematic fonts cannot hang the query
    fn extract_pages_with_timeout(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Self::TIMEOUT) {
            Ok(Ok(pages)) => {
                let _ = handle.join();
                Ok(pages)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed on {}: {}, trying fallback", filename, e);
                Self::extract_pages_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "PDF extraction of {} timed out after {:?}",
                    filename,
                    Self::TIMEOUT
                );
                Self::extract_pages_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread for {} crashed", filename);
                Self::extract_pages_fallback(filename, data)
            }
        }
    }

    /// Page-by-page extraction with lopdf
    fn extract_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::extraction(filename, format!("Failed to load PDF: {}", e)))?;

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys() {
            match doc.extract_text(&[*page_number]) {
                Ok(text) => pages.push(text),
                Err(e) => {
                    tracing::debug!("No text on page {} of {}: {}", page_number, filename, e);
                    pages.push(String::new());
                }
            }
        }

        Ok(pages)
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let pages = Self::extract_pages_with_timeout(filename, data)?;
        let text = pages
            .iter()
            .map(|page| cleanup_pdf_text(page))
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            // Image-only PDFs are not an error; the orchestrator reports "no text"
            tracing::warn!("{} has no extractable text layer ({} pages)", filename, pages.len());
        }

        Ok(text)
    }
}

/// DOCX handler: paragraph text in document order joined with newlines
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::extraction(filename, e.to_string()))?;

        let mut paragraphs = Vec::new();

        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                let mut text = String::new();
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            match child {
                                docx_rs::RunChild::Text(t) => text.push_str(&t.text),
                                docx_rs::RunChild::Tab(_) => text.push('\t'),
                                _ => {}
                            }
                        }
                    }
                }
                paragraphs.push(text);
            }
            // Tables and section properties are not paragraphs
        }

        Ok(paragraphs.join("\n"))
    }
}

/// TXT handler: strict UTF-8, verbatim
pub struct TxtExtractor;

impl TextExtractor for TxtExtractor {
    fn extract(&self, filename: &str, data: &[u8]) -> Result<String> {
        std::str::from_utf8(data)
            .map(str::to_string)
            .map_err(|e| Error::extraction(filename, format!("Invalid UTF-8: {}", e)))
    }
}

/// A file whose extraction failed
#[derive(Debug, Clone)]
pub struct ExtractionFailure {
    /// Original filename
    pub filename: String,
    /// Error message
    pub message: String,
}

/// Result of extracting a batch of uploads
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// One entry per successfully extracted file, in upload order
    pub texts: Vec<ExtractedText>,
    /// Files whose bytes could not be decoded
    pub failures: Vec<ExtractionFailure>,
    /// Files skipped because their type has no handler
    pub unsupported: Vec<String>,
}

impl Extraction {
    /// True when no file produced any non-whitespace text
    pub fn is_blank(&self) -> bool {
        self.texts.iter().all(ExtractedText::is_blank)
    }
}

/// Dispatches uploads to their type's handler
///
/// A file that fails to decode is skipped and recorded; the rest of the
/// batch is still extracted. Unsupported types never reach a handler.
#[derive(Debug, Clone, Default)]
pub struct DocumentExtractor;

impl DocumentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract one file; `Ok(None)` when its type is unsupported
    pub fn extract_file(&self, file: &UploadedFile) -> Result<Option<ExtractedText>> {
        let Some(handler) = file.file_type.handler() else {
            return Ok(None);
        };

        let content = run_handler(handler, &file.name, &file.data)?;
        Ok(Some(ExtractedText::new(file.name.clone(), content)))
    }

    /// Extract every file in the batch
    pub fn extract(&self, files: &[UploadedFile]) -> Extraction {
        let mut extraction = Extraction::default();

        for file in files {
            match self.extract_file(file) {
                Ok(Some(text)) => {
                    tracing::debug!(
                        "Extracted {} chars from {} ({})",
                        text.content.len(),
                        file.name,
                        file.file_type.display_name()
                    );
                    extraction.texts.push(text);
                }
                Ok(None) => {
                    tracing::warn!("Skipping unsupported file: {}", file.name);
                    extraction.unsupported.push(file.name.clone());
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {}", file.name, e);
                    extraction.failures.push(ExtractionFailure {
                        filename: file.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_txt_is_verbatim() {
        let text = TxtExtractor.extract("a.txt", "Line one\n  Line two\n".as_bytes()).unwrap();
        assert_eq!(text, "Line one\n  Line two\n");
    }

    #[test]
    fn test_txt_rejects_invalid_utf8() {
        let err = TxtExtractor.extract("bad.txt", &[0x66, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, Error::Extraction { ref filename, .. } if filename == "bad.txt"));
    }

    #[test]
    fn test_unknown_type_has_no_handler() {
        assert!(FileType::Unknown("xlsx".into()).handler().is_none());
        assert!(FileType::Pdf.handler().is_some());
    }

    #[test]
    fn test_batch_skips_failures_and_unsupported() {
        let files = vec![
            UploadedFile::new("good.txt", "The sky is blue."),
            UploadedFile::new("bad.txt", vec![0xffu8, 0xfe]),
            UploadedFile::new("table.csv", "a,b,c"),
            UploadedFile::new("broken.pdf", "not a pdf at all"),
        ];

        let extraction = DocumentExtractor::new().extract(&files);

        assert_eq!(extraction.texts.len(), 1);
        assert_eq!(extraction.texts[0].source.as_deref(), Some("good.txt"));
        assert_eq!(extraction.unsupported, vec!["table.csv".to_string()]);
        let failed: Vec<_> = extraction.failures.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(failed, vec!["bad.txt", "broken.pdf"]);
    }

    #[test]
    fn test_blank_extraction() {
        let files = vec![UploadedFile::new("empty.txt", "  \n\t")];
        let extraction = DocumentExtractor::new().extract(&files);
        assert_eq!(extraction.texts.len(), 1);
        assert!(extraction.is_blank());
    }

    struct PanickingExtractor;

    impl TextExtractor for PanickingExtractor {
        fn extract(&self, _filename: &str, _data: &[u8]) -> Result<String> {
            panic!("unexpected end of xref table");
        }
    }

    #[test]
    fn test_handler_panic_becomes_extraction_error() {
        let err = run_handler(&PanickingExtractor, "boom.pdf", b"%PDF-1.4").unwrap_err();

        match err {
            Error::Extraction { filename, message } => {
                assert_eq!(filename, "boom.pdf");
                assert!(message.contains("unexpected end of xref table"));
            }
            other => panic!("expected extraction error, got {:?}", other),
        }

        // Later files in the batch still decode
        assert_eq!(run_handler(&TxtExtractor, "a.txt", b"ok").unwrap(), "ok");
    }

    #[test]
    fn test_cleanup_pdf_text() {
        assert_eq!(cleanup_pdf_text("e\u{FB03}cient\u{00A0}o\u{FB01}ce\0"), "efficient office");
    }
}
