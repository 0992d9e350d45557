//! Text extraction from uploaded résumé documents.
//!
//! Extraction is CPU-bound and synchronous; async callers go through
//! [`extract_blocking`], which runs it inside `tokio::task::spawn_blocking`.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Typed extraction failure. Never folded into the extracted text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Failed to extract text from PDF '{file_name}': {message}")]
    Pdf { file_name: String, message: String },

    #[error("'{file_name}' is not valid UTF-8 text: {source}")]
    Encoding {
        file_name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction of '{file_name}' aborted: {message}")]
    Aborted { file_name: String, message: String },
}

pub trait TextExtractor: Send + Sync {
    /// Returns the plain text of `bytes`. Empty text is a success.
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Pdf,
    PlainText,
}

/// Default extractor: PDF through `pdf-extract`, `.txt` / `.md` read as UTF-8.
pub struct DocumentExtractor;

impl DocumentExtractor {
    fn detect(file_name: &str, bytes: &[u8]) -> Result<DocumentKind, ExtractionError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(DocumentKind::Pdf),
            Some("txt") | Some("md") => Ok(DocumentKind::PlainText),
            None if bytes.starts_with(PDF_MAGIC) => Ok(DocumentKind::Pdf),
            Some(other) => Err(ExtractionError::UnsupportedFormat(format!(
                "'{file_name}' has unsupported extension '.{other}'"
            ))),
            None => Err(ExtractionError::UnsupportedFormat(format!(
                "'{file_name}' has no extension and is not a PDF"
            ))),
        }
    }
}

impl TextExtractor for DocumentExtractor {
    fn extract(&self, file_name: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = match Self::detect(file_name, bytes)? {
            DocumentKind::Pdf => {
                pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf {
                    file_name: file_name.to_string(),
                    message: e.to_string(),
                })?
            }
            DocumentKind::PlainText => std::str::from_utf8(bytes)
                .map_err(|source| ExtractionError::Encoding {
                    file_name: file_name.to_string(),
                    source,
                })?
                .to_string(),
        };

        debug!(file_name, chars = text.len(), "Extracted document text");
        Ok(text)
    }
}

/// Runs `extractor` on the blocking pool. A panic inside the PDF parser becomes
/// `ExtractionError::Aborted` instead of taking the request down.
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    file_name: String,
    bytes: Bytes,
) -> Result<String, ExtractionError> {
    let name = file_name.clone();
    tokio::task::spawn_blocking(move || extractor.extract(&file_name, &bytes))
        .await
        .map_err(|e| ExtractionError::Aborted {
            file_name: name,
            message: e.to_string(),
        })?
}
