//! PDF text extraction utilities.
//!
//! Downloaded bodies are written to a temporary file that is removed when the
//! extraction returns, whatever the outcome. Pages are extracted one at a
//! time with lopdf so a single broken page only loses its own text; documents
//! lopdf cannot open at all are handed to pdf-extract as a whole.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::config::DownloadConfig;
use crate::fetch::{FetchError, FetchedDocument};

/// Separator placed between the text of consecutive pages
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Errors that can occur during PDF extraction
#[derive(Debug, Error)]
pub enum PdfExtractError {
    /// The file opened fine but held no text (scanned or image-only PDF)
    #[error("No extractable text found in PDF")]
    NoText,

    #[error("Failed to extract text from PDF: {0}")]
    ExtractionFailed(String),

    #[error("File not found or not a valid PDF: {0}")]
    InvalidFile(String),

    #[error("PDF exceeds the {limit_bytes} byte download limit")]
    TooLarge { limit_bytes: u64 },

    #[error("Failed to download PDF: {0}")]
    Fetch(#[from] FetchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts plain text from PDF bodies
#[derive(Debug, Clone)]
pub struct PdfTextExtractor {
    temp_dir: Option<PathBuf>,
    max_bytes: u64,
}

impl Default for PdfTextExtractor {
    fn default() -> Self {
        Self::from_config(&DownloadConfig::default())
    }
}

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &DownloadConfig) -> Self {
        Self {
            temp_dir: config.temp_dir.clone(),
            max_bytes: config.max_file_size_bytes(),
        }
    }

    /// Write temporary files under `dir` instead of the system temp dir
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Refuse bodies larger than `max_bytes`
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Stream a fetched body to disk and extract its text
    pub async fn extract_document(
        &self,
        mut document: FetchedDocument,
    ) -> Result<String, PdfExtractError> {
        let mut temp = self.temp_file()?;
        let mut written: u64 = 0;

        while let Some(chunk) = document.next_chunk().await? {
            written += chunk.len() as u64;
            if written > self.max_bytes {
                return Err(PdfExtractError::TooLarge {
                    limit_bytes: self.max_bytes,
                });
            }
            temp.write_all(&chunk)?;
        }
        temp.flush()?;

        tracing::debug!(url = %document.url(), bytes = written, "Downloaded PDF body");
        self.extract_temp(temp).await
    }

    /// Extract text from PDF bytes already in memory
    pub async fn extract_bytes(&self, bytes: &[u8]) -> Result<String, PdfExtractError> {
        if bytes.len() as u64 > self.max_bytes {
            return Err(PdfExtractError::TooLarge {
                limit_bytes: self.max_bytes,
            });
        }

        let mut temp = self.temp_file()?;
        temp.write_all(bytes)?;
        temp.flush()?;
        self.extract_temp(temp).await
    }

    fn temp_file(&self) -> Result<NamedTempFile, PdfExtractError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("research-scribe-").suffix(".pdf");
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(temp)
    }

    /// Parse on the blocking pool; the temp file is dropped (and deleted) there
    async fn extract_temp(&self, temp: NamedTempFile) -> Result<String, PdfExtractError> {
        tokio::task::spawn_blocking(move || {
            let result = extract_text(temp.path());
            drop(temp);
            result
        })
        .await
        .map_err(|e| PdfExtractError::ExtractionFailed(format!("Extraction task failed: {}", e)))?
    }
}

/// Extract text from a PDF file.
///
/// Returns the page texts joined by [`PAGE_SEPARATOR`], or
/// [`PdfExtractError::NoText`] when nothing could be recovered.
///
/// # Examples
///
/// ```ignore
/// let text = extract_text(Path::new("paper.pdf"))?;
/// println!("Extracted {} characters", text.len());
/// ```
pub fn extract_text(path: &Path) -> Result<String, PdfExtractError> {
    if !path.is_file() {
        return Err(PdfExtractError::InvalidFile(format!(
            "File not found: {}",
            path.display()
        )));
    }

    let pages = match lopdf::Document::load(path) {
        Ok(document) => extract_pages(&document),
        Err(e) => {
            tracing::debug!(error = %e, "lopdf could not open PDF, trying pdf-extract");
            vec![extract_whole_document(path)?]
        }
    };

    let text = join_pages(&pages);
    tracing::info!(
        pages = pages.len(),
        chars = text.chars().count(),
        "Extracted PDF text"
    );

    if text.is_empty() {
        Err(PdfExtractError::NoText)
    } else {
        Ok(text)
    }
}

/// Join page texts with a blank line and trim the result
pub fn join_pages(pages: &[String]) -> String {
    pages.join(PAGE_SEPARATOR).trim().to_string()
}

fn extract_pages(document: &lopdf::Document) -> Vec<String> {
    document
        .get_pages()
        .keys()
        .map(|&page_number| extract_page(document, page_number))
        .collect()
}

/// Text of a single page; any failure, including a parser panic, yields ""
fn extract_page(document: &lopdf::Document, page_number: u32) -> String {
    match panic::catch_unwind(AssertUnwindSafe(|| document.extract_text(&[page_number]))) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::warn!(page = page_number, error = %e, "Failed to extract page text");
            String::new()
        }
        Err(_) => {
            tracing::warn!(page = page_number, "PDF parser panicked on page");
            String::new()
        }
    }
}

fn extract_whole_document(path: &Path) -> Result<String, PdfExtractError> {
    match panic::catch_unwind(|| pdf_extract::extract_text(path)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(PdfExtractError::ExtractionFailed(e.to_string())),
        Err(_) => Err(PdfExtractError::ExtractionFailed(
            "PDF parser panicked".to_string(),
        )),
    }
}
