//! Utility modules supporting the pipeline.
//!
//! - [`HttpClient`]: shared reqwest client with explicit timeouts
//! - [`PdfTextExtractor`]: PDF body → plain text, tolerant of broken pages
//! - [`extract_text`]: extract text from a PDF file on disk
//! - [`PdfExtractError`]: errors that can occur during PDF extraction
//! - [`truncate_chars`]: char-boundary safe truncation
//!
//! # PDF extraction
//!
//! ```rust,no_run
//! use research_scribe::utils::PdfTextExtractor;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = PdfTextExtractor::new();
//! let text = extractor.extract_bytes(&bytes).await?;
//! println!("{} characters", text.len());
//! # Ok(())
//! # }
//! ```

mod http;
mod pdf;
mod text;

pub use http::{HttpClient, USER_AGENT};
pub use pdf::{extract_text, join_pages, PdfExtractError, PdfTextExtractor, PAGE_SEPARATOR};
pub use text::{collapse_whitespace, truncate_chars};

