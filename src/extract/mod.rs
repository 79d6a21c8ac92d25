//! Model-driven extraction under JSON output contracts.
//!
//! Each extractor holds an `Arc<dyn TextGenerator>` and parses the model's
//! reply through [`contract::validate`], which yields a tagged
//! [`Validation`] instead of an error to be caught at every call site.
//!
//! - [`KeywordExtractor`]: natural-language query → keyword string
//! - [`StructuredSummarizer`]: article text → [`SummaryResult`](crate::models::SummaryResult)
//! - [`AcademicFormatter`]: raw text + journal profile → [`FormattedDocument`](crate::models::FormattedDocument)

pub mod contract;
mod formatter;
mod keywords;
mod summarizer;

pub use contract::Validation;
pub use formatter::{AcademicFormatter, FormatError, PROMPT_TEMPLATE_VERSION};
pub use keywords::KeywordExtractor;
pub use summarizer::{
    StructuredSummarizer, MAX_CONTRACT_ATTEMPTS, MAX_INPUT_CHARS, MAX_OUTPUT_TOKENS,
};
