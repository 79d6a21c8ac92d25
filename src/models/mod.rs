//! Core data models for articles, summaries and formatted documents.

mod article;
mod document;
mod summary;

pub use article::{ArticleRecord, UNKNOWN_JOURNAL};
pub use document::{
    AbstractRules, CitationStub, DocumentAuthor, DocumentSection, FormatMetadata,
    FormattedDocument, GenerationInfo, JournalProfile, ProfileError, ReferenceEntry,
};
pub use summary::{FailureKind, StructuredSummary, SummaryFailure, SummaryResult};
