//! Bibliographic search sources.
//!
//! This module defines the [`ArticleSource`] trait implemented by search
//! backends. The pipeline holds one source behind an `Arc<dyn ArticleSource>`;
//! [`SemanticScholarSource`] is the production backend and [`MockSource`]
//! serves canned records in tests.
//!
//! A source distinguishes "the service answered with zero results"
//! (`Ok(vec![])`) from "the service could not be reached" ([`SearchError`]),
//! so callers can report an outage instead of an empty result list.

pub mod mock;
mod semantic;

pub use mock::MockSource;
pub use semantic::{SemanticScholarSource, SEARCH_FIELDS};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::ArticleRecord;

/// Errors returned by a search source
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Search service returned status {0}")]
    Status(u16),

    #[error("Unreadable search response: {0}")]
    Malformed(String),

    #[error("Empty search query")]
    EmptyQuery,
}

impl SearchError {
    /// Whether the failure lies with the search service rather than the query
    pub fn is_service_unavailable(&self) -> bool {
        !matches!(self, SearchError::EmptyQuery)
    }
}

/// A bibliographic search backend
#[async_trait]
pub trait ArticleSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source (e.g., "semantic")
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Search by keyword string
    ///
    /// Every returned record has a non-empty abstract.
    async fn search(&self, keywords: &str) -> Result<Vec<ArticleRecord>, SearchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_empty_query_is_caller_error() {
        assert!(!SearchError::EmptyQuery.is_service_unavailable());
        assert!(SearchError::Status(503).is_service_unavailable());
        assert!(SearchError::Transport("timeout".into()).is_service_unavailable());
        assert!(SearchError::Malformed("eof".into()).is_service_unavailable());
    }
}
