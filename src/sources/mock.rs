//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::models::{ArticleRecord, UNKNOWN_JOURNAL};
use crate::sources::{ArticleSource, SearchError};

/// A mock source for testing that returns predefined responses.
#[derive(Debug, Default)]
pub struct MockSource {
    search_response: Mutex<Option<Vec<ArticleRecord>>>,
    fail_with_status: Mutex<Option<u16>>,
    queries: Mutex<Vec<String>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the records to return.
    pub fn set_search_response(&self, records: Vec<ArticleRecord>) {
        *lock(&self.search_response) = Some(records);
    }

    /// Make every search fail as if the service answered with `status`.
    pub fn set_failure(&self, status: u16) {
        *lock(&self.fail_with_status) = Some(status);
    }

    /// Clear the configured response and failure.
    pub fn clear_response(&self) {
        *lock(&self.search_response) = None;
        *lock(&self.fail_with_status) = None;
    }

    /// Keyword strings received so far.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ArticleSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, keywords: &str) -> Result<Vec<ArticleRecord>, SearchError> {
        lock(&self.queries).push(keywords.to_string());
        if let Some(status) = *lock(&self.fail_with_status) {
            return Err(SearchError::Status(status));
        }
        Ok(lock(&self.search_response).clone().unwrap_or_default())
    }
}

/// Helper function to create a mock record for testing.
pub fn make_record(title: &str, r#abstract: &str) -> ArticleRecord {
    ArticleRecord {
        title: title.to_string(),
        authors: vec!["Test Author".to_string()],
        year: Some(2024),
        url: format!("http://example.com/{}", title.to_lowercase().replace(' ', "-")),
        r#abstract: r#abstract.to_string(),
        citation_count: 0,
        journal: UNKNOWN_JOURNAL.to_string(),
    }
}
