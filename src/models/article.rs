//! Bibliographic record returned by article search.

use serde::{Deserialize, Serialize};

/// Journal name used when the search service does not know the venue
pub const UNKNOWN_JOURNAL: &str = "N/A";

/// A single bibliographic record
///
/// Records are produced by an [`ArticleSource`](crate::sources::ArticleSource)
/// and never modified afterwards. The abstract is always non-empty: records
/// without one are dropped before they reach the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Paper title
    pub title: String,

    /// Author names, in publication order
    pub authors: Vec<String>,

    /// Publication year, when known
    pub year: Option<i32>,

    /// Paper landing page URL
    pub url: String,

    /// Abstract text (never empty)
    pub r#abstract: String,

    /// Number of citing papers
    #[serde(rename = "citationCount")]
    pub citation_count: u64,

    /// Journal or venue name, [`UNKNOWN_JOURNAL`] when absent
    pub journal: String,
}

impl ArticleRecord {
    /// Authors joined for display
    pub fn authors_display(&self) -> String {
        self.authors.join("; ")
    }
}
