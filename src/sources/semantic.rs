//! Semantic Scholar search source implementation.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::SearchConfig;
use crate::models::{ArticleRecord, UNKNOWN_JOURNAL};
use crate::sources::{ArticleSource, SearchError};
use crate::utils::HttpClient;

/// Field projection requested for every paper
pub const SEARCH_FIELDS: &str = "title,authors,year,url,abstract,citationCount,journal";

/// Semantic Scholar research source
///
/// Uses the Graph API `paper/search` endpoint.
#[derive(Debug, Clone)]
pub struct SemanticScholarSource {
    client: HttpClient,
    endpoint: String,
    api_key: Option<String>,
    limit: usize,
}

#[derive(Debug, Deserialize)]
struct S2SearchResponse {
    #[serde(default)]
    data: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct S2Paper {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    authors: Option<Vec<S2Author>>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    r#abstract: Option<String>,
    #[serde(default)]
    citation_count: Option<u64>,
    #[serde(default)]
    journal: Option<S2Journal>,
}

#[derive(Debug, Deserialize)]
struct S2Author {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S2Journal {
    #[serde(default)]
    name: Option<String>,
}

impl SemanticScholarSource {
    pub fn new(client: HttpClient) -> Self {
        let defaults = SearchConfig::default();
        Self {
            client,
            endpoint: defaults.endpoint,
            api_key: None,
            limit: defaults.result_limit,
        }
    }

    pub fn from_config(config: &SearchConfig, api_key: Option<String>) -> Result<Self, SearchError> {
        let client = HttpClient::with_timeout(config.timeout())
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        Ok(Self::new(client)
            .with_endpoint(config.endpoint.clone())
            .with_limit(config.result_limit)
            .with_api_key(api_key))
    }

    /// Override the API base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// API key (optional, for higher rate limits)
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Add API key to request headers if available
    fn add_api_key_if_present(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(ref key) = self.api_key {
            builder.header("x-api-key", key)
        } else {
            builder
        }
    }

    /// Decode one entry of `data`, dropping it when its shape is unexpected
    fn decode_paper(value: serde_json::Value) -> Option<S2Paper> {
        serde_json::from_value(value)
            .map_err(|e| tracing::debug!(error = %e, "Skipping malformed Semantic Scholar record"))
            .ok()
    }

    /// Convert a raw paper, dropping it when it has no abstract
    fn parse_paper(data: S2Paper) -> Option<ArticleRecord> {
        let r#abstract = data
            .r#abstract
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())?;

        let authors = data
            .authors
            .unwrap_or_default()
            .into_iter()
            .filter_map(|author| author.name)
            .collect();

        let journal = data
            .journal
            .and_then(|journal| journal.name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_JOURNAL.to_string());

        Some(ArticleRecord {
            title: data.title.unwrap_or_default(),
            authors,
            year: data.year,
            url: data.url.unwrap_or_default(),
            r#abstract,
            citation_count: data.citation_count.unwrap_or(0),
            journal,
        })
    }
}

#[async_trait]
impl ArticleSource for SemanticScholarSource {
    fn id(&self) -> &str {
        "semantic"
    }

    fn name(&self) -> &str {
        "Semantic Scholar"
    }

    async fn search(&self, keywords: &str) -> Result<Vec<ArticleRecord>, SearchError> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        tracing::debug!(%keywords, limit = self.limit, "Searching Semantic Scholar");

        let limit = self.limit.to_string();
        let request = self
            .client
            .client()
            .get(format!("{}/paper/search", self.endpoint))
            .query(&[
                ("query", keywords),
                ("limit", limit.as_str()),
                ("fields", SEARCH_FIELDS),
            ]);

        let response = self
            .add_api_key_if_present(request)
            .send()
            .await
            .map_err(|e| SearchError::Transport(format!("Failed to search Semantic Scholar: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Semantic Scholar returned an error status");
            return Err(SearchError::Status(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SearchError::Transport(format!("Failed to read response: {}", e)))?;
        let data: S2SearchResponse = serde_json::from_slice(&body)
            .map_err(|e| SearchError::Malformed(format!("Failed to parse JSON: {}", e)))?;

        let raw = data.data.unwrap_or_default();
        let total = raw.len();
        let records: Vec<ArticleRecord> = raw
            .into_iter()
            .filter_map(Self::decode_paper)
            .filter_map(Self::parse_paper)
            .take(self.limit)
            .collect();

        tracing::info!(
            returned = records.len(),
            dropped = total.saturating_sub(records.len()),
            "Semantic Scholar search complete"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use std::time::Duration;

    fn source_for(server: &mockito::Server) -> SemanticScholarSource {
        let client = HttpClient::with_timeout(Duration::from_secs(5)).unwrap();
        SemanticScholarSource::new(client).with_endpoint(server.url())
    }

    #[tokio::test]
    async fn test_search_filters_and_normalizes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "quantum computing".into()),
                Matcher::UrlEncoded("limit".into(), "10".into()),
                Matcher::UrlEncoded("fields".into(), SEARCH_FIELDS.into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"total": 3, "data": [
                    {"title": "Kept", "authors": [{"authorId": "1", "name": "Ada"}, {"name": "Alan"}],
                     "year": 2020, "url": "https://s2/kept", "abstract": "An abstract.",
                     "citationCount": 7, "journal": {"name": "Nature"}},
                    {"title": "No abstract", "authors": [], "abstract": null},
                    {"title": "Blank abstract", "abstract": "   "},
                    {"title": "No journal", "abstract": "Text", "journal": null}
                ]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let records = source_for(&server).search("quantum computing").await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "Kept");
        assert_eq!(records[0].authors, vec!["Ada", "Alan"]);
        assert_eq!(records[0].year, Some(2020));
        assert_eq!(records[0].citation_count, 7);
        assert_eq!(records[0].journal, "Nature");
        assert_eq!(records[1].journal, UNKNOWN_JOURNAL);
        assert_eq!(records[1].citation_count, 0);
        assert!(records.iter().all(|r| !r.r#abstract.is_empty()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_api_key_header_and_limit_cap() {
        let mut server = mockito::Server::new_async().await;
        let papers: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"title": "P{}", "abstract": "A{}"}}"#, i, i))
            .collect();
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::UrlEncoded("limit".into(), "3".into()))
            .match_header("x-api-key", "s2-key")
            .with_status(200)
            .with_body(format!(r#"{{"data": [{}]}}"#, papers.join(",")))
            .create_async()
            .await;

        let records = source_for(&server)
            .with_limit(3)
            .with_api_key(Some("s2-key".into()))
            .search("graphs")
            .await
            .unwrap();

        assert_eq!(records.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_record_is_dropped_not_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"data": [
                    {"title": "First", "abstract": "A1", "year": 2019},
                    {"title": "Bad year", "abstract": "A2", "year": "2020"},
                    {"title": "Bad authors", "abstract": "A3", "authors": "Ada"},
                    "not an object",
                    {"title": "Last", "abstract": "A4", "citationCount": 3}
                ]}"#,
            )
            .create_async()
            .await;

        let records = source_for(&server).search("codes").await.unwrap();

        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Last"]);
        assert_eq!(records[1].citation_count, 3);
    }

    #[tokio::test]
    async fn test_missing_data_is_zero_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"total": 0, "offset": 0}"#)
            .create_async()
            .await;

        let records = source_for(&server).search("nothing").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_not_zero_results() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_status(429)
            .create_async()
            .await;

        let err = source_for(&server).search("graphs").await.unwrap_err();
        assert!(matches!(err, SearchError::Status(429)));
        assert!(err.is_service_unavailable());
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/paper/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = source_for(&server).search("graphs").await.unwrap_err();
        assert!(matches!(err, SearchError::Malformed(_)));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let client = HttpClient::with_timeout(Duration::from_secs(2)).unwrap();
        let source = SemanticScholarSource::new(client).with_endpoint("http://127.0.0.1:1");

        let err = source.search("graphs").await.unwrap_err();
        assert!(matches!(err, SearchError::Transport(_)));
    }

    #[tokio::test]
    async fn test_blank_keywords_skip_the_request() {
        let client = HttpClient::with_timeout(Duration::from_secs(2)).unwrap();
        let source = SemanticScholarSource::new(client).with_endpoint("http://127.0.0.1:1");

        assert!(matches!(source.search("  ").await, Err(SearchError::EmptyQuery)));
    }
}
