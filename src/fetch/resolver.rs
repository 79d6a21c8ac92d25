//! Landing page resolution.
//!
//! Users paste whatever URL they have: a direct PDF link, a publisher landing
//! page, or an arXiv-style `/abs/` page. The resolver turns each of those into
//! a body that is most likely the PDF itself. Every discovery step is
//! best-effort; if nothing works the original page body is returned and the
//! extractor reports the failure.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use url::Url;

use super::{content_type_of, is_html, FetchError, FetchedDocument};
use crate::config::DownloadConfig;
use crate::utils::HttpClient;

/// Resolves user-supplied URLs to fetchable PDF bodies
#[derive(Debug, Clone)]
pub struct UrlResolver {
    client: HttpClient,
}

impl UrlResolver {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Create a resolver using the download timeout from configuration
    pub fn from_config(config: &DownloadConfig) -> Result<Self, FetchError> {
        let client = HttpClient::with_timeout(config.timeout())
            .map_err(|e| FetchError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self::new(client))
    }

    /// Fetch `url`, following an HTML landing page to its PDF when possible
    ///
    /// Only the initial request can fail; a landing page whose PDF cannot be
    /// found is returned as-is. An unreadable landing page body still gets the
    /// `/abs/` rewrite before its read error is returned.
    pub async fn resolve(&self, url: &str) -> Result<FetchedDocument, FetchError> {
        let page_url = Url::parse(url.trim())
            .map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        let response = self
            .client
            .client()
            .get(page_url.clone())
            .send()
            .await?
            .error_for_status()?;

        let content_type = content_type_of(&response);
        if !content_type.as_deref().map(is_html).unwrap_or(false) {
            tracing::debug!(url = %page_url, ?content_type, "Response is not HTML, using it directly");
            return Ok(FetchedDocument::from_response(response));
        }

        let final_url = response.url().clone();
        let (body, read_error) = match response.bytes().await {
            Ok(bytes) => (bytes.to_vec(), None),
            Err(e) => {
                tracing::warn!(url = %page_url, error = %e, "Failed to read landing page body");
                (Vec::new(), Some(e))
            }
        };

        for candidate in pdf_candidates(&body, &final_url, &page_url) {
            match self.fetch_candidate(&candidate).await {
                Ok(document) => {
                    tracing::info!(from = %page_url, to = %candidate, "Resolved landing page to PDF");
                    return Ok(document);
                }
                Err(e) => {
                    tracing::debug!(candidate = %candidate, error = %e, "PDF candidate failed");
                }
            }
        }

        if let Some(e) = read_error {
            return Err(e.into());
        }

        tracing::warn!(url = %page_url, "No PDF found behind landing page, returning page body");
        Ok(FetchedDocument::from_bytes(final_url, content_type, body))
    }

    async fn fetch_candidate(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let response = self
            .client
            .client()
            .get(url.clone())
            .send()
            .await?
            .error_for_status()?;
        Ok(FetchedDocument::from_response(response))
    }
}

/// Ordered PDF locations to try for a landing page
///
/// A link found in the page comes first. The `/abs/` rewrite is only a guess
/// and is tried afterwards.
fn pdf_candidates(body: &[u8], final_url: &Url, page_url: &Url) -> Vec<Url> {
    let html = String::from_utf8_lossy(body);
    let mut candidates = Vec::new();

    if let Some(link) = find_pdf_link(&html, final_url) {
        candidates.push(link);
    }

    if let Some(guess) = guess_pdf_url(page_url) {
        if !candidates.contains(&guess) {
            candidates.push(guess);
        }
    }

    candidates
}

/// Find a PDF link in an HTML page and make it absolute against `base`
pub(crate) fn find_pdf_link(html: &str, base: &Url) -> Option<Url> {
    find_pdf_anchor(html, base).or_else(|| find_pdf_path_href(html, base))
}

/// First pattern: any anchor whose target ends in `.pdf`
fn find_pdf_anchor(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").ok()?;

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.to_lowercase().ends_with(".pdf"))
        .find_map(|href| base.join(href).ok())
}

fn pdf_path_href_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i)href=["']([^"']*/pdf/[^"']+\.pdf)["']"#).expect("valid regex literal")
    })
}

/// Second pattern: any `href` with a `/pdf/` segment, anywhere in the markup
fn find_pdf_path_href(html: &str, base: &Url) -> Option<Url> {
    pdf_path_href_pattern()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .find_map(|href| base.join(href.as_str().trim()).ok())
}

/// arXiv-style rewrite: `/abs/<id>` becomes `/pdf/<id>.pdf`
pub(crate) fn guess_pdf_url(url: &Url) -> Option<Url> {
    let raw = url.as_str();
    if !raw.contains("/abs/") || raw.ends_with('/') {
        return None;
    }

    let mut rewritten = raw.replace("/abs/", "/pdf/");
    if !rewritten.to_lowercase().ends_with(".pdf") {
        rewritten.push_str(".pdf");
    }
    Url::parse(&rewritten).ok()
}
