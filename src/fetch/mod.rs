//! Fetching documents from user-supplied URLs.
//!
//! - [`UrlResolver`]: follows HTML landing pages down to a fetchable PDF
//! - [`FetchedDocument`]: the resulting body, streamed or already buffered
//! - [`FetchError`]: transport failures on the initial request

mod resolver;

pub use resolver::UrlResolver;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a document
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match (err.status(), err.url()) {
            (Some(status), Some(url)) => FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            },
            _ => FetchError::Network(err.to_string()),
        }
    }
}

#[derive(Debug)]
enum Body {
    Stream(reqwest::Response),
    Buffered(Option<Vec<u8>>),
}

/// A fetched document body
///
/// Either a live response that is read chunk by chunk, or bytes that were
/// already read while inspecting a landing page.
#[derive(Debug)]
pub struct FetchedDocument {
    url: Url,
    content_type: Option<String>,
    body: Body,
}

impl FetchedDocument {
    /// Wrap a successful response without reading it
    pub fn from_response(response: reqwest::Response) -> Self {
        Self {
            url: response.url().clone(),
            content_type: content_type_of(&response),
            body: Body::Stream(response),
        }
    }

    /// Wrap bytes that were already read
    pub fn from_bytes(url: Url, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            url,
            content_type,
            body: Body::Buffered(Some(bytes)),
        }
    }

    /// Final URL the body was read from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Value of the `content-type` header, if any
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Whether the server labelled the body as a PDF
    pub fn is_pdf(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_lowercase().contains("application/pdf"))
            .unwrap_or(false)
    }

    /// Whether the server labelled the body as HTML
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map(is_html).unwrap_or(false)
    }

    /// Read the next chunk of the body, `None` once exhausted
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, FetchError> {
        match &mut self.body {
            Body::Stream(response) => Ok(response.chunk().await?.map(|chunk| chunk.to_vec())),
            Body::Buffered(bytes) => Ok(bytes.take()),
        }
    }

    /// Read the whole remaining body into memory
    pub async fn into_bytes(mut self) -> Result<Vec<u8>, FetchError> {
        let mut bytes = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }
}

fn content_type_of(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

fn is_html(content_type: &str) -> bool {
    let content_type = content_type.to_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml+xml")
}
