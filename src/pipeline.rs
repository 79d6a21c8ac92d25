//! The operations exposed to the application shells.
//!
//! [`ResearchPipeline`] composes the components into the two call chains:
//!
//! - search: query → [`KeywordExtractor`] → [`ArticleSource`]
//! - summarize: (URL → [`UrlResolver`] → [`PdfTextExtractor`]) or raw text
//!   → [`StructuredSummarizer`]
//!
//! plus formatting ([`AcademicFormatter`]) and rendering
//! ([`DocumentAssembler`]). It holds no per-request state; clones share
//! their HTTP pools and model client.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::document::{AssemblyError, DocumentAssembler};
use crate::extract::{AcademicFormatter, FormatError, KeywordExtractor, StructuredSummarizer};
use crate::fetch::{FetchError, UrlResolver};
use crate::llm::{self, LlmError, TextGenerator};
use crate::models::{
    ArticleRecord, FailureKind, FormatMetadata, FormattedDocument, JournalProfile, SummaryResult,
};
use crate::sources::{ArticleSource, SearchError, SemanticScholarSource};
use crate::utils::{HttpClient, PdfExtractError, PdfTextExtractor};

/// Errors raised while wiring the pipeline from configuration
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Failed to create model client: {0}")]
    Model(#[from] LlmError),
}

/// Search, summarize, format and assemble
#[derive(Debug, Clone)]
pub struct ResearchPipeline {
    keywords: KeywordExtractor,
    source: Arc<dyn ArticleSource>,
    resolver: UrlResolver,
    extractor: PdfTextExtractor,
    summarizer: StructuredSummarizer,
    formatter: AcademicFormatter,
    assembler: DocumentAssembler,
}

impl ResearchPipeline {
    /// Start building a pipeline around a model and a search source
    pub fn builder(
        generator: Arc<dyn TextGenerator>,
        source: Arc<dyn ArticleSource>,
    ) -> ResearchPipelineBuilder {
        ResearchPipelineBuilder {
            generator,
            source,
            resolver: None,
            extractor: None,
            assembler: None,
        }
    }

    /// Wire every component from configuration
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let generator = llm::from_config(&config.model, &config.api_keys)?;
        let source = SemanticScholarSource::from_config(
            &config.search,
            config.api_keys.semantic_scholar.clone(),
        )
        .map_err(|e| PipelineError::Client(e.to_string()))?;
        let resolver = UrlResolver::from_config(&config.downloads)
            .map_err(|e| PipelineError::Client(e.to_string()))?;

        Ok(Self::builder(generator, Arc::new(source))
            .resolver(resolver)
            .extractor(PdfTextExtractor::from_config(&config.downloads))
            .assembler(DocumentAssembler::from_config(&config.documents))
            .build()?)
    }

    /// Turn a natural-language query into keywords and search with them
    pub async fn search(&self, query: &str) -> Result<Vec<ArticleRecord>, SearchError> {
        let keywords = self.keywords.extract(query).await;
        if keywords.is_empty() {
            return Err(SearchError::EmptyQuery);
        }
        tracing::info!(%keywords, source = self.source.name(), "Searching articles");
        self.source.search(&keywords).await
    }

    /// Summarize raw text, or the document behind a URL
    pub async fn summarize(&self, input: &str, is_url: bool) -> SummaryResult {
        self.summarize_with_focus(input, is_url, None).await
    }

    /// Like [`summarize`](Self::summarize), steering the model toward `focus`
    pub async fn summarize_with_focus(
        &self,
        input: &str,
        is_url: bool,
        focus: Option<&str>,
    ) -> SummaryResult {
        if !is_url {
            return self.summarizer.summarize(input, focus).await;
        }
        match self.fetch_text(input).await {
            Ok(text) => self.summarizer.summarize(&text, focus).await,
            Err(failure) => failure,
        }
    }

    /// Ask the model to format `raw_text` for the journal in `profile`
    pub async fn format_academic(
        &self,
        raw_text: &str,
        profile: &JournalProfile,
        metadata: &FormatMetadata,
    ) -> Result<FormattedDocument, FormatError> {
        self.formatter.format(raw_text, profile, metadata).await
    }

    /// Render a formatted document and return the absolute output path
    pub async fn assemble_document(
        &self,
        document: &FormattedDocument,
        output_path: &Path,
    ) -> Result<PathBuf, AssemblyError> {
        self.assembler.assemble(document, output_path).await
    }

    async fn fetch_text(&self, url: &str) -> Result<String, SummaryResult> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SummaryResult::failure(FailureKind::InvalidInput, "No URL given"));
        }

        let document = self.resolver.resolve(url).await.map_err(|e| match e {
            FetchError::InvalidUrl(_) => SummaryResult::failure(FailureKind::InvalidInput, e.to_string()),
            other => SummaryResult::failure(
                FailureKind::Transport,
                format!("Failed to download the document: {}", other),
            ),
        })?;

        self.extractor
            .extract_document(document)
            .await
            .map_err(|e| match e {
                PdfExtractError::Fetch(inner) => SummaryResult::failure(
                    FailureKind::Transport,
                    format!("Failed to download the document: {}", inner),
                ),
                PdfExtractError::NoText => SummaryResult::failure(
                    FailureKind::Extraction,
                    "No text could be extracted from the document",
                ),
                other => SummaryResult::failure(
                    FailureKind::Extraction,
                    format!("Could not read the document as a PDF: {}", other),
                ),
            })
    }
}

/// Builder for [`ResearchPipeline`]
#[derive(Debug)]
pub struct ResearchPipelineBuilder {
    generator: Arc<dyn TextGenerator>,
    source: Arc<dyn ArticleSource>,
    resolver: Option<UrlResolver>,
    extractor: Option<PdfTextExtractor>,
    assembler: Option<DocumentAssembler>,
}

impl ResearchPipelineBuilder {
    pub fn resolver(mut self, resolver: UrlResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn extractor(mut self, extractor: PdfTextExtractor) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn assembler(mut self, assembler: DocumentAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Finish, filling unset components with their defaults
    pub fn build(self) -> Result<ResearchPipeline, PipelineError> {
        let resolver = match self.resolver {
            Some(resolver) => resolver,
            None => {
                let timeout = crate::config::DownloadConfig::default().timeout();
                let client = HttpClient::with_timeout(timeout)
                    .map_err(|e| PipelineError::Client(e.to_string()))?;
                UrlResolver::new(client)
            }
        };

        Ok(ResearchPipeline {
            keywords: KeywordExtractor::new(self.generator.clone()),
            source: self.source,
            resolver,
            extractor: self.extractor.unwrap_or_default(),
            summarizer: StructuredSummarizer::new(self.generator.clone()),
            formatter: AcademicFormatter::new(self.generator),
            assembler: self.assembler.unwrap_or_default(),
        })
    }
}
