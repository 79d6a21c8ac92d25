//! # Research Scribe
//!
//! Find papers, summarize them and format manuscripts for a target journal,
//! from the command line or as a Model Context Protocol (MCP) server.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (ArticleRecord, SummaryResult, FormattedDocument, etc.)
//! - [`sources`]: Bibliographic search behind the [`ArticleSource`] trait
//! - [`fetch`]: Resolving article URLs to fetchable PDFs
//! - [`llm`]: Generative model clients behind the [`TextGenerator`] trait
//! - [`extract`]: Keyword, summary and formatting calls with JSON contract checking
//! - [`document`]: Rendering formatted documents to `.docx`
//! - [`pipeline`]: The composed operations shared by the CLI and MCP server
//! - [`mcp`]: MCP protocol implementation and server
//! - [`utils`]: HTTP client, PDF text extraction and text helpers
//! - [`config`]: Configuration management

pub mod config;
pub mod document;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use llm::TextGenerator;
pub use models::{ArticleRecord, FormattedDocument, JournalProfile, SummaryResult};
pub use pipeline::ResearchPipeline;
pub use sources::ArticleSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
