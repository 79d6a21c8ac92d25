//! Configuration management.
//!
//! Configuration is read once by the application shell and handed to each
//! component at construction time. Components never read the environment
//! themselves.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api_keys]
//! gemini = "your-google-api-key"
//! semantic_scholar = "optional-key"
//!
//! [model]
//! name = "gemini-2.0-flash"
//! timeout_secs = 60
//!
//! [search]
//! result_limit = 10
//! timeout_secs = 10
//!
//! [downloads]
//! timeout_secs = 15
//! max_file_size_mb = 100
//!
//! [documents]
//! pandoc_path = "pandoc"
//! output_dir = "./documents"
//! ```
//!
//! Any key can be overridden from the environment with the
//! `RESEARCH_SCRIBE__` prefix, e.g. `RESEARCH_SCRIBE__MODEL__NAME=gemini-1.5-pro`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Generative model settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Bibliographic search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// PDF download settings
    #[serde(default)]
    pub downloads: DownloadConfig,

    /// Document rendering settings
    #[serde(default)]
    pub documents: DocumentConfig,
}

/// API keys for external services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Google Generative Language API key
    #[serde(default)]
    pub gemini: Option<String>,

    /// Semantic Scholar API key (optional, for higher rate limits)
    #[serde(default)]
    pub semantic_scholar: Option<String>,
}

impl Default for ApiKeys {
    fn default() -> Self {
        Self {
            gemini: std::env::var("GOOGLE_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .ok(),
            semantic_scholar: std::env::var("SEMANTIC_SCHOLAR_API_KEY").ok(),
        }
    }
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier
    #[serde(default = "default_model_name")]
    pub name: String,

    /// API base URL
    #[serde(default = "default_model_endpoint")]
    pub endpoint: String,

    /// Per-call timeout (seconds)
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            endpoint: default_model_endpoint(),
            timeout_secs: default_model_timeout(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_model_name() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_model_endpoint() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model_timeout() -> u64 {
    60
}

/// Bibliographic search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Semantic Scholar Graph API base URL
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// Maximum number of records requested and returned
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Request timeout (seconds)
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            result_limit: default_result_limit(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_search_endpoint() -> String {
    "https://api.semanticscholar.org/graph/v1".to_string()
}

fn default_result_limit() -> usize {
    10
}

fn default_search_timeout() -> u64 {
    10
}

/// PDF download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Request timeout for each fetch (seconds)
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,

    /// Maximum file size for downloads (in MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size_mb: usize,

    /// Directory for temporary PDF files (system temp dir when unset)
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_download_timeout(),
            max_file_size_mb: default_max_file_size(),
            temp_dir: None,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb as u64 * 1024 * 1024
    }
}

fn default_download_timeout() -> u64 {
    15
}

fn default_max_file_size() -> usize {
    100
}

/// Document rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Path or name of the pandoc executable
    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: PathBuf,

    /// Optional `--reference-doc` template for pandoc
    #[serde(default)]
    pub reference_doc: Option<PathBuf>,

    /// Converter timeout (seconds)
    #[serde(default = "default_converter_timeout")]
    pub timeout_secs: u64,

    /// Default directory for generated documents
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            pandoc_path: default_pandoc_path(),
            reference_doc: None,
            timeout_secs: default_converter_timeout(),
            output_dir: default_output_dir(),
        }
    }
}

impl DocumentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_pandoc_path() -> PathBuf {
    PathBuf::from("pandoc")
}

fn default_converter_timeout() -> u64 {
    60
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./documents")
}

/// Load configuration from a file, with `RESEARCH_SCRIBE__*` environment overrides
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("RESEARCH_SCRIBE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    let mut loaded: Config = settings.try_deserialize()?;

    // Keys missing from the file still fall back to the usual environment variables
    let env_keys = ApiKeys::default();
    if loaded.api_keys.gemini.is_none() {
        loaded.api_keys.gemini = env_keys.gemini;
    }
    if loaded.api_keys.semantic_scholar.is_none() {
        loaded.api_keys.semantic_scholar = env_keys.semantic_scholar;
    }

    Ok(loaded)
}

/// Find a configuration file in the default locations
///
/// Checks `./research-scribe.toml`, then `<config dir>/research-scribe/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("research-scribe.toml");
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("research-scribe").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}
