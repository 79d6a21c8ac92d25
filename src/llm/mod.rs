//! Text generation backends.
//!
//! The generative model is an explicit client object built once from
//! configuration and shared by the extractors behind an `Arc`. Nothing below
//! this module reads API keys from the environment.
//!
//! - [`TextGenerator`]: prompt in, free text out
//! - [`GeminiClient`]: Google Generative Language `generateContent` backend
//! - [`MockGenerator`]: scripted replies for tests
//! - [`Unconfigured`]: stand-in used when no API key is available

mod gemini;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::MockGenerator;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::{ApiKeys, ModelConfig};

/// Errors returned by a text generator
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error [{status}]: {message}")]
    Api { status: u16, message: String },

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("No API key configured for the generative model")]
    NotConfigured,

    #[error("Model unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Network(err.to_string())
    }
}

/// Sampling options for a single call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    /// Deterministic sampling with an output cap
    pub fn deterministic(max_output_tokens: u32) -> Self {
        Self {
            temperature: Some(0.0),
            max_output_tokens: Some(max_output_tokens),
        }
    }
}

/// A generative text model
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    /// Send one prompt and return the model's raw text reply
    async fn generate(&self, prompt: &str, options: &GenerationOptions)
        -> Result<String, LlmError>;

    /// Identifier of the underlying model, recorded in generated documents
    fn model_id(&self) -> &str;
}

/// Generator used when no API key is configured; every call fails
#[derive(Debug, Clone, Default)]
pub struct Unconfigured;

#[async_trait]
impl TextGenerator for Unconfigured {
    async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }

    fn model_id(&self) -> &str {
        "unconfigured"
    }
}

/// Build the generator described by the configuration
///
/// Falls back to [`Unconfigured`] when no Gemini key is present, so keyword
/// extraction keeps working from its deterministic fallback.
pub fn from_config(model: &ModelConfig, keys: &ApiKeys) -> Result<Arc<dyn TextGenerator>, LlmError> {
    match keys.gemini.as_deref().filter(|key| !key.trim().is_empty()) {
        Some(key) => Ok(Arc::new(GeminiClient::from_config(model, key)?)),
        None => {
            tracing::warn!("No Gemini API key configured; model-backed operations will fail");
            Ok(Arc::new(Unconfigured))
        }
    }
}
