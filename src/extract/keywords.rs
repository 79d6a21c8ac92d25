//! Query → keyword string, with a deterministic fallback.

use serde::Deserialize;
use std::sync::Arc;

use super::contract::{self, Validation};
use crate::llm::{GenerationOptions, TextGenerator};
use crate::utils::collapse_whitespace;

const KEYWORD_PROMPT: &str = r#"You are the query processor of an academic search engine. Your only job is to turn a user's request into an optimized keyword string for a bibliographic search API such as Semantic Scholar.

Follow these rules strictly:
1. Identify the main concepts, technologies, nouns and technical terms in the request.
2. Drop every conversational element.
3. Keep only the terms that matter for the search, in the user's language.
4. Your reply MUST be a valid JSON object with a single key named "keywords". Its value is the keyword string, lowercase and space-separated. Do not write ANY text outside that object.

Examples:
- Request: "me encontre, por favor, artigos recentes sobre o impacto da inteligência artificial na economia do Brasil"
- Reply: {"keywords": "impacto inteligência artificial economia brasil"}

- Request: "história da computação quântica"
- Reply: {"keywords": "história computação quântica"}

Process the following request:
Request: "{query}"
Reply:"#;

#[derive(Debug, Deserialize)]
struct KeywordsReply {
    keywords: String,
}

/// Turns natural-language queries into search keywords
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    generator: Arc<dyn TextGenerator>,
}

impl KeywordExtractor {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Extract a lowercase, space-separated keyword string
    ///
    /// Never fails: any model or parsing problem falls back to the lowercased
    /// query. Only an empty (or blank) query yields an empty string.
    pub async fn extract(&self, query: &str) -> String {
        let fallback = collapse_whitespace(&query.to_lowercase());
        if fallback.is_empty() {
            return fallback;
        }

        let prompt = KEYWORD_PROMPT.replace("{query}", query.trim());
        let options = GenerationOptions::deterministic(256);

        let raw = match self.generator.generate(&prompt, &options).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "Keyword extraction failed, using the query itself");
                return fallback;
            }
        };

        match contract::validate::<KeywordsReply>(&raw) {
            Validation::Valid(reply) => {
                let keywords = collapse_whitespace(&reply.keywords.to_lowercase());
                if keywords.is_empty() {
                    tracing::warn!("Model returned empty keywords, using the query itself");
                    fallback
                } else {
                    tracing::debug!(%keywords, "Extracted keywords");
                    keywords
                }
            }
            Validation::Violation { reason } => {
                tracing::warn!(%reason, "Unparseable keyword reply, using the query itself");
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockGenerator, Unconfigured};

    #[tokio::test]
    async fn test_fenced_reply_is_used() {
        let mock = Arc::new(MockGenerator::with_replies([
            "```json\n{\"keywords\": \"Quantum  Computing History\"}\n```",
        ]));
        let extractor = KeywordExtractor::new(mock.clone());

        let keywords = extractor
            .extract("tell me about the history of quantum computing")
            .await;

        assert_eq!(keywords, "quantum computing history");
        assert!(mock.prompts()[0].contains("tell me about the history of quantum computing"));
    }

    #[tokio::test]
    async fn test_model_unavailable_falls_back_to_query() {
        let extractor = KeywordExtractor::new(Arc::new(Unconfigured));
        let keywords = extractor.extract("  História da Computação Quântica ").await;
        assert_eq!(keywords, "história da computação quântica");
    }

    #[tokio::test]
    async fn test_bad_replies_fall_back_to_query() {
        let mock = MockGenerator::new();
        mock.push_reply("keywords: graphs");
        mock.push_reply("{\"terms\": \"graphs\"}");
        mock.push_reply("{\"keywords\": \"   \"}");
        mock.push_error(LlmError::Api {
            status: 500,
            message: "boom".to_string(),
        });
        let extractor = KeywordExtractor::new(Arc::new(mock));

        for _ in 0..4 {
            assert_eq!(extractor.extract("Graph Neural Networks").await, "graph neural networks");
        }
    }

    #[tokio::test]
    async fn test_empty_query_skips_the_model() {
        let mock = Arc::new(MockGenerator::new());
        let extractor = KeywordExtractor::new(mock.clone());

        assert_eq!(extractor.extract("   ").await, "");
        assert_eq!(mock.call_count(), 0);
    }
}
