//! Article text → four-field structured summary.
//!
//! The model is asked for exactly four string keys. A reply that cannot be
//! parsed (even after salvage) earns one more call with a corrective
//! instruction in front of the prompt; after that the request fails with an
//! excerpt of the last reply.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::contract::{self, Validation};
use crate::llm::{GenerationOptions, TextGenerator};
use crate::models::{FailureKind, StructuredSummary, SummaryResult};
use crate::utils::truncate_chars;

/// Model calls allowed per summary, the first included
pub const MAX_CONTRACT_ATTEMPTS: usize = 2;

/// Input characters sent to the model
pub const MAX_INPUT_CHARS: usize = 12_000;

/// Output token cap for each call
pub const MAX_OUTPUT_TOKENS: u32 = 1_500;

const SUMMARY_PROMPT: &str = r#"You are an assistant that summarizes academic articles. Produce a JSON object with exactly these required keys: "problem", "methodology", "results", "conclusion". Each value is a concise text of 1 to 4 sentences.

Strict rules:
- Return ONLY a valid JSON object, with no explanations or extra text.
- Write in Portuguese (pt-BR) and be didactic.
- Give a complete and clear explanation for each key."#;

const CORRECTIVE_INSTRUCTION: &str = r#"You did not return valid JSON. Reply ONLY with a valid JSON object containing the keys "problem", "methodology", "results", "conclusion". Do not include any additional text or explanations. Only the JSON object."#;

/// The four keys, each optional so partial replies still count as parsed
#[derive(Debug, Default, Deserialize)]
struct SummaryReply {
    #[serde(default)]
    problem: Option<Value>,
    #[serde(default)]
    methodology: Option<Value>,
    #[serde(default)]
    results: Option<Value>,
    #[serde(default)]
    conclusion: Option<Value>,
}

impl SummaryReply {
    fn into_summary(self) -> StructuredSummary {
        StructuredSummary {
            problem: field_text(self.problem),
            methodology: field_text(self.methodology),
            results: field_text(self.results),
            conclusion: field_text(self.conclusion),
        }
    }
}

/// Absent and null become "", strings are trimmed, anything else keeps its JSON text
fn field_text(value: Option<Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.trim().to_string(),
        Some(other) => other.to_string(),
    }
}

/// Where a summarize request stands
#[derive(Debug)]
enum State {
    /// Call the model; `attempt` counts from 1
    Attempt { attempt: usize },
    /// Check the reply of `attempt` against the contract
    Validate { attempt: usize, raw: String },
    /// The reply failed and budget remains
    RetryWithCorrection { next_attempt: usize },
    Success(SummaryReply),
    Exhausted { raw: String, reason: String },
}

/// Summarizes article text under a strict JSON contract
#[derive(Debug, Clone)]
pub struct StructuredSummarizer {
    generator: Arc<dyn TextGenerator>,
}

impl StructuredSummarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Summarize `text`, optionally steering the model toward `focus`
    pub async fn summarize(&self, text: &str, focus: Option<&str>) -> SummaryResult {
        let text = text.trim();
        if text.is_empty() {
            return SummaryResult::failure(FailureKind::InvalidInput, "No article text to summarize");
        }

        let prompt = build_prompt(text, focus);
        let options = GenerationOptions::deterministic(MAX_OUTPUT_TOKENS);

        let mut state = State::Attempt { attempt: 1 };
        loop {
            state = match state {
                State::Attempt { attempt } => {
                    let request = if attempt == 1 {
                        prompt.clone()
                    } else {
                        format!("{}\n\n{}", CORRECTIVE_INSTRUCTION, prompt)
                    };
                    match self.generator.generate(&request, &options).await {
                        Ok(raw) => State::Validate { attempt, raw },
                        Err(e) => {
                            tracing::warn!(attempt, error = %e, "Summary model call failed");
                            return SummaryResult::failure(
                                FailureKind::ModelUnavailable,
                                format!("Failed to generate the summary: {}", e),
                            );
                        }
                    }
                }
                State::Validate { attempt, raw } => {
                    tracing::debug!(attempt, raw = %contract::excerpt(&raw), "Summary model reply");
                    match contract::validate::<SummaryReply>(&raw) {
                        Validation::Valid(reply) => State::Success(reply),
                        Validation::Violation { reason } if attempt < MAX_CONTRACT_ATTEMPTS => {
                            tracing::warn!(attempt, %reason, "Summary reply broke the JSON contract, retrying");
                            State::RetryWithCorrection {
                                next_attempt: attempt + 1,
                            }
                        }
                        Validation::Violation { reason } => State::Exhausted { raw, reason },
                    }
                }
                State::RetryWithCorrection { next_attempt } => State::Attempt {
                    attempt: next_attempt,
                },
                State::Success(reply) => {
                    tracing::info!("Summary generated");
                    return SummaryResult::Summary(reply.into_summary());
                }
                State::Exhausted { raw, reason } => {
                    tracing::warn!(%reason, "No valid JSON summary after {} attempts", MAX_CONTRACT_ATTEMPTS);
                    return SummaryResult::failure_with_raw(
                        FailureKind::ContractViolation,
                        "Invalid response from the AI model",
                        contract::excerpt(&raw),
                    );
                }
            };
        }
    }
}

fn build_prompt(text: &str, focus: Option<&str>) -> String {
    let mut prompt = SUMMARY_PROMPT.to_string();
    if let Some(focus) = focus.map(str::trim).filter(|focus| !focus.is_empty()) {
        prompt.push_str(&format!(
            "\n- Pay particular attention to what the article says about: {}",
            focus
        ));
    }
    format!(
        "{}\n\nArticle (excerpt or full text):\n{}\n\nYour output:",
        prompt,
        truncate_chars(text, MAX_INPUT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, MockGenerator};

    const VALID: &str =
        r#"{"problem":"p","methodology":"m","results":"r","conclusion":"c"}"#;

    fn summarizer(mock: &Arc<MockGenerator>) -> StructuredSummarizer {
        StructuredSummarizer::new(mock.clone())
    }

    #[tokio::test]
    async fn test_fenced_reply_succeeds_first_try() {
        let mock = Arc::new(MockGenerator::with_replies([format!("```json\n{}\n```", VALID)]));

        let result = summarizer(&mock).summarize("Some article text", None).await;

        assert_eq!(
            result,
            SummaryResult::Summary(StructuredSummary {
                problem: "p".into(),
                methodology: "m".into(),
                results: "r".into(),
                conclusion: "c".into(),
            })
        );
        assert_eq!(mock.call_count(), 1);
        let options = &mock.options()[0];
        assert_eq!(options.temperature, Some(0.0));
        assert_eq!(options.max_output_tokens, Some(MAX_OUTPUT_TOKENS));
    }

    #[tokio::test]
    async fn test_truncated_reply_gets_corrective_retry() {
        let mock = Arc::new(MockGenerator::with_replies([
            r#"{"problem":"p","methodology":"m","results":"r","conclusion":"c""#.to_string(),
            VALID.to_string(),
        ]));

        let result = summarizer(&mock).summarize("Some article text", None).await;

        assert!(result.is_success());
        assert_eq!(mock.call_count(), 2);
        let prompts = mock.prompts();
        assert!(!prompts[0].starts_with(CORRECTIVE_INSTRUCTION));
        assert!(prompts[1].starts_with(CORRECTIVE_INSTRUCTION));
        assert!(prompts[1].ends_with(&prompts[0]));
    }

    #[tokio::test]
    async fn test_exhausted_attempts_report_excerpt() {
        let garbage = format!("I cannot do that. {}", "x".repeat(5_000));
        let mock = Arc::new(MockGenerator::with_replies(["not json at all".to_string(), garbage]));

        let result = summarizer(&mock).summarize("Some article text", None).await;

        let failure = result.failure_info().expect("failure");
        assert_eq!(failure.kind, FailureKind::ContractViolation);
        let raw = failure.raw.as_deref().expect("raw excerpt");
        assert!(raw.starts_with("I cannot do that."));
        assert_eq!(raw.chars().count(), 1_000);
        assert_eq!(mock.call_count(), MAX_CONTRACT_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_partial_object_defaults_missing_keys() {
        let mock = Arc::new(MockGenerator::with_replies([
            r#"Here you go: {"problem": "  spaced  ", "results": 42, "conclusion": null} thanks"#,
        ]));

        let result = summarizer(&mock).summarize("Some article text", None).await;

        let summary = result.summary().expect("summary");
        assert_eq!(summary.problem, "spaced");
        assert_eq!(summary.methodology, "");
        assert_eq!(summary.results, "42");
        assert_eq!(summary.conclusion, "");
    }

    #[tokio::test]
    async fn test_model_failure_is_not_retried() {
        let mock = Arc::new(MockGenerator::new());
        mock.push_error(LlmError::Network("connection refused".into()));
        mock.push_reply(VALID);

        let result = summarizer(&mock).summarize("Some article text", None).await;

        assert_eq!(
            result.failure_info().map(|f| f.kind),
            Some(FailureKind::ModelUnavailable)
        );
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_text_is_invalid_input() {
        let mock = Arc::new(MockGenerator::new());

        let result = summarizer(&mock).summarize(" \n ", None).await;

        assert_eq!(
            result.failure_info().map(|f| f.kind),
            Some(FailureKind::InvalidInput)
        );
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_long_input_is_truncated_and_focus_included() {
        let mock = Arc::new(MockGenerator::with_replies([VALID]));
        let text = format!("{}{}", "a".repeat(MAX_INPUT_CHARS), "TAIL_MARKER");

        summarizer(&mock)
            .summarize(&text, Some("energy efficiency"))
            .await;

        let prompt = &mock.prompts()[0];
        assert!(prompt.contains(&"a".repeat(MAX_INPUT_CHARS)));
        assert!(!prompt.contains("TAIL_MARKER"));
        assert!(prompt.contains("energy efficiency"));
    }
}
