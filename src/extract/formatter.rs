//! Raw text + journal profile → formatted academic document.

use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use super::contract::{self, Validation};
use crate::llm::{GenerationOptions, LlmError, TextGenerator};
use crate::models::{FormatMetadata, FormattedDocument, JournalProfile};

/// Version tag recorded in `generation_info`
pub const PROMPT_TEMPLATE_VERSION: &str = "v1";

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8_192;

const OUTPUT_SCHEMA: &str = r#"OUTPUT_SCHEMA: the JSON object must contain:
- "title": string
- "authors": array of {"name": string, "affiliation": string or null}
- "abstract": string
- "keywords": array of strings
- "sections": array of {"name": string, "content": string}, in the order of the required sections
- "in_text_citations": array
- "references_raw": array of strings or of {"raw": string, "doi": string or null, "resolution": string}
- "warnings": array of strings
- "generation_info": {"model": string, "prompt_template_version": string}"#;

/// Errors returned by the formatter
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Formatting model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("Model reply is not a valid formatted document: {reason}")]
    ContractViolation { reason: String, excerpt: String },

    #[error("No text to format")]
    EmptyInput,
}

/// Formats raw article text for a target journal with one model call
#[derive(Debug, Clone)]
pub struct AcademicFormatter {
    generator: Arc<dyn TextGenerator>,
    max_output_tokens: u32,
}

impl AcademicFormatter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Ask the model for a [`FormattedDocument`] following `profile`
    ///
    /// Sections are returned in the model's order and are not checked
    /// against `profile.required_sections`. An abstract longer than the
    /// profile allows is kept, with a warning appended.
    pub async fn format(
        &self,
        raw_text: &str,
        profile: &JournalProfile,
        metadata: &FormatMetadata,
    ) -> Result<FormattedDocument, FormatError> {
        let raw_text = raw_text.trim();
        if raw_text.is_empty() {
            return Err(FormatError::EmptyInput);
        }

        let prompt = build_prompt(raw_text, profile, metadata);
        let options = GenerationOptions {
            temperature: None,
            max_output_tokens: Some(self.max_output_tokens),
        };

        tracing::info!(
            journal = profile.journal_name(),
            chars = raw_text.chars().count(),
            "Requesting academic formatting"
        );
        let raw = self.generator.generate(&prompt, &options).await?;

        let mut document = match contract::validate::<FormattedDocument>(&raw) {
            Validation::Valid(document) => document,
            Validation::Violation { reason } => {
                tracing::warn!(%reason, "Formatting reply broke the JSON contract");
                return Err(FormatError::ContractViolation {
                    reason,
                    excerpt: contract::excerpt(&raw),
                });
            }
        };

        self.fill_generation_info(&mut document);
        check_abstract_length(&mut document, profile);

        tracing::info!(
            sections = document.sections.len(),
            references = document.references_raw.len(),
            "Formatted document parsed"
        );
        Ok(document)
    }

    fn fill_generation_info(&self, document: &mut FormattedDocument) {
        let info = &mut document.generation_info;
        if info.model.is_none() {
            info.model = Some(self.generator.model_id().to_string());
        }
        if info.prompt_template_version.is_none() {
            info.prompt_template_version = Some(PROMPT_TEMPLATE_VERSION.to_string());
        }
        if info.generated_at.is_none() {
            info.generated_at = Some(chrono::Utc::now().to_rfc3339());
        }
    }
}

fn check_abstract_length(document: &mut FormattedDocument, profile: &JournalProfile) {
    let max_chars = profile.abstract_rules.max_chars;
    let length = document.abstract_text.chars().count();
    if length > max_chars {
        document.warnings.push(format!(
            "Abstract has {} characters, above the journal limit of {}",
            length, max_chars
        ));
    }
}

fn build_prompt(raw_text: &str, profile: &JournalProfile, metadata: &FormatMetadata) -> String {
    let system = format!(
        "You are an assistant specialized in formatting scientific texts for journal submission.\n\
         Answer strictly with the JSON contract described below: JSON only, no additional explanations.\n\
         Follow these global rules:\n\
         1. Use the language: {language}.\n\
         2. Adapt the text to the rules of the journal {journal}.\n\
         3. Requested citation style (CSL id): {csl}.\n\
         4. Limits: abstract at most {max_chars} characters.\n\
         5. Answer in conformance with the required JSON schema.\n\
         6. Do not invent references. When there is no DOI, mark the resolution as UNRESOLVED.",
        language = profile.language,
        journal = profile.journal_name(),
        csl = profile.csl_id(),
        max_chars = profile.abstract_rules.max_chars,
    );

    let payload = json!({
        "journal_name": profile.journal_name(),
        "csl_id": profile.csl_id(),
        "language": profile.language,
        "max_abstract_chars": profile.abstract_rules.max_chars,
        "title_case_rule": profile.title_case,
        "required_sections": profile.required_sections,
        "raw_text": raw_text,
        "metadata": metadata,
    });
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string());

    format!(
        "{}\n\n{}\n\nPayload:\n{}\n\nINSTRUCTIONS:\n- Return only a JSON object following the schema.\n- Do not include text outside the JSON.",
        system, OUTPUT_SCHEMA, payload
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockGenerator;
    use crate::models::ReferenceEntry;

    fn profile() -> JournalProfile {
        serde_json::from_value(json!({
            "id": "example_journal",
            "display_name": "Exemplo Journal",
            "citation_style": "apa",
            "abstract": {"max_chars": 20},
            "required_sections": ["Introduction", "Methods", "Results", "Conclusion"]
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_format_parses_reply_and_fills_provenance() {
        let reply = r#"```json
{
  "title": "Exemplo de estudo",
  "authors": [{"name": "Autor Exemplo", "affiliation": null}],
  "abstract": "Este é um resumo simples e longo demais.",
  "sections": [
    {"name": "Methods", "content": "Descrevemos métodos."},
    {"name": "Introduction", "content": "Conteúdo introdutório."}
  ],
  "references_raw": ["Plain reference", {"raw": "Doe 2020", "resolution": "UNRESOLVED"}]
}
```"#;
        let mock = Arc::new(MockGenerator::with_replies([reply]));
        let formatter = AcademicFormatter::new(mock.clone());
        let metadata = FormatMetadata {
            title_hint: Some("Exemplo".into()),
            ..FormatMetadata::default()
        };

        let document = formatter
            .format("Título: Exemplo de Estudo.\nResumo: ...", &profile(), &metadata)
            .await
            .unwrap();

        let names: Vec<_> = document.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Methods", "Introduction"]);
        assert!(matches!(&document.references_raw[0], ReferenceEntry::Raw(r) if r == "Plain reference"));
        assert_eq!(document.generation_info.model.as_deref(), Some("mock-model"));
        assert_eq!(
            document.generation_info.prompt_template_version.as_deref(),
            Some(PROMPT_TEMPLATE_VERSION)
        );
        assert!(document.generation_info.generated_at.is_some());
        assert_eq!(document.warnings.len(), 1);
        assert!(document.warnings[0].contains("20"));

        let prompt = &mock.prompts()[0];
        assert!(prompt.contains("Exemplo Journal"));
        assert!(prompt.contains("apa"));
        assert!(prompt.contains("UNRESOLVED"));
        assert!(prompt.contains("\"title_hint\": \"Exemplo\""));
    }

    #[tokio::test]
    async fn test_model_provenance_is_kept() {
        let mock = Arc::new(MockGenerator::with_replies([
            r#"{"title": "T", "generation_info": {"model": "gemini-x", "prompt_template_version": "v0"}}"#,
        ]));

        let document = AcademicFormatter::new(mock)
            .format("text", &JournalProfile::default(), &FormatMetadata::default())
            .await
            .unwrap();

        assert_eq!(document.generation_info.model.as_deref(), Some("gemini-x"));
        assert_eq!(document.generation_info.prompt_template_version.as_deref(), Some("v0"));
        assert!(document.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_contract_violation() {
        let mock = Arc::new(MockGenerator::with_replies(["I'd rather write prose."]));

        let err = AcademicFormatter::new(mock.clone())
            .format("text", &profile(), &FormatMetadata::default())
            .await
            .unwrap_err();

        match err {
            FormatError::ContractViolation { excerpt, .. } => {
                assert_eq!(excerpt, "I'd rather write prose.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_input_and_model_errors() {
        let mock = Arc::new(MockGenerator::new());
        let formatter = AcademicFormatter::new(mock.clone());

        let err = formatter
            .format("   ", &profile(), &FormatMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::EmptyInput));

        let err = formatter
            .format("text", &profile(), &FormatMetadata::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FormatError::Model(_)));
    }
}
