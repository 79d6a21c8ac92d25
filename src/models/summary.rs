//! Structured summary produced by the summarizer.

use serde::{Deserialize, Serialize};

/// Four-field summary of an article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSummary {
    /// The problem the article addresses
    pub problem: String,
    /// How the authors approached it
    pub methodology: String,
    /// What they found
    pub results: String,
    /// What they concluded
    pub conclusion: String,
}

/// Why a summary could not be produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Empty text or malformed URL
    InvalidInput,
    /// The document could not be downloaded
    Transport,
    /// The document was downloaded but no text could be recovered
    Extraction,
    /// The generative model could not be reached
    ModelUnavailable,
    /// The model never returned a parseable JSON object
    ContractViolation,
}

impl FailureKind {
    /// Whether the failure was caused by the caller's input rather than a collaborator
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FailureKind::InvalidInput | FailureKind::Extraction | FailureKind::ContractViolation
        )
    }
}

/// Error payload returned in place of a summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFailure {
    /// Human-readable message
    pub error: String,

    /// Failure classification
    pub kind: FailureKind,

    /// Excerpt of the last raw model response, for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// Outcome of a summarize request
///
/// Exactly one of the two shapes is ever present: either all four content
/// fields, or an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryResult {
    Summary(StructuredSummary),
    Failed(SummaryFailure),
}

impl SummaryResult {
    /// Build a failure without diagnostics
    pub fn failure(kind: FailureKind, error: impl Into<String>) -> Self {
        SummaryResult::Failed(SummaryFailure {
            error: error.into(),
            kind,
            raw: None,
        })
    }

    /// Build a failure carrying a raw-response excerpt
    pub fn failure_with_raw(kind: FailureKind, error: impl Into<String>, raw: String) -> Self {
        SummaryResult::Failed(SummaryFailure {
            error: error.into(),
            kind,
            raw: Some(raw),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SummaryResult::Summary(_))
    }

    pub fn summary(&self) -> Option<&StructuredSummary> {
        match self {
            SummaryResult::Summary(summary) => Some(summary),
            SummaryResult::Failed(_) => None,
        }
    }

    pub fn failure_info(&self) -> Option<&SummaryFailure> {
        match self {
            SummaryResult::Summary(_) => None,
            SummaryResult::Failed(failure) => Some(failure),
        }
    }
}
