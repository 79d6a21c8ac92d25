//! Journal profiles and the structured document returned by the formatter.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading a journal profile
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML profile: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON profile: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported profile format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// Formatting rules of a target journal
///
/// Supplied by the caller and only ever read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalProfile {
    /// Short identifier, used when no display name is set
    #[serde(default)]
    pub id: Option<String>,

    /// Output language (BCP 47 tag)
    #[serde(default = "default_language")]
    pub language: String,

    /// Journal name shown to the model
    #[serde(default)]
    pub display_name: Option<String>,

    /// CSL citation style identifier
    #[serde(default, alias = "csl_id")]
    pub citation_style: Option<String>,

    /// Abstract rules
    #[serde(default, rename = "abstract")]
    pub abstract_rules: AbstractRules,

    /// Title capitalization rule
    #[serde(default = "default_title_case")]
    pub title_case: String,

    /// Section names the journal requires, in order
    #[serde(default)]
    pub required_sections: Vec<String>,
}

/// Abstract constraints of a journal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractRules {
    /// Maximum abstract length, in characters
    #[serde(default = "default_max_abstract_chars")]
    pub max_chars: usize,
}

impl Default for AbstractRules {
    fn default() -> Self {
        Self {
            max_chars: default_max_abstract_chars(),
        }
    }
}

fn default_language() -> String {
    "pt-BR".to_string()
}

fn default_title_case() -> String {
    "Sentence case".to_string()
}

fn default_max_abstract_chars() -> usize {
    250
}

impl Default for JournalProfile {
    fn default() -> Self {
        Self {
            id: None,
            language: default_language(),
            display_name: None,
            citation_style: None,
            abstract_rules: AbstractRules::default(),
            title_case: default_title_case(),
            required_sections: Vec::new(),
        }
    }
}

impl JournalProfile {
    /// Name to present to the model: display name, then id, then "unknown"
    pub fn journal_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or("unknown")
    }

    /// Citation style identifier, or "unknown"
    pub fn csl_id(&self) -> &str {
        self.citation_style.as_deref().unwrap_or("unknown")
    }

    /// Load a profile from a `.toml` or `.json` file
    pub fn from_file(path: &Path) -> Result<Self, ProfileError> {
        let contents = std::fs::read_to_string(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(&contents)?),
            "json" => Ok(serde_json::from_str(&contents)?),
            other => Err(ProfileError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Caller-supplied hints passed to the formatter alongside the raw text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatMetadata {
    #[serde(default)]
    pub title_hint: Option<String>,

    #[serde(default)]
    pub authors_hint: Vec<String>,

    #[serde(default)]
    pub keywords_hint: Vec<String>,
}

/// Treat an explicit JSON `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An author of the formatted paper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentAuthor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default)]
    pub affiliation: Option<String>,
}

impl DocumentAuthor {
    /// Single display line: name, followed by the affiliation when present
    pub fn display_line(&self) -> String {
        match self.affiliation.as_deref().map(str::trim) {
            Some(affiliation) if !affiliation.is_empty() => {
                format!("{} ({})", self.name, affiliation)
            }
            _ => self.name.clone(),
        }
    }
}

/// One body section of the formatted paper
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

impl DocumentSection {
    /// Heading text, "Section" when the model left the name empty
    pub fn heading(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            "Section"
        } else {
            name
        }
    }
}

/// Structured reference stub, as produced by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationStub {
    #[serde(default)]
    pub raw: Option<String>,

    #[serde(default)]
    pub doi: Option<String>,

    /// Resolution status, e.g. `UNRESOLVED` when no DOI backs the reference
    #[serde(default)]
    pub resolution: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A reference list entry: either an opaque string or a structured stub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReferenceEntry {
    Raw(String),
    Structured(CitationStub),
}

impl ReferenceEntry {
    /// Text to print in the reference list
    pub fn display_text(&self) -> String {
        match self {
            ReferenceEntry::Raw(raw) => raw.clone(),
            ReferenceEntry::Structured(stub) => match (&stub.raw, &stub.doi) {
                (Some(raw), _) => raw.clone(),
                (None, Some(doi)) => format!("doi:{}", doi),
                (None, None) => serde_json::to_string(&stub.extra).unwrap_or_default(),
            },
        }
    }
}

/// Provenance of a formatted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationInfo {
    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub prompt_template_version: Option<String>,

    #[serde(default)]
    pub generated_at: Option<String>,
}

/// A paper formatted for a journal, as described by the model's JSON reply
///
/// Every field is defaulted so a partially-populated reply still parses.
/// Section order is kept exactly as the model returned it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormattedDocument {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<DocumentAuthor>,

    #[serde(default, rename = "abstract", deserialize_with = "null_as_default")]
    pub abstract_text: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub sections: Vec<DocumentSection>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub in_text_citations: Vec<serde_json::Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub references_raw: Vec<ReferenceEntry>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub generation_info: GenerationInfo,
}
