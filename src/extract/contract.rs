//! Parsing model replies against a declared JSON shape.
//!
//! Models wrap JSON in markdown fences, add chatter around it, or stop in
//! the middle of an object. [`validate`] tries the fence-stripped reply
//! first, then the substring between the first `{` and the last `}`.
//! Anything that does not deserialize into the requested type from a JSON
//! object is reported as a [`Validation::Violation`].

use serde::de::DeserializeOwned;

use crate::utils::truncate_chars;

/// Maximum length of raw-reply excerpts kept for diagnostics
pub const EXCERPT_CHARS: usize = 1_000;

/// Outcome of checking a reply against its contract
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<T> {
    Valid(T),
    Violation { reason: String },
}

impl<T> Validation<T> {
    pub fn is_valid(&self) -> bool {
        matches!(self, Validation::Valid(_))
    }

    /// The parsed value, discarding the violation reason
    pub fn ok(self) -> Option<T> {
        match self {
            Validation::Valid(value) => Some(value),
            Validation::Violation { .. } => None,
        }
    }
}

/// Remove markdown code-fence markers and surrounding whitespace
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "").trim().to_string()
}

/// Substring from the first `{` to the last `}`, if there is one
pub fn salvage_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Check a raw model reply against the shape `T`
pub fn validate<T: DeserializeOwned>(raw: &str) -> Validation<T> {
    let direct = match parse_object(&strip_code_fences(raw)) {
        Ok(value) => return Validation::Valid(value),
        Err(reason) => reason,
    };

    match salvage_object(raw).map(parse_object::<T>) {
        Some(Ok(value)) => {
            tracing::debug!("Recovered JSON object from surrounding text");
            Validation::Valid(value)
        }
        Some(Err(salvage)) => Validation::Violation {
            reason: format!("{}; salvage failed: {}", direct, salvage),
        },
        None => Validation::Violation { reason: direct },
    }
}

/// Diagnostic excerpt of a raw reply
pub fn excerpt(raw: &str) -> String {
    truncate_chars(raw, EXCERPT_CHARS).to_string()
}

fn parse_object<T: DeserializeOwned>(candidate: &str) -> Result<T, String> {
    let value: serde_json::Value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    if !value.is_object() {
        return Err("expected a JSON object".to_string());
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}
