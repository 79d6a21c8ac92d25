//! Tool handlers backed by the research pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use super::tools::ToolHandler;
use crate::document::default_file_name;
use crate::models::{FormatMetadata, FormattedDocument, JournalProfile};
use crate::pipeline::ResearchPipeline;

fn string_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Deserialize an optional object argument, defaulting when absent or null
fn object_arg<T: serde::de::DeserializeOwned + Default>(args: &Value, name: &str) -> Result<T, String> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| format!("Invalid '{}' parameter: {}", name, e)),
    }
}

/// Handler for keyword search
#[derive(Debug)]
pub struct SearchArticlesHandler {
    pub pipeline: Arc<ResearchPipeline>,
}

#[async_trait::async_trait]
impl ToolHandler for SearchArticlesHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let query = string_arg(&args, "query").ok_or("Missing 'query' parameter")?;

        let records = self.pipeline.search(query).await.map_err(|e| {
            if e.is_service_unavailable() {
                format!("Failed to reach the article database, try again later ({})", e)
            } else {
                e.to_string()
            }
        })?;

        Ok(json!({
            "query": query,
            "count": records.len(),
            "results": records,
        }))
    }
}

/// Handler for summaries from text or URL
#[derive(Debug)]
pub struct SummarizeArticleHandler {
    pub pipeline: Arc<ResearchPipeline>,
}

#[async_trait::async_trait]
impl ToolHandler for SummarizeArticleHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let focus = string_arg(&args, "focus");
        let result = match (string_arg(&args, "text"), string_arg(&args, "url")) {
            (Some(text), _) => self.pipeline.summarize_with_focus(text, false, focus).await,
            (None, Some(url)) => self.pipeline.summarize_with_focus(url, true, focus).await,
            (None, None) => return Err("Provide either 'text' or 'url'".to_string()),
        };

        serde_json::to_value(&result).map_err(|e| e.to_string())
    }
}

/// Handler for journal formatting
#[derive(Debug)]
pub struct FormatAcademicHandler {
    pub pipeline: Arc<ResearchPipeline>,
}

#[async_trait::async_trait]
impl ToolHandler for FormatAcademicHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let raw_text = string_arg(&args, "raw_text").ok_or("Missing 'raw_text' parameter")?;
        let profile: JournalProfile = object_arg(&args, "journal_profile")?;
        let metadata: FormatMetadata = object_arg(&args, "metadata")?;

        let document = self
            .pipeline
            .format_academic(raw_text, &profile, &metadata)
            .await
            .map_err(|e| e.to_string())?;

        serde_json::to_value(&document).map_err(|e| e.to_string())
    }
}

/// Handler for rendering documents to `.docx`
#[derive(Debug)]
pub struct AssembleDocumentHandler {
    pub pipeline: Arc<ResearchPipeline>,
    pub output_dir: PathBuf,
}

#[async_trait::async_trait]
impl ToolHandler for AssembleDocumentHandler {
    async fn execute(&self, args: Value) -> Result<Value, String> {
        let document: FormattedDocument = match args.get("document") {
            Some(value) if value.is_object() => serde_json::from_value(value.clone())
                .map_err(|e| format!("Invalid 'document' parameter: {}", e))?,
            _ => return Err("Missing 'document' parameter".to_string()),
        };

        let output = match string_arg(&args, "output_path") {
            Some(path) => PathBuf::from(path),
            None => self.output_dir.join(default_file_name(&document)),
        };

        let path = self
            .pipeline
            .assemble_document(&document, &output)
            .await
            .map_err(|e| e.to_string())?;

        Ok(json!({ "path": path }))
    }
}
