//! Tool registry for MCP tools.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use super::handlers::{
    AssembleDocumentHandler, FormatAcademicHandler, SearchArticlesHandler, SummarizeArticleHandler,
};
use crate::pipeline::ResearchPipeline;

/// An MCP tool that can be called by the client
#[derive(Clone)]
pub struct Tool {
    /// Tool name (e.g., "search_articles")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    pub input_schema: serde_json::Value,

    /// Handler function to execute the tool
    pub handler: Arc<dyn ToolHandler>,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish()
    }
}

/// Handler for executing a tool
#[async_trait::async_trait]
pub trait ToolHandler: Send + Sync + std::fmt::Debug {
    /// Execute the tool with the given arguments
    async fn execute(&self, args: Value) -> Result<Value, String>;
}

/// Registry for all MCP tools
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Register the four pipeline tools
    ///
    /// `output_dir` is where `assemble_document` writes when the client gives
    /// no explicit path.
    pub fn from_pipeline(pipeline: Arc<ResearchPipeline>, output_dir: PathBuf) -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
        };

        registry.register(Tool {
            name: "search_articles".to_string(),
            description: "Search academic articles from a natural-language request. Keywords are extracted automatically; only articles with an abstract are returned.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to look for, in plain language"
                    }
                },
                "required": ["query"]
            }),
            handler: Arc::new(SearchArticlesHandler {
                pipeline: pipeline.clone(),
            }),
        });

        registry.register(Tool {
            name: "summarize_article".to_string(),
            description: "Summarize an article into problem, methodology, results and conclusion. Give either the article text or a URL to its PDF or landing page.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {
                        "type": "string",
                        "description": "Full or partial article text"
                    },
                    "url": {
                        "type": "string",
                        "description": "URL of the PDF or of a page linking to it"
                    },
                    "focus": {
                        "type": "string",
                        "description": "Optional topic the summary should pay attention to"
                    }
                }
            }),
            handler: Arc::new(SummarizeArticleHandler {
                pipeline: pipeline.clone(),
            }),
        });

        registry.register(Tool {
            name: "format_academic".to_string(),
            description: "Format raw article text for a target journal. Returns the structured document (title, authors, abstract, sections, references, warnings).".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "raw_text": {
                        "type": "string",
                        "description": "Text to format"
                    },
                    "journal_profile": {
                        "type": "object",
                        "description": "Journal rules: id, display_name, citation_style, language, abstract.max_chars, title_case, required_sections"
                    },
                    "metadata": {
                        "type": "object",
                        "description": "Optional hints: title_hint, authors_hint, keywords_hint"
                    }
                },
                "required": ["raw_text"]
            }),
            handler: Arc::new(FormatAcademicHandler {
                pipeline: pipeline.clone(),
            }),
        });

        registry.register(Tool {
            name: "assemble_document".to_string(),
            description: "Render a formatted document (as returned by format_academic) to a .docx file and return its path.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "document": {
                        "type": "object",
                        "description": "Formatted document JSON"
                    },
                    "output_path": {
                        "type": "string",
                        "description": "Where to write the .docx (defaults to the configured output directory)"
                    }
                },
                "required": ["document"]
            }),
            handler: Arc::new(AssembleDocumentHandler {
                pipeline,
                output_dir,
            }),
        });

        registry
    }

    /// Register a tool
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get all tools
    pub fn all(&self) -> Vec<&Tool> {
        self.tools.values().collect()
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    /// Execute a tool by name
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, String> {
        let tool = self
            .get(name)
            .ok_or_else(|| format!("Tool '{}' not found", name))?;

        tool.handler.execute(args).await
    }
}
