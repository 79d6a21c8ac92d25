//! Converter chain with fallback.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::{DocxWriter, Outline, PandocConverter};
use crate::config::DocumentConfig;
use crate::models::FormattedDocument;

/// Failure of a single converter
#[derive(Debug, Error)]
pub enum ConverterError {
    #[error("Converter not available: {0}")]
    Unavailable(String),

    #[error("Converter failed: {0}")]
    Failed(String),

    #[error("Converter timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Could not write document package: {0}")]
    Package(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the assembler
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Cannot prepare output path {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("All document converters failed: {}", .failures.join("; "))]
    AllConvertersFailed { failures: Vec<String> },
}

/// Renders an [`Outline`] to a file
#[async_trait]
pub trait DocumentConverter: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and error reports
    fn name(&self) -> &str;

    /// Write the rendered document to `output`
    async fn convert(&self, outline: &Outline, output: &Path) -> Result<(), ConverterError>;
}

/// Tries each converter in order until one succeeds
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    converters: Vec<Arc<dyn DocumentConverter>>,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::from_config(&DocumentConfig::default())
    }
}

impl DocumentAssembler {
    pub fn new(converters: Vec<Arc<dyn DocumentConverter>>) -> Self {
        Self { converters }
    }

    /// Pandoc first, then the built-in DOCX writer
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(vec![
            Arc::new(PandocConverter::from_config(config)),
            Arc::new(DocxWriter::new()),
        ])
    }

    pub fn converter_names(&self) -> Vec<&str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    /// Render `document` to `output_path` and return its absolute path
    ///
    /// Missing parent directories are created.
    pub async fn assemble(
        &self,
        document: &FormattedDocument,
        output_path: &Path,
    ) -> Result<PathBuf, AssemblyError> {
        let output = absolute(output_path).map_err(|source| AssemblyError::Output {
            path: output_path.to_path_buf(),
            source,
        })?;
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| AssemblyError::Output {
                    path: output.clone(),
                    source,
                })?;
        }

        let outline = Outline::from_document(document);
        let mut failures = Vec::new();

        for converter in &self.converters {
            match converter.convert(&outline, &output).await {
                Ok(()) => {
                    tracing::info!(converter = converter.name(), path = %output.display(), "Document generated");
                    return Ok(output);
                }
                Err(e) => {
                    tracing::warn!(converter = converter.name(), error = %e, "Converter failed, trying next");
                    failures.push(format!("{}: {}", converter.name(), e));
                }
            }
        }

        Err(AssemblyError::AllConvertersFailed { failures })
    }
}

fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// File name derived from the title, e.g. `quantum-error-correction.docx`
pub fn default_file_name(document: &FormattedDocument) -> String {
    let slug: String = document
        .title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug
        .split('-')
        .filter(|part| !part.is_empty())
        .take(8)
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        format!("document-{}.docx", chrono::Utc::now().format("%Y%m%d-%H%M%S"))
    } else {
        format!("{}.docx", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::docx_headings;
    use crate::document::outline::tests::sample_document;

    #[derive(Debug)]
    struct BrokenConverter(&'static str);

    #[async_trait]
    impl DocumentConverter for BrokenConverter {
        fn name(&self) -> &str {
            self.0
        }

        async fn convert(&self, _outline: &Outline, _output: &Path) -> Result<(), ConverterError> {
            Err(ConverterError::Failed(format!("{} exploded", self.0)))
        }
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("deeper").join("paper.docx");
        let assembler = DocumentAssembler::new(vec![
            Arc::new(BrokenConverter("primary")),
            Arc::new(DocxWriter::new()),
        ]);
        let document = sample_document();

        let path = assembler.assemble(&document, &output).await.unwrap();

        assert!(path.is_absolute());
        assert!(path.is_file());
        assert_eq!(
            docx_headings(&path),
            Outline::from_document(&document).headings()
        );
    }

    #[tokio::test]
    async fn test_missing_pandoc_falls_back_to_docx() {
        let dir = tempfile::tempdir().unwrap();
        let config = DocumentConfig {
            pandoc_path: dir.path().join("no-such-pandoc"),
            ..DocumentConfig::default()
        };
        let assembler = DocumentAssembler::from_config(&config);
        assert_eq!(assembler.converter_names(), vec!["pandoc", "docx"]);

        let path = assembler
            .assemble(&sample_document(), &dir.path().join("out.docx"))
            .await
            .unwrap();

        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_all_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let assembler = DocumentAssembler::new(vec![
            Arc::new(BrokenConverter("first")),
            Arc::new(BrokenConverter("second")),
        ]);

        let err = assembler
            .assemble(&sample_document(), &dir.path().join("out.docx"))
            .await
            .unwrap_err();

        match err {
            AssemblyError::AllConvertersFailed { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].starts_with("first:"));
                assert!(failures[1].starts_with("second:"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relative_path_is_made_absolute() {
        let path = absolute(Path::new("documents/paper.docx")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("documents/paper.docx"));
    }

    #[test]
    fn test_default_file_name() {
        let document = FormattedDocument {
            title: "Computação Quântica: uma revisão!".into(),
            ..Default::default()
        };
        assert_eq!(default_file_name(&document), "computação-quântica-uma-revisão.docx");
        assert!(default_file_name(&FormattedDocument::default()).starts_with("document-"));
    }
}
