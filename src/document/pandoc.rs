//! External `pandoc` converter.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{ConverterError, DocumentConverter, Outline};
use crate::config::DocumentConfig;

/// Renders markdown to `.docx` with the `pandoc` binary
#[derive(Debug, Clone)]
pub struct PandocConverter {
    program: PathBuf,
    reference_doc: Option<PathBuf>,
    timeout: Duration,
}

impl PandocConverter {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            reference_doc: None,
            timeout: DocumentConfig::default().timeout(),
        }
    }

    pub fn from_config(config: &DocumentConfig) -> Self {
        Self {
            program: config.pandoc_path.clone(),
            reference_doc: config.reference_doc.clone(),
            timeout: config.timeout(),
        }
    }

    /// Style template passed as `--reference-doc`
    pub fn with_reference_doc(mut self, reference_doc: impl Into<PathBuf>) -> Self {
        self.reference_doc = Some(reference_doc.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, markdown: &str, output: &Path) -> Result<(), ConverterError> {
        let mut command = Command::new(&self.program);
        command
            .args(["--from", "markdown", "--to", "docx", "-o"])
            .arg(output);
        if let Some(reference_doc) = &self.reference_doc {
            command.arg("--reference-doc").arg(reference_doc);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ConverterError::Unavailable(format!(
                "{} not found",
                self.program.display()
            )),
            _ => ConverterError::Io(e),
        })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(markdown.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let result = child.wait_with_output().await?;
        if result.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&result.stderr);
            Err(ConverterError::Failed(format!(
                "pandoc exited with {}: {}",
                result.status,
                stderr.trim()
            )))
        }
    }
}

#[async_trait]
impl DocumentConverter for PandocConverter {
    fn name(&self) -> &str {
        "pandoc"
    }

    async fn convert(&self, outline: &Outline, output: &Path) -> Result<(), ConverterError> {
        let markdown = outline.to_markdown();
        tracing::debug!(program = %self.program.display(), chars = markdown.len(), "Running pandoc");

        tokio::time::timeout(self.timeout, self.run(&markdown, output))
            .await
            .map_err(|_| ConverterError::Timeout(self.timeout))?
    }
}
