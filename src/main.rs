use anyhow::{bail, Context, Result};
use clap::{ArgGroup, CommandFactory, Parser, Subcommand, ValueEnum};
use research_scribe::config::{find_config_file, get_config, load_config, Config};
use research_scribe::document::{default_file_name, Block, Outline};
use research_scribe::mcp::server::McpServer;
use research_scribe::models::{ArticleRecord, FormatMetadata, FormattedDocument, JournalProfile, SummaryResult};
use research_scribe::pipeline::ResearchPipeline;
use research_scribe::ui::{self, Spinner, Status};
use research_scribe::utils::{extract_text, truncate_chars};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Research Scribe - Search, summarize and format academic papers with a generative model
#[derive(Parser, Debug)]
#[command(name = "research-scribe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "hongkongkiwi")]
#[command(about = "Search, summarize and format academic papers with a generative model", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides every configured timeout)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long, global = true)]
    env: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    fn resolve(self) -> Self {
        match self {
            OutputFormat::Auto if ui::is_terminal() => OutputFormat::Table,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search for articles with a natural-language query
    #[command(alias = "s")]
    Search {
        /// Query in any language, e.g. "história da computação quântica"
        query: String,

        /// Maximum number of results
        #[arg(long, short)]
        max_results: Option<usize>,
    },

    /// Summarize an article into problem, methodology, results and conclusion
    #[command(group(ArgGroup::new("input").required(true).args(["url", "text", "file"])))]
    Summarize {
        /// Article URL (PDF or landing page)
        #[arg(long)]
        url: Option<String>,

        /// Article text
        #[arg(long)]
        text: Option<String>,

        /// Local text or PDF file ("-" reads stdin)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Aspect the summary should emphasize
        #[arg(long)]
        focus: Option<String>,
    },

    /// Format raw manuscript text for a journal
    Format {
        /// Raw manuscript text file ("-" reads stdin)
        input: PathBuf,

        /// Journal profile (TOML or JSON)
        #[arg(long, short)]
        profile: Option<PathBuf>,

        /// Suggested title
        #[arg(long)]
        title_hint: Option<String>,

        /// Suggested author (repeatable)
        #[arg(long = "author")]
        authors: Vec<String>,

        /// Suggested keyword (repeatable)
        #[arg(long = "keyword")]
        keywords: Vec<String>,

        /// Also write the formatted document JSON to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Render a formatted document JSON file to .docx
    Assemble {
        /// Formatted document JSON, as produced by `format`
        document: PathBuf,

        /// Output path (default: <documents.output_dir>/<title>.docx)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Run the MCP server (for Claude Desktop and other MCP clients)
    Serve {
        /// Run in HTTP mode instead of stdio
        #[arg(long)]
        http: bool,

        /// Port for HTTP mode
        #[arg(long, short, default_value_t = 3000)]
        port: u16,

        /// Host to bind to for HTTP mode
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("Research Scribe - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  GOOGLE_API_KEY              API key for the Gemini model (GEMINI_API_KEY also accepted)");
    println!("  SEMANTIC_SCHOLAR_API_KEY    API key for Semantic Scholar (higher rate limits)");
    println!();
    println!("Configuration Overrides (any config key, '__' separated):");
    println!("  RESEARCH_SCRIBE__MODEL__NAME               Model identifier (default: gemini-2.0-flash)");
    println!("  RESEARCH_SCRIBE__SEARCH__RESULT_LIMIT      Maximum search results (default: 10)");
    println!("  RESEARCH_SCRIBE__DOWNLOADS__TIMEOUT_SECS   PDF fetch timeout (default: 15)");
    println!("  RESEARCH_SCRIBE__DOCUMENTS__PANDOC_PATH    pandoc executable (default: pandoc)");
    println!("  RESEARCH_SCRIBE__DOCUMENTS__OUTPUT_DIR     Default .docx directory (default: ./documents)");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                    Rust logging level (e.g., debug, info, warn, error)");
    println!();
    println!("Example:");
    println!("  export GOOGLE_API_KEY=\"your-key-here\"");
    println!("  research-scribe search \"história da computação quântica\"");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    // Initialize tracing based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = if cli.quiet { "error" } else { log_level };

    // Logs go to stderr: stdout carries results and the MCP stdio transport
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("research_scribe={}", env_filter)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "research-scribe", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(secs) = cli.timeout {
        config.model.timeout_secs = secs;
        config.search.timeout_secs = secs;
        config.downloads.timeout_secs = secs;
        config.documents.timeout_secs = secs;
    }
    if let Commands::Search {
        max_results: Some(limit),
        ..
    } = &command
    {
        config.search.result_limit = *limit;
    }

    let pipeline =
        ResearchPipeline::from_config(&config).context("Failed to set up the research pipeline")?;
    let format = cli.output.resolve();
    let show_spinner = !cli.quiet && std::io::stderr().is_terminal();

    match command {
        Commands::Search { query, .. } => {
            let spinner = Spinner::when(show_spinner, "Searching articles...");
            let started = Instant::now();
            let result = pipeline.search(&query).await;
            spinner.finish();

            let records = match result {
                Ok(records) => records,
                Err(e) if e.is_service_unavailable() => {
                    bail!("Failed to reach the article database, try again later ({})", e)
                }
                Err(e) => return Err(e).context("Search failed"),
            };

            if format == OutputFormat::Table && !cli.quiet {
                ui::print_search_header(&query, records.len(), started.elapsed());
            }
            output_articles(&records, format)?;
        }

        Commands::Summarize {
            url,
            text,
            file,
            focus,
        } => {
            let spinner = Spinner::when(show_spinner, "Summarizing...");
            let result = match (url, text, file) {
                (Some(url), _, _) => {
                    spinner.set_message("Fetching and summarizing the article...");
                    pipeline.summarize_with_focus(&url, true, focus.as_deref()).await
                }
                (None, Some(text), _) => {
                    pipeline.summarize_with_focus(&text, false, focus.as_deref()).await
                }
                (None, None, Some(path)) => {
                    let text = read_article_file(&path).await?;
                    pipeline.summarize_with_focus(&text, false, focus.as_deref()).await
                }
                (None, None, None) => bail!("Provide one of --url, --text or --file"),
            };
            spinner.finish();

            output_summary(&result, format)?;
            if let Some(failure) = result.failure_info() {
                bail!("Summarization failed: {}", failure.error);
            }
        }

        Commands::Format {
            input,
            profile,
            title_hint,
            authors,
            keywords,
            save,
        } => {
            let raw_text = read_text_input(&input)?;
            let profile = match profile {
                Some(path) => JournalProfile::from_file(&path)
                    .with_context(|| format!("Failed to load journal profile {}", path.display()))?,
                None => JournalProfile::default(),
            };
            let metadata = FormatMetadata {
                title_hint,
                authors_hint: authors,
                keywords_hint: keywords,
            };

            let spinner = Spinner::when(
                show_spinner,
                &format!("Formatting for {}...", profile.journal_name()),
            );
            let result = pipeline.format_academic(&raw_text, &profile, &metadata).await;
            spinner.finish();
            let document = result.context("Formatting failed")?;

            if let Some(path) = save {
                let json = serde_json::to_string_pretty(&document)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                if !cli.quiet {
                    eprintln!("Saved formatted document to {}", path.display());
                }
            }
            output_document(&document, format)?;
        }

        Commands::Assemble { document, out } => {
            let json = std::fs::read_to_string(&document)
                .with_context(|| format!("Failed to read {}", document.display()))?;
            let formatted: FormattedDocument = serde_json::from_str(&json)
                .with_context(|| format!("{} is not a formatted document", document.display()))?;
            let output = out.unwrap_or_else(|| {
                config.documents.output_dir.join(default_file_name(&formatted))
            });

            let spinner = Spinner::when(show_spinner, "Rendering document...");
            let result = pipeline.assemble_document(&formatted, &output).await;
            spinner.finish();
            let path = result.context("Failed to render the document")?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "path": path }));
                }
                _ if cli.quiet => println!("{}", path.display()),
                _ => ui::print_status(Status::Document, &format!("Wrote {}", path.display())),
            }
        }

        Commands::Serve { http, port, host } => {
            let server = McpServer::new(Arc::new(pipeline), config.documents.output_dir.clone())?;

            if http {
                let addr = format!("{}:{}", host, port);
                tracing::info!("Running MCP server in HTTP mode on {}", addr);
                let (bound_addr, handle) = server.run_http(&addr).await?;
                tracing::info!("MCP server listening on {}", bound_addr);

                // Wait for the server to finish
                handle
                    .await
                    .map_err(|e| anyhow::anyhow!("Server task failed: {}", e))?;
            } else {
                tracing::info!("Running MCP server in stdio mode");
                server.run().await?;
            }
        }

        Commands::Completions { .. } => {}
    }

    Ok(())
}

/// Load configuration from `--config`, a default location, or the environment
fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return load_config(path)
            .with_context(|| format!("Failed to load config file {}", path.display()));
    }
    match find_config_file() {
        Some(path) => {
            tracing::info!("Using config file: {}", path.display());
            load_config(&path).with_context(|| format!("Failed to load config file {}", path.display()))
        }
        None => Ok(get_config()),
    }
}

fn read_text_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        return std::io::read_to_string(std::io::stdin()).context("Failed to read stdin");
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Text of a local article, extracting PDFs page by page
async fn read_article_file(path: &Path) -> Result<String> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !is_pdf {
        return read_text_input(path);
    }

    let owned = path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_text(&owned))
        .await
        .context("PDF extraction task failed")?
        .with_context(|| format!("Failed to extract text from {}", path.display()))
}

fn output_articles(records: &[ArticleRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        OutputFormat::Plain => {
            for record in records {
                let year = record.year.map(|y| y.to_string()).unwrap_or_default();
                println!("{} - {} ({})", record.title, record.authors_display(), year);
                println!("  Journal: {}", record.journal);
                println!("  Citations: {}", record.citation_count);
                println!("  URL: {}", record.url);
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["#", "Title", "Authors", "Year", "Citations", "Journal"]);

            for (index, record) in records.iter().enumerate() {
                let year = record.year.map(|y| y.to_string()).unwrap_or_default();
                table.add_row(vec![
                    Cell::new(index + 1),
                    Cell::new(ui::truncate_with_ellipsis(&record.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(ui::truncate_with_ellipsis(&record.authors_display(), 30)),
                    Cell::new(year),
                    Cell::new(ui::format_number(record.citation_count as usize)),
                    Cell::new(ui::truncate_with_ellipsis(&record.journal, 25)),
                ]);
            }
            println!("{table}");

            if let Some(first) = records.first() {
                println!();
                ui::print_article(1, first);
            }
        }
        OutputFormat::Auto => unreachable!(),
    }
    Ok(())
}

fn output_summary(result: &SummaryResult, format: OutputFormat) -> Result<()> {
    match (format, result) {
        (OutputFormat::Json, _) => println!("{}", serde_json::to_string_pretty(result)?),
        (_, SummaryResult::Summary(summary)) if format == OutputFormat::Plain => {
            println!("Problem: {}", summary.problem);
            println!("Methodology: {}", summary.methodology);
            println!("Results: {}", summary.results);
            println!("Conclusion: {}", summary.conclusion);
        }
        (_, SummaryResult::Summary(summary)) => ui::print_summary(summary),
        (_, SummaryResult::Failed(failure)) => ui::print_summary_failure(failure),
    }
    Ok(())
}

fn output_document(document: &FormattedDocument, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(document)?),
        _ => {
            for block in Outline::from_document(document).blocks() {
                match block {
                    Block::Title(text) => println!("{}", text),
                    Block::Heading(text) => ui::print_section(text),
                    Block::Paragraph(text) => println!("{}\n", text),
                    Block::ListItem(text) => println!("  - {}", text),
                }
            }
            for warning in &document.warnings {
                ui::print_status(Status::Warning, truncate_chars(warning, 200));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_version() {
        let version = env!("CARGO_PKG_VERSION");
        assert!(!version.is_empty());
        let parts: Vec<&str> = version.split('.').collect();
        assert!(parts.len() >= 2);
        assert!(parts[0].parse::<u32>().is_ok());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_search_command() {
        let cli = Cli::parse_from(["research-scribe", "search", "história da computação quântica"]);
        match &cli.command {
            Some(Commands::Search { query, max_results }) => {
                assert_eq!(query, "história da computação quântica");
                assert_eq!(*max_results, None);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_summarize_requires_one_input() {
        assert!(Cli::try_parse_from(["research-scribe", "summarize"]).is_err());
        assert!(Cli::try_parse_from([
            "research-scribe",
            "summarize",
            "--url",
            "https://arxiv.org/abs/1",
            "--text",
            "body"
        ])
        .is_err());

        let cli = Cli::parse_from([
            "research-scribe",
            "summarize",
            "--url",
            "https://arxiv.org/abs/1",
            "--focus",
            "methodology",
        ]);
        match &cli.command {
            Some(Commands::Summarize { url, focus, .. }) => {
                assert_eq!(url.as_deref(), Some("https://arxiv.org/abs/1"));
                assert_eq!(focus.as_deref(), Some("methodology"));
            }
            _ => panic!("Expected Summarize command"),
        }
    }

    #[test]
    fn test_cli_format_collects_hints() {
        let cli = Cli::parse_from([
            "research-scribe",
            "format",
            "draft.txt",
            "--profile",
            "abnt.toml",
            "--author",
            "Ada",
            "--author",
            "Grace",
            "-o",
            "json",
        ]);
        assert_eq!(cli.output, OutputFormat::Json);
        match &cli.command {
            Some(Commands::Format {
                input,
                profile,
                authors,
                ..
            }) => {
                assert_eq!(input, &PathBuf::from("draft.txt"));
                assert_eq!(profile.as_deref(), Some(Path::new("abnt.toml")));
                assert_eq!(authors, &vec!["Ada".to_string(), "Grace".to_string()]);
            }
            _ => panic!("Expected Format command"),
        }
    }

    #[test]
    fn test_cli_serve_command() {
        let cli = Cli::parse_from(["research-scribe", "serve"]);
        match &cli.command {
            Some(Commands::Serve { http, port, host }) => {
                assert!(!*http);
                assert_eq!(*port, 3000);
                assert_eq!(host, "127.0.0.1");
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["research-scribe", "search", "graphs", "-vv", "--timeout", "5"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_explicit_output_format_is_kept() {
        assert_eq!(OutputFormat::Json.resolve(), OutputFormat::Json);
        assert_eq!(OutputFormat::Plain.resolve(), OutputFormat::Plain);
    }
}
