//! CLI UI utilities for terminal output.
//!
//! Colored status lines, article boxes, summaries and spinners. Results go to
//! stdout; spinners draw on stderr.

use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::time::Duration;

use crate::models::{ArticleRecord, StructuredSummary, SummaryFailure};

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Search,
    Document,
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Search => "🔍",
        Status::Document => "📄",
    }
}

/// Print a styled status message.
pub fn print_status(status: Status, msg: &str) {
    let icon = status_icon(status);
    match status {
        Status::Success => println!("{} {}", icon.green().bold(), msg),
        Status::Error => println!("{} {}", icon.red().bold(), msg),
        Status::Warning => println!("{} {}", icon.yellow().bold(), msg),
        Status::Info => println!("{} {}", icon.cyan().bold(), msg),
        Status::Search => println!("{} {}", icon.yellow(), msg),
        Status::Document => println!("{} {}", icon.blue(), msg),
    }
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Print search results header.
pub fn print_search_header(query: &str, count: usize, duration: Duration) {
    println!();
    println!(
        "{} Search results for: \"{}\"",
        status_icon(Status::Search).yellow().bold(),
        query.cyan().bold()
    );
    println!(
        "{} Found {} articles in {:.2}s",
        "─".repeat(30).dimmed(),
        format_number(count).green().bold(),
        duration.as_secs_f64()
    );
    println!();
}

/// Print an article with its abstract, wrapped to the terminal.
pub fn print_article(index: usize, article: &ArticleRecord) {
    let width = terminal_width().clamp(40, 120);
    let year = article
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "????".to_string());

    println!(
        "{} {}",
        format!("{:>2}.", index).dimmed(),
        article.title.blue().bold()
    );
    println!(
        "    {} · {} · {} citations",
        truncate_with_ellipsis(&article.authors_display(), width.saturating_sub(30)),
        year.yellow(),
        format_number(article.citation_count as usize)
    );
    println!("    {}", article.journal.green());
    println!("    {}", truncate_with_ellipsis(&article.r#abstract, width * 2).dimmed());
    if !article.url.is_empty() {
        println!("    {}", article.url.underline());
    }
    println!();
}

/// Print the four fields of a summary.
pub fn print_summary(summary: &StructuredSummary) {
    for (title, body) in [
        ("Problem", &summary.problem),
        ("Methodology", &summary.methodology),
        ("Results", &summary.results),
        ("Conclusion", &summary.conclusion),
    ] {
        print_section(title);
        if body.is_empty() {
            println!("{}", "(empty)".dimmed());
        } else {
            println!("{}", body);
        }
    }
    println!();
}

/// Print a summary failure with its diagnostics.
pub fn print_summary_failure(failure: &SummaryFailure) {
    print_status(Status::Error, &failure.error);
    if let Some(raw) = &failure.raw {
        print_section("Raw model reply");
        println!("{}", raw.dimmed());
    }
}

/// Format a number with commas.
pub fn format_number(n: usize) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if max_chars <= 3 {
        return "...".to_string();
    }
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept = crate::utils::truncate_chars(text, max_chars - 3);
    format!("{}...", kept.trim_end())
}

/// Print a loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(spinner_style("{spinner:.cyan} {msg}").tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "));
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// A spinner that draws nothing, for pipes and quiet mode.
    pub fn hidden() -> Self {
        Self {
            pb: indicatif::ProgressBar::hidden(),
        }
    }

    /// Spinner when `visible`, hidden otherwise.
    pub fn when(visible: bool, msg: &str) -> Self {
        if visible {
            Self::new(msg)
        } else {
            Self::hidden()
        }
    }

    /// Set the message.
    pub fn set_message(&self, msg: &str) {
        self.pb.set_message(msg.to_string());
    }

    /// Clear the spinner from the terminal.
    pub fn finish(&self) {
        self.pb.finish_and_clear();
    }
}

fn spinner_style(template: &str) -> indicatif::ProgressStyle {
    indicatif::ProgressStyle::with_template(template)
        .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
}
