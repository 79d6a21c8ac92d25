//! Converter-independent structure of a rendered document.

use crate::models::FormattedDocument;

pub const ABSTRACT_HEADING: &str = "Abstract";
pub const REFERENCES_HEADING: &str = "References";

/// One block of the rendered document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    /// Section-level heading
    Heading(String),
    Paragraph(String),
    /// Entry of the reference list
    ListItem(String),
}

/// Ordered blocks shared by every converter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    blocks: Vec<Block>,
}

impl Outline {
    /// Lay out title, author lines, abstract, sections and references
    ///
    /// Empty parts are left out; sections keep the document's order.
    pub fn from_document(document: &FormattedDocument) -> Self {
        let mut blocks = Vec::new();

        let title = single_line(&document.title);
        if !title.is_empty() {
            blocks.push(Block::Title(title));
        }

        for author in &document.authors {
            let line = single_line(&author.display_line());
            if !line.is_empty() {
                blocks.push(Block::Paragraph(line));
            }
        }

        let abstract_text = document.abstract_text.trim();
        if !abstract_text.is_empty() {
            blocks.push(Block::Heading(ABSTRACT_HEADING.to_string()));
            blocks.push(Block::Paragraph(abstract_text.to_string()));
        }

        for section in &document.sections {
            blocks.push(Block::Heading(single_line(section.heading())));
            let content = section.content.trim();
            if !content.is_empty() {
                blocks.push(Block::Paragraph(content.to_string()));
            }
        }

        if !document.references_raw.is_empty() {
            blocks.push(Block::Heading(REFERENCES_HEADING.to_string()));
            for reference in &document.references_raw {
                blocks.push(Block::ListItem(single_line(&reference.display_text())));
            }
        }

        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Section-level headings, in order
    pub fn headings(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Heading(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Render as pandoc markdown: `#` title, `##` headings, `-` list items
    ///
    /// Block text is escaped, so markup inside titles, headings or bodies
    /// never adds structure pandoc would parse: the only headings in the
    /// output are the outline's own. Paragraph chunks are split on blank
    /// lines and keep single line breaks as hard breaks, as `DocxWriter` does.
    pub fn to_markdown(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(self.blocks.len());
        let mut list: Vec<String> = Vec::new();

        for block in &self.blocks {
            if !matches!(block, Block::ListItem(_)) && !list.is_empty() {
                parts.push(list.join("\n"));
                list.clear();
            }
            match block {
                Block::Title(text) => parts.push(format!("# {}", escape_markdown(text))),
                Block::Heading(text) => parts.push(format!("## {}", escape_markdown(text))),
                Block::Paragraph(text) => parts.extend(
                    text.split("\n\n")
                        .map(markdown_paragraph)
                        .filter(|chunk| !chunk.is_empty()),
                ),
                Block::ListItem(text) => list.push(format!("- {}", escape_markdown(text))),
            }
        }
        if !list.is_empty() {
            parts.push(list.join("\n"));
        }

        let mut markdown = parts.join("\n\n");
        markdown.push('\n');
        markdown
    }
}

/// Backslash-escape every ASCII punctuation character
///
/// Pandoc accepts `\` before any ASCII punctuation as a literal, which
/// covers ATX and setext markers, list bullets, ordered list numbers, block
/// quotes, tables, inline emphasis, links and raw HTML alike.
fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_punctuation() {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One paragraph chunk with lines trimmed and joined by hard breaks
fn markdown_paragraph(chunk: &str) -> String {
    chunk
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(escape_markdown)
        .collect::<Vec<_>>()
        .join("\\\n")
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
