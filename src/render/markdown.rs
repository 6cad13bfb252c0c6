//! Markdown rendering for extracted sections.

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{ContentBlock, ProseBlock, SectionDocument, TableBlock};

use super::normalize::normalize;
use super::RenderOptions;

/// Convert a section to Markdown.
pub fn to_markdown(doc: &SectionDocument, options: &RenderOptions) -> Result<String> {
    let renderer = MarkdownRenderer::new(options.clone())?;
    Ok(renderer.render(doc))
}

/// Markdown renderer.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: RenderOptions,
    page_number: Regex,
    numbering: Regex,
}

impl MarkdownRenderer {
    /// Create a new Markdown renderer.
    pub fn new(options: RenderOptions) -> Result<Self> {
        Ok(Self {
            options,
            page_number: compile(r"^\s*[-–—]?\s*\d+\s*[-–—]?\s*$")?,
            numbering: compile(r"^\s*(?:\d+(?:\.\d+)*\.?|[A-Z](?:\.\d+)+\.?)\s+")?,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render one section.
    pub fn render(&self, doc: &SectionDocument) -> String {
        let mut output = String::new();
        self.render_section(&mut output, doc);
        finish(output)
    }

    /// Render a parent section followed by its merged children, each under
    /// its own heading.
    pub fn render_group(&self, docs: &[SectionDocument]) -> String {
        let mut output = String::new();
        for doc in docs {
            self.render_section(&mut output, doc);
        }
        finish(output)
    }

    fn render_section(&self, output: &mut String, doc: &SectionDocument) {
        let level = self.options.heading_level(doc.spec.depth);
        output.push_str(&"#".repeat(level));
        output.push(' ');
        output.push_str(&doc.spec.title);
        output.push_str("\n\n");

        let mut title_pending = self.options.drop_duplicate_title;
        for block in &doc.blocks {
            match block {
                ContentBlock::Prose(p) => self.render_prose(output, p, &doc.spec.title, &mut title_pending),
                ContentBlock::Table(t) => {
                    let table = normalize(t);
                    if table.is_empty() {
                        log::debug!("Omitting empty table on page {}", t.page_index + 1);
                        continue;
                    }
                    output.push_str(&table_to_markdown(&table));
                    output.push('\n');
                }
            }
        }
    }

    fn render_prose(&self, output: &mut String, block: &ProseBlock, title: &str, title_pending: &mut bool) {
        let mut lines = Vec::with_capacity(block.lines.len());
        for line in &block.lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if self.options.strip_page_numbers && self.page_number.is_match(trimmed) {
                continue;
            }
            if *title_pending {
                *title_pending = false;
                if self.repeats_title(trimmed, title) {
                    continue;
                }
            }
            if self.options.escape_special_chars {
                lines.push(escape_markdown(trimmed));
            } else {
                lines.push(trimmed.to_string());
            }
        }

        if lines.is_empty() {
            return;
        }
        output.push_str(&lines.join("\n"));
        output.push_str("\n\n");
    }

    /// Whether a line repeats the title, with or without its numbering.
    fn repeats_title(&self, line: &str, title: &str) -> bool {
        let line = collapse_whitespace(line);
        let title = collapse_whitespace(title);
        if title.is_empty() {
            return false;
        }
        if line == title {
            return true;
        }
        let bare = self.numbering.replace(&title, "");
        !bare.is_empty() && line == bare
    }
}

/// Render a table as a pipe table; the first row is the header.
///
/// Returns an empty string for a table with no columns.
pub fn table_to_markdown(table: &TableBlock) -> String {
    let columns = table.column_count();
    if columns == 0 || table.row_count() == 0 {
        return String::new();
    }

    let mut output = String::new();
    for (i, row) in table.rows.iter().enumerate() {
        output.push('|');
        for c in 0..columns {
            let cell = row.get(c).map(String::as_str).unwrap_or("");
            output.push(' ');
            output.push_str(&escape_cell(cell));
            output.push_str(" |");
        }
        output.push('\n');

        if i == 0 {
            output.push('|');
            for _ in 0..columns {
                output.push_str(" --- |");
            }
            output.push('\n');
        }
    }
    output
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Render(e.to_string()))
}

/// Exactly one trailing newline.
fn finish(output: String) -> String {
    let mut out = output.trim_end().to_string();
    out.push('\n');
    out
}

fn escape_cell(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ").trim().replace('|', "\\|")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Escape special Markdown characters.
/// Only characters that could be misread as inline syntax are escaped.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
