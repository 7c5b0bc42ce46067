//! Markdown loading: directory scan and Markdown → plain text.

use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::PipelineError;

/// Metadata key holding the file a document (and its chunks) came from.
pub const SOURCE_KEY: &str = "source";

/// Raw content of one Markdown file plus provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(text: String, source: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert(SOURCE_KEY.into(), Value::String(source.to_string()));
        Self { text, metadata }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).and_then(Value::as_str)
    }
}

/// Loads every direct child of `dir` whose name ends in `.md`, in name order.
///
/// Other entries (non-Markdown files, sub-directories) are skipped.
///
/// # Errors
/// `PipelineError::Io` if the directory or a Markdown file cannot be read.
pub async fn load_markdown_dir(dir: &Path) -> Result<Vec<Document>, PipelineError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| PipelineError::io(dir, e))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| PipelineError::io(dir, e))?
    {
        let name = entry.file_name();
        if !name.to_string_lossy().ends_with(".md") {
            continue;
        }
        let path = entry.path();
        let is_file = tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if is_file {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-file entry");
        }
    }
    paths.sort();

    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        info!(path = %path.display(), "loading markdown");
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| PipelineError::io(&path, e))?;
        docs.push(Document::new(markdown_to_text(&raw), &path.display().to_string()));
    }
    Ok(docs)
}

/// Renders Markdown to plain text; block elements are separated by a blank
/// line, list items by a line break.
pub fn markdown_to_text(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => out.push_str(&t),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::Start(Tag::Item) => {
                line_break(&mut out);
                out.push_str("- ");
            }
            Event::End(TagEnd::Item | TagEnd::TableRow | TagEnd::TableHead) => line_break(&mut out),
            Event::End(TagEnd::TableCell) => out.push(' '),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading { .. }
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote { .. }
                | TagEnd::List { .. }
                | TagEnd::Table,
            )
            | Event::Rule => block_break(&mut out),
            _ => {}
        }
    }

    out.trim().to_string()
}

fn trim_trailing(out: &mut String) {
    let keep = out.trim_end().len();
    out.truncate(keep);
}

fn line_break(out: &mut String) {
    if out.is_empty() || out.ends_with('\n') {
        return;
    }
    trim_trailing(out);
    out.push('\n');
}

fn block_break(out: &mut String) {
    trim_trailing(out);
    if !out.is_empty() {
        out.push_str("\n\n");
    }
}
