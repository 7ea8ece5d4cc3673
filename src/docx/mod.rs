//! DOCX pipeline: docx-rust renderings, then heading recovery.
mod render;

pub use render::{escape_html, render, Rendering};

use crate::cancel::CancellationToken;
use crate::config::DocxOptions;
use crate::detect::has_zip_signature;
use crate::error::{ParseError, Result};
use crate::reader::{DocumentExtractor, DocumentInput};
use crate::sections::detect_sections;
use crate::text::{count_words, strip_tags_once, DEFAULT_WORDS_PER_MINUTE};
use crate::types::{ConversionMessage, DocumentFormat, DocumentMetadata, ParsedDocument, Section};
use docx_rust::DocxFile;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// A heading found in the HTML rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlHeading {
    /// 1 for `<h1>` through 6 for `<h6>`
    pub level: usize,
    pub text: String,
}

pub struct DocxExtractor {
    options: DocxOptions,
    words_per_minute: usize,
    cancel: CancellationToken,
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new(DocxOptions::default())
    }
}

impl DocxExtractor {
    pub fn new(options: DocxOptions) -> Self {
        Self {
            options,
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_words_per_minute(mut self, words_per_minute: usize) -> Self {
        self.words_per_minute = words_per_minute;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn sections(
        &self,
        rendering: &Rendering,
        messages: &mut Vec<ConversionMessage>,
    ) -> Result<Vec<Section>> {
        let text = rendering.text.as_str();
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        if !self.options.detect_sections {
            return Ok(vec![Section::main_content(text)]);
        }

        let headings = html_headings(&rendering.html);
        let mut sections = if headings.is_empty() {
            tracing::debug!("No HTML headings, falling back to line heuristics");
            detect_sections(text, &self.cancel)?
        } else {
            locate_headings(text, &headings, messages, &self.cancel)?
        };
        if sections.is_empty() {
            sections.push(Section::main_content(text));
        }
        Ok(sections)
    }
}

impl DocumentExtractor for DocxExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Docx
    }

    fn extract(&self, input: DocumentInput<'_>) -> Result<ParsedDocument> {
        if !has_zip_signature(input.data) {
            return Err(ParseError::UnsupportedFormat(
                "not a ZIP container, so not a DOCX".to_string(),
            ));
        }
        self.cancel.check()?;

        // must outlive `file`
        let local = input.local_path("upload.docx")?;
        let file = DocxFile::from_file(local.path())
            .map_err(|e| ParseError::CorruptContainer(format!("unreadable DOCX: {e}")))?;
        let docx = file
            .parse()
            .map_err(|e| ParseError::internal("parse DOCX document", e))?;

        let rendering = if self.options.extract_content {
            render(&docx)
        } else {
            Rendering::default()
        };
        let mut messages = rendering.messages.clone();
        let sections = self.sections(&rendering, &mut messages)?;
        tracing::debug!(
            sections = sections.len(),
            messages = messages.len(),
            "Converted DOCX"
        );

        let mut document = ParsedDocument::assemble(
            DocumentFormat::Docx,
            DocumentMetadata::default(),
            sections,
            rendering.text,
            self.words_per_minute,
        );
        if self.options.include_html && self.options.extract_content {
            document.html_content = Some(rendering.html);
        }
        document.messages = messages;
        Ok(document)
    }

    fn is_valid(&self, path: &Path) -> bool {
        let Ok(data) = fs::read(path) else {
            return false;
        };
        has_zip_signature(&data) && crate::detect::detect_format(&data) == DocumentFormat::Docx
    }
}

/// `<h1>`..`<h6>` elements in document order, inner tags stripped and
/// entities decoded once, so the text matches the plain rendering.
/// Headings with no text are dropped.
pub fn html_headings(html: &str) -> Vec<HtmlHeading> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").expect("valid heading regex")
    });
    re.captures_iter(html)
        .filter_map(|caps| {
            let level = caps[1].parse().ok()?;
            let text = strip_tags_once(&caps[2]);
            (!text.is_empty()).then_some(HtmlHeading { level, text })
        })
        .collect()
}

/// Place each heading on the first line at or after the cursor whose
/// words equal its words. A heading that cannot be placed is skipped with
/// a warning. Each section runs to the next placed heading, the last one
/// to the end of the text.
pub fn locate_headings(
    text: &str,
    headings: &[HtmlHeading],
    messages: &mut Vec<ConversionMessage>,
    cancel: &CancellationToken,
) -> Result<Vec<Section>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for raw_line in text.split_inclusive('\n') {
        lines.push((offset, raw_line));
        offset += raw_line.len();
    }

    // (heading, start of heading text, end of heading line)
    let mut placed: Vec<(&HtmlHeading, usize, usize)> = Vec::new();
    let mut cursor = 0;
    for heading in headings {
        cancel.check()?;
        let found = lines[cursor..]
            .iter()
            .position(|(_, line)| line.split_whitespace().eq(heading.text.split_whitespace()));
        match found {
            Some(relative) => {
                let (line_start, line) = lines[cursor + relative];
                let leading = line.len() - line.trim_start().len();
                placed.push((heading, line_start + leading, line_start + line.len()));
                cursor += relative + 1;
            }
            None => {
                tracing::warn!(heading = %heading.text, "Heading not found in text");
                messages.push(ConversionMessage::warning(format!(
                    "Heading '{}' could not be located in the text",
                    heading.text
                )));
            }
        }
    }

    let mut sections = Vec::with_capacity(placed.len());
    for (index, (heading, start, body_start)) in placed.iter().enumerate() {
        let end = placed
            .get(index + 1)
            .map(|(_, next_start, _)| *next_start)
            .unwrap_or(text.len());
        let content = text[(*body_start).min(end)..end].trim().to_string();
        let order = index + 1;
        sections.push(Section {
            id: format!("section-{order}"),
            title: heading.text.clone(),
            order,
            level: heading.level - 1,
            start_offset: *start,
            end_offset: end,
            word_count: count_words(&content),
            content,
        });
    }
    Ok(sections)
}
