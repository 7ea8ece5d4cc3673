//! EPUB pipeline: DRM gate, metadata, chapters from the TOC (or spine), cover.
mod container;
mod cover;
mod metadata;

pub use container::check_container;
pub use cover::{resolve_cover, CoverCandidate};
pub use metadata::{build_metadata, extract_isbn, normalize_subjects, Identified, PackageMetadata};

use crate::cancel::CancellationToken;
use crate::config::EpubOptions;
use crate::detect::has_zip_signature;
use crate::error::{ParseError, Result};
use crate::reader::{DocumentExtractor, DocumentInput};
use crate::text::{count_words, strip_html_tags, DEFAULT_WORDS_PER_MINUTE};
use crate::types::{DocumentFormat, ParsedDocument, Section};
use rbook::prelude::*;
use rbook::Epub;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

/// A document the chapter loop should read, from the TOC or the spine.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ChapterSource {
    /// Absolute href without fragment, as rbook resolves it
    href: String,
    /// TOC label. Spine items have none and take their first heading.
    label: Option<String>,
    order: Option<usize>,
    depth: usize,
}

/// One chapter's stripped text before offsets are assigned.
struct Chapter {
    title: String,
    text: String,
    order: Option<usize>,
    depth: usize,
}

pub struct EpubExtractor {
    options: EpubOptions,
    words_per_minute: usize,
    cancel: CancellationToken,
}

impl Default for EpubExtractor {
    fn default() -> Self {
        Self::new(EpubOptions::default())
    }
}

impl EpubExtractor {
    pub fn new(options: EpubOptions) -> Self {
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

    /// Read up to `max_chapters` distinct documents. Sources pointing into a
    /// document already read are skipped without counting against the cap.
    /// A document that cannot be read, or has no text, is skipped.
    fn read_chapters(
        &self,
        sources: Vec<ChapterSource>,
        mut read: impl FnMut(&str) -> Result<String>,
    ) -> Result<Vec<Chapter>> {
        let mut fetched = HashSet::new();
        let mut chapters = Vec::new();

        for source in sources {
            if fetched.contains(&source.href) {
                continue;
            }
            if fetched.len() >= self.options.max_chapters {
                tracing::debug!(max_chapters = self.options.max_chapters, "Chapter limit reached");
                break;
            }
            self.cancel.check()?;
            fetched.insert(source.href.clone());

            let html = match read(&source.href) {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!(href = %source.href, "Skipping chapter: {err}");
                    continue;
                }
            };
            let text = strip_html_tags(&html);
            if text.is_empty() {
                tracing::debug!(href = %source.href, "Skipping chapter without text");
                continue;
            }
            let title = source
                .label
                .filter(|label| !label.is_empty())
                .or_else(|| first_heading(&html))
                .unwrap_or_else(|| format!("Chapter {}", chapters.len() + 1));
            chapters.push(Chapter {
                title,
                text,
                order: source.order,
                depth: source.depth,
            });
        }
        Ok(chapters)
    }
}

/// Flattened table of contents, depth-first. Top-level entries have depth 0.
fn toc_sources(epub: &Epub) -> Vec<ChapterSource> {
    let Some(root) = epub.toc().contents() else {
        return Vec::new();
    };
    root.children()
        .flatten()
        .filter_map(|entry| {
            let href = entry.href()?;
            Some(ChapterSource {
                href: href.path().as_str().to_string(),
                label: Some(entry.label().split_whitespace().collect::<Vec<_>>().join(" ")),
                order: Some(entry.order()),
                depth: entry.depth().saturating_sub(1),
            })
        })
        .collect()
}

/// Spine items in reading order. Items naming no manifest entry are dropped.
fn spine_sources(epub: &Epub) -> Vec<ChapterSource> {
    epub.spine()
        .entries()
        .filter_map(|item| {
            let Some(entry) = item.manifest_entry() else {
                tracing::warn!(idref = item.idref(), "Spine item has no manifest entry");
                return None;
            };
            Some(ChapterSource {
                href: entry.href().path().as_str().to_string(),
                label: None,
                order: None,
                depth: 0,
            })
        })
        .collect()
}

impl DocumentExtractor for EpubExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Epub
    }

    fn extract(&self, input: DocumentInput<'_>) -> Result<ParsedDocument> {
        if !has_zip_signature(input.data) {
            return Err(ParseError::UnsupportedFormat(
                "not a ZIP container, so not an EPUB".to_string(),
            ));
        }
        self.cancel.check()?;

        if let Some(marker) = check_container(input.data)? {
            return Err(ParseError::DrmProtected(marker));
        }

        let epub = Epub::options()
            .strict(false)
            .read(Cursor::new(input.data.to_vec()))
            .map_err(|e| ParseError::CorruptContainer(format!("unreadable EPUB package: {e}")))?;

        let metadata = build_metadata(&PackageMetadata::from_epub(&epub));
        let read = |href: &str| {
            epub.read_resource_str(href)
                .map_err(|e| ParseError::internal(format!("read {href}"), e))
        };

        let chapters = if self.options.extract_content {
            let toc = self.read_chapters(toc_sources(&epub), read)?;
            if toc.is_empty() {
                tracing::debug!("Table of contents yielded no chapters, reading spine");
                self.read_chapters(spine_sources(&epub), read)?
            } else {
                toc
            }
        } else {
            Vec::new()
        };
        tracing::debug!(chapters = chapters.len(), "Extracted EPUB chapters");

        let (sections, raw_content) = chapter_sections(chapters);
        let mut document = ParsedDocument::assemble(
            DocumentFormat::Epub,
            metadata,
            sections,
            raw_content,
            self.words_per_minute,
        );

        if self.options.extract_cover {
            document.cover_image = resolve_cover(&CoverCandidate::from_manifest(&epub), |c| {
                epub.read_resource_bytes(c.href.as_str())
                    .map_err(|e| ParseError::internal(format!("read {}", c.href), e))
            });
        }

        Ok(document)
    }

    fn is_valid(&self, path: &Path) -> bool {
        fs::read(path)
            .map(|data| {
                has_zip_signature(&data)
                    && check_container(&data).is_ok()
                    && Epub::options().strict(false).read(Cursor::new(data)).is_ok()
            })
            .unwrap_or(false)
    }
}

/// Lay chapters end to end, separated by a blank line, and describe each as
/// a section of the joined text.
fn chapter_sections(chapters: Vec<Chapter>) -> (Vec<Section>, String) {
    let mut raw_content = String::new();
    let mut sections = Vec::with_capacity(chapters.len());
    let mut previous_order = 0;

    for chapter in chapters {
        if !raw_content.is_empty() {
            raw_content.push_str("\n\n");
        }
        let start_offset = raw_content.len();
        raw_content.push_str(&chapter.text);

        let order = match chapter.order {
            Some(order) if order > previous_order => order,
            _ => previous_order + 1,
        };
        previous_order = order;

        sections.push(Section {
            id: format!("chapter-{order}"),
            title: chapter.title,
            order,
            level: chapter.depth,
            start_offset,
            end_offset: raw_content.len(),
            word_count: count_words(&chapter.text),
            content: chapter.text,
        });
    }
    (sections, raw_content)
}

fn first_heading(html: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)<h[12][^>]*>(.*?)</h[12]\s*>").expect("valid heading regex")
    });
    re.captures_iter(html)
        .map(|caps| strip_html_tags(&caps[1]))
        .find(|title| !title.is_empty())
}
