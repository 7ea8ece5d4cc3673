use crate::text::DEFAULT_WORDS_PER_MINUTE;
use serde::Deserialize;
use std::env;
use thiserror::Error;

/// Errors encountered while loading options from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Options for EPUB extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EpubOptions {
    pub extract_cover: bool,
    pub extract_content: bool,
    /// Upper bound on distinct chapter documents read
    pub max_chapters: usize,
}

impl Default for EpubOptions {
    fn default() -> Self {
        Self {
            extract_cover: true,
            extract_content: true,
            max_chapters: 500,
        }
    }
}

/// Options for PDF extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PdfOptions {
    pub extract_content: bool,
    /// Upper bound on pages whose text is extracted
    pub max_pages: usize,
    pub detect_sections: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            extract_content: true,
            max_pages: 5000,
            detect_sections: true,
        }
    }
}

/// Options for DOCX extraction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DocxOptions {
    pub extract_content: bool,
    pub detect_sections: bool,
    /// Return the HTML rendering alongside the plain text
    pub include_html: bool,
}

impl Default for DocxOptions {
    fn default() -> Self {
        Self {
            extract_content: true,
            detect_sections: true,
            include_html: true,
        }
    }
}

/// All per-format options plus settings shared by every format.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestOptions {
    pub epub: EpubOptions,
    pub pdf: PdfOptions,
    pub docx: DocxOptions,
    pub words_per_minute: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            epub: EpubOptions::default(),
            pdf: PdfOptions::default(),
            docx: DocxOptions::default(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl IngestOptions {
    /// Defaults with overrides from `DOCINGEST_MAX_CHAPTERS`,
    /// `DOCINGEST_MAX_PAGES` and `DOCINGEST_WPM`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(value) = parse_env("DOCINGEST_MAX_CHAPTERS")? {
            self.epub.max_chapters = value;
        }
        if let Some(value) = parse_env("DOCINGEST_MAX_PAGES")? {
            self.pdf.max_pages = value;
        }
        if let Some(value) = parse_env("DOCINGEST_WPM")? {
            self.words_per_minute = value;
        }
        tracing::debug!(
            max_chapters = self.epub.max_chapters,
            max_pages = self.pdf.max_pages,
            words_per_minute = self.words_per_minute,
            "Loaded ingest options"
        );
        Ok(self)
    }
}

fn parse_env(key: &str) -> Result<Option<usize>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
