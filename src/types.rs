//! Output shape shared by every format.
use serde::Serialize;

/// Container formats recognised by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Epub,
    Pdf,
    Docx,
    Unknown,
}

impl DocumentFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Epub => "epub",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised metadata. An empty string means "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub language: String,
    pub description: String,
    pub publisher: String,
    pub publication_date: String,
    pub isbn: String,
    pub rights: String,
    pub identifier: String,
    pub subjects: Vec<String>,
}

/// A chapter or detected section.
///
/// Offsets are byte offsets into [`ParsedDocument::raw_content`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    pub order: usize,
    /// Heading depth, or heuristic confidence for detected sections (0 = strongest)
    pub level: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub word_count: usize,
    pub content: String,
}

impl Section {
    /// The fallback section covering a whole document without detectable structure.
    pub fn main_content(text: &str) -> Self {
        Self {
            id: "section-1".to_string(),
            title: "Main Content".to_string(),
            order: 1,
            level: 0,
            start_offset: 0,
            end_offset: text.len(),
            word_count: crate::text::count_words(text),
            content: text.trim().to_string(),
        }
    }
}

/// Cover image pulled from an EPUB manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    #[serde(skip)]
    pub data: Vec<u8>,
    pub mime_type: String,
    pub filename: String,
    pub size: usize,
}

impl CoverImage {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        let size = data.len();
        Self {
            data,
            mime_type: mime_type.into(),
            filename: filename.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Warning,
    Error,
}

/// Non-fatal note produced while converting a DOCX.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionMessage {
    pub kind: MessageKind,
    pub message: String,
}

impl ConversionMessage {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            message: message.into(),
        }
    }
}

/// PDF document-information extras that have no slot in [`DocumentMetadata`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfInfo {
    pub producer: String,
    pub creator_tool: String,
    pub creation_date: String,
    pub modification_date: String,
}

/// Uniform result of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub format: DocumentFormat,
    pub metadata: DocumentMetadata,
    pub sections: Vec<Section>,
    pub total_word_count: usize,
    pub raw_content: String,
    pub estimated_reading_time_minutes: usize,
    /// SHA-256 hex digest of `raw_content`
    pub content_hash: String,

    // EPUB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<CoverImage>,
    pub has_drm: bool,

    // PDF
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_info: Option<PdfInfo>,

    // DOCX
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<ConversionMessage>,
}

impl ParsedDocument {
    /// Build a document with the derived fields (word count, reading time,
    /// hash) computed from `raw_content`. Format-specific extras start empty.
    pub fn assemble(
        format: DocumentFormat,
        metadata: DocumentMetadata,
        sections: Vec<Section>,
        raw_content: String,
        words_per_minute: usize,
    ) -> Self {
        let total_word_count = crate::text::count_words(&raw_content);
        Self {
            format,
            metadata,
            sections,
            total_word_count,
            estimated_reading_time_minutes: crate::text::calculate_reading_time(
                total_word_count,
                words_per_minute,
            ),
            content_hash: crate::text::generate_content_hash(&raw_content),
            raw_content,
            cover_image: None,
            has_drm: false,
            page_count: None,
            pdf_info: None,
            html_content: None,
            messages: Vec::new(),
        }
    }
}
