//! PDF pipeline over lopdf.
mod info;

pub use info::{decode_pdf_string, parse_pdf_date, parse_xmp, InfoDictionary, XmpProperties};

use crate::cancel::CancellationToken;
use crate::config::PdfOptions;
use crate::detect::has_pdf_signature;
use crate::error::{ParseError, Result};
use crate::reader::{DocumentExtractor, DocumentInput};
use crate::sections::detect_sections;
use crate::text::DEFAULT_WORDS_PER_MINUTE;
use crate::types::{DocumentFormat, ParsedDocument, Section};
use lopdf::Document;
use std::fs;
use std::io::Read;
use std::path::Path;

pub struct PdfExtractor {
    options: PdfOptions,
    words_per_minute: usize,
    cancel: CancellationToken,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new(PdfOptions::default())
    }
}

impl PdfExtractor {
    pub fn new(options: PdfOptions) -> Self {
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

    /// Text of the first `max_pages` pages, joined by a blank line. A page
    /// whose text cannot be decoded is skipped.
    fn page_text(
        &self,
        page_numbers: &[u32],
        mut extract: impl FnMut(u32) -> lopdf::Result<String>,
    ) -> Result<String> {
        let mut pages = Vec::new();
        for &number in page_numbers.iter().take(self.options.max_pages) {
            self.cancel.check()?;
            match extract(number) {
                Ok(text) => {
                    let text = text.trim();
                    if !text.is_empty() {
                        pages.push(text.to_string());
                    }
                }
                Err(err) => tracing::warn!(page = number, "Skipping page: {err}"),
            }
        }
        if page_numbers.len() > self.options.max_pages {
            tracing::debug!(
                pages = page_numbers.len(),
                max_pages = self.options.max_pages,
                "Page limit reached"
            );
        }
        Ok(pages.join("\n\n"))
    }
}

impl DocumentExtractor for PdfExtractor {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    fn extract(&self, input: DocumentInput<'_>) -> Result<ParsedDocument> {
        if !has_pdf_signature(input.data) {
            return Err(ParseError::UnsupportedFormat(
                "missing %PDF- signature".to_string(),
            ));
        }
        self.cancel.check()?;

        let doc = Document::load_mem(input.data)
            .map_err(|e| ParseError::CorruptContainer(format!("unreadable PDF: {e}")))?;

        let info = InfoDictionary::from_document(&doc);
        let xmp = info::xmp_packet(&doc)
            .map(|packet| parse_xmp(&packet))
            .unwrap_or_default();
        let metadata = info::build_metadata(&info, &xmp);

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        let page_count = page_numbers.len();
        tracing::debug!(page_count, "Opened PDF");

        let (raw_content, sections) = if self.options.extract_content {
            let text = self.page_text(&page_numbers, |number| doc.extract_text(&[number]))?;
            if page_count > 0 && text.trim().is_empty() {
                return Err(ParseError::Encrypted);
            }
            let sections = if self.options.detect_sections {
                detect_sections(&text, &self.cancel)?
            } else if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![Section::main_content(&text)]
            };
            (text, sections)
        } else {
            (String::new(), Vec::new())
        };

        let mut document = ParsedDocument::assemble(
            DocumentFormat::Pdf,
            metadata,
            sections,
            raw_content,
            self.words_per_minute,
        );
        document.page_count = Some(page_count);
        document.pdf_info = Some(info::pdf_info(&info));
        Ok(document)
    }

    fn is_valid(&self, path: &Path) -> bool {
        let mut header = [0u8; 5];
        let signature_ok = fs::File::open(path)
            .and_then(|mut file| file.read_exact(&mut header))
            .map(|_| has_pdf_signature(&header))
            .unwrap_or(false);
        signature_ok && Document::load(path).is_ok()
    }
}
