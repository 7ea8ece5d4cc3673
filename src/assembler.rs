use crate::cancel::CancellationToken;
use crate::config::IngestOptions;
use crate::detect::detect_format;
use crate::docx::DocxExtractor;
use crate::epub::EpubExtractor;
use crate::error::{ParseError, ParseResult, Result};
use crate::pdf::PdfExtractor;
use crate::reader::{guarded, DocumentExtractor, DocumentInput};
use crate::types::{DocumentFormat, ParsedDocument};
use std::fs;
use std::path::Path;

/// Entry point that sniffs the container format and hands the bytes to the
/// matching extractor.
pub struct DocumentAssembler {
    epub: EpubExtractor,
    pdf: PdfExtractor,
    docx: DocxExtractor,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(IngestOptions::default())
    }
}

impl DocumentAssembler {
    pub fn new(options: IngestOptions) -> Self {
        let wpm = options.words_per_minute;
        Self {
            epub: EpubExtractor::new(options.epub).with_words_per_minute(wpm),
            pdf: PdfExtractor::new(options.pdf).with_words_per_minute(wpm),
            docx: DocxExtractor::new(options.docx).with_words_per_minute(wpm),
        }
    }

    /// Share `cancel` with every extractor.
    pub fn with_cancellation(self, cancel: CancellationToken) -> Self {
        Self {
            epub: self.epub.with_cancellation(cancel.clone()),
            pdf: self.pdf.with_cancellation(cancel.clone()),
            docx: self.docx.with_cancellation(cancel),
        }
    }

    pub fn parse(&self, path: &Path) -> ParseResult<ParsedDocument> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                return ParseResult::failed(&ParseError::internal(
                    format!("read {}", path.display()),
                    err,
                ))
            }
        };
        self.dispatch(DocumentInput {
            data: &data,
            path: Some(path),
        })
        .into()
    }

    pub fn parse_from_buffer(&self, data: &[u8]) -> ParseResult<ParsedDocument> {
        self.dispatch(DocumentInput::from_buffer(data)).into()
    }

    /// True when the file is a supported format its extractor accepts.
    pub fn is_valid(&self, path: &Path) -> bool {
        let Ok(data) = fs::read(path) else {
            return false;
        };
        match detect_format(&data) {
            DocumentFormat::Unknown => false,
            format => self.extractor(format).is_some_and(|e| e.is_valid(path)),
        }
    }

    fn extractor(&self, format: DocumentFormat) -> Option<&dyn DocumentExtractor> {
        match format {
            DocumentFormat::Epub => Some(&self.epub),
            DocumentFormat::Pdf => Some(&self.pdf),
            DocumentFormat::Docx => Some(&self.docx),
            DocumentFormat::Unknown => None,
        }
    }

    fn dispatch(&self, input: DocumentInput<'_>) -> Result<ParsedDocument> {
        if input.data.is_empty() {
            return Err(ParseError::EmptyInput);
        }
        let format = detect_format(input.data);
        let Some(extractor) = self.extractor(format) else {
            return Err(ParseError::UnsupportedFormat(
                "expected an EPUB, PDF or DOCX file".to_string(),
            ));
        };
        tracing::debug!(%format, bytes = input.data.len(), "Detected format");
        guarded(format, || extractor.extract(input))
    }
}
