//! Container classification from magic bytes.
use crate::types::DocumentFormat;
use std::io::{Cursor, Read};

/// `%PDF-`
pub const PDF_SIGNATURE: &[u8; 5] = b"%PDF-";
/// ZIP local-file header, shared by EPUB and DOCX
pub const ZIP_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

const EPUB_MIMETYPE: &str = "application/epub+zip";
const DOCX_MAIN_PART: &str = "word/document.xml";

pub fn has_pdf_signature(data: &[u8]) -> bool {
    data.starts_with(PDF_SIGNATURE)
}

pub fn has_zip_signature(data: &[u8]) -> bool {
    data.starts_with(ZIP_SIGNATURE)
}

/// Classify a buffer as EPUB, PDF, DOCX or unknown.
///
/// ZIP containers are opened to tell EPUB (a `mimetype` entry reading
/// `application/epub+zip`) from DOCX (a `word/document.xml` part). A ZIP
/// that cannot be opened is `Unknown`.
pub fn detect_format(data: &[u8]) -> DocumentFormat {
    if has_pdf_signature(data) {
        return DocumentFormat::Pdf;
    }
    if has_zip_signature(data) {
        return classify_zip(data);
    }
    DocumentFormat::Unknown
}

fn classify_zip(data: &[u8]) -> DocumentFormat {
    let Ok(mut archive) = zip::ZipArchive::new(Cursor::new(data)) else {
        tracing::debug!("ZIP signature present but central directory unreadable");
        return DocumentFormat::Unknown;
    };

    if let Ok(mut entry) = archive.by_name("mimetype") {
        let mut mimetype = String::new();
        if entry.read_to_string(&mut mimetype).is_ok() && mimetype.trim() == EPUB_MIMETYPE {
            return DocumentFormat::Epub;
        }
    }

    if archive.file_names().any(|name| name == DOCX_MAIN_PART) {
        return DocumentFormat::Docx;
    }

    DocumentFormat::Unknown
}
