//! Multi-format document ingestion.
//!
//! EPUB, PDF and DOCX uploads become one [`ParsedDocument`]: normalised
//! metadata, ordered sections with byte offsets into the extracted text,
//! word counts, reading time and a content hash. Every public operation
//! returns a [`ParseResult`] and never panics across the boundary.
//!
//! ```no_run
//! use docingest::{DocumentAssembler, IngestOptions};
//!
//! let assembler = DocumentAssembler::new(IngestOptions::default());
//! let result = assembler.parse(std::path::Path::new("book.epub"));
//! if let Some(doc) = result.data {
//!     println!("{} ({} words)", doc.metadata.title, doc.total_word_count);
//! }
//! ```
pub mod assembler;
pub mod cancel;
pub mod config;
pub mod detect;
pub mod docx;
pub mod epub;
pub mod error;
pub mod pdf;
pub mod reader;
pub mod scratch;
pub mod sections;
pub mod text;
pub mod types;

pub use assembler::DocumentAssembler;
pub use cancel::CancellationToken;
pub use config::{ConfigError, DocxOptions, EpubOptions, IngestOptions, PdfOptions};
pub use detect::detect_format;
pub use docx::DocxExtractor;
pub use epub::EpubExtractor;
pub use error::{ErrorKind, ParseError, ParseFailure, ParseResult};
pub use pdf::PdfExtractor;
pub use reader::DocumentExtractor;
pub use types::{
    ConversionMessage, CoverImage, DocumentFormat, DocumentMetadata, MessageKind, ParsedDocument,
    PdfInfo, Section,
};
