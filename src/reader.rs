use crate::error::{ParseError, ParseResult, Result};
use crate::scratch::ScratchFile;
use crate::types::{DocumentFormat, ParsedDocument};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Bytes of one upload, plus the file it came from when there is one.
#[derive(Debug, Clone, Copy)]
pub struct DocumentInput<'a> {
    pub data: &'a [u8],
    pub path: Option<&'a Path>,
}

impl<'a> DocumentInput<'a> {
    pub fn from_buffer(data: &'a [u8]) -> Self {
        Self { data, path: None }
    }

    /// A path the underlying library can open: the original file, or a
    /// scratch copy of the buffer that is removed when the handle drops.
    pub fn local_path(&self, file_name: &str) -> Result<LocalPath<'a>> {
        match self.path {
            Some(path) => Ok(LocalPath::Original(path)),
            None => ScratchFile::write(self.data, file_name).map(LocalPath::Scratch),
        }
    }
}

pub enum LocalPath<'a> {
    Original(&'a Path),
    Scratch(ScratchFile),
}

impl LocalPath<'_> {
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(path) => path,
            Self::Scratch(scratch) => scratch.path(),
        }
    }
}

/// Shared surface of the per-format extractors.
///
/// Implementors provide [`extract`](Self::extract); the public operations
/// wrap it so that empty input, I/O failures and panics inside third-party
/// parsers all come back as a failed [`ParseResult`].
pub trait DocumentExtractor {
    fn format(&self) -> DocumentFormat;

    /// Run the format pipeline over non-empty input.
    fn extract(&self, input: DocumentInput<'_>) -> Result<ParsedDocument>;

    /// Cheap signature and structure check.
    fn is_valid(&self, path: &Path) -> bool;

    fn parse(&self, path: &Path) -> ParseResult<ParsedDocument> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                return ParseResult::failed(&ParseError::internal(
                    format!("read {}", path.display()),
                    err,
                ))
            }
        };
        self.run(DocumentInput {
            data: &data,
            path: Some(path),
        })
    }

    fn parse_from_buffer(&self, data: &[u8]) -> ParseResult<ParsedDocument> {
        self.run(DocumentInput::from_buffer(data))
    }

    fn run(&self, input: DocumentInput<'_>) -> ParseResult<ParsedDocument> {
        let format = self.format();
        let result = guarded(format, || {
            if input.data.is_empty() {
                return Err(ParseError::EmptyInput);
            }
            self.extract(input)
        });
        if let Err(err) = &result {
            tracing::debug!(%format, kind = ?err.kind(), "Extraction failed: {err}");
        }
        result.into()
    }
}

/// Run `f`, turning a panic into an internal parse error.
pub fn guarded<T>(format: DocumentFormat, f: impl FnOnce() -> Result<T>) -> Result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(%format, "Parser panicked: {message}");
            Err(ParseError::internal(format!("parse {format}"), message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
