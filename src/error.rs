use serde::Serialize;
use std::io;

/// Result type alias used inside the extraction pipelines.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can end an extraction call.
///
/// Item-level problems (one chapter, one page) never surface here; they are
/// logged and the item is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The byte signature matches no supported container
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The container is structurally invalid (broken ZIP, unreadable PDF, missing OPF)
    #[error("Corrupt or invalid file: {0}")]
    CorruptContainer(String),

    /// EPUB carries DRM; nothing was extracted
    #[error("This file is DRM-protected: {0}")]
    DrmProtected(String),

    /// PDF reports pages but yields no text
    #[error("This PDF appears to be encrypted or contains no extractable text")]
    Encrypted,

    /// Zero-length input
    #[error("Input is empty")]
    EmptyInput,

    /// An underlying library failed; `context` names the step
    #[error("Failed to {context}: {message}")]
    Internal { context: String, message: String },

    /// The caller's cancellation token fired
    #[error("Extraction was cancelled")]
    Cancelled,
}

impl ParseError {
    /// Wrap an underlying library error with the step it happened in.
    pub fn internal(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Internal {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn corrupt(err: impl std::fmt::Display) -> Self {
        Self::CorruptContainer(err.to_string())
    }

    /// Category of this error, stable across message wording changes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::CorruptContainer(_) => ErrorKind::CorruptContainer,
            Self::DrmProtected(_) => ErrorKind::DrmProtected,
            Self::Encrypted => ErrorKind::Encrypted,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::Internal { .. } => ErrorKind::InternalParseError,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<zip::result::ZipError> for ParseError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::CorruptContainer(format!("invalid ZIP archive: {err}"))
    }
}

impl From<io::Error> for ParseError {
    fn from(err: io::Error) -> Self {
        Self::internal("read input", err)
    }
}

/// Error category handed to callers so they can choose a remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnsupportedFormat,
    CorruptContainer,
    DrmProtected,
    Encrypted,
    EmptyInput,
    InternalParseError,
    Cancelled,
}

/// Envelope returned by every public operation.
///
/// `data` is present exactly when `success` is true; `error` and
/// `error_kind` are present exactly when it is false.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl<T> ParseResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failed(err: &ParseError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    /// Convert back into a `Result`, for callers that want `?`.
    pub fn into_result(self) -> std::result::Result<T, ParseFailure> {
        if let (true, Some(data)) = (self.success, self.data) {
            return Ok(data);
        }
        Err(ParseFailure {
            kind: self.error_kind.unwrap_or(ErrorKind::InternalParseError),
            message: self.error.unwrap_or_default(),
        })
    }
}

impl<T> From<Result<T>> for ParseResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(err) => Self::failed(&err),
        }
    }
}

/// Owned failure detached from a `ParseResult`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ParseFailure {
    pub kind: ErrorKind,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_result_carries_kind_and_message() {
        let result: ParseResult<()> = Err(ParseError::EmptyInput).into();
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error_kind, Some(ErrorKind::EmptyInput));
        assert_eq!(result.error.as_deref(), Some("Input is empty"));
    }

    #[test]
    fn test_ok_result_round_trips_into_result() {
        let result = ParseResult::ok(7);
        assert!(result.success);
        assert_eq!(result.into_result(), Ok(7));
    }

    #[test]
    fn test_into_result_keeps_category() {
        let result: ParseResult<u8> = ParseResult::failed(&ParseError::Encrypted);
        let failure = result.into_result().unwrap_err();
        assert_eq!(failure.kind, ErrorKind::Encrypted);
    }

    #[test]
    fn test_messages_distinguish_categories() {
        let drm = ParseError::DrmProtected("encryption.xml".into()).to_string();
        let corrupt = ParseError::corrupt("bad header").to_string();
        assert!(drm.contains("DRM"));
        assert!(corrupt.contains("Corrupt"));
        assert_ne!(drm, corrupt);
    }
}
