//! Errors and the per-page diagnostic channel.
//!
//! Fatal conditions surface as [`PdfError`]. Everything that happens
//! during glyph ingestion is absorbed instead: anomalies are recorded as
//! [`AnalysisWarning`] lines (severity + message) attached to the page,
//! and queries on a fully built page never fail.

use std::fmt;

/// Fatal error while opening or analyzing a document.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// The file could not be opened or is not recognizable as a PDF.
    OpenFailure(String),
    /// The user/owner password was rejected.
    InvalidPassword,
    /// The document is encrypted and no password was supplied.
    PasswordRequired,
    /// Cross-reference table or catalog unusable even after reconstruction.
    DamagedDocument(String),
    /// Content-stream interpretation failed beyond recovery.
    InterpreterError(String),
    /// The caller's abort predicate fired; pending work was abandoned.
    Aborted,
    /// I/O error reading the document.
    IoError(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::OpenFailure(msg) => write!(f, "cannot open document: {msg}"),
            PdfError::InvalidPassword => write!(f, "the supplied password is incorrect"),
            PdfError::PasswordRequired => write!(f, "document is encrypted and requires a password"),
            PdfError::DamagedDocument(msg) => write!(f, "damaged document: {msg}"),
            PdfError::InterpreterError(msg) => write!(f, "interpreter error: {msg}"),
            PdfError::Aborted => write!(f, "operation aborted"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Severity of a diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// Machine-readable category of a recoverable anomaly.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WarningCode {
    /// The per-page tiny-glyph quota was exhausted; further tiny glyphs dropped.
    TinyCharLimit,
    /// Words remained in a baseline pool after coalescing.
    WordsLeftInPool,
    /// The PDF header was not found at byte offset 0.
    HeaderNotAtStart,
    /// No `%%EOF` marker near the end of the file.
    MissingEof,
    /// The catalog page count was not an integer.
    BadPageCount,
    /// A character mapping fell back to a default.
    EncodingFallback,
    /// Anything else.
    Other(String),
}

impl WarningCode {
    pub fn as_str(&self) -> &str {
        match self {
            WarningCode::TinyCharLimit => "TINY_CHAR_LIMIT",
            WarningCode::WordsLeftInPool => "WORDS_LEFT_IN_POOL",
            WarningCode::HeaderNotAtStart => "HEADER_NOT_AT_START",
            WarningCode::MissingEof => "MISSING_EOF",
            WarningCode::BadPageCount => "BAD_PAGE_COUNT",
            WarningCode::EncodingFallback => "ENCODING_FALLBACK",
            WarningCode::Other(_) => "OTHER",
        }
    }
}

/// One line on the diagnostic channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnalysisWarning {
    pub severity: Severity,
    pub code: WarningCode,
    pub description: String,
    /// Page number (0-indexed), when page-scoped.
    pub page: Option<usize>,
    /// Element context, e.g. a content-stream byte offset.
    pub element: Option<String>,
}

impl AnalysisWarning {
    pub fn new(code: WarningCode, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            description: description.into(),
            page: None,
            element: None,
        }
    }

    /// Attach a page number, returning the modified warning.
    pub fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    /// Attach element context, returning the modified warning.
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }
}

impl fmt::Display for AnalysisWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: [{}] {}",
            self.severity,
            self.code.as_str(),
            self.description
        )?;
        if let Some(page) = self.page {
            write!(f, " (page {page})")?;
        }
        if let Some(ref element) = self.element {
            write!(f, " [{element}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_error_display() {
        assert_eq!(
            PdfError::OpenFailure("not a PDF".into()).to_string(),
            "cannot open document: not a PDF"
        );
        assert_eq!(
            PdfError::InvalidPassword.to_string(),
            "the supplied password is incorrect"
        );
        assert_eq!(PdfError::Aborted.to_string(), "operation aborted");
    }

    #[test]
    fn pdf_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PdfError = io.into();
        assert!(matches!(err, PdfError::IoError(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn pdf_error_implements_std_error() {
        let err: Box<dyn std::error::Error> = Box::new(PdfError::DamagedDocument("xref".into()));
        assert!(err.to_string().contains("xref"));
    }

    #[test]
    fn warning_display_with_context() {
        let w = AnalysisWarning::new(WarningCode::TinyCharLimit, "tiny glyph quota exceeded")
            .on_page(3)
            .with_element("offset 120");
        assert_eq!(
            w.to_string(),
            "warning: [TINY_CHAR_LIMIT] tiny glyph quota exceeded (page 3) [offset 120]"
        );
    }

    #[test]
    fn warning_display_bare() {
        let w = AnalysisWarning::new(WarningCode::MissingEof, "no %%EOF within final 1024 bytes");
        assert_eq!(
            w.to_string(),
            "warning: [MISSING_EOF] no %%EOF within final 1024 bytes"
        );
    }

    #[test]
    fn warning_codes_have_stable_tags() {
        assert_eq!(WarningCode::WordsLeftInPool.as_str(), "WORDS_LEFT_IN_POOL");
        assert_eq!(WarningCode::Other("x".into()).as_str(), "OTHER");
    }
}
