//! Error types for the loading and interpretation layers.
//!
//! Uses [`thiserror`] for derivation and converts losslessly into the
//! core's [`PdfError`] so callers see one error surface.

use textpage_core::PdfError;
use thiserror::Error;

/// Error from the PDF backend or the content-stream interpreter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The bytes are not recognizable as a PDF document.
    #[error("cannot open document: {0}")]
    Open(String),

    /// The document is encrypted and the password was missing or wrong.
    #[error("the supplied password is incorrect")]
    InvalidPassword,

    /// The document requires a password.
    #[error("document is encrypted and requires a password")]
    PasswordRequired,

    /// Cross-reference table or catalog unusable.
    #[error("damaged document: {0}")]
    Damaged(String),

    /// Content-stream interpretation failed.
    #[error("interpreter error: {0}")]
    Interpreter(String),

    /// I/O error reading the document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Open(msg) => PdfError::OpenFailure(msg),
            BackendError::InvalidPassword => PdfError::InvalidPassword,
            BackendError::PasswordRequired => PdfError::PasswordRequired,
            BackendError::Damaged(msg) => PdfError::DamagedDocument(msg),
            BackendError::Interpreter(msg) => PdfError::InterpreterError(msg),
            BackendError::Io(e) => PdfError::IoError(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            BackendError::Open("no header".into()).to_string(),
            "cannot open document: no header"
        );
        assert_eq!(
            BackendError::Interpreter("bad stream".into()).to_string(),
            "interpreter error: bad stream"
        );
    }

    #[test]
    fn converts_into_pdf_error() {
        let err: PdfError = BackendError::InvalidPassword.into();
        assert_eq!(err, PdfError::InvalidPassword);
        let err: PdfError = BackendError::Damaged("xref".into()).into();
        assert!(matches!(err, PdfError::DamagedDocument(_)));
    }

    #[test]
    fn io_error_wraps() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: BackendError = io.into();
        let pdf: PdfError = err.into();
        assert!(matches!(pdf, PdfError::IoError(_)));
    }
}
