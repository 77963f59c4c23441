//! Selectable, searchable text for rendered PDF pages.
//!
//! Opens a document, runs the page text analysis over every page and
//! exposes three capabilities on the result: interactive selection by
//! pointer, extraction of selected text as Unicode, and in-page
//! substring search returning bounding boxes of matches.
//!
//! ```ignore
//! use textpage::Document;
//!
//! let mut doc = Document::open_file("report.pdf", None)?;
//! doc.set_begin_coordinate(0.1, 0.2, 0);
//! if let Some(highlight) = doc.from_begin_to_coordinate(0.6, 0.25, 0) {
//!     // paint the highlight rectangles
//! }
//! let text = doc.selected_text(true, 0);
//! let hits = doc.search("invoice total", false, 0);
//! ```

mod document;
mod page;

pub use document::{Document, OpenOptions};
pub use page::Page;

pub use textpage_core::{
    AnalysisOptions, AnalysisWarning, PdfError, Rect, Rotation, Severity, WarningCode,
};
