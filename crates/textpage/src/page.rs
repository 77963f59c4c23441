//! The façade page: an analyzed page plus its owned result polygons.

use textpage_core::{AnalysisWarning, Rect, TextPage};

/// One analyzed page of a document.
///
/// The page owns every word, line and block of its text structure, plus
/// one selection polygon and one search polygon. Both polygons are
/// overwritten by the next corresponding call; callers borrow them.
#[derive(Debug)]
pub struct Page {
    pub(crate) number: usize,
    pub(crate) text: TextPage,
    pub(crate) selection_polygon: Vec<Rect>,
    pub(crate) search_polygon: Vec<Rect>,
}

impl Page {
    pub(crate) fn new(number: usize, text: TextPage) -> Self {
        Self {
            number,
            text,
            selection_polygon: Vec::new(),
            search_polygon: Vec::new(),
        }
    }

    /// 0-based page number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Displayed page width in points.
    pub fn width(&self) -> f64 {
        self.text.page_width()
    }

    /// Displayed page height in points.
    pub fn height(&self) -> f64 {
        self.text.page_height()
    }

    /// Whether the page carries no text.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Diagnostics collected while building this page.
    pub fn warnings(&self) -> &[AnalysisWarning] {
        self.text.warnings()
    }

    /// The whole page's text in reading order.
    pub fn text(&self, normalize: bool) -> String {
        self.text.page_text(normalize)
    }

    /// Direct access to the analyzed text structure.
    pub fn analysis(&self) -> &TextPage {
        &self.text
    }
}
