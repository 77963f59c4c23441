//! Document lifecycle: open, analyze every page, query.

use textpage_core::error::{Severity, WarningCode};
use textpage_core::{AnalysisOptions, AnalysisWarning, PdfError, Rect, TextPageBuilder};
use textpage_parse::{interpret_page, open_bytes, page_geometry};

use crate::page::Page;

/// Options for opening a document.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub user_password: Option<String>,
    pub owner_password: Option<String>,
    /// Layout analysis settings shared by every page of this document.
    pub analysis: AnalysisOptions,
}

/// An opened document with one analyzed page per PDF page.
///
/// All pages are built eagerly at open time; afterwards the document is
/// immutable apart from the per-page selection state and result
/// polygons. Selection and search coordinates are fractions of the page
/// size in `[0, 1]`.
#[derive(Debug)]
pub struct Document {
    pages: Vec<Page>,
    warnings: Vec<AnalysisWarning>,
}

impl Document {
    /// Open a document from bytes.
    pub fn open(bytes: &[u8], options: Option<OpenOptions>) -> Result<Self, PdfError> {
        Self::open_impl(bytes, options.unwrap_or_default(), None)
    }

    /// Open a document from a file path.
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<OpenOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        Self::open(&bytes, options)
    }

    /// Open a document, polling `should_abort` between pages. When the
    /// predicate fires, pending work is abandoned and no partial
    /// document is returned.
    pub fn open_abortable(
        bytes: &[u8],
        options: Option<OpenOptions>,
        should_abort: &dyn Fn() -> bool,
    ) -> Result<Self, PdfError> {
        Self::open_impl(bytes, options.unwrap_or_default(), Some(should_abort))
    }

    fn open_impl(
        bytes: &[u8],
        options: OpenOptions,
        should_abort: Option<&dyn Fn() -> bool>,
    ) -> Result<Self, PdfError> {
        let loaded = open_bytes(
            bytes,
            options.user_password.as_deref(),
            options.owner_password.as_deref(),
        )
        .map_err(PdfError::from)?;

        let mut pages = Vec::with_capacity(loaded.page_ids.len());
        for (number, &page_id) in loaded.page_ids.iter().enumerate() {
            if let Some(abort) = should_abort {
                if abort() {
                    return Err(PdfError::Aborted);
                }
            }
            let geometry = page_geometry(&loaded.doc, page_id).map_err(PdfError::from)?;
            let mut builder = TextPageBuilder::new(
                geometry.width(),
                geometry.height(),
                options.analysis.clone(),
            );
            // ingestion-time failures are absorbed into the diagnostic
            // channel; the page keeps whatever was decoded before them
            if let Err(err) = interpret_page(&loaded.doc, page_id, &mut builder, &options.analysis)
            {
                let mut warning = AnalysisWarning::new(
                    WarningCode::Other("INTERPRETER".to_string()),
                    err.to_string(),
                )
                .on_page(number);
                warning.severity = Severity::Error;
                builder.warn(warning);
            }
            pages.push(Page::new(number, builder.finish()));
        }

        Ok(Self {
            pages,
            warnings: loaded.warnings,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self, number: usize) -> Option<&Page> {
        self.pages.get(number)
    }

    /// Document-level diagnostics from the structural pre-scan.
    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    /// Anchor a selection at fractional coordinates on a page. Out of
    /// range page numbers are ignored.
    pub fn set_begin_coordinate(&mut self, x: f64, y: f64, page: usize) {
        if let Some(p) = self.pages.get_mut(page) {
            p.text.start_selection(x, y);
        }
    }

    /// Move the selection end on a page. Returns the highlight polygon
    /// (one line-clipped rectangle per covered line, in fractional
    /// coordinates), or `None` when nothing changed.
    pub fn from_begin_to_coordinate(&mut self, x: f64, y: f64, page: usize) -> Option<&[Rect]> {
        let p = self.pages.get_mut(page)?;
        if !p.text.move_sel_end_to(x, y) {
            return None;
        }
        p.selection_polygon = p.text.selected_region();
        Some(&p.selection_polygon)
    }

    /// Text of the current selection on a page; empty when there is no
    /// selection or the page number is out of range.
    pub fn selected_text(&self, normalize: bool, page: usize) -> String {
        match self.pages.get(page) {
            Some(p) => p.text.selected_text(normalize),
            None => String::new(),
        }
    }

    /// Whole-word bounding boxes of every match on a page. The returned
    /// polygon is owned by the page and overwritten on the next call.
    pub fn search(&mut self, keyword: &str, case_sensitive: bool, page: usize) -> &[Rect] {
        match self.pages.get_mut(page) {
            Some(p) => {
                p.search_polygon = p.text.search(keyword, case_sensitive);
                &p.search_polygon
            }
            None => &[],
        }
    }

    /// Reading-order text of one page; empty when out of range.
    pub fn page_text(&self, normalize: bool, page: usize) -> String {
        match self.pages.get(page) {
            Some(p) => p.text(normalize),
            None => String::new(),
        }
    }
}
