//! Words: the atoms of the analyzed page.

use std::cell::OnceCell;

use crate::font::FontId;
use crate::geometry::{EMPTY_RECT, Rect};
use crate::norm::{fold_upper, nfkc};
use crate::rotation::Rotation;

/// Arena index of a word within its page.
pub type WordId = usize;
/// Arena index of a line within its page.
pub type LineId = usize;
/// Arena index of a block within its page.
pub type BlockId = usize;

/// One word: an ordered run of code points sharing a baseline, font and
/// rotation, with a scalar edge position per glyph along the primary axis.
#[derive(Debug)]
pub struct Word {
    /// Code points, one per glyph (ligature expansion happens upstream).
    pub text: Vec<char>,
    /// `edges[i]` is the leading edge of glyph `i`; `edges[len]` the
    /// trailing edge of the last glyph. Ascending for R0/R90, descending
    /// for R180/R270.
    pub edges: Vec<f64>,
    /// Tight bounding box.
    pub rect: Rect,
    /// Baseline coordinate along the secondary axis.
    pub base: f64,
    pub rot: Rotation,
    pub font: FontId,
    pub font_size: f64,
    /// Byte offset of the first glyph in the source content stream.
    pub char_pos: usize,
    /// Byte length of the word in the source content stream.
    pub char_len: usize,
    /// Whether a space separates this word from the next on the line.
    pub space_after: bool,
    /// Position of the first glyph in the page's flattened glyph stream;
    /// assigned after the reading-order sort.
    pub index: usize,
    /// Owning line; valid once the page is fully built.
    pub line: LineId,
    /// Envelope of this word and all preceding words on its line.
    pub pre: Rect,
    /// Envelope of this word and all following words on its line.
    pub post: Rect,
    norm: OnceCell<Box<[char]>>,
}

impl Word {
    /// Open a new word at the given baseline geometry.
    ///
    /// The vertical extent comes from the font's ascent/descent around the
    /// transformed origin; a degenerate extent is widened to one unit so
    /// later interpolation never divides by zero.
    pub fn open(
        rot: Rotation,
        x: f64,
        y: f64,
        ascent: f64,
        descent: f64,
        char_pos: usize,
        font: FontId,
        font_size: f64,
    ) -> Word {
        let mut rect = EMPTY_RECT;
        let base;
        match rot {
            Rotation::R0 => {
                rect.y_min = y - ascent;
                rect.y_max = y - descent;
                if rect.y_min == rect.y_max {
                    rect.y_min = y;
                    rect.y_max = y + 1.0;
                }
                base = y;
            }
            Rotation::R90 => {
                rect.x_min = x + descent;
                rect.x_max = x + ascent;
                if rect.x_min == rect.x_max {
                    rect.x_min = x;
                    rect.x_max = x + 1.0;
                }
                base = x;
            }
            Rotation::R180 => {
                rect.y_min = y + descent;
                rect.y_max = y + ascent;
                if rect.y_min == rect.y_max {
                    rect.y_min = y;
                    rect.y_max = y + 1.0;
                }
                base = y;
            }
            Rotation::R270 => {
                rect.x_min = x - ascent;
                rect.x_max = x - descent;
                if rect.x_min == rect.x_max {
                    rect.x_min = x;
                    rect.x_max = x + 1.0;
                }
                base = x;
            }
        }
        Word {
            text: Vec::new(),
            edges: Vec::new(),
            rect,
            base,
            rot,
            font,
            font_size,
            char_pos,
            char_len: 0,
            space_after: false,
            index: 0,
            line: 0,
            pre: EMPTY_RECT,
            post: EMPTY_RECT,
            norm: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append one glyph at device position `(x, y)` with advance `(w, h)`.
    pub fn push_glyph(&mut self, x: f64, y: f64, w: f64, h: f64, u: char) {
        self.text.push(u);
        match self.rot {
            Rotation::R0 => {
                if self.edges.is_empty() {
                    self.rect.x_min = x;
                }
                self.edges.push(x);
                self.rect.x_max = x + w;
            }
            Rotation::R90 => {
                if self.edges.is_empty() {
                    self.rect.y_min = y;
                }
                self.edges.push(y);
                self.rect.y_max = y + h;
            }
            Rotation::R180 => {
                if self.edges.is_empty() {
                    self.rect.x_max = x;
                }
                self.edges.push(x);
                self.rect.x_min = x + w;
            }
            Rotation::R270 => {
                if self.edges.is_empty() {
                    self.rect.y_max = y;
                }
                self.edges.push(y);
                self.rect.y_min = y + h;
            }
        }
    }

    /// Seal the edge array: `edges[len]` becomes the trailing edge.
    ///
    /// Kept separate from [`push_glyph`] so the trailing edge always
    /// reflects the final glyph's advance exactly once.
    pub fn seal(&mut self) {
        debug_assert_eq!(self.edges.len(), self.text.len());
        let trailing = match self.rot {
            Rotation::R0 => self.rect.x_max,
            Rotation::R90 => self.rect.y_max,
            Rotation::R180 => self.rect.x_min,
            Rotation::R270 => self.rect.y_min,
        };
        self.edges.push(trailing);
    }

    /// Absorb `other`, which must directly follow this word on the line.
    pub fn merge(&mut self, other: Word) {
        self.rect.absorb(&other.rect);
        // The old trailing edge is replaced by the next word's first edge.
        self.edges.truncate(self.text.len());
        self.edges.extend_from_slice(&other.edges);
        self.text.extend_from_slice(&other.text);
        self.char_len += other.char_len;
        self.norm = OnceCell::new();
    }

    /// Reading-order comparison of leading edges along the primary axis.
    pub fn primary_cmp(&self, other: &Word) -> std::cmp::Ordering {
        let cmp = self.rot.sign() * (self.rot.lead(&self.rect) - self.rot.lead(&other.rect));
        cmp.partial_cmp(&0.0).unwrap_or(std::cmp::Ordering::Equal)
    }

    /// Signed gap from this word's trailing edge to `other`'s leading edge.
    pub fn primary_delta(&self, other: &Word) -> f64 {
        self.rot.sign() * (self.rot.lead(&other.rect) - self.rot.trail(&self.rect))
    }

    /// NFKC-normalized text, computed once and cached for the word's life.
    pub fn norm(&self) -> &[char] {
        self.norm.get_or_init(|| nfkc(&self.text).into_boxed_slice())
    }

    fn norm_eq_at(&self, i: usize, q: char, case_sensitive: bool) -> bool {
        let c = self.norm()[i];
        if case_sensitive {
            c == q
        } else {
            fold_upper(c) == q
        }
    }

    /// Whether the normalized text starts with `query`.
    pub fn starts_with(&self, query: &[char], case_sensitive: bool) -> bool {
        if self.norm().len() < query.len() {
            return false;
        }
        query
            .iter()
            .enumerate()
            .all(|(i, &q)| self.norm_eq_at(i, q, case_sensitive))
    }

    /// Whether the normalized text ends with `query`.
    pub fn ends_with(&self, query: &[char], case_sensitive: bool) -> bool {
        let n = self.norm().len();
        if n < query.len() {
            return false;
        }
        query
            .iter()
            .enumerate()
            .all(|(i, &q)| self.norm_eq_at(n - query.len() + i, q, case_sensitive))
    }

    /// Whether the normalized text equals `query`.
    pub fn text_eq(&self, query: &[char], case_sensitive: bool) -> bool {
        self.norm().len() == query.len() && self.starts_with(query, case_sensitive)
    }

    /// Whether the normalized text contains `query` as a substring.
    pub fn contains(&self, query: &[char], case_sensitive: bool) -> bool {
        let n = self.norm().len();
        if query.is_empty() {
            return true;
        }
        if n < query.len() {
            return false;
        }
        (0..=n - query.len()).any(|start| {
            query
                .iter()
                .enumerate()
                .all(|(i, &q)| self.norm_eq_at(start + i, q, case_sensitive))
        })
    }
}
