//! Pointer-driven text selection.
//!
//! Selection state is a pair of word/glyph anchors. Pointer coordinates
//! arrive as fractions of the page size; the nearest word is found with
//! a three-level zoom (block, line, word) followed by a bidirectional
//! walk along the reading order that prunes whole branches with the
//! pre/post envelope distances.

use crate::geometry::Rect;
use crate::norm::nfkc;
use crate::page::TextPage;
use crate::rotation::Rotation;
use crate::word::WordId;

/// Active selection anchors. `idx1`/`idx2` are glyph offsets within the
/// start/end words; the value `word.len()` addresses the space after the
/// word. `idx_save` preserves the original anchor offset so dragging
/// back into the anchor word restores it.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Selection {
    pub start: WordId,
    pub end: WordId,
    pub idx1: usize,
    pub idx2: usize,
    pub idx_save: usize,
}

impl TextPage {
    /// The word after `w` on the same line, if any.
    fn next_in_line(&self, w: WordId) -> Option<WordId> {
        let line = &self.lines[self.words[w].line];
        if w + 1 < line.words.end { Some(w + 1) } else { None }
    }

    /// Nearest word to a device-space point, optionally starting from a
    /// previous result to keep the search local.
    pub(crate) fn find_nearest(&self, x: f64, y: f64, from: Option<WordId>) -> Option<WordId> {
        if self.words.is_empty() {
            return None;
        }

        let (start, mut mindist) = match from {
            Some(w) => (w, self.words[w].rect.dist(x, y)),
            None => {
                // zoom: best block, then best line inside it, then best word
                let mut best_blk = 0;
                let mut d = f64::MAX;
                for (i, blk) in self.blocks.iter().enumerate() {
                    if d <= 0.0 {
                        break;
                    }
                    let bd = blk.rect.dist(x, y);
                    if bd < d {
                        d = bd;
                        best_blk = i;
                    }
                }
                let mut best_line = self.blocks[best_blk].lines.start;
                d = f64::MAX;
                for l in self.blocks[best_blk].lines.clone() {
                    if d <= 0.0 {
                        break;
                    }
                    let ld = self.lines[l].rect.dist(x, y);
                    if ld < d {
                        d = ld;
                        best_line = l;
                    }
                }
                let mut best_word = self.lines[best_line].words.start;
                d = f64::MAX;
                for w in self.lines[best_line].words.clone() {
                    if d <= 0.0 {
                        break;
                    }
                    let wd = self.words[w].rect.dist(x, y);
                    if wd < d {
                        d = wd;
                        best_word = w;
                    }
                }
                (best_word, d)
            }
        };
        let mut best = start;

        // forward: words, then lines, then blocks, pruned by the post
        // envelopes of the remainder
        let mut line_id = self.words[start].line;
        let mut blk_id = self.lines[line_id].block;
        let mut w = start + 1;
        loop {
            if w >= self.lines[line_id].words.end || mindist < self.words[w].post.dist(x, y) {
                line_id += 1;
                if line_id >= self.blocks[blk_id].lines.end
                    || mindist < self.lines[line_id].post.dist(x, y)
                {
                    blk_id += 1;
                    if blk_id >= self.blocks.len() || mindist < self.blocks[blk_id].post.dist(x, y)
                    {
                        break;
                    }
                    line_id = self.blocks[blk_id].lines.start;
                }
                w = self.lines[line_id].words.start;
                continue;
            }
            let d = self.words[w].rect.dist(x, y);
            if d < mindist {
                mindist = d;
                best = w;
                if mindist == 0.0 {
                    break;
                }
            }
            w += 1;
        }

        // backward mirror with the pre envelopes
        let mut line_id = self.words[start].line;
        let mut blk_id = self.lines[line_id].block;
        let mut w = if start > self.lines[line_id].words.start {
            Some(start - 1)
        } else {
            None
        };
        loop {
            let skip = match w {
                Some(wi) => mindist < self.words[wi].pre.dist(x, y),
                None => true,
            };
            if skip {
                let first_line = self.blocks[blk_id].lines.start;
                if line_id == first_line
                    || mindist < self.lines[line_id - 1].pre.dist(x, y)
                {
                    if blk_id == 0 {
                        break;
                    }
                    blk_id -= 1;
                    if mindist < self.blocks[blk_id].pre.dist(x, y) {
                        break;
                    }
                    line_id = self.blocks[blk_id].lines.end - 1;
                } else {
                    line_id -= 1;
                }
                w = Some(self.lines[line_id].words.end - 1);
                continue;
            }
            let wi = w.unwrap_or(start);
            let d = self.words[wi].rect.dist(x, y);
            if d < mindist {
                mindist = d;
                best = wi;
                if mindist == 0.0 {
                    break;
                }
            }
            w = if wi > self.lines[line_id].words.start {
                Some(wi - 1)
            } else {
                None
            };
        }

        Some(best)
    }

    /// Glyph offset within (or beside) a word for a device-space point.
    ///
    /// An initial guess by linear interpolation over the word's primary
    /// extent is refined against the edge array. Positions before the
    /// word resolve to the end of the previous word when a space
    /// separates them; positions past the word resolve to the trailing
    /// space or the last glyph.
    pub(crate) fn cal_idx(&self, x: f64, y: f64, word: WordId) -> (WordId, usize) {
        let w = &self.words[word];
        let r = &w.rect;
        let (pos, offset) = match w.rot {
            Rotation::R0 => (x, (x - r.x_min) / r.width()),
            Rotation::R90 => (y, (y - r.y_min) / r.height()),
            Rotation::R180 => (x, (r.x_max - x) / r.width()),
            Rotation::R270 => (y, (r.y_max - y) / r.height()),
        };
        let len = w.len() as isize;
        let mut idx = (offset * w.len() as f64).floor() as isize;
        if idx >= 0 && idx < len {
            if matches!(w.rot, Rotation::R0 | Rotation::R90) {
                while idx < len && w.edges[(idx + 1) as usize] < pos {
                    idx += 1;
                }
                while idx >= 0 && w.edges[idx as usize] > pos {
                    idx -= 1;
                }
            } else {
                while idx < len && w.edges[(idx + 1) as usize] > pos {
                    idx += 1;
                }
                while idx >= 0 && w.edges[idx as usize] < pos {
                    idx -= 1;
                }
            }
        }
        if idx < 0 {
            let line = &self.lines[w.line];
            if word > line.words.start && self.words[word - 1].space_after {
                return (word - 1, self.words[word - 1].len());
            }
            return (word, 0);
        }
        if idx >= len {
            if w.space_after {
                return (word, w.len());
            }
            return (word, w.len() - 1);
        }
        (word, idx as usize)
    }

    /// Anchor a new selection at fractional page coordinates.
    pub fn start_selection(&mut self, x: f64, y: f64) {
        let x = x * self.page_width;
        let y = y * self.page_height;
        self.selection = match self.find_nearest(x, y, None) {
            Some(w) => {
                let (w, idx) = self.cal_idx(x, y, w);
                Some(Selection {
                    start: w,
                    end: w,
                    idx1: idx,
                    idx2: idx,
                    idx_save: idx,
                })
            }
            None => None,
        };
    }

    /// Move the selection end to fractional page coordinates.
    ///
    /// Returns whether the selection end actually changed. The anchor
    /// offset is restored when the drag returns to the anchor word and
    /// clamped to a word boundary otherwise, so cross-word drags always
    /// select whole glyph runs on the anchor side.
    pub fn move_sel_end_to(&mut self, x: f64, y: f64) -> bool {
        let Some(sel) = self.selection else {
            return false;
        };
        let old_idx = sel.idx2 + self.words[sel.end].index;
        let x = x * self.page_width;
        let y = y * self.page_height;
        let near = self.find_nearest(x, y, Some(sel.end)).unwrap_or(sel.end);
        let (end, mut idx2) = self.cal_idx(x, y, near);
        let mut idx1 = sel.idx1;
        let start = sel.start;

        let back_at_anchor = start == end
            || (self.next_in_line(start) == Some(end) && sel.idx_save == self.words[start].len())
            || (self.next_in_line(end) == Some(start) && idx2 == self.words[end].len());
        if back_at_anchor {
            idx1 = sel.idx_save;
        } else if self.words[start].index < self.words[end].index {
            if idx1 < self.words[start].len() {
                idx1 = 0;
            }
            if idx2 < self.words[end].len() {
                idx2 = self.words[end].len() - 1;
            }
        } else {
            if idx2 < self.words[end].len() {
                idx2 = 0;
            }
            if idx1 < self.words[start].len() {
                idx1 = self.words[start].len() - 1;
            }
        }

        self.selection = Some(Selection {
            start,
            end,
            idx1,
            idx2,
            idx_save: sel.idx_save,
        });
        old_idx != idx2 + self.words[end].index
    }

    /// Selection anchors ordered by glyph-stream position.
    fn ordered_selection(&self) -> Option<(WordId, usize, WordId, usize)> {
        let sel = self.selection?;
        if self.words[sel.start].index + sel.idx1 < self.words[sel.end].index + sel.idx2 {
            Some((sel.start, sel.idx1, sel.end, sel.idx2))
        } else {
            Some((sel.end, sel.idx2, sel.start, sel.idx1))
        }
    }

    /// One rectangle per covered line, clipped to the selected glyph
    /// edges on the first and last line, in fractional coordinates.
    pub fn selected_region(&self) -> Vec<Rect> {
        let Some((begin, b_idx, mut end, e_idx)) = self.ordered_selection() else {
            return Vec::new();
        };
        let mut result = Vec::new();

        // a selection ending in a trailing space extends to the next
        // word's leading edge
        let mut e_edge_idx = e_idx + 1;
        if e_idx == self.words[end].len() {
            if let Some(next) = self.next_in_line(end) {
                end = next;
                e_edge_idx = 0;
            } else {
                e_edge_idx = e_idx;
            }
        }

        let begin_line = &self.lines[self.words[begin].line];
        let b_edge = self.words[begin].edges[b_idx];
        let lr = &begin_line.rect;
        result.push(match begin_line.rot {
            Rotation::R0 => Rect::new(b_edge, lr.y_min, lr.x_max, lr.y_max),
            Rotation::R90 => Rect::new(lr.x_min, b_edge, lr.x_max, lr.y_max),
            Rotation::R180 => Rect::new(lr.x_min, lr.y_min, b_edge, lr.y_max),
            Rotation::R270 => Rect::new(lr.x_min, lr.y_min, lr.x_max, b_edge),
        });

        let begin_line_id = self.words[begin].line;
        let end_line_id = self.words[end].line;
        for l in begin_line_id + 1..=end_line_id {
            result.push(self.lines[l].rect);
        }

        let e_edge = self.words[end].edges[e_edge_idx];
        if let Some(last) = result.last_mut() {
            match self.lines[end_line_id].rot {
                Rotation::R0 => last.x_max = e_edge,
                Rotation::R90 => last.y_max = e_edge,
                Rotation::R180 => last.x_min = e_edge,
                Rotation::R270 => last.y_min = e_edge,
            }
        }

        result
            .into_iter()
            .map(|r| r.scaled(self.page_width, self.page_height))
            .collect()
    }

    /// The selected text, optionally NFKC-normalized. Empty when there
    /// is no selection.
    pub fn selected_text(&self, normalize: bool) -> String {
        match self.ordered_selection() {
            Some((begin, b_idx, end, e_idx)) => {
                self.text_between(begin, b_idx, end, e_idx, normalize)
            }
            None => String::new(),
        }
    }

    fn push_chars(out: &mut String, chars: &[char], normalize: bool) {
        if normalize {
            out.extend(nfkc(chars));
        } else {
            out.extend(chars.iter());
        }
    }

    /// Concatenate the glyph stream from (begin, b_idx) through
    /// (end, e_idx) inclusive: U+0020 for every `space_after`, U+000A at
    /// line transitions, and a trailing space when the selection ends in
    /// the space after a word.
    pub(crate) fn text_between(
        &self,
        begin: WordId,
        b_idx: usize,
        end: WordId,
        e_idx: usize,
        normalize: bool,
    ) -> String {
        let mut out = String::new();
        let mut begin = begin;
        let mut b_idx = b_idx;
        let mut e_idx = e_idx;

        if b_idx == self.words[begin].len() {
            out.push(' ');
            if begin == end && b_idx == e_idx {
                return out;
            }
            begin += 1;
            b_idx = 0;
        }
        let mut append_space = false;
        if e_idx == self.words[end].len() {
            append_space = true;
            e_idx -= 1;
        }

        if begin == end {
            Self::push_chars(&mut out, &self.words[begin].text[b_idx..=e_idx], normalize);
        } else {
            Self::push_chars(&mut out, &self.words[begin].text[b_idx..], normalize);
            if self.words[begin].space_after {
                out.push(' ');
            }
            for w in begin + 1..=end {
                if self.words[w].line != self.words[w - 1].line {
                    out.push('\n');
                }
                if w == end {
                    break;
                }
                if normalize {
                    out.extend(self.words[w].norm().iter());
                } else {
                    out.extend(self.words[w].text.iter());
                }
                if self.words[w].space_after {
                    out.push(' ');
                }
            }
            Self::push_chars(&mut out, &self.words[end].text[..=e_idx], normalize);
        }

        if append_space {
            out.push(' ');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::page::test_support::build_page;

    // a 600x800 page with "Hello world" at device (60, 80): "Hello"
    // covers x 60..90, the space 90..96, "world" 96..126
    fn hello_world() -> crate::page::TextPage {
        build_page(&[("Hello world", 60.0, 80.0)])
    }

    #[test]
    fn start_selection_anchors_on_nearest_word() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        let text = page.selected_text(false);
        assert_eq!(text, "H");
    }

    #[test]
    fn drag_across_words_selects_whole_span() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        let changed = page.move_sel_end_to(0.4, 0.1);
        assert!(changed);
        assert_eq!(page.selected_text(false), "Hello world");
    }

    #[test]
    fn drag_region_is_line_clipped() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        page.move_sel_end_to(0.4, 0.1);
        let region = page.selected_region();
        assert_eq!(region.len(), 1);
        let r = region[0];
        assert!((r.x_min - 60.0 / 600.0).abs() < 1e-9);
        assert!((r.x_max - 126.0 / 600.0).abs() < 1e-9);
        assert!((r.y_min - 70.5 / 800.0).abs() < 1e-9);
        assert!((r.y_max - 83.5 / 800.0).abs() < 1e-9);
    }

    #[test]
    fn repeated_move_to_same_point_reports_no_change() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        assert!(page.move_sel_end_to(0.4, 0.1));
        assert!(!page.move_sel_end_to(0.4, 0.1));
    }

    #[test]
    fn selecting_word_plus_trailing_space() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        // device x = 92 lands in the inter-word space after "Hello"
        page.move_sel_end_to(92.0 / 600.0, 0.1);
        assert_eq!(page.selected_text(false), "Hello ");
    }

    #[test]
    fn single_word_selection_within_word() {
        let mut page = hello_world();
        page.start_selection(0.1, 0.1);
        // device x = 89 is inside the last glyph of "Hello"
        page.move_sel_end_to(89.0 / 600.0, 0.1);
        assert_eq!(page.selected_text(false), "Hello");
    }

    #[test]
    fn backwards_drag_swaps_anchors() {
        let mut page = hello_world();
        page.start_selection(0.2, 0.1);
        page.move_sel_end_to(0.1, 0.1);
        assert_eq!(page.selected_text(false), "Hello world");
    }

    #[test]
    fn selection_across_lines_inserts_newline() {
        let mut page = build_page(&[("first line", 60.0, 80.0), ("second", 60.0, 110.0)]);
        page.start_selection(0.1, 0.1);
        page.move_sel_end_to(90.0 / 600.0, 110.0 / 800.0);
        assert_eq!(page.selected_text(false), "first line\nsecond");
        let region = page.selected_region();
        assert_eq!(region.len(), 2);
    }

    #[test]
    fn selection_on_empty_page_is_empty() {
        let mut page = build_page(&[]);
        page.start_selection(0.5, 0.5);
        assert_eq!(page.selected_text(false), "");
        assert!(page.selected_region().is_empty());
        assert!(!page.move_sel_end_to(0.6, 0.5));
    }

    #[test]
    fn normalized_selection_expands_ligatures() {
        let mut page = build_page(&[("\u{FB01}le here", 60.0, 80.0)]);
        page.start_selection(0.1, 0.1);
        page.move_sel_end_to(0.3, 0.1);
        let raw = page.selected_text(false);
        let norm = page.selected_text(true);
        assert!(raw.starts_with('\u{FB01}'));
        assert!(norm.starts_with("fi"));
    }

    #[test]
    fn whole_page_selection_matches_page_text() {
        let mut page = build_page(&[("alpha beta", 60.0, 80.0), ("gamma", 60.0, 110.0)]);
        page.start_selection(60.5 / 600.0, 80.0 / 800.0);
        page.move_sel_end_to(89.0 / 600.0, 110.0 / 800.0);
        assert_eq!(page.selected_text(false), page.page_text(false));
        assert_eq!(page.page_text(false), "alpha beta\ngamma");
    }

    #[test]
    fn cal_idx_halves_of_single_glyph() {
        // single glyph word: the index is 0 on the left half, and the
        // trailing position on the right half
        let mut page = build_page(&[("X", 60.0, 80.0)]);
        page.start_selection(61.0 / 600.0, 0.1);
        assert_eq!(page.selected_text(false), "X");
        page.start_selection(65.9 / 600.0, 0.1);
        assert_eq!(page.selected_text(false), "X");
    }
}
