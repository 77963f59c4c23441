//! Blocks: rectangular groups of lines built by geometric growth.
//!
//! A block starts from a seed word and alternates four absorption passes
//! (above, below, overlapping, sidebands) until a full round changes
//! nothing. The block then splits its words into lines.

use std::ops::Range;

use crate::config::AnalysisOptions;
use crate::geometry::{EMPTY_RECT, Rect};
use crate::line::{Line, LineBuilder};
use crate::pool::Pool;
use crate::rotation::Rotation;
use crate::word::Word;

/// A finished block in the page arena, in reading order.
#[derive(Debug)]
pub struct Block {
    pub rect: Rect,
    pub rot: Rotation,
    pub lines: Range<usize>,
    /// Sum of line glyph counts (spaces included).
    pub char_count: usize,
    /// Primary-axis clearance after neighbor analysis.
    pub pri_min: f64,
    pub pri_max: f64,
    /// Extended box used by the reading-order sort.
    pub ex: Rect,
    /// Table membership (-1 when not part of a table).
    pub table_id: i32,
    /// Whether this block closes its table in reading order.
    pub table_end: bool,
    /// Envelope of this block and all preceding blocks in reading order.
    pub pre: Rect,
    /// Envelope of this block and all following blocks in reading order.
    pub post: Rect,
}

/// A block under construction. Words live in the block's own pool until
/// line extraction, then in the `lines` builders until the page freezes.
#[derive(Debug)]
pub(crate) struct BlockBuilder {
    pub rect: Rect,
    pub rot: Rotation,
    pub pool: Pool,
    pub lines: Vec<LineBuilder>,
    pub char_count: usize,
    pub pri_min: f64,
    pub pri_max: f64,
    pub ex: Rect,
    pub table_id: i32,
    pub table_end: bool,
    /// Seed font size; all growth thresholds scale from it.
    font_size: f64,
    min_base: f64,
    max_base: f64,
}

/// Advance `scan_from` to the first non-empty bucket, then take the
/// leading word among the first four non-empty baseline buckets. Seeding
/// from several buckets avoids starting a line or block with a
/// superscript.
pub(crate) fn take_seed(pool: &mut Pool, scan_from: &mut i64) -> Option<Word> {
    while *scan_from <= pool.max_idx() && pool.bucket(*scan_from).is_empty() {
        *scan_from += 1;
    }
    if *scan_from > pool.max_idx() {
        return None;
    }
    let mut start_idx = *scan_from;
    let mut idx = *scan_from + 1;
    while idx < *scan_from + 4 && idx <= pool.max_idx() {
        if !pool.bucket(idx).is_empty()
            && pool.bucket(idx)[0].primary_cmp(&pool.bucket(start_idx)[0]).is_lt()
        {
            start_idx = idx;
        }
        idx += 1;
    }
    Some(pool.bucket_mut(start_idx).remove(0))
}

impl BlockBuilder {
    pub fn new(seed: Word, opts: &AnalysisOptions) -> Self {
        let mut blk = Self {
            rect: EMPTY_RECT,
            rot: seed.rot,
            pool: Pool::new(opts.pool_step),
            lines: Vec::new(),
            char_count: 0,
            pri_min: 0.0,
            pri_max: 0.0,
            ex: EMPTY_RECT,
            table_id: -1,
            table_end: false,
            font_size: seed.font_size,
            min_base: seed.base,
            max_base: seed.base,
        };
        blk.add_word(seed);
        blk
    }

    pub fn add_word(&mut self, word: Word) {
        self.rect.absorb(&word.rect);
        self.pool.add_word(word);
    }

    fn overlaps_primary_slack(&self, w: &Word, slack: f64) -> bool {
        if self.rot.is_horizontal() {
            w.rect.x_min < self.rect.x_max + slack && w.rect.x_max > self.rect.x_min - slack
        } else {
            w.rect.y_min < self.rect.y_max + slack && w.rect.y_max > self.rect.y_min - slack
        }
    }

    fn near_lead_side(&self, w: &Word, col_space2: f64) -> bool {
        if self.rot.is_horizontal() {
            w.rect.x_max <= self.rect.x_min && w.rect.x_max > self.rect.x_min - col_space2
        } else {
            w.rect.y_max <= self.rect.y_min && w.rect.y_max > self.rect.y_min - col_space2
        }
    }

    fn near_trail_side(&self, w: &Word, col_space2: f64) -> bool {
        if self.rot.is_horizontal() {
            w.rect.x_min >= self.rect.x_max && w.rect.x_min < self.rect.x_max + col_space2
        } else {
            w.rect.y_min >= self.rect.y_max && w.rect.y_min < self.rect.y_max + col_space2
        }
    }

    /// Absorb words from `pool` until one full round of the four passes
    /// finds nothing. Pool sizes strictly decrease on every absorption,
    /// which bounds the loop.
    pub fn expand(&mut self, pool: &mut Pool, opts: &AnalysisOptions) {
        let font_size = self.font_size;
        let col_space1 = opts.min_col_spacing1 * font_size;
        let col_space2 = opts.min_col_spacing2 * font_size;
        let line_space = opts.max_line_spacing_delta * font_size;
        let intra_line_space = opts.max_intra_line_delta * font_size;
        let delta1 = opts.max_block_font_size_delta1 * font_size;
        let delta2 = opts.max_block_font_size_delta2 * font_size;
        let delta3 = opts.max_block_font_size_delta3 * font_size;

        loop {
            let mut found = false;

            // words on the line above the block's current top edge
            let mut new_min_base = self.min_base;
            let mut idx = pool.base_idx(self.min_base);
            while idx >= pool.base_idx(self.min_base - line_space) {
                let mut j = 0;
                while j < pool.bucket(idx).len() {
                    let w = &pool.bucket(idx)[j];
                    if w.base < self.min_base
                        && w.base >= self.min_base - line_space
                        && self.overlaps_primary_slack(w, 0.0)
                        && (w.font_size - font_size).abs() < delta1
                    {
                        let w = pool.bucket_mut(idx).remove(j);
                        new_min_base = w.base;
                        self.add_word(w);
                        found = true;
                    } else {
                        j += 1;
                    }
                }
                idx -= 1;
            }
            self.min_base = new_min_base;

            // words on the line below the block's current bottom edge
            let mut new_max_base = self.max_base;
            let mut idx = pool.base_idx(self.max_base);
            while idx <= pool.base_idx(self.max_base + line_space) {
                let mut j = 0;
                while j < pool.bucket(idx).len() {
                    let w = &pool.bucket(idx)[j];
                    if w.base > self.max_base
                        && w.base <= self.max_base + line_space
                        && self.overlaps_primary_slack(w, 0.0)
                        && (w.font_size - font_size).abs() < delta1
                    {
                        let w = pool.bucket_mut(idx).remove(j);
                        new_max_base = w.base;
                        self.add_word(w);
                        found = true;
                    } else {
                        j += 1;
                    }
                }
                idx += 1;
            }
            self.max_base = new_max_base;

            // words on lines already inside the block that overlap it
            let mut idx = pool.base_idx(self.min_base - intra_line_space);
            while idx <= pool.base_idx(self.max_base + intra_line_space) {
                let mut j = 0;
                while j < pool.bucket(idx).len() {
                    let w = &pool.bucket(idx)[j];
                    if w.base >= self.min_base - intra_line_space
                        && w.base <= self.max_base + intra_line_space
                        && self.overlaps_primary_slack(w, col_space1)
                        && (w.font_size - font_size).abs() < delta2
                    {
                        let w = pool.bucket_mut(idx).remove(j);
                        self.add_word(w);
                        found = true;
                    } else {
                        j += 1;
                    }
                }
                idx += 1;
            }

            if found {
                continue;
            }

            // outlying words just beyond the lead and trail edges; only a
            // handful may exist there, or it is a real column gap
            for trail_side in [false, true] {
                let lo = pool.base_idx(self.min_base - intra_line_space);
                let hi = pool.base_idx(self.max_base + intra_line_space);
                let in_band = |w: &Word, blk: &BlockBuilder| {
                    w.base >= blk.min_base - intra_line_space
                        && w.base <= blk.max_base + intra_line_space
                        && (w.font_size - font_size).abs() < delta3
                };
                let near = |w: &Word, blk: &BlockBuilder| {
                    if trail_side {
                        blk.near_trail_side(w, col_space2)
                    } else {
                        blk.near_lead_side(w, col_space2)
                    }
                };

                let mut n = 0;
                for idx in lo..=hi {
                    if pool
                        .bucket(idx)
                        .iter()
                        .any(|w| in_band(w, self) && near(w, self))
                    {
                        n += 1;
                    }
                }
                if n > 0 && n <= 3 {
                    for idx in lo..=hi {
                        let hit = pool
                            .bucket(idx)
                            .iter()
                            .position(|w| in_band(w, self) && near(w, self));
                        if let Some(j) = hit {
                            let w = pool.bucket_mut(idx).remove(j);
                            if w.base < self.min_base {
                                self.min_base = w.base;
                            } else if w.base > self.max_base {
                                self.max_base = w.base;
                            }
                            self.add_word(w);
                            found = true;
                        }
                    }
                }
            }

            if !found {
                break;
            }
        }
    }

    /// Discard duplicated text (fake boldface, drop shadows): a later word
    /// with identical code points whose four bounds sit within the
    /// rotation-appropriate deltas of an earlier word is deleted.
    fn remove_duplicates(&mut self, opts: &AnalysisOptions) {
        let mut idx0 = self.pool.min_idx();
        while idx0 <= self.pool.max_idx() {
            let mut i0 = 0;
            while i0 < self.pool.bucket(idx0).len() {
                let (text, rect, base, pri_delta, sec_delta) = {
                    let w0 = &self.pool.bucket(idx0)[i0];
                    (
                        w0.text.clone(),
                        w0.rect,
                        w0.base,
                        opts.dup_max_pri_delta * w0.font_size,
                        opts.dup_max_sec_delta * w0.font_size,
                    )
                };
                let horizontal = self.rot.is_horizontal();
                let close = |r: &Rect| {
                    let (pri_x, sec_y) = if horizontal {
                        (pri_delta, sec_delta)
                    } else {
                        (sec_delta, pri_delta)
                    };
                    (rect.x_min - r.x_min).abs() < pri_x
                        && (rect.x_max - r.x_max).abs() < pri_x
                        && (rect.y_min - r.y_min).abs() < sec_y
                        && (rect.y_max - r.y_max).abs() < sec_y
                };

                let max_idx = self.pool.base_idx(base + sec_delta);
                let mut dup: Option<(i64, usize)> = None;
                'scan: for idx1 in idx0..=max_idx {
                    let start = if idx1 == idx0 { i0 + 1 } else { 0 };
                    for j in start..self.pool.bucket(idx1).len() {
                        let w2 = &self.pool.bucket(idx1)[j];
                        if w2.text == text && close(&w2.rect) {
                            dup = Some((idx1, j));
                            break 'scan;
                        }
                    }
                }
                if let Some((idx1, j)) = dup {
                    self.pool.bucket_mut(idx1).remove(j);
                } else {
                    i0 += 1;
                }
            }
            idx0 += 1;
        }
    }

    /// Split the block's pooled words into lines and coalesce each.
    pub fn coalesce(&mut self, opts: &AnalysisOptions) {
        self.remove_duplicates(opts);

        let mut scan_from = self.pool.min_idx();
        let mut cursor: Option<usize> = None;
        while let Some(seed) = take_seed(&mut self.pool, &mut scan_from) {
            let font_size = seed.font_size;
            let min_base = seed.base - opts.max_intra_line_delta * font_size;
            let max_base = seed.base + opts.max_intra_line_delta * font_size;
            let mut line = LineBuilder::new(seed.rot, seed.base);
            line.add_word(seed);

            loop {
                // the leading remaining word whose baseline fits the line
                let mut best: Option<(i64, usize)> = None;
                let mut idx = self.pool.base_idx(min_base);
                while idx <= self.pool.base_idx(max_base) {
                    for j in 0..self.pool.bucket(idx).len() {
                        let w = &self.pool.bucket(idx)[j];
                        if w.base >= min_base && w.base <= max_base {
                            let delta = line.last_word().primary_delta(w);
                            if delta >= opts.min_char_spacing * font_size {
                                if delta < opts.max_word_spacing * font_size
                                    && best
                                        .map(|(bi, bj)| {
                                            w.primary_cmp(&self.pool.bucket(bi)[bj]).is_lt()
                                        })
                                        .unwrap_or(true)
                                {
                                    best = Some((idx, j));
                                }
                                break;
                            }
                        }
                    }
                    idx += 1;
                }
                match best {
                    Some((idx, j)) => {
                        let w = self.pool.bucket_mut(idx).remove(j);
                        line.add_word(w);
                    }
                    None => break,
                }
            }

            line.coalesce(opts);
            self.char_count += line.char_count;

            // keep lines sorted by (baseline, lead); the cursor makes the
            // common in-order insert cheap
            let from = match cursor {
                Some(c) if line.cmp_yx(&self.lines[c]).is_gt() => c + 1,
                _ => 0,
            };
            let mut pos = from;
            while pos < self.lines.len() && line.cmp_yx(&self.lines[pos]).is_gt() {
                pos += 1;
            }
            self.lines.insert(pos, line);
            cursor = Some(pos);
        }
    }

    /// Seal into an arena [`Block`]; line range is patched by the caller.
    pub fn seal(self) -> Block {
        Block {
            rect: self.rect,
            rot: self.rot,
            lines: 0..0,
            char_count: self.char_count,
            pri_min: self.pri_min,
            pri_max: self.pri_max,
            ex: self.ex,
            table_id: self.table_id,
            table_end: self.table_end,
            pre: EMPTY_RECT,
            post: EMPTY_RECT,
        }
    }
}

/// Fill per-line pre/post envelopes over one block's line slice.
pub(crate) fn fill_line_envelopes(lines: &mut [Line]) {
    let mut run = EMPTY_RECT;
    for line in lines.iter_mut() {
        run.absorb(&line.rect);
        line.pre = run;
    }
    run = EMPTY_RECT;
    for line in lines.iter_mut().rev() {
        run.absorb(&line.rect);
        line.post = run;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::test_support::make_word;

    fn word_line(text: &str, x0: f64, base: f64, font_size: f64, char_pos: usize) -> Word {
        let glyph_w = font_size * 0.5;
        let glyphs: Vec<(char, f64, f64)> = text
            .chars()
            .enumerate()
            .map(|(i, c)| (c, x0 + i as f64 * glyph_w, glyph_w))
            .collect();
        let mut w = make_word(&glyphs, base, font_size);
        w.char_pos = char_pos;
        w
    }

    fn pool_with(words: Vec<Word>) -> Pool {
        let mut pool = Pool::new(4.0);
        for w in words {
            pool.add_word(w);
        }
        pool
    }

    #[test]
    fn take_seed_prefers_leading_word_over_first_bucket() {
        // A superscript-like word sits in an earlier bucket but further
        // right; the seed should be the leftmost within the first four
        // non-empty buckets.
        let mut sup = word_line("2", 80.0, 96.0, 7.0, 0);
        sup.base = 96.0;
        let body = word_line("Body", 10.0, 100.0, 10.0, 1);
        let mut pool = pool_with(vec![sup, body]);
        let mut scan = pool.min_idx();
        let seed = take_seed(&mut pool, &mut scan).unwrap();
        assert_eq!(seed.text.iter().collect::<String>(), "Body");
    }

    #[test]
    fn take_seed_none_when_pool_empty() {
        let mut pool = Pool::new(4.0);
        let mut scan = pool.min_idx();
        assert!(take_seed(&mut pool, &mut scan).is_none());
    }

    #[test]
    fn expand_absorbs_lines_above_and_below() {
        let seed = word_line("middle", 10.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        let mut pool = pool_with(vec![
            word_line("above", 10.0, 88.0, 10.0, 10),
            word_line("below", 10.0, 112.0, 10.0, 20),
            // far away: separate paragraph
            word_line("far", 10.0, 200.0, 10.0, 30),
        ]);
        blk.expand(&mut pool, &AnalysisOptions::default());
        assert_eq!(blk.pool.len(), 3);
        assert_eq!(pool.len(), 1, "distant word stays in the page pool");
    }

    #[test]
    fn expand_respects_font_size_gate_for_adjacent_lines() {
        let seed = word_line("body", 10.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        // same geometry but a much larger font: fails delta1
        let mut pool = pool_with(vec![word_line("HUGE", 10.0, 88.0, 20.0, 10)]);
        blk.expand(&mut pool, &AnalysisOptions::default());
        assert_eq!(blk.pool.len(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn expand_pulls_in_nearby_sideband_word() {
        let seed = word_line("left", 10.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        // trailing edge of block is at 30; a word 5pt to the right is
        // within min_col_spacing2 * 10 = 10pt
        let mut pool = pool_with(vec![word_line("x", 35.0, 100.0, 10.0, 10)]);
        blk.expand(&mut pool, &AnalysisOptions::default());
        assert_eq!(blk.pool.len(), 2);
    }

    #[test]
    fn expand_leaves_column_gap_alone() {
        let seed = word_line("left", 10.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        // 40pt away: beyond both overlap slack and sideband reach
        let mut pool = pool_with(vec![word_line("right", 70.0, 100.0, 10.0, 10)]);
        blk.expand(&mut pool, &AnalysisOptions::default());
        assert_eq!(blk.pool.len(), 1);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn coalesce_builds_one_line_in_reading_order() {
        let seed = word_line("Hello", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        blk.add_word(word_line("world", 30.0, 100.0, 10.0, 6));
        blk.coalesce(&AnalysisOptions::default());
        assert_eq!(blk.lines.len(), 1);
        let texts: Vec<String> = blk.lines[0]
            .words
            .iter()
            .map(|w| w.text.iter().collect())
            .collect();
        assert_eq!(texts, vec!["Hello", "world"]);
        assert!(blk.lines[0].words[0].space_after);
        assert_eq!(blk.char_count, 11);
    }

    #[test]
    fn coalesce_splits_baselines_into_lines() {
        let seed = word_line("one", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        blk.add_word(word_line("two", 0.0, 115.0, 10.0, 4));
        blk.coalesce(&AnalysisOptions::default());
        assert_eq!(blk.lines.len(), 2);
        assert_eq!(blk.lines[0].base, 100.0);
        assert_eq!(blk.lines[1].base, 115.0);
    }

    #[test]
    fn coalesce_keeps_superscript_on_same_line() {
        // superscript at base 97 within maxIntraLineDelta * 10 = 5 of 100
        let seed = word_line("x", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        let mut sup = word_line("2", 5.5, 97.0, 10.0, 5);
        sup.base = 97.0;
        blk.add_word(sup);
        blk.coalesce(&AnalysisOptions::default());
        assert_eq!(blk.lines.len(), 1);
        assert_eq!(blk.lines[0].words.len(), 2);
    }

    #[test]
    fn duplicate_words_removed_once() {
        // same text at nearly the same position: fake bold
        let seed = word_line("X", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        blk.add_word(word_line("X", 0.05, 100.0, 10.0, 1));
        blk.coalesce(&AnalysisOptions::default());
        let total: usize = blk.lines.iter().map(|l| l.words.len()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn near_identical_but_different_text_kept() {
        let seed = word_line("X", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        blk.add_word(word_line("Y", 0.05, 100.0, 10.0, 1));
        blk.coalesce(&AnalysisOptions::default());
        let total: usize = blk.lines.iter().map(|l| l.words.len()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn coalesce_drains_block_pool() {
        let seed = word_line("a", 0.0, 100.0, 10.0, 0);
        let mut blk = BlockBuilder::new(seed, &AnalysisOptions::default());
        blk.add_word(word_line("b", 20.0, 100.0, 10.0, 2));
        blk.add_word(word_line("c", 0.0, 112.0, 10.0, 4));
        blk.coalesce(&AnalysisOptions::default());
        assert!(blk.pool.is_empty());
        let total: usize = blk.lines.iter().map(|l| l.words.len()).sum();
        assert_eq!(total, 3);
    }
}
