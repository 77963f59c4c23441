//! Lines: words sharing a baseline band, with inter-word spacing decided.

use std::cmp::Ordering;
use std::ops::Range;

use crate::config::AnalysisOptions;
use crate::geometry::{EMPTY_RECT, Rect};
use crate::rotation::Rotation;
use crate::word::{BlockId, Word};

/// A finished line in the page arena. `words` indexes the page's word
/// arena, which is laid out in reading order.
#[derive(Debug)]
pub struct Line {
    pub rect: Rect,
    pub rot: Rotation,
    /// Baseline of the seed word.
    pub base: f64,
    pub words: Range<usize>,
    pub block: BlockId,
    /// Glyph count plus one per trailing space.
    pub char_count: usize,
    /// Envelope of this line and all preceding lines in its block.
    pub pre: Rect,
    /// Envelope of this line and all following lines in its block.
    pub post: Rect,
}

/// A line under construction: owns its words until the page is frozen.
#[derive(Debug)]
pub(crate) struct LineBuilder {
    pub words: Vec<Word>,
    pub rect: Rect,
    pub rot: Rotation,
    pub base: f64,
    pub char_count: usize,
}

impl LineBuilder {
    pub fn new(rot: Rotation, base: f64) -> Self {
        Self {
            words: Vec::new(),
            rect: EMPTY_RECT,
            rot,
            base,
            char_count: 0,
        }
    }

    pub fn add_word(&mut self, word: Word) {
        self.rect.absorb(&word.rect);
        self.words.push(word);
    }

    pub fn last_word(&self) -> &Word {
        self.words.last().unwrap()
    }

    fn primary_cmp(&self, other: &LineBuilder) -> Ordering {
        let cmp = self.rot.sign() * (self.rot.lead(&self.rect) - self.rot.lead(&other.rect));
        cmp.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
    }

    fn secondary_cmp(&self, other: &LineBuilder) -> Ordering {
        let cmp = self.rot.sec_sign() * (self.base - other.base);
        cmp.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
    }

    /// Baseline-major, then primary-axis ordering of lines in a block.
    pub fn cmp_yx(&self, other: &LineBuilder) -> Ordering {
        self.secondary_cmp(other).then(self.primary_cmp(other))
    }

    /// Decide inter-word spacing and merge contiguous fragments.
    ///
    /// The spacing threshold adapts to tracked (extra-wide) text: the
    /// smallest positive gap between adjacent single-glyph words becomes
    /// the unit, otherwise the plain `max_char_spacing` fraction applies.
    /// Adjacent words merge when font, size and content-stream byte
    /// ranges all line up.
    pub fn coalesce(&mut self, opts: &AnalysisOptions) {
        if self.words.len() > 1 {
            let font_size = self.words[0].font_size;

            let mut min_space;
            if self.words[0].len() > 1 || self.words[1].len() > 1 {
                min_space = 0.0;
            } else {
                min_space = self.words[0].primary_delta(&self.words[1]);
                let mut i = 1;
                while i + 1 < self.words.len() && min_space > 0.0 {
                    if self.words[i + 1].len() > 1 {
                        min_space = 0.0;
                    }
                    let delta = self.words[i].primary_delta(&self.words[i + 1]);
                    if delta < min_space {
                        min_space = delta;
                    }
                    i += 1;
                }
            }
            let space = if min_space <= 0.0 {
                opts.max_char_spacing * font_size
            } else {
                (opts.max_wide_char_spacing_mul * min_space)
                    .min(opts.max_wide_char_spacing * font_size)
            };

            let mut i = 0;
            while i + 1 < self.words.len() {
                if self.words[i].primary_delta(&self.words[i + 1]) >= space {
                    self.words[i].space_after = true;
                    i += 1;
                } else if self.words[i].font == self.words[i + 1].font
                    && (self.words[i].font_size - self.words[i + 1].font_size).abs()
                        < opts.max_word_font_size_delta * font_size
                    && self.words[i + 1].char_pos
                        == self.words[i].char_pos + self.words[i].char_len
                {
                    let absorbed = self.words.remove(i + 1);
                    self.words[i].merge(absorbed);
                } else {
                    i += 1;
                }
            }
        }

        self.char_count = self
            .words
            .iter()
            .map(|w| w.len() + usize::from(w.space_after))
            .sum();
    }
}

/// Fill the per-word pre/post envelopes of one line's word slice.
pub(crate) fn fill_word_envelopes(words: &mut [Word]) {
    let mut run = EMPTY_RECT;
    for w in words.iter_mut() {
        run.absorb(&w.rect);
        w.pre = run;
    }
    run = EMPTY_RECT;
    for w in words.iter_mut().rev() {
        run.absorb(&w.rect);
        w.post = run;
    }
}
