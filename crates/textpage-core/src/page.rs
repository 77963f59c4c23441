//! The analyzed page: glyph intake, coalescing and the query surface.
//!
//! A page has three lifecycle phases. [`TextPageBuilder`] is the
//! *ingesting* phase: it receives the loader's glyph events and marked
//! content notifications and accumulates words into per-rotation pools.
//! [`TextPageBuilder::finish`] runs coalescing and freezes the result
//! into a [`TextPage`], the *queryable* phase: immutable arenas of
//! words, lines and blocks in reading order, plus selection and search.
//! Dropping the page releases everything.

use crate::block::{Block, BlockBuilder, fill_line_envelopes, take_seed};
use crate::config::AnalysisOptions;
use crate::error::{AnalysisWarning, WarningCode};
use crate::font::{FontId, FontRegistry};
use crate::geometry::{EMPTY_RECT, linear_delta, transform_delta, transform_point};
use crate::line::{Line, fill_word_envelopes};
use crate::norm::{is_ltr, is_rtl};
use crate::order::sort_reading_order;
use crate::pool::Pool;
use crate::rotation::{ROTATIONS, Rotation};
use crate::select::Selection;
use crate::word::Word;

/// Snapshot of the graphics state accompanying one glyph event.
#[derive(Debug, Clone)]
pub struct GlyphState {
    pub font: FontId,
    /// Transformed font size (text-space size through the text matrix).
    pub font_size: f64,
    /// Character spacing (Tc), in unscaled text-space units.
    pub char_spacing: f64,
    /// Word spacing (Tw), applied to single-byte code 0x20.
    pub word_spacing: f64,
    /// Horizontal scaling (Tz) as a fraction.
    pub h_scaling: f64,
    /// Linear part of the text matrix (text space to user space).
    pub text_mat: [f64; 4],
    /// User space to device space transform.
    pub ctm: [f64; 6],
    /// Font transformation matrix; its signs decide the word rotation.
    pub font_mat: [f64; 4],
    /// Font ascent as a fraction of the font size.
    pub ascent: f64,
    /// Font descent as a fraction of the font size (negative).
    pub descent: f64,
}

/// One glyph-placement event from the content stream.
#[derive(Debug, Clone)]
pub struct GlyphEvent {
    /// Pre-transform (user space) position of the glyph origin.
    pub x: f64,
    pub y: f64,
    /// Pre-transform advance.
    pub dx: f64,
    pub dy: f64,
    /// Glyph origin offset (vertical writing); carried but unused here.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Character code from the content stream.
    pub code: u32,
    /// Byte length of the character in the content stream.
    pub byte_len: usize,
    /// Mapped Unicode values; may contain raw surrogate halves.
    pub unicode: Vec<u32>,
    pub state: GlyphState,
}

/// Accumulates glyph events for one page (the ingesting phase).
pub struct TextPageBuilder {
    opts: AnalysisOptions,
    page_width: f64,
    page_height: f64,
    fonts: FontRegistry,
    pools: [Pool; 4],
    cur_word: Option<Word>,
    char_pos: usize,
    n_tiny: u32,
    tiny_warned: bool,
    last_char_overlap: bool,
    nest: u32,
    bmc_level: u32,
    actual_text: Option<String>,
    new_span: bool,
    span_x: f64,
    span_y: f64,
    span_dx: f64,
    span_dy: f64,
    warnings: Vec<AnalysisWarning>,
}

impl TextPageBuilder {
    pub fn new(page_width: f64, page_height: f64, opts: AnalysisOptions) -> Self {
        let step = opts.pool_step;
        Self {
            opts,
            page_width,
            page_height,
            fonts: FontRegistry::new(),
            pools: [
                Pool::new(step),
                Pool::new(step),
                Pool::new(step),
                Pool::new(step),
            ],
            cur_word: None,
            char_pos: 0,
            n_tiny: 0,
            tiny_warned: false,
            last_char_overlap: false,
            nest: 0,
            bmc_level: 0,
            actual_text: None,
            new_span: false,
            span_x: 0.0,
            span_y: 0.0,
            span_dx: 0.0,
            span_dy: 0.0,
            warnings: Vec::new(),
        }
    }

    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    /// Intern a font for use in subsequent glyph states.
    pub fn register_font(&mut self, key: &str) -> FontId {
        self.fonts.register(key)
    }

    /// Record a diagnostic line.
    pub fn warn(&mut self, warning: AnalysisWarning) {
        self.warnings.push(warning);
    }

    /// Entry point for every glyph event.
    ///
    /// Inside an ActualText span glyphs only contribute their union box;
    /// the replacement text is emitted when the span closes.
    pub fn add_glyph(&mut self, ev: &GlyphEvent) {
        if self.bmc_level == 0 {
            self.add_char(ev);
        } else if self.new_span {
            self.span_x = ev.x;
            self.span_y = ev.y;
            self.span_dx = ev.dx;
            self.span_dy = ev.dy;
            self.new_span = false;
        } else {
            if ev.x < self.span_x {
                self.span_x = ev.x;
            }
            if ev.y < self.span_y {
                self.span_y = ev.y;
            }
            if ev.x + ev.dx > self.span_x + self.span_dx {
                self.span_dx = ev.x + ev.dx - self.span_x;
            }
            if ev.y + ev.dy > self.span_y + self.span_dy {
                self.span_dy = ev.y + ev.dy - self.span_y;
            }
        }
    }

    /// Marked-content begin. Only the outermost span with an ActualText
    /// string opens an override; nesting inside one is counted.
    pub fn begin_marked_content(&mut self, actual_text: Option<String>) {
        if self.bmc_level > 0 {
            self.bmc_level += 1;
            return;
        }
        if let Some(text) = actual_text {
            self.actual_text = Some(text);
            self.bmc_level = 1;
            self.new_span = true;
        }
    }

    /// Marked-content end. Closing the outermost span emits a synthetic
    /// glyph run carrying the ActualText string over the span's box.
    /// `cur_x`/`cur_y` is the current text position, used when the span
    /// contained no glyphs.
    pub fn end_marked_content(&mut self, state: &GlyphState, cur_x: f64, cur_y: f64) {
        if self.bmc_level == 0 {
            return;
        }
        self.bmc_level -= 1;
        if self.bmc_level > 0 {
            return;
        }
        if self.new_span {
            self.span_x = cur_x;
            self.span_y = cur_y;
            self.span_dx = 0.0;
            self.span_dy = 0.0;
        }
        if let Some(text) = self.actual_text.take() {
            let ev = GlyphEvent {
                x: self.span_x,
                y: self.span_y,
                dx: self.span_dx,
                dy: self.span_dy,
                origin_x: 0.0,
                origin_y: 0.0,
                code: 0,
                byte_len: 1,
                unicode: text.chars().map(|c| c as u32).collect(),
                state: state.clone(),
            };
            self.add_char(&ev);
        }
    }

    fn begin_word(&mut self, state: &GlyphState, x: f64, y: f64) {
        // Type 3 glyph procedures can themselves draw text; nested word
        // opens are counted and matched by end_word.
        if self.cur_word.is_some() {
            self.nest += 1;
            return;
        }
        let rot = Rotation::from_font_matrix(&state.font_mat);
        let (dx_pt, dy_pt) = transform_point(&state.ctm, x, y);
        self.cur_word = Some(Word::open(
            rot,
            dx_pt,
            dy_pt,
            state.ascent * state.font_size,
            state.descent * state.font_size,
            self.char_pos,
            state.font,
            state.font_size,
        ));
    }

    fn end_word(&mut self) {
        if self.nest > 0 {
            self.nest -= 1;
            return;
        }
        if let Some(mut word) = self.cur_word.take() {
            // zero-length words have no valid extent
            if word.is_empty() {
                return;
            }
            word.seal();
            self.pools[word.rot.index()].add_word(word);
        }
    }

    fn add_char(&mut self, ev: &GlyphEvent) {
        let state = &ev.state;

        // remove char spacing (and word spacing for the space code) from
        // the advance before any geometry is derived from it
        let mut sp = state.char_spacing;
        if ev.code == 0x20 {
            sp += state.word_spacing;
        }
        let (dx2, dy2) = linear_delta(&state.text_mat, sp * state.h_scaling, 0.0);
        let dx = ev.dx - dx2;
        let dy = ev.dy - dy2;
        let (mut w1, mut h1) = transform_delta(&state.ctm, dx, dy);
        let (mut x1, mut y1) = transform_point(&state.ctm, ev.x, ev.y);

        // reject glyphs outside the page or with nonsensical sizes; the
        // byte position still advances so upstream offsets stay correct
        if x1 + w1 < 0.0
            || x1 > self.page_width
            || y1 + h1 < 0.0
            || y1 > self.page_height
            || w1 > self.page_width
            || h1 > self.page_height
        {
            self.char_pos += ev.byte_len;
            return;
        }

        if !self.opts.keep_tiny_chars && w1.abs() < 3.0 && h1.abs() < 3.0 {
            self.n_tiny += 1;
            if self.n_tiny > self.opts.tiny_char_quota {
                if !self.tiny_warned {
                    self.tiny_warned = true;
                    self.warnings.push(AnalysisWarning::new(
                        WarningCode::TinyCharLimit,
                        "tiny glyph quota exceeded; dropping further tiny glyphs",
                    ));
                }
                self.char_pos += ev.byte_len;
                return;
            }
        }

        // a space never enters a word; it flushes the current one and
        // its bytes are charged to the flushed word
        if ev.unicode.len() == 1 && ev.unicode[0] == 0x20 {
            if let Some(word) = &mut self.cur_word {
                word.char_len += ev.byte_len;
            }
            self.char_pos += ev.byte_len;
            self.end_word();
            return;
        }

        // word-boundary checks against the current word's last glyph
        let boundary = match &self.cur_word {
            Some(word) if word.len() > 0 => {
                let base = word.rot.secondary(x1, y1);
                let pri = word.rot.primary(x1, y1);
                let gap = word.rot.sign() * (pri - word.rot.trail(&word.rect));
                let delta = word.rot.sign() * (pri - word.edges[word.len() - 1]);
                let overlap = delta.abs() < self.opts.dup_max_pri_delta * word.font_size
                    && (base - word.base).abs() < self.opts.dup_max_sec_delta * word.font_size;
                let brk = overlap
                    || self.last_char_overlap
                    || gap < -self.opts.min_dup_break_overlap * word.font_size
                    || gap > self.opts.min_word_break_space * word.font_size
                    || (base - word.base).abs() > 0.5
                    || state.font_size != word.font_size;
                Some((overlap, brk))
            }
            _ => None,
        };
        match boundary {
            Some((overlap, brk)) => {
                if brk {
                    self.end_word();
                }
                self.last_char_overlap = overlap;
            }
            None => self.last_char_overlap = false,
        }

        if !ev.unicode.is_empty() {
            if self.cur_word.is_none() {
                self.begin_word(state, ev.x, ev.y);
            }

            // transforms can run text against its own rotation; reopen
            // the word at the far end with flipped deltas so glyph edges
            // stay ordered along the primary axis
            let rot = self.cur_word.as_ref().map(|w| w.rot).unwrap_or(Rotation::R0);
            let reversed = match rot {
                Rotation::R0 => w1 < 0.0,
                Rotation::R90 => h1 < 0.0,
                Rotation::R180 => w1 > 0.0,
                Rotation::R270 => h1 > 0.0,
            };
            if reversed {
                self.end_word();
                self.begin_word(state, ev.x + ev.dx, ev.y + ev.dy);
                x1 += w1;
                y1 += h1;
                w1 = -w1;
                h1 = -h1;
            }

            let n = ev.unicode.len();
            w1 /= n as f64;
            h1 /= n as f64;
            if let Some(word) = &mut self.cur_word {
                let mut i = 0usize;
                while i < n {
                    let u = ev.unicode[i];
                    let c = if (0xd800..0xdc00).contains(&u) {
                        if i + 1 < n && (0xdc00..0xe000).contains(&ev.unicode[i + 1]) {
                            let low = ev.unicode[i + 1];
                            i += 1;
                            let combined = (((u & 0x3ff) << 10) | (low & 0x3ff)) + 0x10000;
                            char::from_u32(combined).unwrap_or('\u{fffd}')
                        } else {
                            '\u{fffd}'
                        }
                    } else if (0xdc00..0xe000).contains(&u) {
                        '\u{fffd}'
                    } else {
                        char::from_u32(u).unwrap_or('\u{fffd}')
                    };
                    word.push_glyph(x1 + i as f64 * w1, y1 + i as f64 * h1, w1, h1, c);
                    i += 1;
                }
            }
        }

        if let Some(word) = &mut self.cur_word {
            word.char_len += ev.byte_len;
        }
        self.char_pos += ev.byte_len;
    }

    /// Close the event stream: coalesce pools into blocks, sort into
    /// reading order and freeze the arenas.
    pub fn finish(mut self) -> TextPage {
        self.end_word();

        let opts = self.opts.clone();
        let mut builders: Vec<BlockBuilder> = Vec::new();
        let mut counts = [0usize; 4];

        for rot in ROTATIONS {
            let pool = &mut self.pools[rot.index()];
            let mut scan_from = pool.min_idx();
            while let Some(seed) = take_seed(pool, &mut scan_from) {
                let mut blk = BlockBuilder::new(seed, &opts);
                blk.expand(pool, &opts);
                blk.coalesce(&opts);
                counts[rot.index()] += blk.char_count;
                builders.push(blk);
            }
            if !pool.is_empty() {
                self.warnings.push(AnalysisWarning::new(
                    WarningCode::WordsLeftInPool,
                    format!("{} words left in pool", pool.len()),
                ));
            }
        }

        let mut primary_rot = Rotation::R0;
        for rot in ROTATIONS {
            if counts[rot.index()] > counts[primary_rot.index()] {
                primary_rot = rot;
            }
        }

        let mut lr_count = 0i64;
        for blk in &builders {
            for line in &blk.lines {
                for word in &line.words {
                    for &c in &word.text {
                        if is_ltr(c) {
                            lr_count += 1;
                        } else if is_rtl(c) {
                            lr_count -= 1;
                        }
                    }
                }
            }
        }
        let primary_lr = lr_count >= 0;

        crate::table::detect_tables(&mut builders, primary_lr, &opts);
        let builders = sort_reading_order(
            builders,
            primary_rot,
            primary_lr,
            self.page_width,
            self.page_height,
        );

        // freeze into flat arenas in reading order
        let mut words: Vec<Word> = Vec::new();
        let mut lines: Vec<Line> = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();
        let mut index = 0usize;

        for mut builder in builders {
            let line_start = lines.len();
            let block_id = blocks.len();
            let taken_lines = std::mem::take(&mut builder.lines);
            for line_builder in taken_lines {
                let word_start = words.len();
                let line_id = lines.len();
                for mut word in line_builder.words {
                    word.line = line_id;
                    word.index = index;
                    index += word.len() + usize::from(word.space_after);
                    words.push(word);
                }
                lines.push(Line {
                    rect: line_builder.rect,
                    rot: line_builder.rot,
                    base: line_builder.base,
                    words: word_start..words.len(),
                    block: block_id,
                    char_count: line_builder.char_count,
                    pre: EMPTY_RECT,
                    post: EMPTY_RECT,
                });
            }
            let mut block = builder.seal();
            block.lines = line_start..lines.len();
            blocks.push(block);
        }

        for line in &lines {
            fill_word_envelopes(&mut words[line.words.clone()]);
        }
        for block in &blocks {
            fill_line_envelopes(&mut lines[block.lines.clone()]);
        }
        let mut run = EMPTY_RECT;
        for block in blocks.iter_mut() {
            run.absorb(&block.rect);
            block.pre = run;
        }
        run = EMPTY_RECT;
        for block in blocks.iter_mut().rev() {
            run.absorb(&block.rect);
            block.post = run;
        }

        TextPage {
            page_width: self.page_width,
            page_height: self.page_height,
            fonts: self.fonts,
            words,
            lines,
            blocks,
            primary_rot,
            primary_lr,
            total_glyphs: index,
            warnings: self.warnings,
            selection: None,
        }
    }
}

/// A fully analyzed page (the queryable phase).
///
/// Owns every word, line and block; structures are never shared between
/// pages. Queries on an empty page return empty results.
#[derive(Debug)]
pub struct TextPage {
    pub(crate) page_width: f64,
    pub(crate) page_height: f64,
    fonts: FontRegistry,
    pub(crate) words: Vec<Word>,
    pub(crate) lines: Vec<Line>,
    pub(crate) blocks: Vec<Block>,
    primary_rot: Rotation,
    primary_lr: bool,
    total_glyphs: usize,
    warnings: Vec<AnalysisWarning>,
    pub(crate) selection: Option<Selection>,
}

impl TextPage {
    pub fn page_width(&self) -> f64 {
        self.page_width
    }

    pub fn page_height(&self) -> f64 {
        self.page_height
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Rotation carrying the most glyphs on this page.
    pub fn primary_rot(&self) -> Rotation {
        self.primary_rot
    }

    /// Whether strong left-to-right characters outnumber right-to-left.
    pub fn primary_lr(&self) -> bool {
        self.primary_lr
    }

    /// Length of the flattened glyph stream (glyphs plus inter-word spaces).
    pub fn total_glyphs(&self) -> usize {
        self.total_glyphs
    }

    pub fn warnings(&self) -> &[AnalysisWarning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The whole page's text in reading order: equivalent to selecting
    /// from the first glyph to past the last glyph.
    pub fn page_text(&self, normalize: bool) -> String {
        if self.words.is_empty() {
            return String::new();
        }
        let last = self.words.len() - 1;
        let e_idx = self.words[last].len() - 1;
        self.text_between(0, 0, last, e_idx, normalize)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Identity device transform: positions are already device
    /// coordinates; the font matrix encodes upright 10pt text.
    pub fn plain_state(font: FontId, font_size: f64) -> GlyphState {
        GlyphState {
            font,
            font_size,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            text_mat: [1.0, 0.0, 0.0, 1.0],
            ctm: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
            font_mat: [font_size, 0.0, 0.0, -font_size],
            ascent: 0.95,
            descent: -0.35,
        }
    }

    pub fn glyph(c: char, x: f64, y: f64, dx: f64, state: &GlyphState) -> GlyphEvent {
        GlyphEvent {
            x,
            y,
            dx,
            dy: 0.0,
            origin_x: 0.0,
            origin_y: 0.0,
            code: c as u32,
            byte_len: 1,
            unicode: vec![c as u32],
            state: state.clone(),
        }
    }

    pub fn space(x: f64, y: f64, dx: f64, state: &GlyphState) -> GlyphEvent {
        glyph(' ', x, y, dx, state)
    }

    /// Feed a line of text with 6pt glyph advances starting at (x, y).
    pub fn feed_text(builder: &mut TextPageBuilder, text: &str, x: f64, y: f64, state: &GlyphState) {
        let mut cx = x;
        for c in text.chars() {
            if c == ' ' {
                builder.add_glyph(&space(cx, y, 6.0, state));
            } else {
                builder.add_glyph(&glyph(c, cx, y, 6.0, state));
            }
            cx += 6.0;
        }
    }

    pub fn build_page(texts: &[(&str, f64, f64)]) -> TextPage {
        let mut builder = TextPageBuilder::new(600.0, 800.0, AnalysisOptions::default());
        let font = builder.register_font("F1");
        let state = plain_state(font, 10.0);
        for &(text, x, y) in texts {
            feed_text(&mut builder, text, x, y, &state);
        }
        builder.finish()
    }
}
