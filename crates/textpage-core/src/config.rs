//! Layout analysis options.
//!
//! Every tunable of the coalescing pipeline lives here as an explicit
//! field so that pages on different threads can run with independent
//! settings. Defaults match the values the algorithms were calibrated
//! against; most multipliers are fractions of the current font size.

/// Options for page text analysis.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Baseline band width of one pool bucket, in points.
    pub pool_step: f64,
    /// Inter-character gap (fraction of font size) that starts a new word.
    pub min_word_break_space: f64,
    /// Negative inter-character gap (overlap) that starts a new word.
    pub min_dup_break_overlap: f64,
    /// Max baseline distance between two lines of one block.
    pub max_line_spacing_delta: f64,
    /// Font-size tolerance when absorbing lines above/below a block.
    pub max_block_font_size_delta1: f64,
    /// Font-size tolerance for text overlapping a block.
    pub max_block_font_size_delta2: f64,
    /// Font-size tolerance for text beside a block.
    pub max_block_font_size_delta3: f64,
    /// Max font-size difference between merged words.
    pub max_word_font_size_delta: f64,
    /// Max baseline offset of words within one line (sub/superscripts).
    pub max_intra_line_delta: f64,
    /// Max inter-word gap on one line.
    pub max_word_spacing: f64,
    /// Horizontal slack that still pulls a word into a block.
    pub min_col_spacing1: f64,
    /// Minimum gap between columns.
    pub min_col_spacing2: f64,
    /// Minimum (possibly negative) intra-word character gap.
    pub min_char_spacing: f64,
    /// Intra-word gap threshold when no wide spacing was detected.
    pub max_char_spacing: f64,
    /// Multiplier applied to the detected minimum gap under wide spacing.
    pub max_wide_char_spacing_mul: f64,
    /// Upper bound for the wide-spacing threshold.
    pub max_wide_char_spacing: f64,
    /// Max primary-axis delta for duplicated (fake bold) text.
    pub dup_max_pri_delta: f64,
    /// Max secondary-axis delta for duplicated text.
    pub dup_max_sec_delta: f64,
    /// Accept glyphs smaller than 3x3 device units beyond the quota.
    pub keep_tiny_chars: bool,
    /// Number of tiny glyphs accepted per page when the quota applies.
    pub tiny_char_quota: u32,
    /// Map numeric glyph names (`uniXXXX`, `uXXXX`, digits) to Unicode.
    pub map_numeric_char_names: bool,
    /// Fall back to the character code for unknown glyph names.
    pub map_unknown_char_names: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            pool_step: 4.0,
            min_word_break_space: 0.1,
            min_dup_break_overlap: 0.2,
            max_line_spacing_delta: 1.5,
            max_block_font_size_delta1: 0.05,
            max_block_font_size_delta2: 0.6,
            max_block_font_size_delta3: 0.2,
            max_word_font_size_delta: 0.05,
            max_intra_line_delta: 0.5,
            max_word_spacing: 1.5,
            min_col_spacing1: 0.3,
            min_col_spacing2: 1.0,
            min_char_spacing: -0.2,
            max_char_spacing: 0.03,
            max_wide_char_spacing_mul: 1.3,
            max_wide_char_spacing: 0.4,
            dup_max_pri_delta: 0.1,
            dup_max_sec_delta: 0.2,
            keep_tiny_chars: false,
            tiny_char_quota: 50_000,
            map_numeric_char_names: true,
            map_unknown_char_names: false,
        }
    }
}
