//! Graphics and text state for content-stream interpretation.
//!
//! Tracks the CTM stack and the text/line matrices plus the text
//! parameters (Tc, Tw, Tz, TL, Ts, Tf). Coordinates handed to the
//! analysis core are *user space* (after the text matrix); the CTM maps
//! user space to device space and travels alongside each glyph event.

/// Multiply two affine matrices: apply `a` first, then `b`.
pub fn mat_mul(a: &[f64; 6], b: &[f64; 6]) -> [f64; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

pub const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn translation(tx: f64, ty: f64) -> [f64; 6] {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Interpreter state: CTM stack plus the text object state.
#[derive(Debug, Clone)]
pub struct TextState {
    /// Current transformation matrix (user space to device space).
    pub ctm: [f64; 6],
    ctm_stack: Vec<[f64; 6]>,
    /// Current font resource name (Tf).
    pub font_name: Option<String>,
    /// Nominal font size (Tf).
    pub font_size: f64,
    /// Character spacing (Tc).
    pub char_spacing: f64,
    /// Word spacing (Tw).
    pub word_spacing: f64,
    /// Horizontal scaling (Tz) as a fraction; 1.0 = 100%.
    pub h_scaling: f64,
    /// Leading (TL).
    pub leading: f64,
    /// Text rise (Ts).
    pub rise: f64,
    tm: [f64; 6],
    lm: [f64; 6],
}

impl TextState {
    pub fn new(base_ctm: [f64; 6]) -> Self {
        Self {
            ctm: base_ctm,
            ctm_stack: Vec::new(),
            font_name: None,
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            tm: IDENTITY,
            lm: IDENTITY,
        }
    }

    pub fn save(&mut self) {
        self.ctm_stack.push(self.ctm);
    }

    pub fn restore(&mut self) {
        if let Some(m) = self.ctm_stack.pop() {
            self.ctm = m;
        }
    }

    /// `cm`: prepend a matrix to the CTM.
    pub fn concat(&mut self, m: &[f64; 6]) {
        self.ctm = mat_mul(m, &self.ctm);
    }

    /// `BT`: reset text and line matrices.
    pub fn begin_text(&mut self) {
        self.tm = IDENTITY;
        self.lm = IDENTITY;
    }

    /// `ET`.
    pub fn end_text(&mut self) {
        self.tm = IDENTITY;
        self.lm = IDENTITY;
    }

    /// `Tf`.
    pub fn set_font(&mut self, name: String, size: f64) {
        self.font_name = Some(name);
        self.font_size = size;
    }

    /// `Td`: move to the start of the next line, offset from the
    /// current line start.
    pub fn text_move(&mut self, tx: f64, ty: f64) {
        self.lm = mat_mul(&translation(tx, ty), &self.lm);
        self.tm = self.lm;
    }

    /// `TD`: like `Td` but also sets the leading.
    pub fn text_move_set_leading(&mut self, tx: f64, ty: f64) {
        self.leading = -ty;
        self.text_move(tx, ty);
    }

    /// `Tm`: set the text and line matrices outright.
    pub fn set_text_matrix(&mut self, m: [f64; 6]) {
        self.tm = m;
        self.lm = m;
    }

    /// `T*`: next line using the current leading.
    pub fn next_line(&mut self) {
        self.text_move(0.0, -self.leading);
    }

    /// Linear part of the text matrix.
    pub fn text_linear(&self) -> [f64; 4] {
        [self.tm[0], self.tm[1], self.tm[2], self.tm[3]]
    }

    /// Current glyph origin in user space, text rise applied.
    pub fn glyph_origin(&self) -> (f64, f64) {
        (
            self.tm[2] * self.rise + self.tm[4],
            self.tm[3] * self.rise + self.tm[5],
        )
    }

    /// Map a text-space advance through the text matrix.
    pub fn text_delta(&self, tx: f64, ty: f64) -> (f64, f64) {
        (
            self.tm[0] * tx + self.tm[2] * ty,
            self.tm[1] * tx + self.tm[3] * ty,
        )
    }

    /// Advance the text position by a text-space displacement.
    pub fn advance(&mut self, tx: f64) {
        self.tm = mat_mul(&translation(tx, 0.0), &self.tm);
    }

    /// Device-space font size: the length of the text-space vector
    /// (0, font_size) pushed through the text matrix and the CTM.
    pub fn transformed_font_size(&self) -> f64 {
        let (ux, uy) = self.text_delta(0.0, self.font_size);
        let dx = self.ctm[0] * ux + self.ctm[2] * uy;
        let dy = self.ctm[1] * ux + self.ctm[3] * uy;
        (dx * dx + dy * dy).sqrt()
    }

    /// Font transformation matrix: the linear part of
    /// scale(size * h_scaling, size) x Tm x CTM. Its signs decide the
    /// word rotation in the analysis core.
    pub fn font_trans_mat(&self) -> [f64; 4] {
        let sx = self.font_size * self.h_scaling;
        let sy = self.font_size;
        let a = [sx * self.tm[0], sx * self.tm[1], sy * self.tm[2], sy * self.tm[3]];
        [
            a[0] * self.ctm[0] + a[1] * self.ctm[2],
            a[0] * self.ctm[1] + a[1] * self.ctm[3],
            a[2] * self.ctm[0] + a[3] * self.ctm[2],
            a[2] * self.ctm[1] + a[3] * self.ctm[3],
        ]
    }
}
