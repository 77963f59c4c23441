/// A 2D point in device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in device coordinates (top-left origin).
///
/// An empty rectangle is represented by `x_min > x_max`; adding the first
/// point or rectangle to an empty one replaces it instead of unioning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

/// The empty rectangle sentinel (`x_min > x_max`).
pub const EMPTY_RECT: Rect = Rect {
    x_min: 0.0,
    y_min: 0.0,
    x_max: -1.0,
    y_max: -1.0,
};

impl Rect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Whether this rectangle is the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.x_min > self.x_max
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Grow this rectangle to cover `other`. An empty receiver becomes `other`.
    pub fn absorb(&mut self, other: &Rect) {
        if self.is_empty() {
            *self = *other;
            return;
        }
        if other.x_min < self.x_min {
            self.x_min = other.x_min;
        }
        if other.y_min < self.y_min {
            self.y_min = other.y_min;
        }
        if other.x_max > self.x_max {
            self.x_max = other.x_max;
        }
        if other.y_max > self.y_max {
            self.y_max = other.y_max;
        }
    }

    /// The union of two rectangles.
    pub fn union(&self, other: &Rect) -> Rect {
        let mut r = *self;
        r.absorb(other);
        r
    }

    /// Whether the x-ranges of the two rectangles overlap (open intervals).
    pub fn overlaps_x(&self, other: &Rect) -> bool {
        self.x_min < other.x_max && self.x_max > other.x_min
    }

    /// Whether the y-ranges of the two rectangles overlap (open intervals).
    pub fn overlaps_y(&self, other: &Rect) -> bool {
        self.y_min < other.y_max && self.y_max > other.y_min
    }

    /// Rectangular (L1 clamp) distance from this rectangle to a point.
    ///
    /// Zero when the point is inside; otherwise the sum per axis of how far
    /// the point lies outside the rectangle's interval.
    pub fn dist(&self, x: f64, y: f64) -> f64 {
        (self.x_min - x).max(0.0)
            + (x - self.x_max).max(0.0)
            + (self.y_min - y).max(0.0)
            + (y - self.y_max).max(0.0)
    }

    /// Scale to fractional page coordinates.
    pub fn scaled(&self, page_width: f64, page_height: f64) -> Rect {
        Rect {
            x_min: self.x_min / page_width,
            y_min: self.y_min / page_height,
            x_max: self.x_max / page_width,
            y_max: self.y_max / page_height,
        }
    }
}

/// Transform a point through a 6-element affine matrix `[a, b, c, d, e, f]`:
/// `(x', y') = (a*x + c*y + e, b*x + d*y + f)`.
pub fn transform_point(m: &[f64; 6], x: f64, y: f64) -> (f64, f64) {
    (m[0] * x + m[2] * y + m[4], m[1] * x + m[3] * y + m[5])
}

/// Transform a delta through the linear part of a 6-element affine matrix.
pub fn transform_delta(m: &[f64; 6], dx: f64, dy: f64) -> (f64, f64) {
    (m[0] * dx + m[2] * dy, m[1] * dx + m[3] * dy)
}

/// Transform a delta through a bare 2x2 linear matrix `[a, b, c, d]`.
pub fn linear_delta(m: &[f64; 4], dx: f64, dy: f64) -> (f64, f64) {
    (m[0] * dx + m[2] * dy, m[1] * dx + m[3] * dy)
}
