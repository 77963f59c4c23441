use crate::geometry::Rect;

/// One of the four supported 90-degree text orientations.
///
/// Every word, line and block carries exactly one rotation, fixed when the
/// word is created. All geometry that depends on the orientation goes
/// through this type instead of switching on a raw integer: the *primary*
/// axis is the one glyphs advance along, the *secondary* axis carries the
/// baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rotation {
    /// Upright horizontal text.
    R0,
    /// 90 degrees clockwise.
    R90,
    /// Upside down.
    R180,
    /// 270 degrees clockwise.
    R270,
}

pub const ROTATIONS: [Rotation; 4] = [
    Rotation::R0,
    Rotation::R90,
    Rotation::R180,
    Rotation::R270,
];

impl Rotation {
    /// Index 0..=3 for per-rotation tables.
    pub fn index(self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }

    pub fn from_index(i: usize) -> Rotation {
        ROTATIONS[i & 3]
    }

    /// Derive the rotation from the linear font transformation matrix
    /// `[m0, m1, m2, m3]` (text matrix composed with the device transform).
    pub fn from_font_matrix(m: &[f64; 4]) -> Rotation {
        if (m[0] * m[3]).abs() > (m[1] * m[2]).abs() {
            if m[3] < 0.0 {
                Rotation::R0
            } else {
                Rotation::R180
            }
        } else if m[2] > 0.0 {
            Rotation::R90
        } else {
            Rotation::R270
        }
    }

    /// Primary axis is x (true for R0/R180) or y (false for R90/R270).
    pub fn is_horizontal(self) -> bool {
        matches!(self, Rotation::R0 | Rotation::R180)
    }

    /// Direction sign along the primary axis: +1 when glyph edges ascend
    /// (R0, R90), -1 when they descend (R180, R270).
    pub fn sign(self) -> f64 {
        match self {
            Rotation::R0 | Rotation::R90 => 1.0,
            Rotation::R180 | Rotation::R270 => -1.0,
        }
    }

    /// Direction sign along the secondary axis (baseline ordering):
    /// +1 for R0/R270, -1 for R90/R180.
    pub fn sec_sign(self) -> f64 {
        match self {
            Rotation::R0 | Rotation::R270 => 1.0,
            Rotation::R90 | Rotation::R180 => -1.0,
        }
    }

    /// The rotation turned by 180 degrees (used for right-to-left reading).
    pub fn flipped(self) -> Rotation {
        match self {
            Rotation::R0 => Rotation::R180,
            Rotation::R90 => Rotation::R270,
            Rotation::R180 => Rotation::R0,
            Rotation::R270 => Rotation::R90,
        }
    }

    /// Project a point onto the primary axis.
    pub fn primary(self, x: f64, y: f64) -> f64 {
        if self.is_horizontal() { x } else { y }
    }

    /// Project a point onto the secondary axis.
    pub fn secondary(self, x: f64, y: f64) -> f64 {
        if self.is_horizontal() { y } else { x }
    }

    /// Coordinate of a rectangle's reading-start edge along the primary axis.
    pub fn lead(self, r: &Rect) -> f64 {
        match self {
            Rotation::R0 => r.x_min,
            Rotation::R90 => r.y_min,
            Rotation::R180 => r.x_max,
            Rotation::R270 => r.y_max,
        }
    }

    /// Coordinate of a rectangle's reading-end edge along the primary axis.
    pub fn trail(self, r: &Rect) -> f64 {
        match self {
            Rotation::R0 => r.x_max,
            Rotation::R90 => r.y_max,
            Rotation::R180 => r.x_min,
            Rotation::R270 => r.y_min,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_font_matrix_upright() {
        // Standard text under a y-flipping device transform: d < 0.
        assert_eq!(
            Rotation::from_font_matrix(&[12.0, 0.0, 0.0, -12.0]),
            Rotation::R0
        );
    }

    #[test]
    fn from_font_matrix_upside_down() {
        assert_eq!(
            Rotation::from_font_matrix(&[-12.0, 0.0, 0.0, 12.0]),
            Rotation::R180
        );
    }

    #[test]
    fn from_font_matrix_quarter_turns() {
        assert_eq!(
            Rotation::from_font_matrix(&[0.0, 12.0, 12.0, 0.0]),
            Rotation::R90
        );
        assert_eq!(
            Rotation::from_font_matrix(&[0.0, -12.0, -12.0, 0.0]),
            Rotation::R270
        );
    }

    #[test]
    fn signs() {
        assert_eq!(Rotation::R0.sign(), 1.0);
        assert_eq!(Rotation::R90.sign(), 1.0);
        assert_eq!(Rotation::R180.sign(), -1.0);
        assert_eq!(Rotation::R270.sign(), -1.0);

        assert_eq!(Rotation::R0.sec_sign(), 1.0);
        assert_eq!(Rotation::R90.sec_sign(), -1.0);
        assert_eq!(Rotation::R180.sec_sign(), -1.0);
        assert_eq!(Rotation::R270.sec_sign(), 1.0);
    }

    #[test]
    fn lead_and_trail_edges() {
        let r = Rect::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Rotation::R0.lead(&r), 1.0);
        assert_eq!(Rotation::R0.trail(&r), 3.0);
        assert_eq!(Rotation::R90.lead(&r), 2.0);
        assert_eq!(Rotation::R90.trail(&r), 4.0);
        assert_eq!(Rotation::R180.lead(&r), 3.0);
        assert_eq!(Rotation::R180.trail(&r), 1.0);
        assert_eq!(Rotation::R270.lead(&r), 4.0);
        assert_eq!(Rotation::R270.trail(&r), 2.0);
    }

    #[test]
    fn flipped_is_involution() {
        for rot in ROTATIONS {
            assert_eq!(rot.flipped().flipped(), rot);
        }
    }

    #[test]
    fn index_round_trip() {
        for rot in ROTATIONS {
            assert_eq!(Rotation::from_index(rot.index()), rot);
        }
    }
}
