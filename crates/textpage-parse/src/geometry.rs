//! Page geometry: MediaBox, /Rotate and the base device transform.
//!
//! Device space has its origin at the displayed page's top-left corner
//! with y growing downward, at 72 dpi. /Rotate values of 90 and 270
//! swap the displayed width and height.

use textpage_core::geometry::transform_point;

/// Geometry of one page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// MediaBox `[x0, y0, x1, y1]` in PDF user space.
    pub media: [f64; 4],
    /// Normalized /Rotate value: 0, 90, 180 or 270.
    pub rotate: i32,
}

impl PageGeometry {
    pub fn new(media: [f64; 4], rotate: i32) -> Self {
        let rotate = rotate.rem_euclid(360) / 90 * 90;
        Self { media, rotate }
    }

    fn media_width(&self) -> f64 {
        self.media[2] - self.media[0]
    }

    fn media_height(&self) -> f64 {
        self.media[3] - self.media[1]
    }

    /// Displayed page width.
    pub fn width(&self) -> f64 {
        match self.rotate {
            90 | 270 => self.media_height(),
            _ => self.media_width(),
        }
    }

    /// Displayed page height.
    pub fn height(&self) -> f64 {
        match self.rotate {
            90 | 270 => self.media_width(),
            _ => self.media_height(),
        }
    }

    /// PDF user space to device space transform.
    pub fn base_ctm(&self) -> [f64; 6] {
        let [x0, y0, x1, y1] = self.media;
        match self.rotate {
            90 => [0.0, 1.0, 1.0, 0.0, -y0, -x0],
            180 => [-1.0, 0.0, 0.0, 1.0, x1, -y0],
            270 => [0.0, -1.0, -1.0, 0.0, y1, x1],
            _ => [1.0, 0.0, 0.0, -1.0, -x0, y1],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

    #[test]
    fn rotate_normalized() {
        assert_eq!(PageGeometry::new(LETTER, -90).rotate, 270);
        assert_eq!(PageGeometry::new(LETTER, 450).rotate, 90);
        assert_eq!(PageGeometry::new(LETTER, 0).rotate, 0);
    }

    #[test]
    fn dimensions_swap_for_quarter_turns() {
        let g = PageGeometry::new(LETTER, 0);
        assert_eq!((g.width(), g.height()), (612.0, 792.0));
        let g = PageGeometry::new(LETTER, 90);
        assert_eq!((g.width(), g.height()), (792.0, 612.0));
    }

    #[test]
    fn unrotated_ctm_flips_y() {
        let g = PageGeometry::new(LETTER, 0);
        let m = g.base_ctm();
        // PDF bottom-left maps to device bottom-left (0, height)
        assert_eq!(transform_point(&m, 0.0, 0.0), (0.0, 792.0));
        // PDF top-left maps to device origin
        assert_eq!(transform_point(&m, 0.0, 792.0), (0.0, 0.0));
    }

    #[test]
    fn offset_media_box_translates_to_origin() {
        let g = PageGeometry::new([20.0, 30.0, 620.0, 830.0], 0);
        let m = g.base_ctm();
        assert_eq!(transform_point(&m, 20.0, 830.0), (0.0, 0.0));
        assert_eq!(transform_point(&m, 620.0, 30.0), (600.0, 800.0));
    }

    #[test]
    fn rotated_ctms_keep_corners_in_page() {
        for rotate in [0, 90, 180, 270] {
            let g = PageGeometry::new(LETTER, rotate);
            let m = g.base_ctm();
            for (x, y) in [(0.0, 0.0), (612.0, 0.0), (0.0, 792.0), (612.0, 792.0)] {
                let (dx, dy) = transform_point(&m, x, y);
                assert!(
                    dx >= -1e-9 && dx <= g.width() + 1e-9,
                    "rotate {rotate}: x {dx}"
                );
                assert!(
                    dy >= -1e-9 && dy <= g.height() + 1e-9,
                    "rotate {rotate}: y {dy}"
                );
            }
        }
    }
}
