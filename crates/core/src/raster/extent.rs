//! Pixel and world-coordinate extents

use super::GeoTransform;
use serde::{Deserialize, Serialize};

/// Integer rectangle in source pixel coordinates.
///
/// A provider's native extent originates at `(0, 0)`; a requested region of
/// interest may have a negative origin and may lie partially or entirely
/// outside the native extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelExtent {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

impl PixelExtent {
    pub fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Extent anchored at the origin, as exposed by providers.
    pub fn with_size(width: usize, height: usize) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the right-most column.
    pub fn right(&self) -> i64 {
        self.x + self.width as i64
    }

    /// One past the bottom-most row.
    pub fn bottom(&self) -> i64 {
        self.y + self.height as i64
    }

    pub fn contains(&self, col: i64, row: i64) -> bool {
        col >= self.x && col < self.right() && row >= self.y && row < self.bottom()
    }

    /// Intersection with another extent, `None` when they do not overlap.
    pub fn intersection(&self, other: &PixelExtent) -> Option<PixelExtent> {
        if self.is_empty() || other.is_empty() {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right <= x || bottom <= y {
            return None;
        }
        Some(PixelExtent::new(
            x,
            y,
            (right - x) as usize,
            (bottom - y) as usize,
        ))
    }

    /// Pixel count, `None` on overflow.
    pub fn area(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

/// World-coordinate corner polygon of a pixel extent.
///
/// Corners are stored in fixed winding order: top-left, top-right,
/// bottom-right, bottom-left, matching the transform's orientation (for a
/// north-up image the top edge has the maximum Y).
///
/// The corners lie on pixel *edges*: they are the affine image of pixel
/// coordinates `(0,0)`, `(w,0)`, `(w,h)` and `(0,h)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoExtent {
    corners: [(f64, f64); 4],
}

impl GeoExtent {
    pub fn from_corners(corners: [(f64, f64); 4]) -> Self {
        Self { corners }
    }

    /// Corner polygon of `extent` under `transform`.
    ///
    /// `extent` is interpreted on the transform's own pixel grid, so a
    /// provider passes its native extent and gets the full image footprint.
    pub fn from_transform(transform: &GeoTransform, extent: &PixelExtent) -> Self {
        let x0 = extent.x as f64;
        let y0 = extent.y as f64;
        let x1 = extent.right() as f64;
        let y1 = extent.bottom() as f64;
        Self {
            corners: [
                transform.pixel_to_geo_corner(x0, y0),
                transform.pixel_to_geo_corner(x1, y0),
                transform.pixel_to_geo_corner(x1, y1),
                transform.pixel_to_geo_corner(x0, y1),
            ],
        }
    }

    /// The all-zero extent marking a non-georeferenced image.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.corners.iter().all(|&(x, y)| x == 0.0 && y == 0.0)
    }

    pub fn corners(&self) -> &[(f64, f64); 4] {
        &self.corners
    }

    pub fn top_left(&self) -> (f64, f64) {
        self.corners[0]
    }

    pub fn top_right(&self) -> (f64, f64) {
        self.corners[1]
    }

    pub fn bottom_right(&self) -> (f64, f64) {
        self.corners[2]
    }

    pub fn bottom_left(&self) -> (f64, f64) {
        self.corners[3]
    }

    /// Corner-wise comparison within `epsilon`, for float-tolerant tests and
    /// change detection.
    pub fn approx_eq(&self, other: &GeoExtent, epsilon: f64) -> bool {
        self.corners
            .iter()
            .zip(other.corners.iter())
            .all(|(a, b)| (a.0 - b.0).abs() <= epsilon && (a.1 - b.1).abs() <= epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersection_partial() {
        let native = PixelExtent::with_size(2000, 2000);
        let roi = PixelExtent::new(-100, -100, 200, 150);
        let isect = native.intersection(&roi).unwrap();
        assert_eq!(isect, PixelExtent::new(0, 0, 100, 50));
    }

    #[test]
    fn intersection_disjoint() {
        let native = PixelExtent::with_size(100, 100);
        let roi = PixelExtent::new(200, 0, 10, 10);
        assert!(native.intersection(&roi).is_none());
        assert!(native.intersection(&PixelExtent::new(-10, -10, 10, 10)).is_none());
    }

    #[test]
    fn intersection_contained() {
        let native = PixelExtent::with_size(100, 100);
        let roi = PixelExtent::new(10, 20, 30, 40);
        assert_eq!(native.intersection(&roi), Some(roi));
    }

    #[test]
    fn empty_extent_never_intersects() {
        let empty = PixelExtent::new(5, 5, 0, 10);
        let other = PixelExtent::with_size(100, 100);
        assert!(empty.intersection(&other).is_none());
    }

    #[test]
    fn geo_extent_winding() {
        // North-up: Y step negative, so the top edge carries the origin Y.
        let gt = GeoTransform::new(10.0, 50.0, 1.0, -1.0);
        let ge = GeoExtent::from_transform(&gt, &PixelExtent::with_size(20, 30));
        assert_eq!(ge.top_left(), (10.0, 50.0));
        assert_eq!(ge.top_right(), (30.0, 50.0));
        assert_eq!(ge.bottom_right(), (30.0, 20.0));
        assert_eq!(ge.bottom_left(), (10.0, 20.0));
    }

    #[test]
    fn geo_extent_empty_flag() {
        assert!(GeoExtent::empty().is_empty());
        let gt = GeoTransform::new(1.0, 1.0, 1.0, -1.0);
        let ge = GeoExtent::from_transform(&gt, &PixelExtent::with_size(1, 1));
        assert!(!ge.is_empty());
    }
}
