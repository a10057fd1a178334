//! Affine geotransformation between pixel and world coordinates

use serde::{Deserialize, Serialize};

/// Affine transformation coefficients for georeferencing rasters.
///
/// Maps pixel coordinates (col, row) to world coordinates (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// For north-up images `row_rotation` and `col_rotation` are 0 and
/// `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner of the upper-left pixel
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner of the upper-left pixel
    pub origin_y: f64,
    /// Cell size in X direction
    pub pixel_width: f64,
    /// Cell size in Y direction (usually negative)
    pub pixel_height: f64,
    /// Row rotation term (0 for axis-aligned images)
    pub row_rotation: f64,
    /// Column rotation term (0 for axis-aligned images)
    pub col_rotation: f64,
}

impl GeoTransform {
    /// Create a north-up (rotation-free) transform.
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// The identity transform `[0, 1, 0, 0, 0, 1]`, used for images that
    /// carry no georeferencing.
    pub fn identity() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Create from a GDAL-style array
    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`.
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// Convert to a GDAL-style array.
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// World coordinates of a pixel's top-left corner.
    ///
    /// Accepts fractional and negative pixel coordinates.
    pub fn pixel_to_geo_corner(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// World coordinates of a pixel's center.
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_geo_corner(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Convert world coordinates to fractional pixel coordinates.
    ///
    /// Returns NaN coordinates for a degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-10 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// The transform of a sub-window whose top-left pixel corner sits at
    /// `(col, row)` of this transform's pixel grid.
    ///
    /// The new origin is the affine image of the window corner; step and
    /// rotation terms are copied. Because the origin goes through the full
    /// affine map, the result composes exactly, rotation terms included.
    pub fn for_window(&self, col: i64, row: i64) -> Self {
        let (origin_x, origin_y) = self.pixel_to_geo_corner(col as f64, row as f64);
        Self {
            origin_x,
            origin_y,
            ..*self
        }
    }

    /// Whether this is a north-up image (no rotation, negative Y step).
    pub fn is_north_up(&self) -> bool {
        self.row_rotation.abs() < 1e-10
            && self.col_rotation.abs() < 1e-10
            && self.pixel_height < 0.0
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gdal_roundtrip() {
        let coeffs = [1.358847, 1e-4, 0.0, 43.575298, 0.0, -1e-4];
        let gt = GeoTransform::from_gdal(coeffs);
        assert_eq!(gt.to_gdal(), coeffs);
        assert!(gt.is_north_up());
    }

    #[test]
    fn pixel_to_geo_roundtrip() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        let (col, row) = gt.geo_to_pixel(x, y);

        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn window_transform_is_exact_composition() {
        // Rotated transform: re-anchoring must still agree with the parent
        // map at every pixel.
        let gt = GeoTransform {
            origin_x: 10.0,
            origin_y: 20.0,
            pixel_width: 2.0,
            pixel_height: -3.0,
            row_rotation: 0.5,
            col_rotation: -0.25,
        };
        let sub = gt.for_window(7, 11);

        let (px, py) = gt.pixel_to_geo_corner(7.0 + 3.0, 11.0 + 4.0);
        let (sx, sy) = sub.pixel_to_geo_corner(3.0, 4.0);
        assert_relative_eq!(px, sx, epsilon = 1e-12);
        assert_relative_eq!(py, sy, epsilon = 1e-12);
    }

    #[test]
    fn negative_window_origin() {
        let gt = GeoTransform::new(0.0, 0.0, 1.0, -1.0);
        let sub = gt.for_window(-100, -100);
        assert_relative_eq!(sub.origin_x, -100.0);
        assert_relative_eq!(sub.origin_y, 100.0);
    }
}
