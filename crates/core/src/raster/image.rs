//! Dynamically-depthed multi-band pixel buffers

use super::{PixelExtent, RasterElement};
use crate::error::{Error, Result};
use ndarray::{s, Array3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on a single buffer allocation. Requests beyond it fail with
/// [`Error::AllocationTooLarge`] instead of attempting the allocation.
const MAX_BUFFER_BYTES: usize = 1 << 33;

/// Per-sample storage depth of an image buffer.
///
/// Covers the depths the GDAL boundary can deliver without scaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageDepth {
    U8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ImageDepth {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            ImageDepth::U8 => 1,
            ImageDepth::U16 | ImageDepth::I16 => 2,
            ImageDepth::U32 | ImageDepth::I32 | ImageDepth::F32 => 4,
            ImageDepth::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ImageDepth::F32 | ImageDepth::F64)
    }

    /// Default no-data sentinel for this depth (see
    /// [`RasterElement::default_nodata`]).
    pub fn default_no_data(&self) -> f64 {
        match self {
            ImageDepth::U8 => u8::default_nodata(),
            ImageDepth::U16 => u16::default_nodata(),
            ImageDepth::I16 => i16::default_nodata(),
            ImageDepth::U32 => u32::default_nodata(),
            ImageDepth::I32 => i32::default_nodata(),
            ImageDepth::F32 => f32::default_nodata(),
            ImageDepth::F64 => f64::default_nodata(),
        }
    }
}

impl fmt::Display for ImageDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageDepth::U8 => "u8",
            ImageDepth::U16 => "u16",
            ImageDepth::I16 => "i16",
            ImageDepth::U32 => "u32",
            ImageDepth::I32 => "i32",
            ImageDepth::F32 => "f32",
            ImageDepth::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// An owned multi-band pixel buffer with run-time depth.
///
/// Storage is band-sequential: `Array3` with shape `(bands, rows, cols)`.
/// Depth dispatch stays inside this module; callers work with [`ImageDepth`]
/// and `f64` values at the API surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    U8(Array3<u8>),
    U16(Array3<u16>),
    I16(Array3<i16>),
    U32(Array3<u32>),
    I32(Array3<i32>),
    F32(Array3<f32>),
    F64(Array3<f64>),
}

macro_rules! with_image {
    ($image:expr, $arr:ident => $body:expr) => {
        match $image {
            ImageData::U8($arr) => $body,
            ImageData::U16($arr) => $body,
            ImageData::I16($arr) => $body,
            ImageData::U32($arr) => $body,
            ImageData::I32($arr) => $body,
            ImageData::F32($arr) => $body,
            ImageData::F64($arr) => $body,
        }
    };
}

macro_rules! for_depth {
    ($depth:expr, $t:ident => $body:expr) => {
        match $depth {
            ImageDepth::U8 => {
                type $t = u8;
                ImageData::U8($body)
            }
            ImageDepth::U16 => {
                type $t = u16;
                ImageData::U16($body)
            }
            ImageDepth::I16 => {
                type $t = i16;
                ImageData::I16($body)
            }
            ImageDepth::U32 => {
                type $t = u32;
                ImageData::U32($body)
            }
            ImageDepth::I32 => {
                type $t = i32;
                ImageData::I32($body)
            }
            ImageDepth::F32 => {
                type $t = f32;
                ImageData::F32($body)
            }
            ImageDepth::F64 => {
                type $t = f64;
                ImageData::F64($body)
            }
        }
    };
}

// Shared with mask.rs, which dispatches over the same variants.
pub(crate) use with_image;

impl ImageData {
    /// Allocate a `bands × rows × cols` buffer filled with `fill`.
    ///
    /// `fill` is cast into the target depth, falling back to the depth's
    /// default sentinel when it is not representable. Fails without
    /// allocating when the requested size overflows or exceeds the buffer
    /// cap.
    pub fn filled(
        depth: ImageDepth,
        bands: usize,
        rows: usize,
        cols: usize,
        fill: f64,
    ) -> Result<ImageData> {
        let bytes = bands
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .and_then(|n| n.checked_mul(depth.bytes_per_sample()));
        match bytes {
            Some(b) if b <= MAX_BUFFER_BYTES => {}
            _ => {
                return Err(Error::AllocationTooLarge {
                    bands,
                    width: cols,
                    height: rows,
                })
            }
        }
        Ok(
            for_depth!(depth, T => Array3::<T>::from_elem((bands, rows, cols), T::from_f64_or_default(fill))),
        )
    }

    pub fn depth(&self) -> ImageDepth {
        match self {
            ImageData::U8(_) => ImageDepth::U8,
            ImageData::U16(_) => ImageDepth::U16,
            ImageData::I16(_) => ImageDepth::I16,
            ImageData::U32(_) => ImageDepth::U32,
            ImageData::I32(_) => ImageDepth::I32,
            ImageData::F32(_) => ImageDepth::F32,
            ImageData::F64(_) => ImageDepth::F64,
        }
    }

    pub fn bands(&self) -> usize {
        with_image!(self, a => a.shape()[0])
    }

    pub fn rows(&self) -> usize {
        with_image!(self, a => a.shape()[1])
    }

    pub fn cols(&self) -> usize {
        with_image!(self, a => a.shape()[2])
    }

    /// `(bands, rows, cols)`
    pub fn shape(&self) -> (usize, usize, usize) {
        let s = with_image!(self, a => a.shape().to_vec());
        (s[0], s[1], s[2])
    }

    pub fn is_empty(&self) -> bool {
        let (bands, rows, cols) = self.shape();
        bands == 0 || rows == 0 || cols == 0
    }

    /// The buffer's own pixel extent, anchored at the origin.
    pub fn extent(&self) -> PixelExtent {
        PixelExtent::with_size(self.cols(), self.rows())
    }

    /// All band values at a pixel, cast to `f64`.
    pub fn values_at(&self, row: usize, col: usize) -> Option<Vec<f64>> {
        if row >= self.rows() || col >= self.cols() {
            return None;
        }
        Some(with_image!(self, a => {
            (0..a.shape()[0]).map(|b| a[[b, row, col]].to_f64()).collect()
        }))
    }

    /// Copy `src_window` (in `src`'s pixel coordinates) into this buffer at
    /// `(dst_col, dst_row)`.
    ///
    /// Both buffers must share depth and band count, and both rectangles
    /// must be in bounds.
    pub fn paste_from(
        &mut self,
        src: &ImageData,
        src_window: &PixelExtent,
        dst_col: usize,
        dst_row: usize,
    ) -> Result<()> {
        if src.bands() != self.bands() {
            return Err(Error::BandCountMismatch {
                expected: self.bands(),
                actual: src.bands(),
            });
        }
        let src_ok = src_window.x >= 0
            && src_window.y >= 0
            && src_window.right() <= src.cols() as i64
            && src_window.bottom() <= src.rows() as i64;
        let dst_ok = dst_col + src_window.width <= self.cols()
            && dst_row + src_window.height <= self.rows();
        if !src_ok || !dst_ok {
            return Err(Error::WindowOutOfBounds {
                x: src_window.x,
                y: src_window.y,
                width: src_window.width,
                height: src_window.height,
            });
        }

        let (expected, actual) = (self.depth(), src.depth());
        let (sc, sr) = (src_window.x as usize, src_window.y as usize);
        let (w, h) = (src_window.width, src_window.height);
        match (&mut *self, src) {
            (ImageData::U8(d), ImageData::U8(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::U16(d), ImageData::U16(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::I16(d), ImageData::I16(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::U32(d), ImageData::U32(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::I32(d), ImageData::I32(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::F32(d), ImageData::F32(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            (ImageData::F64(d), ImageData::F64(s)) => copy_window(d, s, sc, sr, w, h, dst_col, dst_row),
            _ => return Err(Error::DepthMismatch { expected, actual }),
        }
        Ok(())
    }

    /// Extract `roi` from this buffer, padding with `fill`.
    ///
    /// The result always has exactly `roi.width × roi.height` pixels: the
    /// part of `roi` overlapping this buffer is copied, everything else is
    /// `fill`. A completely disjoint `roi` yields an all-`fill` buffer.
    pub fn window_or_fill(&self, roi: &PixelExtent, fill: f64) -> Result<ImageData> {
        let mut out = ImageData::filled(self.depth(), self.bands(), roi.height, roi.width, fill)?;
        if let Some(isect) = self.extent().intersection(roi) {
            out.paste_from(
                self,
                &isect,
                (isect.x - roi.x) as usize,
                (isect.y - roi.y) as usize,
            )?;
        }
        Ok(out)
    }
}

fn copy_window<T: Copy>(
    dst: &mut Array3<T>,
    src: &Array3<T>,
    src_col: usize,
    src_row: usize,
    width: usize,
    height: usize,
    dst_col: usize,
    dst_row: usize,
) {
    dst.slice_mut(s![
        ..,
        dst_row..dst_row + height,
        dst_col..dst_col + width
    ])
    .assign(&src.slice(s![
        ..,
        src_row..src_row + height,
        src_col..src_col + width
    ]));
}

macro_rules! impl_from_array {
    ($t:ty, $variant:ident) => {
        impl From<Array3<$t>> for ImageData {
            fn from(data: Array3<$t>) -> Self {
                ImageData::$variant(data)
            }
        }
    };
}

impl_from_array!(u8, U8);
impl_from_array!(u16, U16);
impl_from_array!(i16, I16);
impl_from_array!(u32, U32);
impl_from_array!(i32, I32);
impl_from_array!(f32, F32);
impl_from_array!(f64, F64);

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(bands: usize, rows: usize, cols: usize) -> ImageData {
        ImageData::from(Array3::from_shape_fn((bands, rows, cols), |(b, r, c)| {
            (b * 10_000 + r * 100 + c) as u16
        }))
    }

    #[test]
    fn filled_casts_fill_value() {
        let img = ImageData::filled(ImageDepth::U16, 2, 3, 4, 300.0).unwrap();
        assert_eq!(img.shape(), (2, 3, 4));
        assert_eq!(img.values_at(2, 3), Some(vec![300.0, 300.0]));
    }

    #[test]
    fn filled_unrepresentable_fill_uses_depth_default() {
        let img = ImageData::filled(ImageDepth::U8, 1, 1, 1, -32000.0).unwrap();
        assert_eq!(img.values_at(0, 0), Some(vec![255.0]));
    }

    #[test]
    fn filled_rejects_overflowing_request() {
        let err = ImageData::filled(ImageDepth::F64, usize::MAX, 2, 2, 0.0).unwrap_err();
        assert!(matches!(err, Error::AllocationTooLarge { .. }));
    }

    #[test]
    fn empty_buffer() {
        let img = ImageData::filled(ImageDepth::F32, 3, 0, 5, 0.0).unwrap();
        assert!(img.is_empty());
        assert_eq!(img.values_at(0, 0), None);
    }

    #[test]
    fn window_inside() {
        let img = ramp(2, 10, 10);
        let out = img
            .window_or_fill(&PixelExtent::new(2, 3, 4, 5), 0.0)
            .unwrap();
        assert_eq!(out.shape(), (2, 5, 4));
        // (row 3, col 2) of the source lands at (0, 0).
        assert_eq!(out.values_at(0, 0), Some(vec![302.0, 10302.0]));
        assert_eq!(out.values_at(4, 3), Some(vec![705.0, 10705.0]));
    }

    #[test]
    fn window_disjoint_is_all_fill() {
        let img = ramp(3, 8, 8);
        let out = img
            .window_or_fill(&PixelExtent::new(-50, -50, 4, 4), 65535.0)
            .unwrap();
        assert_eq!(out.shape(), (3, 4, 4));
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(out.values_at(r, c), Some(vec![65535.0; 3]));
            }
        }
    }

    #[test]
    fn window_partial_overlap() {
        let img = ramp(1, 6, 6);
        let out = img
            .window_or_fill(&PixelExtent::new(-2, -2, 4, 4), 65535.0)
            .unwrap();
        // Top-left 2x2 of the request is outside, bottom-right 2x2 maps to
        // source pixels (0,0)..(1,1).
        assert_eq!(out.values_at(0, 0), Some(vec![65535.0]));
        assert_eq!(out.values_at(1, 1), Some(vec![65535.0]));
        assert_eq!(out.values_at(2, 2), Some(vec![0.0]));
        assert_eq!(out.values_at(3, 3), Some(vec![101.0]));
    }

    #[test]
    fn paste_depth_mismatch() {
        let mut dst = ImageData::filled(ImageDepth::F32, 1, 4, 4, 0.0).unwrap();
        let src = ramp(1, 4, 4);
        let err = dst
            .paste_from(&src, &PixelExtent::with_size(2, 2), 0, 0)
            .unwrap_err();
        assert!(matches!(err, Error::DepthMismatch { .. }));
    }

    #[test]
    fn paste_band_mismatch() {
        let mut dst = ImageData::filled(ImageDepth::U16, 2, 4, 4, 0.0).unwrap();
        let src = ramp(3, 4, 4);
        let err = dst
            .paste_from(&src, &PixelExtent::with_size(2, 2), 0, 0)
            .unwrap_err();
        assert!(matches!(err, Error::BandCountMismatch { .. }));
    }
}
