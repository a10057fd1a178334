//! No-data mask computation
//!
//! A pixel is valid only when **every** band differs from the sentinel.
//! Filters use the two-output form to keep no-data regions intact through a
//! transform: `filtered = data ⊙ mask + fill ⊙ unmask`.

use super::image::with_image;
use super::{ImageData, RasterElement};
use ndarray::{Array2, Array3};
use num_traits::{One, Zero};

/// Mask value for a valid pixel in the single-band `u8` form.
pub const MASK_VALID: u8 = 255;

/// Compute the single-band validity mask of a multi-band buffer.
///
/// The result has the same pixel grid as `data`: [`MASK_VALID`] where all
/// bands differ from `no_data_value`, `0` elsewhere. An empty input yields
/// an empty mask.
pub fn compute_mask(data: &ImageData, no_data_value: f64) -> Array2<u8> {
    with_image!(data, a => band_and_mask(a, no_data_value))
}

fn band_and_mask<T: RasterElement>(data: &Array3<T>, no_data_value: f64) -> Array2<u8> {
    let (bands, rows, cols) = {
        let s = data.shape();
        (s[0], s[1], s[2])
    };
    let nodata = T::from_f64(no_data_value);
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let valid = (0..bands).all(|b| !is_nodata(data[[b, r, c]], nodata));
        if valid {
            MASK_VALID
        } else {
            0
        }
    })
}

/// Compute the multiplicative `(mask, unmask)` pair of a multi-band buffer.
///
/// Both outputs share `data`'s depth and band count and hold `1` / `0`, with
/// `unmask = 1 - mask`, so they can be multiplied element-wise against
/// buffers of the same shape.
pub fn compute_mask_pair(data: &ImageData, no_data_value: f64) -> (ImageData, ImageData) {
    with_image!(data, a => {
        let (m, u) = band_mask_pair(a, no_data_value);
        (ImageData::from(m), ImageData::from(u))
    })
}

fn band_mask_pair<T: RasterElement>(
    data: &Array3<T>,
    no_data_value: f64,
) -> (Array3<T>, Array3<T>) {
    let (bands, rows, cols) = {
        let s = data.shape();
        (s[0], s[1], s[2])
    };
    let nodata = T::from_f64(no_data_value);
    let mut mask = Array3::from_elem((bands, rows, cols), T::zero());
    let mut unmask = Array3::from_elem((bands, rows, cols), T::zero());
    for r in 0..rows {
        for c in 0..cols {
            let valid = (0..bands).all(|b| !is_nodata(data[[b, r, c]], nodata));
            let target = if valid { &mut mask } else { &mut unmask };
            for b in 0..bands {
                target[[b, r, c]] = T::one();
            }
        }
    }
    (mask, unmask)
}

fn is_nodata<T: RasterElement>(value: T, nodata: Option<T>) -> bool {
    match nodata {
        Some(nd) => value.is_nodata(nd),
        // Sentinel not representable in this depth: only NaN can still
        // invalidate a pixel.
        None => value.is_not_a_number(),
    }
}
