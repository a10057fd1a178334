//! Pixel element trait for depth-generic raster code

use num_traits::{NumCast, One, Zero};
use std::fmt::Debug;

/// Trait for the numeric types a raster band can be stored as.
///
/// Implemented for the seven depths the provider layer supports
/// (`u8`, `u16`, `i16`, `u32`, `i32`, `f32`, `f64`). Generic code reads
/// and fills buffers through this trait instead of matching on the depth.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + One + Send + Sync + 'static
{
    /// Default no-data sentinel for this type, as `f64`.
    ///
    /// Unsigned depths use their maximum (the customary sentinel in
    /// satellite imagery), signed depths their minimum, floating depths the
    /// crate-wide [`NO_DATA_VALUE`](crate::provider::NO_DATA_VALUE).
    fn default_nodata() -> f64;

    /// Whether this value matches the sentinel.
    ///
    /// For floating depths NaN always counts as no-data, and the comparison
    /// tolerates representation error around the sentinel.
    fn is_nodata(&self, nodata: Self) -> bool;

    /// Whether this value is NaN (always `false` for integer depths).
    fn is_not_a_number(&self) -> bool {
        false
    }

    /// Cast from `f64`, or `None` when the value is not representable.
    fn from_f64(value: f64) -> Option<Self> {
        NumCast::from(value)
    }

    /// Cast from `f64`, falling back to this type's default sentinel.
    fn from_f64_or_default(value: f64) -> Self {
        Self::from_f64(value)
            .or_else(|| Self::from_f64(Self::default_nodata()))
            .unwrap_or_else(Self::zero)
    }

    /// Cast to `f64` (lossless for every supported depth except very large
    /// `u32`/`i32` magnitudes, which round).
    fn to_f64(self) -> f64;
}

macro_rules! impl_element_unsigned {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> f64 {
                <$t>::MAX as f64
            }

            fn is_nodata(&self, nodata: Self) -> bool {
                *self == nodata
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

macro_rules! impl_element_signed {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> f64 {
                <$t>::MIN as f64
            }

            fn is_nodata(&self, nodata: Self) -> bool {
                *self == nodata
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

macro_rules! impl_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> f64 {
                crate::provider::NO_DATA_VALUE
            }

            fn is_nodata(&self, nodata: Self) -> bool {
                if self.is_nan() {
                    return true;
                }
                (*self - nodata).abs() <= <$t>::EPSILON * nodata.abs().max(1.0)
            }

            fn is_not_a_number(&self) -> bool {
                self.is_nan()
            }

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element_unsigned!(u8);
impl_element_unsigned!(u16);
impl_element_unsigned!(u32);
impl_element_signed!(i16);
impl_element_signed!(i32);
impl_element_float!(f32);
impl_element_float!(f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sentinels() {
        assert_eq!(u16::default_nodata(), 65535.0);
        assert_eq!(i16::default_nodata(), -32768.0);
        assert_eq!(f32::default_nodata(), crate::provider::NO_DATA_VALUE);
    }

    #[test]
    fn nan_is_nodata() {
        assert!(f32::NAN.is_nodata(-32000.0));
        assert!(!1.5f32.is_nodata(-32000.0));
        assert!((-32000.0f32).is_nodata(-32000.0));
    }

    #[test]
    fn unrepresentable_cast_falls_back() {
        assert_eq!(u8::from_f64_or_default(-32000.0), u8::MAX);
        assert_eq!(u16::from_f64(300.0), Some(300u16));
        assert_eq!(u16::from_f64(-1.0), None);
    }
}
