//! Image data providers
//!
//! A provider is the read boundary between raster storage and everything
//! else: viewers and filters request pixel regions and geo metadata through
//! [`ImageDataProvider`] and never learn whether the data lives in a file or
//! in memory.

#[cfg(feature = "gdal")]
mod gdal;

mod floating;

#[cfg(feature = "gdal")]
pub use self::gdal::GdalDataProvider;
pub use floating::FloatingDataProvider;

use crate::crs::ProjectionRef;
use crate::error::Result;
use crate::raster::{GeoExtent, GeoTransform, ImageData, ImageDepth, Metadata, PixelExtent};

/// Canonical no-data sentinel for depths that can represent it.
///
/// Depths that cannot (the unsigned integers) fall back to their own default
/// sentinel, see [`ImageDepth::default_no_data`].
pub const NO_DATA_VALUE: f64 = -32000.0;

/// Read access to multi-band geo-referenced raster data.
///
/// # Contract
///
/// - Every operation is synchronous and may block on I/O. Providers do no
///   internal threading or locking; move calls off an interactive thread
///   when responsiveness matters.
/// - [`image_data_within`](Self::image_data_within) always returns a buffer
///   of exactly the requested width and height. The part of the request
///   overlapping the native extent holds source pixels; everything else is
///   filled with [`no_data_value`](Self::no_data_value). A request entirely
///   outside the native extent is *not* an error.
/// - Metadata and data fetches on a provider that is not set up fail with
///   [`Error::ProviderNotReady`](crate::error::Error::ProviderNotReady);
///   they never return stale data and never panic.
pub trait ImageDataProvider {
    /// Display identifier (file stem, derived-copy label, ...).
    fn name(&self) -> &str;

    /// Whether the provider has been set up and can serve reads.
    fn is_valid(&self) -> bool;

    /// Native pixel extent, anchored at `(0, 0)`. Empty while invalid.
    fn pixel_extent(&self) -> PixelExtent;

    fn band_count(&self) -> usize;

    fn depth(&self) -> ImageDepth;

    /// The sentinel marking absent observations, per band, per pixel.
    fn no_data_value(&self) -> f64;

    /// Whether the source carries real georeferencing. When `false`,
    /// [`geo_transform`](Self::geo_transform) reports the identity transform
    /// and [`geo_extent`](Self::geo_extent) is empty.
    fn is_georeferenced(&self) -> bool;

    /// The full native-extent pixel buffer.
    fn image_data(&self) -> Result<ImageData> {
        self.image_data_within(&self.pixel_extent())
    }

    /// A `roi`-shaped pixel buffer, sentinel-padded outside the native
    /// extent (see the trait-level contract).
    fn image_data_within(&self, roi: &PixelExtent) -> Result<ImageData>;

    /// World-coordinate corner polygon of the native extent.
    fn geo_extent(&self) -> Result<GeoExtent>;

    /// Affine pixel-to-world transform; identity when not georeferenced.
    fn geo_transform(&self) -> Result<GeoTransform>;

    /// Projection reference of the source; empty when not georeferenced.
    fn projection_ref(&self) -> Result<ProjectionRef>;

    /// Free-form metadata pairs of the source.
    fn metadata(&self) -> Result<Metadata>;
}
