//! # rastview core
//!
//! Data-access layer for viewing large, multi-band, geo-referenced raster
//! imagery.
//!
//! This crate provides:
//! - [`ImageDataProvider`]: the read interface viewers and filters consume
//! - [`GdalDataProvider`]: a provider backed by a raster file (GDAL)
//! - [`FloatingDataProvider`]: an in-memory provider detached from its source
//! - [`ImageData`]: dynamically-depthed multi-band pixel buffers
//! - No-data mask utilities and the geo metadata value types
//!
//! Region reads are total: a provider returns a buffer of exactly the
//! requested shape for *any* region of interest, padding everything outside
//! the source with the provider's no-data sentinel, so callers never carry
//! their own bounds logic.
//!
//! The `gdal` feature (default) enables the file-backed provider, GeoTIFF
//! writing and semantic projection comparison; without it the in-memory
//! types still build.

pub mod crs;
pub mod error;
pub mod io;
pub mod provider;
pub mod raster;

pub use crs::ProjectionRef;
pub use error::{Error, Result};
#[cfg(feature = "gdal")]
pub use provider::GdalDataProvider;
pub use provider::{FloatingDataProvider, ImageDataProvider, NO_DATA_VALUE};
pub use raster::{
    compute_mask, compute_mask_pair, GeoExtent, GeoTransform, ImageData, ImageDepth, Metadata,
    PixelExtent,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::ProjectionRef;
    pub use crate::error::{Error, Result};
    #[cfg(feature = "gdal")]
    pub use crate::provider::GdalDataProvider;
    pub use crate::provider::{FloatingDataProvider, ImageDataProvider, NO_DATA_VALUE};
    pub use crate::raster::{
        GeoExtent, GeoTransform, ImageData, ImageDepth, Metadata, PixelExtent,
    };
}
