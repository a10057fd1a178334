//! Error types for rastview

use crate::raster::ImageDepth;
use thiserror::Error;

/// Main error type for rastview operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("raster allocation too large: {bands} band(s) of {width}x{height}")]
    AllocationTooLarge {
        bands: usize,
        width: usize,
        height: usize,
    },

    #[error("pixel depth mismatch: expected {expected}, got {actual}")]
    DepthMismatch {
        expected: ImageDepth,
        actual: ImageDepth,
    },

    #[error("band count mismatch: expected {expected}, got {actual}")]
    BandCountMismatch { expected: usize, actual: usize },

    #[error("window ({x}, {y}, {width}x{height}) exceeds buffer bounds")]
    WindowOutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    #[error("unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("provider is not set up: {0}")]
    ProviderNotReady(String),

    #[error("source has no raster data: {0}")]
    EmptySource(String),

    #[cfg(feature = "gdal")]
    #[error("GDAL error: {0}")]
    Gdal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "gdal")]
impl From<gdal::errors::GdalError> for Error {
    fn from(e: gdal::errors::GdalError) -> Self {
        Error::Gdal(e.to_string())
    }
}

/// Result type alias for rastview operations
pub type Result<T> = std::result::Result<T, Error>;
