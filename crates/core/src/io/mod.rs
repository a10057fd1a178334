//! Writing raster data back to files

#[cfg(feature = "gdal")]
mod gdal_io;

#[cfg(feature = "gdal")]
pub use gdal_io::{write_geotiff, write_provider, WriteOptions};
