//! GeoTIFF writing using GDAL
//!
//! The read path lives in the provider layer
//! ([`GdalDataProvider`](crate::provider::GdalDataProvider)); this module
//! covers the reverse direction: persisting an in-memory buffer, with its
//! geo metadata, as a file a provider can be set up on again.

use std::path::Path;

use gdal::raster::{Buffer, GdalType};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};
use gdal::Metadata as GdalMetadata;
use ndarray::{s, Array3};

use crate::crs::ProjectionRef;
use crate::error::{Error, Result};
use crate::provider::ImageDataProvider;
use crate::raster::{GeoTransform, ImageData, Metadata, RasterElement};

/// Geo metadata written alongside the pixel data.
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Affine transform; `None` writes a non-georeferenced file.
    pub geo_transform: Option<GeoTransform>,
    /// Projection reference; the empty reference writes none.
    pub projection: ProjectionRef,
    /// No-data value declared on every band.
    pub no_data_value: Option<f64>,
    /// Free-form metadata pairs for the default domain.
    pub metadata: Metadata,
}

/// Write a multi-band buffer to `path` as a GeoTIFF.
///
/// Bands are written at the buffer's depth, in band order. Fails on an
/// empty buffer.
pub fn write_geotiff(path: impl AsRef<Path>, image: &ImageData, options: &WriteOptions) -> Result<()> {
    if image.is_empty() {
        return Err(Error::InvalidDimensions {
            width: image.cols(),
            height: image.rows(),
        });
    }

    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let bands = image.bands();

    let mut dataset = match image {
        ImageData::U8(a) => create_and_write::<u8>(&driver, path.as_ref(), a)?,
        ImageData::U16(a) => create_and_write::<u16>(&driver, path.as_ref(), a)?,
        ImageData::I16(a) => create_and_write::<i16>(&driver, path.as_ref(), a)?,
        ImageData::U32(a) => create_and_write::<u32>(&driver, path.as_ref(), a)?,
        ImageData::I32(a) => create_and_write::<i32>(&driver, path.as_ref(), a)?,
        ImageData::F32(a) => create_and_write::<f32>(&driver, path.as_ref(), a)?,
        ImageData::F64(a) => create_and_write::<f64>(&driver, path.as_ref(), a)?,
    };

    if let Some(gt) = &options.geo_transform {
        dataset.set_geo_transform(&gt.to_gdal())?;
    }
    if !options.projection.is_empty() {
        let srs = SpatialRef::from_wkt(options.projection.wkt())?;
        dataset.set_spatial_ref(&srs)?;
    }
    for (key, value) in options.metadata.iter() {
        dataset.set_metadata_item(key, value, "")?;
    }
    if let Some(no_data) = options.no_data_value {
        for index in 1..=bands {
            let mut band = dataset.rasterband(index)?;
            band.set_no_data_value(Some(no_data))?;
        }
    }

    Ok(())
}

/// Write a provider's full extent and metadata to `path`.
pub fn write_provider(path: impl AsRef<Path>, provider: &dyn ImageDataProvider) -> Result<()> {
    let image = provider.image_data()?;
    let options = WriteOptions {
        geo_transform: provider.is_georeferenced().then(|| provider.geo_transform()).transpose()?,
        projection: provider.projection_ref()?,
        no_data_value: Some(provider.no_data_value()),
        metadata: provider.metadata()?,
    };
    write_geotiff(path, &image, &options)
}

fn create_and_write<T: RasterElement + GdalType>(
    driver: &gdal::Driver,
    path: &Path,
    data: &Array3<T>,
) -> Result<Dataset> {
    let shape = data.shape();
    let (bands, rows, cols) = (shape[0], shape[1], shape[2]);
    let dataset = driver.create_with_band_type::<T, _>(path, cols, rows, bands)?;
    for index in 0..bands {
        let plane: Vec<T> = data.slice(s![index, .., ..]).iter().copied().collect();
        let mut buffer = Buffer::new((cols, rows), plane);
        let mut band = dataset.rasterband(index + 1)?;
        band.write((0, 0), (cols, rows), &mut buffer)?;
    }
    Ok(dataset)
}
