//! GDAL-backed image data provider

use std::path::{Path, PathBuf};

use gdal::raster::GdalType;
use gdal::Dataset;
use gdal::Metadata as GdalMetadata;
use ndarray::{s, Array2, Array3};
use num_traits::Zero;

use crate::crs::ProjectionRef;
use crate::error::{Error, Result};
use crate::provider::{ImageDataProvider, NO_DATA_VALUE};
use crate::raster::{
    GeoExtent, GeoTransform, ImageData, ImageDepth, Metadata, PixelExtent, RasterElement,
};

/// Image data provider backed by a raster file opened through GDAL.
///
/// The provider exclusively owns its dataset handle: it is acquired by
/// [`setup`](Self::setup), released when the provider is dropped or set up
/// again, and released on every failure path. Reads go through the handle on
/// demand; pixel data is not cached here.
///
/// GDAL dataset handles are not thread-safe, so this type is deliberately
/// not shared across threads; use one provider per thread or serialize
/// access externally.
pub struct GdalDataProvider {
    name: String,
    path: PathBuf,
    dataset: Option<Dataset>,
    info: Option<SourceInfo>,
}

/// Source description cached at setup time.
#[derive(Debug, Clone)]
struct SourceInfo {
    bands: usize,
    depth: ImageDepth,
    extent: PixelExtent,
    geo_transform: Option<GeoTransform>,
    projection: ProjectionRef,
    metadata: Metadata,
    band_names: Vec<String>,
    no_data_value: f64,
}

impl GdalDataProvider {
    /// A provider with no source; invalid until [`setup`](Self::setup)
    /// succeeds.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            path: PathBuf::new(),
            dataset: None,
            info: None,
        }
    }

    /// Construct-and-setup convenience.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut provider = Self::new();
        provider.setup(path)?;
        Ok(provider)
    }

    /// Open `path` read-only and cache the source description.
    ///
    /// Fails when the path cannot be opened or the source reports zero
    /// bands or a zero extent; the provider is left invalid in that case,
    /// with any previously held handle already released. All bands are read
    /// at the depth of band 1 (the raster library converts on read when a
    /// source mixes band depths).
    pub fn setup(&mut self, path: impl AsRef<Path>) -> Result<()> {
        // Release the prior handle before touching the new source, also on
        // the failure paths below.
        self.dataset = None;
        self.info = None;
        self.name.clear();
        self.path.clear();

        let path = path.as_ref();
        let dataset = Dataset::open(path)?;
        let info = read_source_info(&dataset, path)?;

        self.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        self.path = path.to_path_buf();
        self.dataset = Some(dataset);
        self.info = Some(info);
        Ok(())
    }

    /// Path of the backing file; empty while invalid.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display names of the bands (source band descriptions, or `Band N`).
    pub fn band_names(&self) -> &[String] {
        self.info.as_ref().map(|i| i.band_names.as_slice()).unwrap_or(&[])
    }

    fn parts(&self) -> Result<(&Dataset, &SourceInfo)> {
        match (&self.dataset, &self.info) {
            (Some(dataset), Some(info)) => Ok((dataset, info)),
            _ => Err(Error::ProviderNotReady(self.name.clone())),
        }
    }
}

impl Default for GdalDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageDataProvider for GdalDataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        self.dataset.is_some() && self.info.is_some()
    }

    fn pixel_extent(&self) -> PixelExtent {
        self.info
            .as_ref()
            .map(|i| i.extent)
            .unwrap_or_else(|| PixelExtent::with_size(0, 0))
    }

    fn band_count(&self) -> usize {
        self.info.as_ref().map(|i| i.bands).unwrap_or(0)
    }

    fn depth(&self) -> ImageDepth {
        self.info.as_ref().map(|i| i.depth).unwrap_or(ImageDepth::U8)
    }

    fn no_data_value(&self) -> f64 {
        self.info
            .as_ref()
            .map(|i| i.no_data_value)
            .unwrap_or(NO_DATA_VALUE)
    }

    fn is_georeferenced(&self) -> bool {
        self.info
            .as_ref()
            .map(|i| i.geo_transform.is_some())
            .unwrap_or(false)
    }

    fn image_data_within(&self, roi: &PixelExtent) -> Result<ImageData> {
        let (dataset, info) = self.parts()?;
        // The raster library guarantees nothing outside the source bounds:
        // read the intersection only and paste it into a sentinel-filled
        // buffer of the requested shape.
        let mut out =
            ImageData::filled(info.depth, info.bands, roi.height, roi.width, info.no_data_value)?;
        if let Some(isect) = info.extent.intersection(roi) {
            let window = read_window(dataset, info, &isect)?;
            out.paste_from(
                &window,
                &PixelExtent::with_size(isect.width, isect.height),
                (isect.x - roi.x) as usize,
                (isect.y - roi.y) as usize,
            )?;
        }
        Ok(out)
    }

    fn geo_extent(&self) -> Result<GeoExtent> {
        let (_, info) = self.parts()?;
        Ok(match info.geo_transform {
            Some(gt) => GeoExtent::from_transform(&gt, &info.extent),
            None => GeoExtent::empty(),
        })
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        let (_, info) = self.parts()?;
        Ok(info.geo_transform.unwrap_or_else(GeoTransform::identity))
    }

    fn projection_ref(&self) -> Result<ProjectionRef> {
        let (_, info) = self.parts()?;
        Ok(info.projection.clone())
    }

    fn metadata(&self) -> Result<Metadata> {
        let (_, info) = self.parts()?;
        Ok(info.metadata.clone())
    }
}

fn read_source_info(dataset: &Dataset, path: &Path) -> Result<SourceInfo> {
    let bands = dataset.raster_count();
    let (cols, rows) = dataset.raster_size();
    if bands == 0 || cols == 0 || rows == 0 {
        return Err(Error::EmptySource(path.display().to_string()));
    }

    let first = dataset.rasterband(1)?;
    let depth = depth_of(first.band_type())?;

    let mut band_names = Vec::with_capacity(bands);
    for index in 1..=bands {
        let band = dataset.rasterband(index)?;
        let description = band.description().unwrap_or_default();
        band_names.push(if description.is_empty() {
            format!("Band {index}")
        } else {
            description
        });
    }

    let geo_transform = dataset.geo_transform().ok().map(GeoTransform::from_gdal);

    let mut metadata = Metadata::new();
    if let Some(entries) = dataset.metadata_domain("") {
        for entry in entries {
            if let Some((key, value)) = entry.split_once('=') {
                metadata.push(key, value);
            }
        }
    }

    let no_data_value = first.no_data_value().unwrap_or(depth.default_no_data());

    Ok(SourceInfo {
        bands,
        depth,
        extent: PixelExtent::with_size(cols, rows),
        geo_transform,
        projection: ProjectionRef::from_wkt(dataset.projection()),
        metadata,
        band_names,
        no_data_value,
    })
}

fn depth_of(band_type: gdal::raster::GdalDataType) -> Result<ImageDepth> {
    use gdal::raster::GdalDataType;
    Ok(match band_type {
        GdalDataType::UInt8 => ImageDepth::U8,
        GdalDataType::UInt16 => ImageDepth::U16,
        GdalDataType::Int16 => ImageDepth::I16,
        GdalDataType::UInt32 => ImageDepth::U32,
        GdalDataType::Int32 => ImageDepth::I32,
        GdalDataType::Float32 => ImageDepth::F32,
        GdalDataType::Float64 => ImageDepth::F64,
        other => return Err(Error::UnsupportedDataType(format!("{other:?}"))),
    })
}

fn read_window(dataset: &Dataset, info: &SourceInfo, window: &PixelExtent) -> Result<ImageData> {
    Ok(match info.depth {
        ImageDepth::U8 => ImageData::from(read_bands::<u8>(dataset, info.bands, window)?),
        ImageDepth::U16 => ImageData::from(read_bands::<u16>(dataset, info.bands, window)?),
        ImageDepth::I16 => ImageData::from(read_bands::<i16>(dataset, info.bands, window)?),
        ImageDepth::U32 => ImageData::from(read_bands::<u32>(dataset, info.bands, window)?),
        ImageDepth::I32 => ImageData::from(read_bands::<i32>(dataset, info.bands, window)?),
        ImageDepth::F32 => ImageData::from(read_bands::<f32>(dataset, info.bands, window)?),
        ImageDepth::F64 => ImageData::from(read_bands::<f64>(dataset, info.bands, window)?),
    })
}

fn read_bands<T: RasterElement + GdalType>(
    dataset: &Dataset,
    bands: usize,
    window: &PixelExtent,
) -> Result<Array3<T>> {
    let (w, h) = (window.width, window.height);
    let mut out = Array3::from_elem((bands, h, w), T::zero());
    for index in 0..bands {
        let band = dataset.rasterband(index + 1)?;
        let buffer = band.read_as::<T>((window.x as isize, window.y as isize), (w, h), (w, h), None)?;
        let plane = Array2::from_shape_vec((h, w), buffer.data().to_vec())
            .map_err(|e| Error::Other(e.to_string()))?;
        out.slice_mut(s![index, .., ..]).assign(&plane);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_provider_is_invalid() {
        let provider = GdalDataProvider::new();
        assert!(!provider.is_valid());
        assert!(provider.pixel_extent().is_empty());
        assert_eq!(provider.band_count(), 0);
        assert!(matches!(
            provider.image_data(),
            Err(Error::ProviderNotReady(_))
        ));
        assert!(matches!(provider.geo_extent(), Err(Error::ProviderNotReady(_))));
        assert!(matches!(provider.metadata(), Err(Error::ProviderNotReady(_))));
    }

    #[test]
    fn setup_missing_path_fails_and_stays_invalid() {
        let mut provider = GdalDataProvider::new();
        let err = provider.setup("/no/such/raster.tif");
        assert!(err.is_err());
        assert!(!provider.is_valid());
        assert!(matches!(
            provider.image_data(),
            Err(Error::ProviderNotReady(_))
        ));
    }
}
