//! In-memory, source-detached image data provider

use crate::crs::ProjectionRef;
use crate::error::{Error, Result};
use crate::provider::ImageDataProvider;
use crate::raster::{GeoExtent, GeoTransform, ImageData, ImageDepth, Metadata, PixelExtent};

/// Image data provider that owns a fully materialized pixel buffer.
///
/// A floating provider is detached from whatever produced it: the source
/// provider may be re-set-up or dropped afterwards without affecting reads
/// from the copy. Instances are immutable after construction and safe to
/// read from multiple threads.
///
/// There is no public constructor; use
/// [`from_provider`](Self::from_provider) or
/// [`from_image`](Self::from_image).
pub struct FloatingDataProvider {
    name: String,
    data: ImageData,
    geo_transform: Option<GeoTransform>,
    geo_extent: GeoExtent,
    projection: ProjectionRef,
    metadata: Metadata,
    no_data_value: f64,
}

impl FloatingDataProvider {
    /// Materialize `roi` of `source` into an owned provider.
    ///
    /// The copy is anchored at local origin `(0, 0)`; callers track any
    /// offset into the source themselves. Its geotransform is the source
    /// transform re-anchored at `roi`'s top-left pixel corner (step and
    /// rotation terms copied), and its geo extent is recomputed from that
    /// new transform — not transformed from the source polygon. Projection,
    /// no-data value and metadata are copied verbatim.
    ///
    /// `roi` may extend past the source extent; the out-of-bounds part is
    /// sentinel-filled by the source's read contract. Fails when `source`
    /// is invalid or `roi` is degenerate.
    pub fn from_provider(source: &dyn ImageDataProvider, roi: &PixelExtent) -> Result<Self> {
        if !source.is_valid() {
            return Err(Error::ProviderNotReady(source.name().to_string()));
        }
        if roi.is_empty() {
            return Err(Error::InvalidDimensions {
                width: roi.width,
                height: roi.height,
            });
        }

        let data = source.image_data_within(roi)?;
        let extent = PixelExtent::with_size(roi.width, roi.height);

        let geo_transform = if source.is_georeferenced() {
            Some(source.geo_transform()?.for_window(roi.x, roi.y))
        } else {
            None
        };
        let geo_extent = match &geo_transform {
            Some(gt) => GeoExtent::from_transform(gt, &extent),
            None => GeoExtent::empty(),
        };

        Ok(Self {
            name: format!("{} copy", source.name()),
            data,
            geo_transform,
            geo_extent,
            projection: source.projection_ref()?,
            metadata: source.metadata()?,
            no_data_value: source.no_data_value(),
        })
    }

    /// Wrap a raw in-memory buffer.
    ///
    /// The result carries no georeferencing: identity transform, empty geo
    /// extent, empty projection. `name` is a display identifier and is not
    /// interpreted. The no-data value is the buffer depth's default
    /// sentinel. Fails on an empty buffer.
    pub fn from_image(name: impl Into<String>, data: ImageData) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidDimensions {
                width: data.cols(),
                height: data.rows(),
            });
        }
        let no_data_value = data.depth().default_no_data();
        Ok(Self {
            name: name.into(),
            data,
            geo_transform: None,
            geo_extent: GeoExtent::empty(),
            projection: ProjectionRef::empty(),
            metadata: Metadata::new(),
            no_data_value,
        })
    }
}

impl ImageDataProvider for FloatingDataProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_valid(&self) -> bool {
        // Factories reject degenerate buffers, so a constructed instance is
        // always readable.
        true
    }

    fn pixel_extent(&self) -> PixelExtent {
        self.data.extent()
    }

    fn band_count(&self) -> usize {
        self.data.bands()
    }

    fn depth(&self) -> ImageDepth {
        self.data.depth()
    }

    fn no_data_value(&self) -> f64 {
        self.no_data_value
    }

    fn is_georeferenced(&self) -> bool {
        self.geo_transform.is_some()
    }

    fn image_data(&self) -> Result<ImageData> {
        Ok(self.data.clone())
    }

    fn image_data_within(&self, roi: &PixelExtent) -> Result<ImageData> {
        self.data.window_or_fill(roi, self.no_data_value)
    }

    fn geo_extent(&self) -> Result<GeoExtent> {
        Ok(self.geo_extent)
    }

    fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.geo_transform.unwrap_or_else(GeoTransform::identity))
    }

    fn projection_ref(&self) -> Result<ProjectionRef> {
        Ok(self.projection.clone())
    }

    fn metadata(&self) -> Result<Metadata> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    fn source_image(bands: usize, rows: usize, cols: usize) -> ImageData {
        ImageData::from(Array3::from_shape_fn((bands, rows, cols), |(b, r, c)| {
            (b * 100_000 + r * 100 + c) as i32
        }))
    }

    fn georeferenced_source(rows: usize, cols: usize) -> FloatingDataProvider {
        let mut provider =
            FloatingDataProvider::from_image("synthetic", source_image(2, rows, cols)).unwrap();
        let gt = GeoTransform::from_gdal([1.358847, 1e-4, 0.0, 43.575298, 0.0, -1e-4]);
        provider.geo_transform = Some(gt);
        provider.geo_extent =
            GeoExtent::from_transform(&gt, &PixelExtent::with_size(cols, rows));
        provider.projection = ProjectionRef::from_wkt("GEOGCS[\"WGS 84\"]");
        let mut md = Metadata::new();
        md.push("SENSOR", "NA");
        provider.metadata = md;
        provider
    }

    #[test]
    fn from_image_has_no_geo_metadata() {
        let provider = FloatingDataProvider::from_image("raw", source_image(3, 4, 5)).unwrap();
        assert!(provider.is_valid());
        assert_eq!(provider.name(), "raw");
        assert_eq!(provider.pixel_extent(), PixelExtent::with_size(5, 4));
        assert_eq!(provider.band_count(), 3);
        assert!(!provider.is_georeferenced());
        assert!(provider.geo_extent().unwrap().is_empty());
        assert_eq!(provider.geo_transform().unwrap(), GeoTransform::identity());
        assert!(provider.projection_ref().unwrap().is_empty());
    }

    #[test]
    fn from_image_rejects_empty_buffer() {
        let empty = ImageData::filled(ImageDepth::U8, 1, 0, 5, 0.0).unwrap();
        assert!(FloatingDataProvider::from_image("x", empty).is_err());
    }

    #[test]
    fn roi_shape_is_always_honored() {
        let provider = FloatingDataProvider::from_image("raw", source_image(2, 20, 30)).unwrap();
        for roi in [
            PixelExtent::new(5, 5, 10, 10),
            PixelExtent::new(-7, -3, 10, 10),
            PixelExtent::new(500, 500, 10, 10),
        ] {
            let out = provider.image_data_within(&roi).unwrap();
            assert_eq!(out.rows(), roi.height);
            assert_eq!(out.cols(), roi.width);
        }
    }

    #[test]
    fn disjoint_roi_is_all_sentinel() {
        let provider = FloatingDataProvider::from_image("raw", source_image(2, 8, 8)).unwrap();
        let nd = provider.no_data_value();
        let out = provider
            .image_data_within(&PixelExtent::new(100, 100, 4, 3))
            .unwrap();
        for r in 0..3 {
            for c in 0..4 {
                assert_eq!(out.values_at(r, c), Some(vec![nd; 2]));
            }
        }
    }

    #[test]
    fn partial_roi_mixes_source_and_sentinel() {
        let provider = FloatingDataProvider::from_image("raw", source_image(1, 8, 8)).unwrap();
        let nd = provider.no_data_value();
        let out = provider
            .image_data_within(&PixelExtent::new(6, 6, 4, 4))
            .unwrap();
        // (6,6) and (7,7) are inside the 8x8 source.
        assert_eq!(out.values_at(0, 0), Some(vec![606.0]));
        assert_eq!(out.values_at(1, 1), Some(vec![707.0]));
        assert_eq!(out.values_at(2, 2), Some(vec![nd]));
        assert_eq!(out.values_at(3, 3), Some(vec![nd]));
    }

    #[test]
    fn full_extent_copy_is_identity() {
        let source = georeferenced_source(30, 40);
        let copy =
            FloatingDataProvider::from_provider(&source, &source.pixel_extent()).unwrap();

        assert_eq!(copy.image_data().unwrap(), source.image_data().unwrap());
        assert_eq!(copy.pixel_extent(), source.pixel_extent());
        assert_eq!(
            copy.geo_transform().unwrap(),
            source.geo_transform().unwrap()
        );
        assert!(copy
            .geo_extent()
            .unwrap()
            .approx_eq(&source.geo_extent().unwrap(), 1e-12));
        assert!(copy
            .projection_ref()
            .unwrap()
            .is_equivalent(&source.projection_ref().unwrap()));
        assert_eq!(copy.metadata().unwrap(), source.metadata().unwrap());
        assert_eq!(copy.no_data_value(), source.no_data_value());
    }

    #[test]
    fn roi_copy_recomputes_geo_metadata() {
        let source = georeferenced_source(30, 40);
        let roi = PixelExtent::new(10, 20, 15, 5);
        let copy = FloatingDataProvider::from_provider(&source, &roi).unwrap();

        assert_eq!(copy.pixel_extent(), PixelExtent::with_size(15, 5));

        let src_gt = source.geo_transform().unwrap();
        let gt = copy.geo_transform().unwrap();
        assert_relative_eq!(gt.origin_x, src_gt.origin_x + 10.0 * src_gt.pixel_width);
        assert_relative_eq!(gt.origin_y, src_gt.origin_y + 20.0 * src_gt.pixel_height);
        assert_eq!(gt.pixel_width, src_gt.pixel_width);
        assert_eq!(gt.pixel_height, src_gt.pixel_height);

        // Corners equal the source affine map applied to the roi's pixel
        // corners (pixel-edge convention).
        let ge = copy.geo_extent().unwrap();
        let expected = [
            src_gt.pixel_to_geo_corner(10.0, 20.0),
            src_gt.pixel_to_geo_corner(25.0, 20.0),
            src_gt.pixel_to_geo_corner(25.0, 25.0),
            src_gt.pixel_to_geo_corner(10.0, 25.0),
        ];
        for (actual, expected) in ge.corners().iter().zip(expected.iter()) {
            assert_relative_eq!(actual.0, expected.0, epsilon = 1e-12);
            assert_relative_eq!(actual.1, expected.1, epsilon = 1e-12);
        }

        // Pixel data matches the source region.
        let out = copy.image_data().unwrap();
        let direct = source.image_data_within(&roi).unwrap();
        assert_eq!(out, direct);
    }

    #[test]
    fn copy_is_independent_of_source_lifetime() {
        let source = georeferenced_source(10, 10);
        let copy =
            FloatingDataProvider::from_provider(&source, &PixelExtent::new(2, 2, 4, 4)).unwrap();
        let before = copy.image_data().unwrap();
        drop(source);
        assert_eq!(copy.image_data().unwrap(), before);
    }

    #[test]
    fn floating_provider_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FloatingDataProvider>();
    }

    #[test]
    fn non_georeferenced_source_yields_non_georeferenced_copy() {
        let source = FloatingDataProvider::from_image("raw", source_image(1, 6, 6)).unwrap();
        let copy =
            FloatingDataProvider::from_provider(&source, &PixelExtent::new(1, 1, 3, 3)).unwrap();
        assert!(!copy.is_georeferenced());
        assert!(copy.geo_extent().unwrap().is_empty());
    }
}
