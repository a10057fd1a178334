//! Raster value types and pixel buffers

mod element;
mod extent;
mod geotransform;
mod image;
mod mask;
mod metadata;

pub use element::RasterElement;
pub use extent::{GeoExtent, PixelExtent};
pub use geotransform::GeoTransform;
pub use image::{ImageData, ImageDepth};
pub use mask::{compute_mask, compute_mask_pair, MASK_VALID};
pub use metadata::Metadata;
