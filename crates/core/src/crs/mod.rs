//! Coordinate reference system handling

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a coordinate reference system, stored as
/// well-known text.
///
/// An empty reference marks a non-georeferenced image. The WKT is never
/// interpreted here beyond equivalence checks; it travels with a provider
/// and is handed back to the raster library on write.
///
/// Intentionally no `PartialEq`: two WKT strings can describe the same
/// system with different formatting, so comparisons go through
/// [`ProjectionRef::is_equivalent`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectionRef {
    wkt: String,
}

impl ProjectionRef {
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self { wkt: wkt.into() }
    }

    /// The empty (non-georeferenced) reference.
    pub fn empty() -> Self {
        Self::default()
    }

    /// WGS84 geographic coordinates, as exported by the raster library.
    #[cfg(feature = "gdal")]
    pub fn wgs84() -> crate::error::Result<Self> {
        let srs = gdal::spatial_ref::SpatialRef::from_epsg(4326)?;
        Ok(Self::from_wkt(srs.to_wkt()?))
    }

    pub fn wkt(&self) -> &str {
        &self.wkt
    }

    pub fn is_empty(&self) -> bool {
        self.wkt.trim().is_empty()
    }

    /// Semantic equivalence between two projection references.
    ///
    /// With the `gdal` feature both strings are parsed and compared through
    /// the library's `IsSame` check, so formatting and parameter-ordering
    /// differences do not matter. When parsing fails (or without the
    /// feature) a whitespace-normalized textual comparison is used instead.
    pub fn is_equivalent(&self, other: &ProjectionRef) -> bool {
        if self.is_empty() || other.is_empty() {
            return self.is_empty() && other.is_empty();
        }

        #[cfg(feature = "gdal")]
        {
            use gdal::spatial_ref::SpatialRef;
            if let (Ok(a), Ok(b)) = (
                SpatialRef::from_wkt(&self.wkt),
                SpatialRef::from_wkt(&other.wkt),
            ) {
                return a == b;
            }
        }

        normalized(&self.wkt) == normalized(&other.wkt)
    }
}

fn normalized(wkt: &str) -> String {
    wkt.split_whitespace().collect()
}

impl fmt::Display for ProjectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.wkt)
        }
    }
}
