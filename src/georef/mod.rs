//! Georeferencing backend used by the delegated strategy.
//!
//! The [`GeoBackend`] trait is the seam to whatever library can open a raster
//! with full projection metadata and transform coordinates between spatial
//! references. Everything the delegated resolver needs goes through two calls:
//!
//! | Call | Returns |
//! |---|---|
//! | [`GeoBackend::open`] | [`Dataset`]: spatial reference, geotransform, pixel size |
//! | [`GeoBackend::to_geographic`] | `(lon, lat)` in the geographic base of a spatial reference |
//!
//! The production implementation is `GeoTiffBackend` (feature `delegated`):
//! GeoTIFF tags via the `tiff` crate, CRS definitions from `crs-definitions`,
//! transforms through `proj4rs`.

#[cfg(feature = "delegated")]
pub mod geotiff;
mod srs;

#[cfg(feature = "delegated")]
pub use geotiff::GeoTiffBackend;
pub use srs::{SpatialRef, WGS84_DATUM};

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeorefError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported raster: {0}")]
    Unsupported(String),
    #[error("raster has no georeferencing: {0}")]
    NotGeoreferenced(String),
    #[error("coordinate transform failed: {0}")]
    Transform(String),
}

/// GDAL-ordered affine geotransform `[x0, dx/dcol, dx/drow, y0, dy/dcol, dy/drow]`.
///
/// The origin `(x0, y0)` is the outer corner of the upper-left pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    pub const IDENTITY: GeoTransform = GeoTransform([0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);

    /// Map a pixel/line position to projected coordinates.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let gt = &self.0;
        (
            gt[0] + col * gt[1] + row * gt[2],
            gt[3] + col * gt[4] + row * gt[5],
        )
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }
}

/// An opened raster as seen by the delegated strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    /// `None` when the raster carries no usable projection metadata.
    pub spatial_ref: Option<SpatialRef>,
    pub geo_transform: GeoTransform,
    pub width: u32,
    pub height: u32,
}

/// A library able to open georeferenced rasters and reproject points.
pub trait GeoBackend: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Open a raster read-only.
    fn open(&self, path: &Path) -> Result<Dataset, GeorefError>;

    /// Transform `(x, y)` in `srs` to `(lon, lat)` degrees in its geographic base.
    fn to_geographic(&self, srs: &SpatialRef, x: f64, y: f64) -> Result<(f64, f64), GeorefError>;
}

/// The backend compiled into this build, if any.
pub fn default_backend() -> Option<Box<dyn GeoBackend>> {
    #[cfg(feature = "delegated")]
    {
        Some(Box::new(GeoTiffBackend::new()))
    }
    #[cfg(not(feature = "delegated"))]
    {
        None
    }
}
