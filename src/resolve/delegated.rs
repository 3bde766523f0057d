use super::{BoundsResolver, ResolveError};
use crate::bounds::GeoBoundingBox;
use crate::georef::{GeoBackend, SpatialRef};
use crate::strategy::Strategy;
use crate::types::Tile;
use tracing::debug;

/// Resolves tiles through a georeferencing backend.
///
/// Only rasters whose geodetic base is WGS 84 are accepted; anything else is
/// skipped before a single coordinate is transformed. The backend's
/// geotransform already anchors on pixel corners, so no half-pixel shift is
/// applied here.
pub struct DelegatedResolver {
    backend: Box<dyn GeoBackend>,
    wgs84: SpatialRef,
}

impl DelegatedResolver {
    pub fn new(backend: Box<dyn GeoBackend>) -> Self {
        Self {
            backend,
            wgs84: SpatialRef::wgs84(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

impl BoundsResolver for DelegatedResolver {
    fn strategy(&self) -> Strategy {
        Strategy::Delegated
    }

    fn resolve_bounds(&self, tile: &Tile) -> Result<GeoBoundingBox, ResolveError> {
        let dataset = self.backend.open(tile.path()).map_err(ResolveError::Open)?;

        let srs = match &dataset.spatial_ref {
            Some(srs) if srs.is_same_geodetic_base(&self.wgs84) => srs,
            Some(srs) => return Err(ResolveError::UnsupportedDatum(srs.describe())),
            None => return Err(ResolveError::UnsupportedDatum("no spatial reference".into())),
        };

        let gt = dataset.geo_transform;
        let (ulx, uly) = gt.apply(0.0, 0.0);
        let (lrx, lry) = gt.apply(f64::from(dataset.width), f64::from(dataset.height));
        debug!(
            tile = %tile,
            srs = %srs.describe(),
            ulx, uly, lrx, lry,
            "dataset corners"
        );

        let upper_left = self
            .backend
            .to_geographic(srs, ulx, uly)
            .map_err(ResolveError::Transform)?;
        let lower_right = self
            .backend
            .to_geographic(srs, lrx, lry)
            .map_err(ResolveError::Transform)?;
        Ok(GeoBoundingBox::from_corners(upper_left, lower_right)?)
    }
}
