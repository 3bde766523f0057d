//! Tile → geographic bounding box resolution.
//!
//! Two interchangeable resolvers implement [`BoundsResolver`]:
//!
//! - [`DirectResolver`]: PNG header + `.pgw` world file + closed-form
//!   spherical Mercator inverse. No datum check.
//! - [`DelegatedResolver`]: opens the raster through a [`GeoBackend`](crate::georef::GeoBackend)
//!   and trusts it only when the raster's geodetic base is WGS 84.
//!
//! Every failure is local to its tile and collapses into a [`SkipOutcome`]
//! carrying one [`SkipReason`].

mod delegated;
mod direct;

pub use delegated::DelegatedResolver;
pub use direct::{DirectOptions, DirectResolver, projected_bounds};

use crate::bounds::{GeoBoundingBox, GeometryError};
use crate::georef::GeorefError;
use crate::header::HeaderError;
use crate::strategy::Strategy;
use crate::types::{ConversionRequest, Resolution, SkipOutcome, SkipReason, Tile};
use crate::worldfile::WorldFileError;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("{0}")]
    Header(#[from] HeaderError),
    #[error("{0}")]
    WorldFile(#[from] WorldFileError),
    #[error("{0}")]
    Geometry(#[from] GeometryError),
    #[error("geodetic base is not WGS 84: {0}")]
    UnsupportedDatum(String),
    #[error("unable to open: {0}")]
    Open(GeorefError),
    #[error("{0}")]
    Transform(GeorefError),
}

impl ResolveError {
    pub fn reason(&self) -> SkipReason {
        match self {
            ResolveError::Header(HeaderError::InvalidSignature { .. }) => SkipReason::InvalidSignature,
            ResolveError::Header(_) => SkipReason::UnreadableHeader,
            ResolveError::WorldFile(WorldFileError::Missing(_) | WorldFileError::Io(_)) => {
                SkipReason::MissingWorldFile
            }
            ResolveError::WorldFile(WorldFileError::TooFewLines { .. }) => {
                SkipReason::InsufficientWorldFileLines
            }
            ResolveError::WorldFile(WorldFileError::InvalidNumber { .. } | WorldFileError::NotText(_)) => {
                SkipReason::InvalidNumericField
            }
            ResolveError::Geometry(_) | ResolveError::Transform(_) => SkipReason::InvalidGeometry,
            ResolveError::UnsupportedDatum(_) => SkipReason::UnsupportedDatum,
            ResolveError::Open(_) => SkipReason::OpenFailure,
        }
    }
}

/// One georeferencing strategy, applied uniformly to every tile of a run.
pub trait BoundsResolver: Send + Sync {
    fn strategy(&self) -> Strategy;

    /// Compute the bounding box of a single tile.
    fn resolve_bounds(&self, tile: &Tile) -> Result<GeoBoundingBox, ResolveError>;

    /// Run-level warning to emit once when this resolver is in use.
    fn advisory(&self) -> Option<&'static str> {
        None
    }

    /// Resolve a tile into a conversion request or a terminal skip.
    fn resolve(&self, tile: &Tile) -> Resolution {
        match self.resolve_bounds(tile) {
            Ok(bounding_box) => {
                debug!(
                    tile = %tile,
                    ullat = bounding_box.upper_left_lat,
                    ullon = bounding_box.upper_left_lon,
                    lrlat = bounding_box.lower_right_lat,
                    lrlon = bounding_box.lower_right_lon,
                    "resolved"
                );
                Ok(ConversionRequest {
                    tile: tile.clone(),
                    bounding_box,
                })
            }
            Err(e) => {
                let reason = e.reason();
                warn!(tile = %tile, %reason, "skipping: {e}");
                Err(SkipOutcome {
                    tile: tile.clone(),
                    reason,
                    message: e.to_string(),
                })
            }
        }
    }
}
