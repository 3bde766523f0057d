//! Shared types handed between discovery, resolution, and conversion.

use crate::bounds::GeoBoundingBox;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// A raster chart tile, identified by its absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Tile(PathBuf);

impl Tile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A resolved tile ready for the external chart converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionRequest {
    pub tile: Tile,
    pub bounding_box: GeoBoundingBox,
}

/// Why a tile was left out of the run.
///
/// Every reason is terminal for the tile and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnreadableHeader,
    InvalidSignature,
    MissingWorldFile,
    InsufficientWorldFileLines,
    InvalidNumericField,
    InvalidGeometry,
    UnsupportedDatum,
    OpenFailure,
}

impl SkipReason {
    pub fn label(self) -> &'static str {
        match self {
            SkipReason::UnreadableHeader => "unreadable header",
            SkipReason::InvalidSignature => "invalid signature",
            SkipReason::MissingWorldFile => "missing world file",
            SkipReason::InsufficientWorldFileLines => "insufficient world file lines",
            SkipReason::InvalidNumericField => "invalid numeric field",
            SkipReason::InvalidGeometry => "invalid geometry",
            SkipReason::UnsupportedDatum => "unsupported datum",
            SkipReason::OpenFailure => "open failure",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Terminal outcome for a tile that could not be resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipOutcome {
    pub tile: Tile,
    pub reason: SkipReason,
    /// Human-readable detail (offending path, values, ...).
    pub message: String,
}

/// Result of resolving a single tile.
pub type Resolution = Result<ConversionRequest, SkipOutcome>;
