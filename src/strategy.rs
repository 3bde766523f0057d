//! Per-run choice between the delegated and direct georeferencing paths.
//!
//! The choice is made once, before any tile is looked at:
//!
//! ```text
//! backend available?  --no-delegated?   strategy
//! yes                 no                Delegated
//! yes                 yes               Direct
//! no                  no                Direct (+ fallback warning)
//! no                  yes               Direct
//! ```
//!
//! Availability is an explicit [`Capability`] value probed at startup and
//! passed in; nothing here consults global state.

use crate::georef::{GeoBackend, default_backend};
use crate::resolve::{BoundsResolver, DelegatedResolver, DirectOptions, DirectResolver};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Tile extensions accepted by the direct strategy.
pub const DIRECT_EXTENSIONS: &[&str] = &[".png"];

/// Tile extensions accepted by the delegated strategy.
pub const DELEGATED_EXTENSIONS: &[&str] = &[".png", ".tiff", ".tif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Delegated,
    Direct,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Delegated => "delegated",
            Strategy::Direct => "direct",
        })
    }
}

/// Whether a georeferencing backend can be used in this process.
pub struct Capability {
    backend: Option<Box<dyn GeoBackend>>,
}

impl Capability {
    /// Whatever backend this build was compiled with.
    pub fn probe() -> Self {
        Self {
            backend: default_backend(),
        }
    }

    pub fn none() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: Box<dyn GeoBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }
}

/// Pick the resolver for this run.
pub fn select(capability: Capability, no_delegated: bool, direct: DirectOptions) -> Box<dyn BoundsResolver> {
    match capability.backend {
        Some(backend) if !no_delegated => {
            info!(backend = backend.name(), "using delegated georeferencing");
            Box::new(DelegatedResolver::new(backend))
        }
        Some(_) => {
            info!("delegated georeferencing disabled on request");
            Box::new(DirectResolver::new(direct))
        }
        None => {
            if !no_delegated {
                warn!("georeferencing backend not available - falling back to world files");
            }
            Box::new(DirectResolver::new(direct))
        }
    }
}
