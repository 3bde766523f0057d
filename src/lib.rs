//! # chart2kap
//!
//! Finds georeferenced raster chart tiles, works out the geographic bounding
//! box of each one, and hands tile plus box to an external chart converter
//! (`imgkap`) that writes the BSB/KAP file.
//!
//! # Pipeline
//!
//! ```text
//! 1. Select    capability + flags  →  one resolver for the whole run
//! 2. Discover  files / dirs        →  tiles (whitelist depends on strategy)
//! 3. Resolve   tile                →  bounding box | skip reason
//! 4. Convert   tile + box          →  converter exit status
//! ```
//!
//! Every tile is resolved independently. A tile that cannot be resolved is
//! skipped with a reason and the run moves on; nothing is guessed or repaired.
//!
//! # Georeferencing Strategies
//!
//! - **Delegated**: the raster is opened through a [`georef::GeoBackend`]
//!   (GeoTIFF tags, EPSG registry, PROJ transforms). Accepted only when the
//!   raster's geodetic datum is WGS 84.
//! - **Direct**: a PNG header gives the pixel size of the tile, a `.pgw` world
//!   file gives pixel size and origin, and a closed-form spherical Mercator
//!   inverse gives latitude/longitude. There is no datum check, so the run
//!   warns once that tiles must already be in WGS 84 Web Mercator.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`header`] | 24-byte PNG header: signature, IHDR tag, width, height |
//! | [`worldfile`] | Six-line world file parser |
//! | [`mercator`] | Spherical Web Mercator ↔ longitude/latitude |
//! | [`bounds`] | Validated projected and geographic boxes |
//! | [`georef`] | Backend seam for the delegated strategy, GeoTIFF implementation |
//! | [`resolve`] | Direct and delegated resolvers |
//! | [`strategy`] | Per-run strategy selection from an explicit capability |
//! | [`scan`] | Recursive tile discovery |
//! | [`converter`] | External converter invocation |
//! | [`run`] | Parallel resolve + convert, run report |
//! | [`config`] | `chart2kap.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | Subscriber setup |

pub mod bounds;
pub mod config;
pub mod converter;
pub mod georef;
pub mod header;
pub mod logging;
pub mod mercator;
pub mod output;
pub mod resolve;
pub mod run;
pub mod scan;
pub mod strategy;
pub mod types;
pub mod worldfile;

#[cfg(test)]
pub(crate) mod test_helpers;
