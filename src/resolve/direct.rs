use super::{BoundsResolver, ResolveError};
use crate::bounds::{GeoBoundingBox, GeometryError, ProjectedBounds, ProjectedPoint};
use crate::header::{RasterHeader, read_header};
use crate::mercator::meters_to_lon_lat;
use crate::strategy::Strategy;
use crate::types::Tile;
use crate::worldfile::{AffineWorldFile, WORLD_FILE_EXTENSION, read_world_file, world_file_path};
use tracing::debug;

pub(crate) const DIRECT_ADVISORY: &str =
    "running without delegated georeferencing - charts must be in WGS84 - no check for this";

/// Tunables of the direct strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectOptions {
    /// Move the world-file origin from the pixel center to the pixel corner.
    pub half_pixel_shift: bool,
    /// Extension of the sibling world file, without the dot.
    pub world_file_extension: String,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            half_pixel_shift: true,
            world_file_extension: WORLD_FILE_EXTENSION.to_string(),
        }
    }
}

/// Projected corners of a tile from its header and world file.
///
/// Upper-left is the world-file origin, optionally moved back half a pixel on
/// both axes; lower-right is upper-left plus pixel size times pixel count.
pub fn projected_bounds(
    header: &RasterHeader,
    world: &AffineWorldFile,
    half_pixel_shift: bool,
) -> Result<ProjectedBounds, GeometryError> {
    let shift = if half_pixel_shift { 0.5 } else { 0.0 };
    let ulx = world.origin_x - shift * world.pixel_size_x;
    let uly = world.origin_y - shift * world.pixel_size_y;
    let lrx = ulx + world.pixel_size_x * f64::from(header.width);
    let lry = uly + world.pixel_size_y * f64::from(header.height);
    ProjectedBounds::new(ProjectedPoint::new(ulx, uly), ProjectedPoint::new(lrx, lry))
}

/// Header + world file + spherical Mercator inverse.
#[derive(Debug, Clone, Default)]
pub struct DirectResolver {
    options: DirectOptions,
}

impl DirectResolver {
    pub fn new(options: DirectOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DirectOptions {
        &self.options
    }
}

impl BoundsResolver for DirectResolver {
    fn strategy(&self) -> Strategy {
        Strategy::Direct
    }

    fn resolve_bounds(&self, tile: &Tile) -> Result<GeoBoundingBox, ResolveError> {
        let header = read_header(tile.path())?;
        let world = read_world_file(&world_file_path(tile.path(), &self.options.world_file_extension))?;
        let bounds = projected_bounds(&header, &world, self.options.half_pixel_shift)?;
        debug!(
            tile = %tile,
            width = header.width,
            height = header.height,
            ulx = bounds.upper_left.x,
            uly = bounds.upper_left.y,
            lrx = bounds.lower_right.x,
            lry = bounds.lower_right.y,
            "projected bounds"
        );

        let upper_left = meters_to_lon_lat(bounds.upper_left.x, bounds.upper_left.y);
        let lower_right = meters_to_lon_lat(bounds.lower_right.x, bounds.lower_right.y);
        Ok(GeoBoundingBox::from_corners(upper_left, lower_right)?)
    }

    fn advisory(&self) -> Option<&'static str> {
        Some(DIRECT_ADVISORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::Strategy;
    use crate::test_helpers::{write_png_tile, write_world_file};
    use crate::types::SkipReason;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const WORLD: [f64; 6] = [10.0, 0.0, 0.0, -10.0, 500_000.0, 6_000_000.0];

    fn header(width: u32, height: u32) -> RasterHeader {
        RasterHeader {
            signature: *b"PNG",
            chunk_tag: *b"IHDR",
            width,
            height,
        }
    }

    fn world(values: [f64; 6]) -> AffineWorldFile {
        AffineWorldFile {
            pixel_size_x: values[0],
            pixel_size_y: values[3],
            origin_x: values[4],
            origin_y: values[5],
        }
    }

    fn tile_with_world(dir: &Path, name: &str, width: u32, height: u32, values: &[f64]) -> Tile {
        let path = dir.join(name);
        write_png_tile(&path, width, height);
        write_world_file(&path.with_extension("pgw"), values);
        Tile::new(path)
    }

    #[test]
    fn half_pixel_shift_moves_origin_to_corner() {
        let bounds = projected_bounds(&header(100, 200), &world(WORLD), true).unwrap();
        assert_eq!(bounds.upper_left, ProjectedPoint::new(499_995.0, 6_000_005.0));
        assert_eq!(bounds.lower_right, ProjectedPoint::new(500_995.0, 5_998_005.0));
    }

    #[test]
    fn shift_can_be_disabled() {
        let bounds = projected_bounds(&header(100, 200), &world(WORLD), false).unwrap();
        assert_eq!(bounds.upper_left, ProjectedPoint::new(500_000.0, 6_000_000.0));
        assert_eq!(bounds.lower_right, ProjectedPoint::new(501_000.0, 5_998_000.0));
    }

    #[test]
    fn positive_pixel_size_y_is_invalid() {
        let mut values = WORLD;
        values[3] = 10.0;
        let err = projected_bounds(&header(100, 200), &world(values), true).unwrap_err();
        assert!(matches!(err, GeometryError::InvertedY { .. }));
    }

    #[test]
    fn zero_width_is_invalid() {
        let err = projected_bounds(&header(0, 200), &world(WORLD), true).unwrap_err();
        assert!(matches!(err, GeometryError::InvertedX { .. }));
    }

    #[test]
    fn resolves_tile_on_disk() {
        let tmp = TempDir::new().unwrap();
        let tile = tile_with_world(tmp.path(), "chart.png", 100, 200, &WORLD);

        let bbox = DirectResolver::default().resolve_bounds(&tile).unwrap();
        assert_relative_eq!(bbox.upper_left_lon, 4.491531504833401, epsilon = 1e-9);
        assert_relative_eq!(bbox.upper_left_lat, 47.35373513153043, epsilon = 1e-9);
        assert_relative_eq!(bbox.lower_right_lon, 4.5005146576745965, epsilon = 1e-9);
        assert_relative_eq!(bbox.lower_right_lat, 47.34156209241832, epsilon = 1e-9);
        assert!(bbox.upper_left_lat > bbox.lower_right_lat);
        assert!(bbox.upper_left_lon < bbox.lower_right_lon);
    }

    #[test]
    fn resolve_wraps_request() {
        let tmp = TempDir::new().unwrap();
        let tile = tile_with_world(tmp.path(), "chart.png", 100, 200, &WORLD);
        let request = DirectResolver::default().resolve(&tile).unwrap();
        assert_eq!(request.tile, tile);
    }

    #[test]
    fn positive_pixel_size_y_skips_tile() {
        let tmp = TempDir::new().unwrap();
        let tile = tile_with_world(
            tmp.path(),
            "flipped.png",
            100,
            200,
            &[10.0, 0.0, 0.0, 10.0, 500_000.0, 6_000_000.0],
        );
        let skip = DirectResolver::default().resolve(&tile).unwrap_err();
        assert_eq!(skip.reason, SkipReason::InvalidGeometry);
        assert_eq!(skip.tile, tile);
    }

    #[test]
    fn missing_world_file_skips_tile() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lonely.png");
        write_png_tile(&path, 10, 10);
        let skip = DirectResolver::default().resolve(&Tile::new(path)).unwrap_err();
        assert_eq!(skip.reason, SkipReason::MissingWorldFile);
    }

    #[test]
    fn five_line_world_file_skips_tile() {
        let tmp = TempDir::new().unwrap();
        let tile = tile_with_world(tmp.path(), "short.png", 10, 10, &[10.0, 0.0, 0.0, -10.0, 5.0]);
        let skip = DirectResolver::default().resolve(&tile).unwrap_err();
        assert_eq!(skip.reason, SkipReason::InsufficientWorldFileLines);
    }

    #[test]
    fn non_numeric_world_file_skips_tile() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("typo.png");
        write_png_tile(&path, 10, 10);
        std::fs::write(path.with_extension("pgw"), "10\n0\n0\n-1O\n5\n5\n").unwrap();
        let skip = DirectResolver::default().resolve(&Tile::new(path)).unwrap_err();
        assert_eq!(skip.reason, SkipReason::InvalidNumericField);
        assert!(skip.message.contains("line 4"));
    }

    #[test]
    fn bad_signature_skips_before_world_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fake.png");
        let mut bytes = crate::test_helpers::png_header_bytes(10, 10);
        bytes[1..4].copy_from_slice(b"JPG");
        std::fs::write(&path, bytes).unwrap();
        let skip = DirectResolver::default().resolve(&Tile::new(path)).unwrap_err();
        assert_eq!(skip.reason, SkipReason::InvalidSignature);
    }

    #[test]
    fn missing_tile_is_unreadable() {
        let skip = DirectResolver::default()
            .resolve(&Tile::new(PathBuf::from("/nonexistent/x.png")))
            .unwrap_err();
        assert_eq!(skip.reason, SkipReason::UnreadableHeader);
    }

    #[test]
    fn custom_world_file_extension() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("chart.png");
        write_png_tile(&path, 100, 200);
        write_world_file(&path.with_extension("wld"), &WORLD);
        let resolver = DirectResolver::new(DirectOptions {
            world_file_extension: "wld".into(),
            ..DirectOptions::default()
        });
        assert!(resolver.resolve_bounds(&Tile::new(path)).is_ok());
    }

    #[test]
    fn advisory_is_always_present() {
        assert_eq!(DirectResolver::default().advisory(), Some(DIRECT_ADVISORY));
        assert_eq!(DirectResolver::default().strategy(), Strategy::Direct);
    }

    proptest! {
        #[test]
        fn box_is_ordered_or_geometry_is_invalid(
            psx in prop_oneof![-50.0f64..-0.5, 0.5f64..50.0],
            psy in prop_oneof![-50.0f64..-0.5, 0.5f64..50.0],
            ox in -1.0e7f64..1.0e7,
            oy in -1.0e7f64..1.0e7,
            w in 1u32..5000,
            h in 1u32..5000,
        ) {
            let wf = AffineWorldFile { pixel_size_x: psx, pixel_size_y: psy, origin_x: ox, origin_y: oy };
            match projected_bounds(&header(w, h), &wf, true) {
                Ok(bounds) => {
                    prop_assert!(psx > 0.0 && psy < 0.0);
                    let ul = meters_to_lon_lat(bounds.upper_left.x, bounds.upper_left.y);
                    let lr = meters_to_lon_lat(bounds.lower_right.x, bounds.lower_right.y);
                    let bbox = GeoBoundingBox::from_corners(ul, lr);
                    prop_assert!(bbox.is_ok());
                }
                Err(_) => prop_assert!(psx < 0.0 || psy > 0.0),
            }
        }
    }
}
