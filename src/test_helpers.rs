//! Shared test utilities: on-disk tile and world file fixtures.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let tile = write_tile(tmp.path(), "chart.png", 100, 200, Some(&[10.0, 0.0, 0.0, -10.0, 5e5, 6e6][..]));
//! ```

use crate::types::Tile;
use std::path::Path;

/// The 24 header bytes of a PNG with the given dimensions.
pub fn png_header_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(24);
    bytes.extend_from_slice(b"\x89PNG\r\n\x1a\n");
    bytes.extend_from_slice(&13u32.to_be_bytes());
    bytes.extend_from_slice(b"IHDR");
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes
}

/// Write a file that starts like a PNG of the given size.
///
/// Only the header is real; nothing here decodes pixel data.
pub fn write_png_tile(path: &Path, width: u32, height: u32) {
    let mut bytes = png_header_bytes(width, height);
    // bit depth, color type, compression, filter, interlace, CRC
    bytes.extend_from_slice(&[8, 2, 0, 0, 0, 0, 0, 0, 0]);
    std::fs::write(path, bytes).unwrap();
}

/// Write one value per line.
pub fn write_world_file(path: &Path, values: &[f64]) {
    let content: String = values.iter().map(|v| format!("{v}\n")).collect();
    std::fs::write(path, content).unwrap();
}

/// A PNG tile in `dir`, with a sibling `.pgw` when `world` is given.
pub fn write_tile(dir: &Path, name: &str, width: u32, height: u32, world: Option<&[f64]>) -> Tile {
    let path = dir.join(name);
    write_png_tile(&path, width, height);
    if let Some(values) = world {
        write_world_file(&path.with_extension("pgw"), values);
    }
    Tile::new(path)
}
