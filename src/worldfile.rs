//! World file (`.pgw`) parsing.
//!
//! A world file is six plain-text numbers, one per line:
//!
//! ```text
//! 1  A  pixel size in x
//! 2  D  rotation about y  (ignored)
//! 3  B  rotation about x  (ignored)
//! 4  E  pixel size in y   (usually negative)
//! 5  C  x of the upper-left pixel
//! 6  F  y of the upper-left pixel
//! ```
//!
//! Only lines 1, 4, 5 and 6 are read; anything after line 6 is ignored.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sidecar extension for PNG tiles.
pub const WORLD_FILE_EXTENSION: &str = "pgw";

/// Minimum number of lines a usable world file has.
const REQUIRED_LINES: usize = 6;

#[derive(Error, Debug)]
pub enum WorldFileError {
    #[error("world file {0} not found")]
    Missing(PathBuf),
    #[error("unable to read world file: {0}")]
    Io(#[from] std::io::Error),
    #[error("not enough lines in world file ({found}, need 6)")]
    TooFewLines { found: usize },
    #[error("line {line} of world file is not a number: {value:?}")]
    InvalidNumber { line: usize, value: String },
    #[error("world file {0} is not text")]
    NotText(PathBuf),
}

/// The per-axis affine transform a world file describes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AffineWorldFile {
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

/// Sibling world file path for a tile: same stem, world-file extension.
pub fn world_file_path(tile: &Path, extension: &str) -> PathBuf {
    tile.with_extension(extension)
}

/// Parse world file text.
pub fn parse_world_file(content: &str) -> Result<AffineWorldFile, WorldFileError> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < REQUIRED_LINES {
        return Err(WorldFileError::TooFewLines { found: lines.len() });
    }

    // 1-based line numbers in errors, matching what a user sees in an editor.
    let value = |line: usize| -> Result<f64, WorldFileError> {
        let raw = lines[line - 1].trim();
        raw.parse::<f64>()
            .map_err(|_| WorldFileError::InvalidNumber {
                line,
                value: raw.to_string(),
            })
    };

    Ok(AffineWorldFile {
        pixel_size_x: value(1)?,
        pixel_size_y: value(4)?,
        origin_x: value(5)?,
        origin_y: value(6)?,
    })
}

/// Read and parse the world file at `path`.
pub fn read_world_file(path: &Path) -> Result<AffineWorldFile, WorldFileError> {
    if !path.exists() {
        return Err(WorldFileError::Missing(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8(bytes).map_err(|_| WorldFileError::NotText(path.to_path_buf()))?;
    parse_world_file(&content)
}
