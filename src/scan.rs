//! Chart tile discovery.
//!
//! Inputs are files and/or directories. Files are taken when their name ends
//! with a whitelisted extension (case-insensitive); directories are walked
//! recursively and every whitelisted file below them is collected. Missing
//! inputs are warned about and skipped.
//!
//! Tiles come back as absolute paths, in input order, each directory's
//! contents sorted by file name.

use crate::types::Tile;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// True when the file name ends with one of `extensions` (which include the dot).
pub fn matches_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| name.ends_with(&ext.to_ascii_lowercase()))
}

/// Collect chart tiles from `inputs`.
pub fn discover(inputs: &[PathBuf], extensions: &[String]) -> Result<Vec<Tile>, ScanError> {
    let mut tiles = Vec::new();

    for input in inputs {
        if input.is_file() {
            if matches_extension(input, extensions) {
                tiles.push(Tile::new(std::path::absolute(input)?));
            } else {
                info!(path = %input.display(), "ignored");
            }
        } else if input.is_dir() {
            walk(input, extensions, &mut tiles)?;
        } else {
            warn!(path = %input.display(), "input not found");
        }
    }

    Ok(tiles)
}

fn walk(root: &Path, extensions: &[String], tiles: &mut Vec<Tile>) -> Result<(), ScanError> {
    let before = tiles.len();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && matches_extension(entry.path(), extensions) {
            tiles.push(Tile::new(std::path::absolute(entry.path())?));
        }
    }
    debug!(dir = %root.display(), found = tiles.len() - before, "scanned directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{DELEGATED_EXTENSIONS, DIRECT_EXTENSIONS};
    use std::fs;
    use tempfile::TempDir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let png = exts(DIRECT_EXTENSIONS);
        assert!(matches_extension(Path::new("a/b/chart.PNG"), &png));
        assert!(matches_extension(Path::new("chart.png"), &png));
        assert!(!matches_extension(Path::new("chart.pgw"), &png));
        assert!(!matches_extension(Path::new("chart.tif"), &png));
        assert!(matches_extension(Path::new("chart.TIF"), &exts(DELEGATED_EXTENSIONS)));
    }

    #[test]
    fn walks_directories_recursively_in_name_order() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("z12/b.png"));
        touch(&tmp.path().join("z12/a.png"));
        touch(&tmp.path().join("z12/a.pgw"));
        touch(&tmp.path().join("z11/deep/c.png"));
        touch(&tmp.path().join("notes.txt"));

        let tiles = discover(&[tmp.path().to_path_buf()], &exts(DIRECT_EXTENSIONS)).unwrap();
        let names: Vec<_> = tiles
            .iter()
            .map(|t| t.path().strip_prefix(tmp.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("z11/deep/c.png"),
                PathBuf::from("z12/a.png"),
                PathBuf::from("z12/b.png"),
            ]
        );
        assert!(tiles.iter().all(|t| t.path().is_absolute()));
    }

    #[test]
    fn whitelist_depends_on_extension_set() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("a.png"));
        touch(&tmp.path().join("b.tiff"));

        let direct = discover(&[tmp.path().to_path_buf()], &exts(DIRECT_EXTENSIONS)).unwrap();
        let delegated = discover(&[tmp.path().to_path_buf()], &exts(DELEGATED_EXTENSIONS)).unwrap();
        assert_eq!(direct.len(), 1);
        assert_eq!(delegated.len(), 2);
    }

    #[test]
    fn explicit_files_are_filtered_too() {
        let tmp = TempDir::new().unwrap();
        let png = tmp.path().join("a.png");
        let txt = tmp.path().join("a.txt");
        touch(&png);
        touch(&txt);

        let tiles = discover(&[png.clone(), txt], &exts(DIRECT_EXTENSIONS)).unwrap();
        assert_eq!(tiles, vec![Tile::new(png)]);
    }

    #[test]
    fn missing_inputs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let png = tmp.path().join("a.png");
        touch(&png);

        let tiles = discover(
            &[tmp.path().join("gone"), png.clone()],
            &exts(DIRECT_EXTENSIONS),
        )
        .unwrap();
        assert_eq!(tiles, vec![Tile::new(png)]);
    }

    #[test]
    fn input_order_is_kept() {
        let tmp = TempDir::new().unwrap();
        let b = tmp.path().join("b.png");
        let a = tmp.path().join("a.png");
        touch(&a);
        touch(&b);

        let tiles = discover(&[b.clone(), a.clone()], &exts(DIRECT_EXTENSIONS)).unwrap();
        assert_eq!(tiles, vec![Tile::new(b), Tile::new(a)]);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        let tiles = discover(&[tmp.path().to_path_buf()], &exts(DIRECT_EXTENSIONS)).unwrap();
        assert!(tiles.is_empty());
    }
}
