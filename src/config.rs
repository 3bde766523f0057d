//! Configuration loading and validation.
//!
//! Configuration lives in an optional `chart2kap.toml` in the working
//! directory, or in any file passed with `--config`. Stock defaults are
//! overridden by whatever the file sets; command-line flags override both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [converter]
//! program = "imgkap"        # Chart converter executable
//! extra_args = []           # Arguments placed before the tile and coordinates
//!
//! [direct]
//! half_pixel_shift = true   # Move world-file origin from pixel center to corner
//! world_file_extension = "pgw"
//!
//! [discovery]
//! direct_extensions = [".png"]
//! delegated_extensions = [".png", ".tiff", ".tif"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Config files are sparse; unknown keys are rejected to catch typos early.

use crate::converter::DEFAULT_PROGRAM;
use crate::resolve::DirectOptions;
use crate::strategy::{DELEGATED_EXTENSIONS, DIRECT_EXTENSIONS, Strategy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "chart2kap.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config file {0} not found")]
    NotFound(PathBuf),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub converter: ConverterConfig,
    pub direct: DirectConfig,
    pub discovery: DiscoveryConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.converter.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "converter.program must not be empty".into(),
            ));
        }
        let ext = &self.direct.world_file_extension;
        if ext.is_empty() || ext.starts_with('.') {
            return Err(ConfigError::Validation(
                "direct.world_file_extension must be a bare extension like \"pgw\"".into(),
            ));
        }
        for (key, list) in [
            ("discovery.direct_extensions", &self.discovery.direct_extensions),
            ("discovery.delegated_extensions", &self.discovery.delegated_extensions),
        ] {
            if list.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if let Some(bad) = list.iter().find(|e| !e.starts_with('.') || e.len() < 2) {
                return Err(ConfigError::Validation(format!(
                    "{key}: {bad:?} must start with a dot, like \".png\""
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn direct_options(&self) -> DirectOptions {
        DirectOptions {
            half_pixel_shift: self.direct.half_pixel_shift,
            world_file_extension: self.direct.world_file_extension.clone(),
        }
    }
}

/// External chart converter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    pub program: String,
    pub extra_args: Vec<String>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            extra_args: Vec::new(),
        }
    }
}

/// Direct (world file) strategy settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectConfig {
    pub half_pixel_shift: bool,
    pub world_file_extension: String,
}

impl Default for DirectConfig {
    fn default() -> Self {
        let options = DirectOptions::default();
        Self {
            half_pixel_shift: options.half_pixel_shift,
            world_file_extension: options.world_file_extension,
        }
    }
}

/// Tile extension whitelists, one per strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub direct_extensions: Vec<String>,
    pub delegated_extensions: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            direct_extensions: owned(DIRECT_EXTENSIONS),
            delegated_extensions: owned(DELEGATED_EXTENSIONS),
        }
    }
}

impl DiscoveryConfig {
    pub fn extensions(&self, strategy: Strategy) -> &[String] {
        match strategy {
            Strategy::Direct => &self.direct_extensions,
            Strategy::Delegated => &self.delegated_extensions,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of tiles resolved and converted at once.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// The stock defaults as a `toml::Value::Table`, the base layer for overrides.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Config::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<Config, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective configuration.
///
/// An explicit path must exist. Without one, [`CONFIG_FILE_NAME`] in `dir` is
/// used when present, else the stock defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => dir.join(CONFIG_FILE_NAME),
    };
    let overlay = if path.exists() {
        let content = fs::read_to_string(&path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        None
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# chart2kap configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Looked up as ./chart2kap.toml, or passed with --config <FILE>.
# Command-line flags override these values. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Chart converter
# ---------------------------------------------------------------------------
[converter]
# Executable invoked once per resolved tile as:
#   <program> [extra_args...] <tile> <ullat> <ullon> <lrlat> <lrlon>
program = "imgkap"

# Arguments placed before the tile path and coordinates.
extra_args = []

# ---------------------------------------------------------------------------
# Direct strategy (PNG + world file, spherical Mercator)
# ---------------------------------------------------------------------------
[direct]
# World files give the center of the upper-left pixel; the tile grid is
# read from its outer corner. Disable for world files that already point
# at the corner. Also settable with --no-half-pixel-shift.
half_pixel_shift = true

# Extension of the world file next to each tile (no dot).
world_file_extension = "pgw"

# ---------------------------------------------------------------------------
# Discovery
# ---------------------------------------------------------------------------
[discovery]
# File name endings accepted as tiles, matched case-insensitively.
direct_extensions = [".png"]
delegated_extensions = [".png", ".tiff", ".tif"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum tiles processed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
