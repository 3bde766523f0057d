//! Hand-off to the external chart converter.
//!
//! The converter is invoked once per resolved tile as
//!
//! ```text
//! <program> [extra args...] <tile> <ullat> <ullon> <lrlat> <lrlon>
//! ```
//!
//! with coordinates printed to six decimals. The exit status is captured and
//! reported back; a failing conversion is recorded in the run report but does
//! not stop the run.

use crate::bounds::GeoBoundingBox;
use crate::types::ConversionRequest;
use serde::Serialize;
use std::ffi::OsString;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, info};

/// Converter executable used when none is configured.
pub const DEFAULT_PROGRAM: &str = "imgkap";

#[derive(Error, Debug)]
pub enum ConverterError {
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// What the converter process reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConverterStatus {
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub stderr: String,
}

impl ConverterStatus {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Boundary to whatever turns a resolved tile into a chart file.
pub trait Converter: Sync {
    fn convert(&self, request: &ConversionRequest) -> Result<ConverterStatus, ConverterError>;
}

fn corner_args(bbox: &GeoBoundingBox) -> [String; 4] {
    [
        format!("{:.6}", bbox.upper_left_lat),
        format!("{:.6}", bbox.upper_left_lon),
        format!("{:.6}", bbox.lower_right_lat),
        format!("{:.6}", bbox.lower_right_lon),
    ]
}

/// Positional arguments for one request: tile path then the four corners.
///
/// The path is passed through as-is, so non-UTF-8 file names reach the
/// converter unchanged.
pub fn converter_args(request: &ConversionRequest) -> Vec<OsString> {
    let mut args = vec![request.tile.path().as_os_str().to_os_string()];
    args.extend(corner_args(&request.bounding_box).map(OsString::from));
    args
}

/// Runs the converter as a child process and waits for it.
#[derive(Debug, Clone)]
pub struct ProcessConverter {
    program: String,
    extra_args: Vec<String>,
}

impl ProcessConverter {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    /// The full command as it would be typed in a shell, for logging.
    pub fn command_line(&self, request: &ConversionRequest) -> String {
        std::iter::once(self.program.clone())
            .chain(self.extra_args.iter().cloned())
            .chain(std::iter::once(request.tile.path().display().to_string()))
            .chain(corner_args(&request.bounding_box))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Converter for ProcessConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<ConverterStatus, ConverterError> {
        debug!(tile = %request.tile, command = %self.command_line(request), "invoking converter");
        let output = Command::new(&self.program)
            .args(&self.extra_args)
            .args(converter_args(request))
            .output()
            .map_err(|source| ConverterError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            debug!(tile = %request.tile, "{}", stdout.trim_end());
        }
        Ok(ConverterStatus {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
        })
    }
}

/// Logs the command that would run and reports success without spawning.
#[derive(Debug, Clone)]
pub struct DryRunConverter {
    inner: ProcessConverter,
}

impl DryRunConverter {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            inner: ProcessConverter::new(program, extra_args),
        }
    }
}

impl Converter for DryRunConverter {
    fn convert(&self, request: &ConversionRequest) -> Result<ConverterStatus, ConverterError> {
        info!(tile = %request.tile, "would run: {}", self.inner.command_line(request));
        Ok(ConverterStatus::success())
    }
}
