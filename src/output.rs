//! CLI output formatting.
//!
//! Output is **tile-centric**: every line group leads with the tile's 1-based
//! position in the run and its file name, followed by indented context lines
//! (full path, bounding box, skip reason, converter status).
//!
//! ## Convert
//!
//! ```text
//! 001 chart_1.png
//!     Source: /charts/z12/chart_1.png
//!     UL 47.353735 4.491532  LR 47.341562 4.500515
//! 002 chart_2.png skipped (missing world file)
//!     Source: /charts/z12/chart_2.png
//!     world file /charts/z12/chart_2.pgw not found
//!
//! Converted 1, failed 0, skipped 1
//!     missing world file: 1
//! ```
//!
//! ## Check
//!
//! ```text
//! Resolved
//!     chart_1.png  UL 47.353735 4.491532  LR 47.341562 4.500515
//!
//! Skipped
//!     chart_2.png  missing world file
//! ```
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::bounds::GeoBoundingBox;
use crate::run::{RunEvent, RunReport};
use crate::strategy::Strategy;
use crate::types::Tile;
use std::collections::BTreeMap;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn file_name(tile: &Tile) -> String {
    tile.path()
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| tile.to_string())
}

/// Corners in converter argument order: upper-left lat/lon, lower-right lat/lon.
fn format_box(bbox: &GeoBoundingBox) -> String {
    format!(
        "UL {:.6} {:.6}  LR {:.6} {:.6}",
        bbox.upper_left_lat, bbox.upper_left_lon, bbox.lower_right_lat, bbox.lower_right_lon
    )
}

pub fn format_discovery(count: usize, strategy: Strategy) -> Vec<String> {
    let noun = if count == 1 { "chart" } else { "charts" };
    vec![format!("Found {count} {noun} ({strategy} georeferencing)")]
}

/// Format a single run progress event as display lines.
pub fn format_run_event(event: &RunEvent) -> Vec<String> {
    match event {
        RunEvent::Converted { index, request } => vec![
            format!("{} {}", format_index(index + 1), file_name(&request.tile)),
            format!("    Source: {}", request.tile),
            format!("    {}", format_box(&request.bounding_box)),
        ],
        RunEvent::ConversionFailed { index, failure } => {
            let code = failure
                .code
                .map_or_else(|| "none".to_string(), |c| c.to_string());
            let mut lines = vec![
                format!(
                    "{} {} conversion failed (exit {})",
                    format_index(index + 1),
                    file_name(&failure.request.tile),
                    code
                ),
                format!("    Source: {}", failure.request.tile),
                format!("    {}", format_box(&failure.request.bounding_box)),
            ];
            lines.extend(
                failure
                    .detail
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(|l| format!("    {l}")),
            );
            lines
        }
        RunEvent::Skipped { index, outcome } => vec![
            format!(
                "{} {} skipped ({})",
                format_index(index + 1),
                file_name(&outcome.tile),
                outcome.reason
            ),
            format!("    Source: {}", outcome.tile),
            format!("    {}", outcome.message),
        ],
    }
}

/// Totals plus a per-reason breakdown of skipped tiles.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Converted {}, failed {}, skipped {}",
        report.converted.len(),
        report.failed.len(),
        report.skipped.len()
    )];
    let mut by_reason: BTreeMap<&str, usize> = BTreeMap::new();
    for skip in &report.skipped {
        *by_reason.entry(skip.reason.label()).or_default() += 1;
    }
    for (reason, count) in by_reason {
        lines.push(format!("    {reason}: {count}"));
    }
    lines
}

/// Resolved boxes and skip reasons, without converter status.
pub fn format_check_output(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.converted.is_empty() {
        lines.push("Resolved".to_string());
        for request in &report.converted {
            lines.push(format!(
                "    {}  {}",
                file_name(&request.tile),
                format_box(&request.bounding_box)
            ));
        }
    }
    if !report.skipped.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Skipped".to_string());
        for skip in &report.skipped {
            lines.push(format!("    {}  {}", file_name(&skip.tile), skip.reason));
        }
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}
