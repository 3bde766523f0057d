//! The conversion run: resolve every tile, hand the resolved ones to the
//! converter, collect a report.
//!
//! Tiles are independent, so they are fanned out over the rayon pool. Per-tile
//! progress is streamed as [`RunEvent`]s over an optional channel; the final
//! [`RunReport`] lists tiles in input order regardless of completion order.

use crate::converter::Converter;
use crate::resolve::BoundsResolver;
use crate::strategy::Strategy;
use crate::types::{ConversionRequest, SkipOutcome, Tile};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum RunError {
    #[error("no charts found to convert")]
    NoTiles,
}

/// A resolved tile the converter did not turn into a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedConversion {
    pub request: ConversionRequest,
    /// Converter exit code, when it ran at all.
    pub code: Option<i32>,
    pub detail: String,
}

/// Progress events streamed while the run is in flight.
#[derive(Debug, Clone)]
pub enum RunEvent {
    Converted {
        index: usize,
        request: ConversionRequest,
    },
    ConversionFailed {
        index: usize,
        failure: FailedConversion,
    },
    Skipped {
        index: usize,
        outcome: SkipOutcome,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub strategy: Strategy,
    pub converted: Vec<ConversionRequest>,
    pub failed: Vec<FailedConversion>,
    pub skipped: Vec<SkipOutcome>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len() + self.skipped.len()
    }
}

enum TileOutcome {
    Converted(ConversionRequest),
    Failed(FailedConversion),
    Skipped(SkipOutcome),
}

fn process_tile(resolver: &dyn BoundsResolver, converter: &dyn Converter, tile: &Tile) -> TileOutcome {
    let request = match resolver.resolve(tile) {
        Ok(request) => request,
        Err(skip) => return TileOutcome::Skipped(skip),
    };

    match converter.convert(&request) {
        Ok(status) if status.is_success() => {
            info!(tile = %tile, "converted");
            TileOutcome::Converted(request)
        }
        Ok(status) => {
            let code = status
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string());
            warn!(tile = %tile, code = %code, "converter failed: {}", status.stderr);
            TileOutcome::Failed(FailedConversion {
                request,
                code: status.code,
                detail: status.stderr,
            })
        }
        Err(e) => {
            warn!(tile = %tile, "{e}");
            TileOutcome::Failed(FailedConversion {
                request,
                code: None,
                detail: e.to_string(),
            })
        }
    }
}

/// Resolve and convert every tile.
///
/// Fails only when `tiles` is empty; every per-tile problem ends up in the
/// report instead.
pub fn run(
    tiles: &[Tile],
    resolver: &dyn BoundsResolver,
    converter: &dyn Converter,
    events: Option<Sender<RunEvent>>,
) -> Result<RunReport, RunError> {
    if tiles.is_empty() {
        return Err(RunError::NoTiles);
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        strategy = %resolver.strategy(),
        tiles = tiles.len(),
        "starting run"
    );
    if let Some(advisory) = resolver.advisory() {
        warn!("{advisory}");
    }

    let outcomes: Vec<TileOutcome> = tiles
        .par_iter()
        .enumerate()
        .map_with(events, |events, (index, tile)| {
            let outcome = process_tile(resolver, converter, tile);
            if let Some(tx) = events {
                let event = match &outcome {
                    TileOutcome::Converted(request) => RunEvent::Converted {
                        index,
                        request: request.clone(),
                    },
                    TileOutcome::Failed(failure) => RunEvent::ConversionFailed {
                        index,
                        failure: failure.clone(),
                    },
                    TileOutcome::Skipped(outcome) => RunEvent::Skipped {
                        index,
                        outcome: outcome.clone(),
                    },
                };
                // Printer thread gone means nobody is listening; keep going.
                tx.send(event).ok();
            }
            outcome
        })
        .collect();

    let mut report = RunReport {
        strategy: resolver.strategy(),
        converted: Vec::new(),
        failed: Vec::new(),
        skipped: Vec::new(),
    };
    for outcome in outcomes {
        match outcome {
            TileOutcome::Converted(request) => report.converted.push(request),
            TileOutcome::Failed(failure) => report.failed.push(failure),
            TileOutcome::Skipped(skip) => report.skipped.push(skip),
        }
    }

    info!(
        converted = report.converted.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "done"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::tests::RecordingConverter;
    use crate::georef::tests::MockGeoBackend;
    use crate::georef::{Dataset, GeoTransform, SpatialRef};
    use crate::resolve::{DelegatedResolver, DirectResolver};
    use crate::test_helpers::write_tile;
    use crate::types::SkipReason;
    use tempfile::TempDir;

    const WORLD: [f64; 6] = [10.0, 0.0, 0.0, -10.0, 500_000.0, 6_000_000.0];

    #[test]
    fn empty_tile_list_is_an_error() {
        let result = run(&[], &DirectResolver::default(), &RecordingConverter::new(), None);
        assert!(matches!(result, Err(RunError::NoTiles)));
    }

    #[test]
    fn report_partitions_outcomes_in_input_order() {
        let tmp = TempDir::new().unwrap();
        let c = write_tile(tmp.path(), "c.png", 100, 200, Some(&WORLD[..]));
        let a = write_tile(tmp.path(), "a.png", 100, 200, Some(&WORLD[..]));
        let missing = write_tile(tmp.path(), "b.png", 100, 200, None);
        let tiles = vec![c.clone(), missing.clone(), a.clone()];

        let converter = RecordingConverter::new();
        let report = run(&tiles, &DirectResolver::default(), &converter, None).unwrap();

        let converted: Vec<_> = report.converted.iter().map(|r| r.tile.clone()).collect();
        assert_eq!(converted, vec![c, a]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].tile, missing);
        assert_eq!(report.skipped[0].reason, SkipReason::MissingWorldFile);
        assert_eq!(report.total(), 3);
        assert_eq!(report.strategy, Strategy::Direct);
    }

    #[test]
    fn skipped_tiles_never_reach_converter() {
        let tmp = TempDir::new().unwrap();
        let good = write_tile(tmp.path(), "good.png", 100, 200, Some(&WORLD[..]));
        let bad = write_tile(tmp.path(), "bad.png", 100, 200, Some(&[10.0, 0.0, 0.0, 10.0, 0.0, 0.0][..]));

        let converter = RecordingConverter::new();
        run(&[good.clone(), bad], &DirectResolver::default(), &converter, None).unwrap();
        assert_eq!(converter.converted_tiles(), vec![good]);
    }

    #[test]
    fn failing_converter_does_not_abort_run() {
        let tmp = TempDir::new().unwrap();
        let first = write_tile(tmp.path(), "1.png", 100, 200, Some(&WORLD[..]));
        let second = write_tile(tmp.path(), "2.png", 100, 200, Some(&WORLD[..]));

        let converter = RecordingConverter::new().failing_on(first.path());
        let report = run(
            &[first.clone(), second.clone()],
            &DirectResolver::default(),
            &converter,
            None,
        )
        .unwrap();

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].request.tile, first);
        assert_eq!(report.failed[0].code, Some(1));
        assert_eq!(report.converted.len(), 1);
        assert_eq!(report.converted[0].tile, second);
    }

    #[test]
    fn events_cover_every_tile() {
        let tmp = TempDir::new().unwrap();
        let tiles: Vec<Tile> = (0..8)
            .map(|i| {
                let world = if i % 2 == 0 { Some(&WORLD[..]) } else { None };
                write_tile(tmp.path(), &format!("{i}.png"), 100, 200, world)
            })
            .collect();

        let (tx, rx) = std::sync::mpsc::channel();
        let report = run(&tiles, &DirectResolver::default(), &RecordingConverter::new(), Some(tx)).unwrap();

        let mut indices: Vec<usize> = rx
            .iter()
            .map(|event| match event {
                RunEvent::Converted { index, .. }
                | RunEvent::ConversionFailed { index, .. }
                | RunEvent::Skipped { index, .. } => index,
            })
            .collect();
        indices.sort();
        assert_eq!(indices, (0..8).collect::<Vec<_>>());
        assert_eq!(report.converted.len(), 4);
        assert_eq!(report.skipped.len(), 4);
    }

    #[test]
    fn delegated_run_uses_backend() {
        let wgs84 = Dataset {
            spatial_ref: Some(SpatialRef::wgs84()),
            geo_transform: GeoTransform([4.0, 0.5, 0.0, 53.0, 0.0, -0.5]),
            width: 2,
            height: 2,
        };
        let backend = MockGeoBackend::new(1.0).with_dataset("/charts/a.tif", wgs84);
        let resolver = DelegatedResolver::new(Box::new(backend));
        let converter = RecordingConverter::new();

        let report = run(&[Tile::new("/charts/a.tif")], &resolver, &converter, None).unwrap();
        assert_eq!(report.strategy, Strategy::Delegated);
        let bbox = report.converted[0].bounding_box;
        assert_eq!((bbox.upper_left_lon, bbox.upper_left_lat), (4.0, 53.0));
        assert_eq!((bbox.lower_right_lon, bbox.lower_right_lat), (5.0, 52.0));
    }

    #[test]
    fn report_serializes_to_json() {
        let tmp = TempDir::new().unwrap();
        let tile = write_tile(tmp.path(), "a.png", 100, 200, None);
        let report = run(&[tile], &DirectResolver::default(), &RecordingConverter::new(), None).unwrap();

        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["strategy"], "direct");
        assert_eq!(json["skipped"][0]["reason"], "missing_world_file");
    }
}
