//! One pipeline run, start to finish: scan, parse, extract, fuse,
//! segment, classify, assemble.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use rtkqa_exif::Extractor;
use rtkqa_formats::{
    parse_log, parse_report, AbnormalWindow, RmseBin, RoutePoint, TimestampLogRecord,
};

use crate::{
    assemble, classify_route, fuse_photos, scan_folder, segment, ClassifiedRoutePoint,
    EngineConfig, Layers, RunError,
};

/// Per-flight counts for the run summary. The RMSE columns bin each
/// photo's accuracy figure with the configured boundaries.
///
#[derive(Clone, Debug, Serialize)]
pub struct FlightSummary {
    pub flight_id: String,
    pub photos: usize,
    pub rmse_low: usize,
    pub rmse_medium: usize,
    pub rmse_high: usize,
    pub route_points: usize,
    pub windows: usize,
}

/// Counts and collected warnings for one run. File-local failures land
/// here instead of aborting anything.
///
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunSummary {
    pub flights: Vec<FlightSummary>,
    pub photos: usize,
    pub matched: usize,
    pub metadata_only: usize,
    pub route_points: usize,
    pub capture_points: usize,
    pub dropped_log_lines: usize,
    pub warnings: Vec<String>,
}

/// Result of one pipeline run.
///
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunOutput {
    pub layers: Layers,
    pub summary: RunSummary,
}

/// Run the whole pipeline over one folder tree.
///
/// The extractor liveness check happens once, before any file is touched:
/// without the tool every photo record would come out empty, which is
/// worse than failing loudly.
///
#[tracing::instrument(skip(cfg, extractor))]
pub fn run(
    root: &Path,
    cfg: &EngineConfig,
    extractor: &dyn Extractor,
) -> Result<RunOutput, RunError> {
    let tool_version = extractor.ensure()?;
    info!("{} {tool_version}", extractor.name());

    let scan = scan_folder(root)?;

    let mut warnings = Vec::new();

    // Reports and logs read disjoint files; results merge in sorted scan
    // order so reruns are identical.
    let mut route: Vec<RoutePoint> = Vec::new();
    let mut capture_points = 0usize;
    let mut windows: BTreeMap<String, Vec<AbnormalWindow>> = BTreeMap::new();
    for rpt in &scan.reports {
        match parse_report(&rpt.path, &rpt.flight_id) {
            Ok(data) => {
                capture_points += data.captures.len();
                route.extend(data.route);
                if !data.windows.is_empty() {
                    windows
                        .entry(rpt.flight_id.clone())
                        .or_default()
                        .extend(data.windows);
                }
            }
            Err(e) => {
                warn!("{e}");
                warnings.push(e.to_string());
            }
        }
    }

    let mut logs: Vec<TimestampLogRecord> = Vec::new();
    let mut dropped_log_lines = 0usize;
    for mrk in &scan.logs {
        match parse_log(&mrk.path, &mrk.flight_id) {
            Ok(data) => {
                if data.dropped > 0 {
                    warnings.push(format!(
                        "{}: {} unparseable rows",
                        mrk.path.display(),
                        data.dropped
                    ));
                }
                dropped_log_lines += data.dropped;
                logs.extend(data.records);
            }
            Err(e) => {
                warn!("{e}");
                warnings.push(e.to_string());
            }
        }
    }

    let image_paths: Vec<PathBuf> = scan.images.iter().map(|s| s.path.clone()).collect();
    let meta = extractor.batch_read(&image_paths, cfg.batch_size)?;

    let (photos, stats) = fuse_photos(&scan.images, &meta, &logs, cfg);

    let flights = segment(photos, route, windows);

    let classified: Vec<(String, Vec<ClassifiedRoutePoint>)> = flights
        .iter()
        .filter(|f| !f.route.is_empty())
        .map(|f| (f.id.clone(), classify_route(&f.route, &f.windows, cfg)))
        .collect();

    let layers = assemble(&flights, &classified);

    let summary = RunSummary {
        flights: flights
            .iter()
            .map(|f| {
                let mut bins = [0usize; 3];
                for p in &f.photos {
                    if let Some(rmse) = p.rmse_3d_cm {
                        bins[cfg.rmse_bins.classify(rmse) as usize] += 1;
                    }
                }
                FlightSummary {
                    flight_id: f.id.clone(),
                    photos: f.photos.len(),
                    rmse_low: bins[RmseBin::Low as usize],
                    rmse_medium: bins[RmseBin::Medium as usize],
                    rmse_high: bins[RmseBin::High as usize],
                    route_points: f.route.len(),
                    windows: f.windows.len(),
                }
            })
            .collect(),
        photos: layers.photos.len(),
        matched: stats.matched,
        metadata_only: stats.metadata_only,
        route_points: flights.iter().map(|f| f.route.len()).sum(),
        capture_points,
        dropped_log_lines,
        warnings,
    };

    info!(
        "{} photos across {} flight(s)",
        summary.photos,
        summary.flights.len()
    );
    Ok(RunOutput { layers, summary })
}
