//! Nearest-neighbor fusion of image metadata with the timestamp log.
//!
//! Exactly one [`PhotoRecord`] is produced per image, whatever could or
//! could not be resolved for it. The join is spatial: the nearest log
//! record by ground distance wins when it lies within the match
//! tolerance, independent of flight. Otherwise the photo falls back to
//! its own metadata, a defined outcome rather than an error.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::trace;

use rtkqa_formats::{
    ImageMetadataRecord, PhotoRecord, RtkStatus, TimestampLogRecord,
};

use crate::{quality, EngineConfig, SourceFile};

/// Mean Earth radius, meters.
const EARTH_R_M: f64 = 6_371_000.0;

/// Great-circle ground distance between two WGS84 coordinates.
///
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = lat1.to_radians();
    let p2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dl = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
    2.0 * EARTH_R_M * a.sqrt().asin()
}

/// Nearest log record by ground distance. Equal distances resolve to the
/// lowest sequence index, keeping the match deterministic.
///
pub fn nearest_log<'a>(
    lat: f64,
    lon: f64,
    logs: &'a [TimestampLogRecord],
) -> Option<(&'a TimestampLogRecord, f64)> {
    let mut best: Option<(&TimestampLogRecord, f64)> = None;
    for rec in logs {
        let d = haversine_m(lat, lon, rec.latitude, rec.longitude);
        let better = match best {
            None => true,
            Some((b, bd)) => d < bd || (d == bd && rec.seq < b.seq),
        };
        if better {
            best = Some((rec, d));
        }
    }
    best
}

/// Fusion outcome counters for the run summary.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct FusionStats {
    pub matched: usize,
    pub metadata_only: usize,
}

/// Fuse every image into its canonical record.
///
/// The per-photo STD priority rule: log-derived values win over metadata
/// values, the log being written by the positioning receiver itself while
/// metadata STDs may be firmware estimates.
///
#[tracing::instrument(skip_all)]
pub fn fuse_photos(
    images: &[SourceFile],
    meta: &BTreeMap<PathBuf, ImageMetadataRecord>,
    logs: &[TimestampLogRecord],
    cfg: &EngineConfig,
) -> (Vec<PhotoRecord>, FusionStats) {
    let mut records = Vec::with_capacity(images.len());
    let mut stats = FusionStats::default();

    for image in images {
        let m = meta
            .get(&image.path)
            .cloned()
            .unwrap_or_else(|| ImageMetadataRecord::empty(image.path.clone()));

        let hit = match (m.latitude, m.longitude) {
            (Some(lat), Some(lon)) => {
                nearest_log(lat, lon, logs).filter(|(_, d)| *d <= cfg.match_tolerance_m)
            }
            _ => None,
        };

        let (status, has_flag, stds, flight_id) = match hit {
            Some((rec, d)) => {
                trace!("{}: matched seq {} at {d:.2} m", image.path.display(), rec.seq);
                stats.matched += 1;
                (
                    rec.rtk_status,
                    true,
                    (Some(rec.std_n_m), Some(rec.std_e_m), Some(rec.std_u_m)),
                    rec.flight_id.clone(),
                )
            }
            None => {
                stats.metadata_only += 1;
                let status = m.rtk_flag.as_ref().map(RtkStatus::from).unwrap_or_default();
                (
                    status,
                    m.rtk_flag.is_some(),
                    (m.std_n_m, m.std_e_m, m.std_u_m),
                    image.flight_id.clone(),
                )
            }
        };

        let rmse_3d_cm = quality::rmse_3d_cm(stds.0, stds.1, stds.2);
        let rtk_quality = quality::fix_quality(status, has_flag, stds, cfg);

        records.push(PhotoRecord {
            file: image
                .path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_default(),
            flight_id,
            time: m.time,
            latitude: m.latitude,
            longitude: m.longitude,
            rtk_flag: status.code(),
            rtk_status: status,
            rtk_quality,
            std_n_m: stds.0,
            std_e_m: stds.1,
            std_u_m: stds.2,
            rmse_3d_cm,
            abs_alt_m: m.abs_alt_m,
            rel_alt_m: m.rel_alt_m,
            yaw_deg: m.yaw_deg,
        });
    }

    (records, stats)
}
