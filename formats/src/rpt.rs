//! Survey report (`.RPT`) decoding.
//!
//! The report is one JSON document with three sections under the report
//! root: the dense route trail, the per-capture trail and a summary of
//! abnormal RTK intervals. Any section may be absent; a missing section
//! yields an empty collection, not a failure.
//!

use std::fs;
use std::path::Path;

use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::trace;

use crate::{DecodeError, RawFlag, RtkStatus};

/// Reason code of an abnormal interval. Future firmware may add codes;
/// they are carried verbatim rather than rejected.
///
#[derive(Clone, Debug, Display, EnumString, Eq, PartialEq)]
pub enum AbnormalReason {
    #[strum(serialize = "LOSS")]
    Loss,
    #[strum(serialize = "FEW_SYS")]
    FewSys,
    #[strum(serialize = "LESS_SAT")]
    LessSat,
    #[strum(default)]
    Other(String),
}

/// Dense trajectory sample from the report route section. Immutable once
/// parsed, ordered by timestamp within a flight.
///
#[derive(Clone, Debug)]
pub struct RoutePoint {
    pub flight_id: String,
    /// Device timestamp, milliseconds.
    pub timestamp: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    /// Ellipsoid height, meters.
    pub ellh: Option<f64>,
    pub rtk_status: RtkStatus,
}

/// Route-style point the report tags as coincident with an exposure.
///
#[derive(Clone, Debug)]
pub struct CaptureRecord {
    /// Capture sequence, 0-based document order.
    pub seq: usize,
    pub point: RoutePoint,
}

/// Time interval the device flagged as degraded. `start <= end`; windows
/// within one flight are taken as non-overlapping.
///
#[derive(Clone, Debug)]
pub struct AbnormalWindow {
    pub start: i64,
    pub end: i64,
    pub reason: AbnormalReason,
}

impl AbnormalWindow {
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// Everything one report file contributes.
///
#[derive(Clone, Debug, Default)]
pub struct ReportData {
    pub route: Vec<RoutePoint>,
    pub captures: Vec<CaptureRecord>,
    pub windows: Vec<AbnormalWindow>,
}

// ----- on-disk schema

#[derive(Debug, Default, Deserialize)]
struct ReportFile {
    #[serde(rename = "SURVEYING_REPORT_ROOT", default)]
    root: ReportRoot,
}

#[derive(Debug, Default, Deserialize)]
struct ReportRoot {
    #[serde(rename = "RTK_PATH_INFO_UNIT")]
    path_unit: Option<DetailUnit>,
    #[serde(rename = "VISIBLE_CAM_INFO_UNIT")]
    cam_unit: Option<DetailUnit>,
    #[serde(rename = "RTB_INFO_UNIT")]
    rtb_unit: Option<RtbUnit>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailUnit {
    #[serde(rename = "RTK_DETAIL_INFO", default)]
    detail: Vec<DetailRecord>,
}

#[derive(Debug, Deserialize)]
struct DetailRecord {
    #[serde(rename = "LATITUDE")]
    latitude: Option<f64>,
    #[serde(rename = "LONGITUDE")]
    longitude: Option<f64>,
    #[serde(rename = "HEIGHT")]
    height: Option<f64>,
    #[serde(rename = "TIME_STAMP")]
    timestamp: Option<i64>,
    #[serde(rename = "RTK_STATUS")]
    rtk_status: Option<RawFlag>,
}

impl DetailRecord {
    /// Records without a position cannot be placed on a map and are dropped.
    fn to_point(&self, flight_id: &str) -> Option<RoutePoint> {
        let (latitude, longitude) = (self.latitude?, self.longitude?);
        Some(RoutePoint {
            flight_id: flight_id.to_owned(),
            timestamp: self.timestamp,
            latitude,
            longitude,
            ellh: self.height,
            rtk_status: self
                .rtk_status
                .as_ref()
                .map(RtkStatus::from)
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct RtbUnit {
    #[serde(rename = "RTB_LOSS_ABNORMAL_DURATION", default)]
    loss: Vec<Interval>,
    #[serde(rename = "RTB_TOO_FEW_SYSTEMS_ABNORMAL_DURATION", default)]
    few_sys: Vec<Interval>,
    #[serde(rename = "RTB_SATELLITE_ABNORMAL_DURATION", default)]
    less_sat: Vec<Interval>,
}

#[derive(Debug, Deserialize)]
struct Interval {
    #[serde(rename = "START_TIME")]
    start: Option<i64>,
    #[serde(rename = "END_TIME")]
    end: Option<i64>,
}

fn windows_of(intervals: &[Interval], reason: AbnormalReason, out: &mut Vec<AbnormalWindow>) {
    for iv in intervals {
        if let (Some(start), Some(end)) = (iv.start, iv.end) {
            out.push(AbnormalWindow {
                start,
                end,
                reason: reason.clone(),
            });
        }
    }
}

/// Decode one report file.
///
/// Malformed JSON fails the file with [`DecodeError::BadReport`]; the
/// caller skips it and continues the folder scan.
///
#[tracing::instrument]
pub fn parse_report(path: &Path, flight_id: &str) -> Result<ReportData, DecodeError> {
    let data = fs::read_to_string(path).map_err(|source| DecodeError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ReportFile =
        serde_json::from_str(&data).map_err(|source| DecodeError::BadReport {
            path: path.to_path_buf(),
            source,
        })?;

    let mut out = ReportData::default();

    if let Some(unit) = &file.root.path_unit {
        out.route = unit
            .detail
            .iter()
            .filter_map(|r| r.to_point(flight_id))
            .collect();
    }
    if let Some(unit) = &file.root.cam_unit {
        out.captures = unit
            .detail
            .iter()
            .filter_map(|r| r.to_point(flight_id))
            .enumerate()
            .map(|(seq, point)| CaptureRecord { seq, point })
            .collect();
    }
    if let Some(rtb) = &file.root.rtb_unit {
        windows_of(&rtb.loss, AbnormalReason::Loss, &mut out.windows);
        windows_of(&rtb.few_sys, AbnormalReason::FewSys, &mut out.windows);
        windows_of(&rtb.less_sat, AbnormalReason::LessSat, &mut out.windows);
    }

    trace!(
        "{}: {} route, {} capture, {} windows",
        path.display(),
        out.route.len(),
        out.captures.len(),
        out.windows.len()
    );
    Ok(out)
}
