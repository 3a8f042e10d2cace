//! Per-image records: extracted metadata and the fused per-photo record.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::{QualityTier, RawFlag, RtkStatus};

/// Metadata read from one image by the extraction tool. Everything except
/// the path is optional: a corrupt image or missing tags yield a record
/// with null fields, not a failure.
///
#[derive(Clone, Debug, Default)]
pub struct ImageMetadataRecord {
    pub file: PathBuf,
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub abs_alt_m: Option<f64>,
    pub rel_alt_m: Option<f64>,
    pub yaw_deg: Option<f64>,
    /// Firmware-estimated standard deviations; the timestamp log takes
    /// precedence over these when a log record matches.
    pub std_n_m: Option<f64>,
    pub std_e_m: Option<f64>,
    pub std_u_m: Option<f64>,
    pub rtk_flag: Option<RawFlag>,
}

impl ImageMetadataRecord {
    /// Empty record for an image whose metadata could not be read.
    pub fn empty(file: PathBuf) -> Self {
        ImageMetadataRecord {
            file,
            ..Default::default()
        }
    }
}

/// Canonical fused per-photo record. Exactly one exists per input image;
/// fields stay unknown when a source could not be resolved. Never mutated
/// after fusion.
///
#[derive(Clone, Debug, Serialize)]
pub struct PhotoRecord {
    pub file: String,
    pub flight_id: String,
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Canonical device code of the fix state, when one is known.
    pub rtk_flag: Option<u8>,
    pub rtk_status: RtkStatus,
    pub rtk_quality: QualityTier,
    pub std_n_m: Option<f64>,
    pub std_e_m: Option<f64>,
    pub std_u_m: Option<f64>,
    /// None whenever any standard deviation is missing.
    pub rmse_3d_cm: Option<f64>,
    pub abs_alt_m: Option<f64>,
    pub rel_alt_m: Option<f64>,
    pub yaw_deg: Option<f64>,
}

/// Capture timestamps appear in several renderings depending on firmware.
/// A trailing `Z` and fractional seconds are tolerated.
///
pub fn parse_exif_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim().trim_end_matches('Z');
    for fmt in [
        "%Y:%m:%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("2023:10:22 15:30:45")]
    #[case("2023-10-22 15:30:45")]
    #[case("2023-10-22T15:30:45")]
    #[case("2023-10-22T15:30:45Z")]
    #[case("  2023:10:22 15:30:45 ")]
    fn test_exif_datetime_formats(#[case] input: &str) {
        assert_eq!(
            Utc.with_ymd_and_hms(2023, 10, 22, 15, 30, 45).unwrap(),
            parse_exif_datetime(input).unwrap()
        );
    }

    #[test]
    fn test_exif_datetime_fractional() {
        let t = parse_exif_datetime("2023:10:22 15:30:45.25").unwrap();
        assert_eq!(250, t.timestamp_subsec_millis());
    }

    #[test]
    fn test_exif_datetime_invalid() {
        assert!(parse_exif_datetime("not a date").is_none());
        assert!(parse_exif_datetime("").is_none());
    }
}
