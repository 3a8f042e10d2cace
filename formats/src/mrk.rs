//! Per-capture timestamp log (`.MRK`) decoding.
//!
//! One text row per exposure, written by the positioning receiver:
//!
//! ```text
//! 1	528012.123456,[2251]	 21.6,N	 -7.1,E	 -37.0,V	40.16023495,Lat	116.27432587,Lon	41.741,Ellh	0.010,0.012,0.021	50,Q
//! ```
//!
//! Rows are in exposure order, which is the capture sequence order. The
//! leading index, GPS time and antenna offsets vary between firmware; rows
//! without them still decode. A row that fails numeric parsing is skipped
//! and counted, never aborting the file.
//!

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, TimeZone, Utc};
use nom::bytes::complete::tag;
use nom::character::complete::{char, digit1, one_of, space0, space1};
use nom::combinator::{map_res, opt};
use nom::multi::many0;
use nom::number::complete::double;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::IResult;
use tracing::{debug, trace};

use crate::{DecodeError, RtkStatus};

/// One per-capture entry from the log.
///
#[derive(Clone, Debug)]
pub struct TimestampLogRecord {
    pub flight_id: String,
    /// Capture sequence, 0-based file order.
    pub seq: usize,
    pub latitude: f64,
    pub longitude: f64,
    /// Ellipsoid height, meters.
    pub ellh: f64,
    pub std_n_m: f64,
    pub std_e_m: f64,
    pub std_u_m: f64,
    pub rtk_status: RtkStatus,
    /// Some firmware omit the GPS time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Decoded log plus the number of rows that failed to parse.
///
#[derive(Clone, Debug, Default)]
pub struct LogData {
    pub records: Vec<TimestampLogRecord>,
    pub dropped: usize,
}

/// GPS time runs ahead of UTC by the leap seconds accumulated since the
/// GPS epoch (18 s since 2017).
const GPS_UTC_LEAP_S: i64 = 18;

/// Convert GPS seconds-of-week plus week number to UTC.
///
pub fn gps_to_utc(secs: f64, week: i64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    let epoch = Utc.with_ymd_and_hms(1980, 1, 6, 0, 0, 0).single()?;
    let ms = (secs * 1000.0).round() as i64 + (week * 7 * 86_400 - GPS_UTC_LEAP_S) * 1000;
    epoch.checked_add_signed(Duration::milliseconds(ms))
}

// ----- row grammar

struct RawRow {
    time: Option<(f64, i64)>,
    lat: f64,
    lon: f64,
    ellh: f64,
    std_n: f64,
    std_e: f64,
    std_u: f64,
    flag: i64,
}

fn num(i: &str) -> IResult<&str, f64> {
    preceded(space0, double)(i)
}

fn uint(i: &str) -> IResult<&str, i64> {
    map_res(digit1, str::parse)(i)
}

/// `528012.123456,[2251]`
fn gps_time(i: &str) -> IResult<&str, (f64, i64)> {
    pair(num, delimited(tag(",["), uint, char(']')))(i)
}

/// Antenna offset fields like `21.6,N`, present on some firmware, unused.
fn offset(i: &str) -> IResult<&str, f64> {
    terminated(num, pair(char(','), one_of("NEVnev")))(i)
}

fn lat_field(i: &str) -> IResult<&str, f64> {
    terminated(num, tag(",Lat"))(i)
}

fn lon_field(i: &str) -> IResult<&str, f64> {
    terminated(num, tag(",Lon"))(i)
}

fn ellh_field(i: &str) -> IResult<&str, f64> {
    terminated(num, tag(",Ellh"))(i)
}

fn row(i: &str) -> IResult<&str, RawRow> {
    let (i, _seq) = opt(terminated(preceded(space0, uint), space1))(i)?;
    let (i, time) = opt(gps_time)(i)?;
    let (i, _) = many0(offset)(i)?;
    let (i, lat) = lat_field(i)?;
    let (i, lon) = lon_field(i)?;
    let (i, ellh) = ellh_field(i)?;
    let (i, std_n) = terminated(num, char(','))(i)?;
    let (i, std_e) = terminated(num, char(','))(i)?;
    let (i, std_u) = num(i)?;
    let (i, flag) = preceded(space0, terminated(uint, tag(",Q")))(i)?;
    Ok((
        i,
        RawRow {
            time,
            lat,
            lon,
            ellh,
            std_n,
            std_e,
            std_u,
            flag,
        },
    ))
}

/// Decode one timestamp log.
///
/// Returns the rows in file order; `dropped` counts rows that did not
/// match the grammar.
///
#[tracing::instrument]
pub fn parse_log(path: &Path, flight_id: &str) -> Result<LogData, DecodeError> {
    let data = fs::read_to_string(path).map_err(|source| DecodeError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut out = LogData::default();
    for line in data.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        match row(line) {
            Ok((_, raw)) => out.records.push(TimestampLogRecord {
                flight_id: flight_id.to_owned(),
                seq: out.records.len(),
                latitude: raw.lat,
                longitude: raw.lon,
                ellh: raw.ellh,
                std_n_m: raw.std_n,
                std_e_m: raw.std_e,
                std_u_m: raw.std_u,
                rtk_status: RtkStatus::from_code(raw.flag),
                timestamp: raw.time.and_then(|(secs, week)| gps_to_utc(secs, week)),
            }),
            Err(e) => {
                out.dropped += 1;
                debug!("{}: unparseable row: {e}", path.display());
            }
        }
    }

    trace!(
        "{}: {} records, {} dropped",
        path.display(),
        out.records.len(),
        out.dropped
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const FULL_ROW: &str = "1\t528012.123456,[2251]\t 21.6,N\t -7.1,E\t -37.0,V\t40.16023495,Lat\t116.27432587,Lon\t41.741,Ellh\t0.010,0.012,0.021\t50,Q";

    #[test]
    fn test_row_full() {
        let (_, r) = row(FULL_ROW).unwrap();
        assert_eq!(40.16023495, r.lat);
        assert_eq!(116.27432587, r.lon);
        assert_eq!(41.741, r.ellh);
        assert_eq!(0.010, r.std_n);
        assert_eq!(0.012, r.std_e);
        assert_eq!(0.021, r.std_u);
        assert_eq!(50, r.flag);
        let (secs, week) = r.time.unwrap();
        assert_eq!(528012.123456, secs);
        assert_eq!(2251, week);
    }

    #[test]
    fn test_row_without_index_and_time() {
        let input = "-33.5,Lat\t151.2,Lon\t12.0,Ellh\t0.02, 0.02, 0.01\t34,Q";
        let (_, r) = row(input).unwrap();
        assert_eq!(-33.5, r.lat);
        assert_eq!(34, r.flag);
        assert!(r.time.is_none());
    }

    #[test]
    fn test_row_spaces_in_std_triple() {
        let input = "7\t40.0,Lat\t116.0,Lon\t10.0,Ellh\t 0.010, 0.012, 0.021\t16,Q";
        let (_, r) = row(input).unwrap();
        assert_eq!(0.021, r.std_u);
        assert_eq!(16, r.flag);
    }

    #[test]
    fn test_parse_log_skips_bad_rows() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "{FULL_ROW}").unwrap();
        writeln!(f, "this row is garbage").unwrap();
        writeln!(f, "2\t40.2,Lat\t116.3,Lon\t42.0,Ellh\t0.02,0.02,0.01\t34,Q").unwrap();

        let log = parse_log(f.path(), "m").unwrap();
        assert_eq!(2, log.records.len());
        assert_eq!(1, log.dropped);

        // sequence indices follow file order
        assert_eq!(0, log.records[0].seq);
        assert_eq!(1, log.records[1].seq);
        assert_eq!(RtkStatus::Fix, log.records[0].rtk_status);
        assert_eq!(RtkStatus::Float, log.records[1].rtk_status);
    }

    #[test]
    fn test_unknown_flag_maps_to_unknown() {
        let input = "40.0,Lat\t116.0,Lon\t10.0,Ellh\t0.01,0.01,0.01\t77,Q";
        let (_, r) = row(input).unwrap();
        assert_eq!(RtkStatus::Unknown, RtkStatus::from_code(r.flag));
    }

    #[test]
    fn test_gps_epoch() {
        let t = gps_to_utc(GPS_UTC_LEAP_S as f64, 0).unwrap();
        assert_eq!(
            Utc.with_ymd_and_hms(1980, 1, 6, 0, 0, 0).unwrap(),
            t
        );
    }

    #[test]
    fn test_gps_one_day_in() {
        let t = gps_to_utc(86_400.0 + GPS_UTC_LEAP_S as f64, 0).unwrap();
        assert_eq!(
            Utc.with_ymd_and_hms(1980, 1, 7, 0, 0, 0).unwrap(),
            t
        );
    }

    #[test]
    fn test_gps_negative_seconds_rejected() {
        assert!(gps_to_utc(-1.0, 2251).is_none());
    }
}
