//! End-to-end runs over synthetic mission folders, with a canned
//! extractor standing in for the external tool.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};

use rtkqa_engine::{run, EngineConfig, RunError};
use rtkqa_exif::{ExtractError, Extractor};
use rtkqa_formats::{ImageMetadataRecord, QualityTier};

/// Canned metadata keyed by file name, so fixtures stay independent of
/// the temp directory the test runs in.
#[derive(Debug, Default)]
struct FakeExtractor {
    by_name: BTreeMap<String, ImageMetadataRecord>,
}

impl FakeExtractor {
    fn with(mut self, name: &str, rec: ImageMetadataRecord) -> Self {
        self.by_name.insert(name.to_string(), rec);
        self
    }
}

impl Extractor for FakeExtractor {
    fn name(&self) -> String {
        String::from("fake")
    }

    fn ensure(&self) -> Result<String, ExtractError> {
        Ok(String::from("0.0-test"))
    }

    fn batch_read(
        &self,
        files: &[PathBuf],
        _chunk: usize,
    ) -> Result<BTreeMap<PathBuf, ImageMetadataRecord>, ExtractError> {
        Ok(files
            .iter()
            .map(|f| {
                let name = f
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let mut rec = self
                    .by_name
                    .get(&name)
                    .cloned()
                    .unwrap_or_else(|| ImageMetadataRecord::empty(f.clone()));
                rec.file = f.clone();
                (f.clone(), rec)
            })
            .collect())
    }
}

/// An extractor that never comes up.
#[derive(Debug)]
struct DeadExtractor;

impl Extractor for DeadExtractor {
    fn name(&self) -> String {
        String::from("dead")
    }

    fn ensure(&self) -> Result<String, ExtractError> {
        Err(ExtractError::ToolUnavailable {
            hint: String::from("not installed"),
        })
    }

    fn batch_read(
        &self,
        _files: &[PathBuf],
        _chunk: usize,
    ) -> Result<BTreeMap<PathBuf, ImageMetadataRecord>, ExtractError> {
        unreachable!("liveness check must run first")
    }
}

const REPORT: &str = r#"{
  "SURVEYING_REPORT_ROOT": {
    "RTK_PATH_INFO_UNIT": {
      "RTK_DETAIL_INFO": [
        {"LATITUDE": 40.1000, "LONGITUDE": 116.2000, "TIME_STAMP": 1000, "RTK_STATUS": 50},
        {"LATITUDE": 40.1001, "LONGITUDE": 116.2001, "TIME_STAMP": 2000, "RTK_STATUS": 50},
        {"LATITUDE": 40.1002, "LONGITUDE": 116.2002, "TIME_STAMP": 3000, "RTK_STATUS": 34}
      ]
    },
    "RTB_INFO_UNIT": {
      "RTB_LOSS_ABNORMAL_DURATION": [{"START_TIME": 1500, "END_TIME": 2500}]
    }
  }
}"#;

const LOG: &str = "\
1\t40.10000000,Lat\t116.20000000,Lon\t41.741,Ellh\t0.020,0.020,0.010\t50,Q
2\t40.10010000,Lat\t116.20010000,Lon\t41.812,Ellh\t0.030,0.030,0.040\t34,Q
";

fn meta(lat: f64, lon: f64, secs: i64) -> ImageMetadataRecord {
    ImageMetadataRecord {
        latitude: Some(lat),
        longitude: Some(lon),
        time: Some(Utc.timestamp_opt(secs, 0).unwrap()),
        abs_alt_m: Some(141.0),
        rel_alt_m: Some(100.0),
        yaw_deg: Some(-87.0),
        ..Default::default()
    }
}

fn write_mission(root: &Path) {
    let dir = root.join("m1");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("flight.RPT"), REPORT).unwrap();
    fs::write(dir.join("flight.MRK"), LOG).unwrap();
    fs::write(dir.join("DJI_0001.JPG"), b"jpg").unwrap();
    fs::write(dir.join("DJI_0002.JPG"), b"jpg").unwrap();
}

fn mission_extractor() -> FakeExtractor {
    FakeExtractor::default()
        .with("DJI_0001.JPG", meta(40.10000000, 116.20000000, 100))
        .with("DJI_0002.JPG", meta(40.10010000, 116.20010000, 200))
}

#[test]
fn test_full_mission() {
    let dir = tempfile::tempdir().unwrap();
    write_mission(dir.path());

    let out = run(dir.path(), &EngineConfig::default(), &mission_extractor()).unwrap();

    // both photos matched their log record; log STDs win
    assert_eq!(2, out.summary.matched);
    assert_eq!(0, out.summary.metadata_only);
    assert_eq!(2, out.layers.photos.len());

    let p1 = &out.layers.photos[0];
    assert_eq!("DJI_0001.JPG", p1.file);
    assert_eq!("m1", p1.flight_id);
    assert_eq!(Some(50), p1.rtk_flag);
    assert_eq!(Some(0.020), p1.std_n_m);
    // (0.02, 0.02, 0.01) m combine to exactly 3.0 cm
    assert!((p1.rmse_3d_cm.unwrap() - 3.0).abs() < 1e-9);
    assert_eq!(QualityTier::Excellent, p1.rtk_quality);

    // route: two segments, the middle point sits in the LOSS window
    assert_eq!(2, out.layers.route.len());
    assert_eq!(QualityTier::Good, out.layers.route[0].rpt_quality);
    assert_eq!("LOSS", out.layers.route[0].rpt_reason);
    // the last point (ts 3000) is outside the window again
    assert_eq!(QualityTier::Excellent, out.layers.route[1].rpt_quality);
    assert_eq!("", out.layers.route[1].rpt_reason);

    // one flight path connecting both photos in time order
    assert_eq!(1, out.layers.flight_paths.len());
    assert_eq!(2, out.layers.flight_paths[0].vertices.len());
    assert_eq!("m1", out.layers.flight_paths[0].flight_id);

    // rmse bins: 3.0 cm is still low, 5.83 cm lands in medium
    assert_eq!(1, out.summary.flights.len());
    assert_eq!(1, out.summary.flights[0].rmse_low);
    assert_eq!(1, out.summary.flights[0].rmse_medium);
    assert_eq!(0, out.summary.flights[0].rmse_high);

    assert!(out.summary.warnings.is_empty());
}

#[test]
fn test_images_only_folder_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("DJI_0001.JPG"), b"jpg").unwrap();
    fs::write(dir.path().join("DJI_0002.JPG"), b"jpg").unwrap();

    // no report, no log, and the extractor finds no GPS tags either
    let out = run(
        dir.path(),
        &EngineConfig::default(),
        &FakeExtractor::default(),
    )
    .unwrap();

    assert_eq!(2, out.layers.photos.len());
    for p in &out.layers.photos {
        assert_eq!(QualityTier::Unknown, p.rtk_quality);
        assert!(p.rmse_3d_cm.is_none());
    }
    assert!(out.layers.route.is_empty());
    assert!(out.layers.flight_paths.is_empty());
}

#[test]
fn test_metadata_only_fallback_keeps_metadata_stds() {
    let dir = tempfile::tempdir().unwrap();
    let m = dir.path().join("m1");
    fs::create_dir_all(&m).unwrap();
    fs::write(m.join("flight.MRK"), LOG).unwrap();
    fs::write(m.join("far.JPG"), b"jpg").unwrap();

    // photo sits ~1.1 km from every log record
    let mut far = meta(40.11, 116.20, 100);
    far.std_n_m = Some(0.5);
    far.std_e_m = Some(0.5);
    far.std_u_m = Some(0.5);
    let fake = FakeExtractor::default().with("far.JPG", far);

    let out = run(dir.path(), &EngineConfig::default(), &fake).unwrap();
    assert_eq!(1, out.summary.metadata_only);
    assert_eq!(Some(0.5), out.layers.photos[0].std_n_m);
}

#[test]
fn test_unavailable_tool_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    write_mission(dir.path());

    let r = run(dir.path(), &EngineConfig::default(), &DeadExtractor);
    assert!(matches!(r, Err(RunError::Extract(_))));
}

#[test]
fn test_corrupt_report_does_not_stop_other_flights() {
    let dir = tempfile::tempdir().unwrap();
    write_mission(dir.path());
    let m2 = dir.path().join("m2");
    fs::create_dir_all(&m2).unwrap();
    fs::write(m2.join("broken.RPT"), "{this is not json").unwrap();
    fs::write(m2.join("DJI_0003.JPG"), b"jpg").unwrap();

    let fake = mission_extractor().with("DJI_0003.JPG", meta(41.0, 117.0, 300));
    let out = run(dir.path(), &EngineConfig::default(), &fake).unwrap();

    // the healthy flight is fully processed
    assert_eq!(2, out.layers.route.len());
    assert_eq!(3, out.layers.photos.len());
    // and the bad file shows up as a warning, not a failure
    assert_eq!(1, out.summary.warnings.len());
    assert!(out.summary.warnings[0].contains("broken.RPT"));
}

#[test]
fn test_runs_are_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write_mission(dir.path());

    let a = run(dir.path(), &EngineConfig::default(), &mission_extractor()).unwrap();
    let b = run(dir.path(), &EngineConfig::default(), &mission_extractor()).unwrap();

    assert_eq!(
        serde_json::to_string(&a.layers).unwrap(),
        serde_json::to_string(&b.layers).unwrap()
    );
    assert_eq!(
        serde_json::to_string(&a.summary).unwrap(),
        serde_json::to_string(&b.summary).unwrap()
    );
}
