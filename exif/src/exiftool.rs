//! `exiftool` driven as a subprocess in JSON output mode.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::{debug, trace, warn};

use rtkqa_formats::{parse_exif_datetime, ImageMetadataRecord, RawFlag};

use crate::{ExtractError, Extractor};

/// One record of `exiftool -j -n` output. Tag names differ between drone
/// generations, hence the aliases. Unknown tags are ignored.
///
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTags {
    #[serde(rename = "SourceFile")]
    source_file: Option<PathBuf>,
    #[serde(rename = "GPSLatitude")]
    latitude: Option<f64>,
    #[serde(rename = "GPSLongitude")]
    longitude: Option<f64>,
    #[serde(rename = "AbsoluteAltitude")]
    abs_alt: Option<f64>,
    #[serde(rename = "RelativeAltitude")]
    rel_alt: Option<f64>,
    #[serde(rename = "FlightYawDegree", alias = "GimbalYawDegree")]
    yaw: Option<f64>,
    #[serde(rename = "RtkFlag", alias = "RTKFlag", alias = "RtkStatus", alias = "RTKStatus")]
    rtk_flag: Option<RawFlag>,
    #[serde(rename = "RtkStdLat", alias = "RTKStdLat")]
    std_n: Option<f64>,
    #[serde(rename = "RtkStdLon", alias = "RTKStdLon")]
    std_e: Option<f64>,
    #[serde(rename = "RtkStdHgt", alias = "RTKStdHgt")]
    std_u: Option<f64>,
    #[serde(rename = "CreateDate", alias = "DateTimeOriginal")]
    created: Option<String>,
}

impl RawTags {
    fn into_record(self, file: PathBuf) -> ImageMetadataRecord {
        ImageMetadataRecord {
            file,
            time: self.created.as_deref().and_then(parse_exif_datetime),
            latitude: self.latitude,
            longitude: self.longitude,
            abs_alt_m: self.abs_alt,
            rel_alt_m: self.rel_alt,
            yaw_deg: self.yaw,
            std_n_m: self.std_n,
            std_e_m: self.std_e,
            std_u_m: self.std_u,
            rtk_flag: self.rtk_flag,
        }
    }
}

/// The `exiftool` executable, located once and reused for every batch.
///
#[derive(Clone, Debug, Default)]
pub struct ExifTool {
    /// Explicitly configured executable; when unset the PATH is searched.
    path: Option<PathBuf>,
}

impl ExifTool {
    pub fn new(path: Option<PathBuf>) -> Self {
        ExifTool { path }
    }

    /// Run `-ver` against a candidate; a clean exit makes it usable.
    fn probe(cand: &Path) -> Option<String> {
        let output = Command::new(cand).arg("-ver").output().ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    /// Resolve the executable: the configured path first, then whatever
    /// `exiftool` the PATH finds.
    fn resolve(&self) -> Result<(PathBuf, String), ExtractError> {
        let candidates: Vec<PathBuf> = match &self.path {
            Some(p) => vec![p.clone()],
            None => vec![PathBuf::from("exiftool")],
        };
        for cand in &candidates {
            if let Some(ver) = Self::probe(cand) {
                trace!("using {} ({ver})", cand.display());
                return Ok((cand.clone(), ver));
            }
        }
        Err(ExtractError::ToolUnavailable {
            hint: "install exiftool or set exiftool_path in the settings file".to_owned(),
        })
    }
}

/// Invoke one batch. `-fast2` skips trailer scans, `-n` keeps values
/// numeric. exiftool exits non-zero when some files error but still
/// prints records for the rest, so the output is used whenever it parses.
///
fn run_batch(
    tool: &Path,
    files: &[PathBuf],
) -> Result<Vec<(PathBuf, ImageMetadataRecord)>, ExtractError> {
    let output = Command::new(tool)
        .arg("-j")
        .arg("-n")
        .arg("-fast2")
        .args(files)
        .output()?;

    if output.stdout.is_empty() {
        return Err(ExtractError::BatchFailed(format!(
            "no output, status {}",
            output.status
        )));
    }

    let tags: Vec<RawTags> = serde_json::from_slice(&output.stdout)?;
    let mut by_path: BTreeMap<PathBuf, ImageMetadataRecord> = tags
        .into_iter()
        .filter_map(|t| {
            let file = t.source_file.clone()?;
            Some((file.clone(), t.into_record(file)))
        })
        .collect();

    // Every requested file gets an entry, readable or not.
    Ok(files
        .iter()
        .map(|f| {
            let rec = by_path
                .remove(f)
                .unwrap_or_else(|| ImageMetadataRecord::empty(f.clone()));
            (f.clone(), rec)
        })
        .collect())
}

impl Extractor for ExifTool {
    fn name(&self) -> String {
        String::from("exiftool")
    }

    #[tracing::instrument]
    fn ensure(&self) -> Result<String, ExtractError> {
        self.resolve().map(|(_, ver)| ver)
    }

    #[tracing::instrument(skip(files))]
    fn batch_read(
        &self,
        files: &[PathBuf],
        chunk: usize,
    ) -> Result<BTreeMap<PathBuf, ImageMetadataRecord>, ExtractError> {
        let (tool, _) = self.resolve()?;

        let mut out = BTreeMap::new();
        for batch in files.chunks(chunk.max(1)) {
            match run_batch(&tool, batch) {
                Ok(records) => out.extend(records),
                Err(e) => {
                    // one failed batch degrades to null-field records
                    warn!("batch of {} images failed: {e}", batch.len());
                    for f in batch {
                        out.insert(f.clone(), ImageMetadataRecord::empty(f.clone()));
                    }
                }
            }
            debug!("{}/{} images read", out.len(), files.len());
        }
        Ok(out)
    }
}
