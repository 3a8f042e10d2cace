//! On-disk settings for the driver, HCL format.
//!
//! Everything has a default; the file only needs the values being
//! overridden. Example:
//!
//! ```hcl
//! version = 1
//! exiftool_path = "/opt/local/bin/exiftool"
//! match_tolerance_m = 3.0
//! abnormal_map = { LOSS = "Poor" }
//! ```
//!

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use rtkqa_common::Versioned;
use rtkqa_engine::{EngineConfig, StdGates};
use rtkqa_formats::{QualityTier, RmseBins};

/// Current settings.hcl version
const SVERSION: usize = 1;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Version number for safety
    pub version: usize,
    /// Explicit path to the exiftool executable.
    pub exiftool_path: Option<PathBuf>,
    pub match_tolerance_m: f64,
    pub batch_size: usize,
    /// RMSE bin boundaries `[low, medium]`, centimeters.
    pub rmse_bins_cm: [f64; 2],
    /// Route tier per abnormal reason code.
    pub abnormal_map: BTreeMap<String, QualityTier>,
    /// Tier for reason codes absent from the map.
    pub abnormal_default: QualityTier,
    pub gates: StdGates,
    /// Infer a tier from STDs when no fix flag exists at all.
    pub std_inference: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let cfg = EngineConfig::default();
        Settings {
            version: SVERSION,
            exiftool_path: None,
            match_tolerance_m: cfg.match_tolerance_m,
            batch_size: cfg.batch_size,
            rmse_bins_cm: [cfg.rmse_bins.low_max_cm, cfg.rmse_bins.medium_max_cm],
            abnormal_map: cfg.abnormal_map,
            abnormal_default: cfg.abnormal_default,
            gates: cfg.gates,
            std_inference: cfg.std_inference,
        }
    }
}

impl Versioned for Settings {
    const CURRENT: usize = SVERSION;

    fn version(&self) -> usize {
        self.version
    }
}

impl Settings {
    /// The engine configuration these settings describe.
    ///
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            match_tolerance_m: self.match_tolerance_m,
            batch_size: self.batch_size,
            rmse_bins: RmseBins {
                low_max_cm: self.rmse_bins_cm[0],
                medium_max_cm: self.rmse_bins_cm[1],
            },
            abnormal_map: self.abnormal_map.clone(),
            abnormal_default: self.abnormal_default,
            gates: self.gates,
            std_inference: self.std_inference,
        }
    }
}
