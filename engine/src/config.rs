//! Pipeline configuration: explicit values with documented defaults,
//! passed into each stage at construction. Nothing here is ambient state,
//! so a run is reproducible from its inputs alone.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rtkqa_formats::{QualityTier, RmseBins};

/// STD gate thresholds (meters) refining the quality tier within a fix
/// state. Up and north/east components gate separately.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct StdGates {
    pub fix_excellent_u: f64,
    pub fix_excellent_ne: f64,
    pub fix_good_u: f64,
    pub fix_good_ne: f64,
    pub flt_good_u: f64,
    pub flt_good_ne: f64,
}

impl Default for StdGates {
    fn default() -> Self {
        StdGates {
            fix_excellent_u: 0.05,
            fix_excellent_ne: 0.03,
            fix_good_u: 0.15,
            fix_good_ne: 0.08,
            flt_good_u: 0.30,
            flt_good_ne: 0.20,
        }
    }
}

/// Everything the pipeline can be tuned with.
///
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Photo to log-record nearest-match tolerance, meters.
    pub match_tolerance_m: f64,
    /// Images per extraction tool invocation.
    pub batch_size: usize,
    pub rmse_bins: RmseBins,
    /// Tier for route points inside an abnormal window, by reason code.
    pub abnormal_map: BTreeMap<String, QualityTier>,
    /// Tier for windows whose reason code is not in the map.
    pub abnormal_default: QualityTier,
    pub gates: StdGates,
    /// Assign a tier from the STD gates when no fix flag exists at all.
    pub std_inference: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let abnormal_map = ["LOSS", "FEW_SYS", "LESS_SAT"]
            .iter()
            .map(|k| (k.to_string(), QualityTier::Good))
            .collect();
        EngineConfig {
            match_tolerance_m: 5.0,
            batch_size: 100,
            rmse_bins: RmseBins::default(),
            abnormal_map,
            abnormal_default: QualityTier::Good,
            gates: StdGates::default(),
            std_inference: false,
        }
    }
}
