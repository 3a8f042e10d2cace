//! RTK fix states, quality tiers and RMSE bins.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Positioning fix state as reported by the receiver.
///
/// Firmware generations encode these as different small integers (the
/// timestamp log uses 50/34/16, older image tags use 5/3/1), so decoding
/// accepts all of them. Anything unrecognized maps to `Unknown`, never to
/// an error.
///
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize,
)]
pub enum RtkStatus {
    #[strum(serialize = "RTK Fix")]
    Fix,
    #[strum(serialize = "RTK Float")]
    Float,
    #[strum(serialize = "Single")]
    Single,
    #[strum(serialize = "No Position")]
    NoPosition,
    #[default]
    #[strum(serialize = "Unknown")]
    Unknown,
}

impl RtkStatus {
    /// Decode a raw numeric device code.
    ///
    pub fn from_code(code: i64) -> Self {
        match code {
            50 | 5 | 4 => RtkStatus::Fix,
            34 | 3 | 2 => RtkStatus::Float,
            16 | 1 => RtkStatus::Single,
            0 => RtkStatus::NoPosition,
            _ => RtkStatus::Unknown,
        }
    }

    /// Decode a textual flag as some firmware writes it into image tags.
    ///
    pub fn from_label(label: &str) -> Self {
        let s = label.to_lowercase();
        if s.contains("fix") {
            RtkStatus::Fix
        } else if s.contains("float") {
            RtkStatus::Float
        } else if s.contains("single") || s.contains("standalone") {
            RtkStatus::Single
        } else if s.contains("none") || s.contains("invalid") {
            RtkStatus::NoPosition
        } else {
            RtkStatus::Unknown
        }
    }

    /// Canonical device code for this state, when one exists.
    ///
    pub fn code(&self) -> Option<u8> {
        match self {
            RtkStatus::Fix => Some(50),
            RtkStatus::Float => Some(34),
            RtkStatus::Single => Some(16),
            RtkStatus::NoPosition => Some(0),
            RtkStatus::Unknown => None,
        }
    }
}

/// Raw flag value as found in device output, numeric or textual.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RawFlag {
    Code(i64),
    Label(String),
}

impl From<&RawFlag> for RtkStatus {
    fn from(raw: &RawFlag) -> Self {
        match raw {
            RawFlag::Code(c) => RtkStatus::from_code(*c),
            RawFlag::Label(s) => RtkStatus::from_label(s),
        }
    }
}

/// Quality tier used for both photo fix quality and route segments.
///
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, EnumString, Eq, PartialEq, Serialize,
)]
#[strum(ascii_case_insensitive)]
pub enum QualityTier {
    Excellent,
    Good,
    Poor,
    #[default]
    Unknown,
}

/// RMSE accuracy bin for photo points.
///
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, Serialize)]
#[strum(serialize_all = "lowercase")]
pub enum RmseBin {
    Low,
    Medium,
    High,
}

/// RMSE bin boundaries, centimeters, lower bound inclusive.
///
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct RmseBins {
    pub low_max_cm: f64,
    pub medium_max_cm: f64,
}

impl Default for RmseBins {
    fn default() -> Self {
        RmseBins {
            low_max_cm: 3.0,
            medium_max_cm: 6.0,
        }
    }
}

impl RmseBins {
    /// `rmse ≤ low → Low`, `low < rmse ≤ medium → Medium`, above → High.
    ///
    pub fn classify(&self, rmse_cm: f64) -> RmseBin {
        if rmse_cm <= self.low_max_cm {
            RmseBin::Low
        } else if rmse_cm <= self.medium_max_cm {
            RmseBin::Medium
        } else {
            RmseBin::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(50, RtkStatus::Fix)]
    #[case(5, RtkStatus::Fix)]
    #[case(4, RtkStatus::Fix)]
    #[case(34, RtkStatus::Float)]
    #[case(3, RtkStatus::Float)]
    #[case(2, RtkStatus::Float)]
    #[case(16, RtkStatus::Single)]
    #[case(1, RtkStatus::Single)]
    #[case(0, RtkStatus::NoPosition)]
    #[case(99, RtkStatus::Unknown)]
    #[case(-1, RtkStatus::Unknown)]
    fn test_from_code(#[case] code: i64, #[case] expected: RtkStatus) {
        assert_eq!(expected, RtkStatus::from_code(code));
    }

    #[rstest]
    #[case("RTK Fix", RtkStatus::Fix)]
    #[case("float", RtkStatus::Float)]
    #[case("Standalone", RtkStatus::Single)]
    #[case("invalid", RtkStatus::NoPosition)]
    #[case("whatever", RtkStatus::Unknown)]
    fn test_from_label(#[case] label: &str, #[case] expected: RtkStatus) {
        assert_eq!(expected, RtkStatus::from_label(label));
    }

    #[test]
    fn test_status_display() {
        assert_eq!("RTK Fix", RtkStatus::Fix.to_string());
        assert_eq!("No Position", RtkStatus::NoPosition.to_string());
    }

    #[rstest]
    #[case(3.0, RmseBin::Low)]
    #[case(3.01, RmseBin::Medium)]
    #[case(6.0, RmseBin::Medium)]
    #[case(6.01, RmseBin::High)]
    fn test_bins_inclusive_lower(#[case] rmse: f64, #[case] expected: RmseBin) {
        assert_eq!(expected, RmseBins::default().classify(rmse));
    }
}
