//! Accuracy and fix-quality classification.

use rtkqa_formats::{AbnormalWindow, QualityTier, RoutePoint, RtkStatus};

use crate::EngineConfig;

/// 3-D RMSE in centimeters from the N/E/U standard deviations. None
/// whenever a component is missing; full precision is kept internally,
/// rounding is a display concern.
///
pub fn rmse_3d_cm(n: Option<f64>, e: Option<f64>, u: Option<f64>) -> Option<f64> {
    match (n, e, u) {
        (Some(n), Some(e), Some(u)) => Some((n * n + e * e + u * u).sqrt() * 100.0),
        _ => None,
    }
}

/// Quality tier for a photo fix.
///
/// The decoded flag picks the tier family; STD gates only refine within
/// it. Without any flag the tier stays Unknown unless STD-based inference
/// is enabled, in which case the Fix gates are tried first and the Float
/// gate second.
///
pub fn fix_quality(
    status: RtkStatus,
    has_flag: bool,
    stds: (Option<f64>, Option<f64>, Option<f64>),
    cfg: &EngineConfig,
) -> QualityTier {
    let base = match status {
        RtkStatus::Fix => QualityTier::Excellent,
        RtkStatus::Float => QualityTier::Good,
        RtkStatus::Single | RtkStatus::NoPosition => QualityTier::Poor,
        RtkStatus::Unknown => QualityTier::Unknown,
    };

    let (n, e, u) = stds;
    if n.is_none() && e.is_none() && u.is_none() {
        return base;
    }
    let ne = n.unwrap_or(0.0).max(e.unwrap_or(0.0));
    let u = u.unwrap_or(f64::MAX);
    let g = &cfg.gates;

    match status {
        RtkStatus::Fix => {
            if u <= g.fix_excellent_u && ne <= g.fix_excellent_ne {
                QualityTier::Excellent
            } else if u <= g.fix_good_u && ne <= g.fix_good_ne {
                QualityTier::Good
            } else {
                QualityTier::Poor
            }
        }
        RtkStatus::Float => {
            if u <= g.flt_good_u && ne <= g.flt_good_ne {
                QualityTier::Good
            } else {
                QualityTier::Poor
            }
        }
        RtkStatus::Unknown if !has_flag && cfg.std_inference => {
            if u <= g.fix_excellent_u && ne <= g.fix_excellent_ne {
                QualityTier::Excellent
            } else if u <= g.fix_good_u && ne <= g.fix_good_ne {
                QualityTier::Good
            } else if u <= g.flt_good_u && ne <= g.flt_good_ne {
                QualityTier::Good
            } else {
                QualityTier::Poor
            }
        }
        _ => base,
    }
}

/// A route point with its summary-derived classification attached.
///
#[derive(Clone, Debug)]
pub struct ClassifiedRoutePoint {
    pub point: RoutePoint,
    pub quality: QualityTier,
    /// Reason code of the active window, empty when none applies.
    pub reason: String,
}

/// Classification of one route point from the abnormal-window summary
/// alone. Neither flags nor STDs play a part: route quality mirrors the
/// device's own summary judgement.
///
pub fn route_quality(
    ts: Option<i64>,
    windows: &[AbnormalWindow],
    cfg: &EngineConfig,
) -> (QualityTier, String) {
    if let Some(t) = ts {
        for w in windows {
            if w.contains(t) {
                let reason = w.reason.to_string();
                let tier = cfg
                    .abnormal_map
                    .get(&reason)
                    .copied()
                    .unwrap_or(cfg.abnormal_default);
                return (tier, reason);
            }
        }
    }
    (QualityTier::Excellent, String::new())
}

pub fn classify_route(points: &[RoutePoint], windows: &[AbnormalWindow], cfg: &EngineConfig) -> Vec<ClassifiedRoutePoint> {
    points
        .iter()
        .map(|p| {
            let (quality, reason) = route_quality(p.timestamp, windows, cfg);
            ClassifiedRoutePoint {
                point: p.clone(),
                quality,
                reason,
            }
        })
        .collect()
}
