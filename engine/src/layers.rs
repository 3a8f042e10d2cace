//! The three ordered output collections handed to the rendering host.
//!
//! Assembly is pure shaping: everything here was classified upstream and
//! is only grouped into the shapes the host renders.

use serde::Serialize;

use rtkqa_formats::{PhotoRecord, QualityTier, RtkStatus};

use crate::{ClassifiedRoutePoint, Flight};

/// One straight route piece between two consecutive report samples. The
/// classification of the later sample colors the piece.
///
#[derive(Clone, Debug, Serialize)]
pub struct RouteSegment {
    pub flight_id: String,
    pub rpt_quality: QualityTier,
    pub rpt_reason: String,
    pub rtk_status: RtkStatus,
    /// `[longitude, latitude]`
    pub from: [f64; 2],
    pub to: [f64; 2],
}

/// One polyline per flight, vertices in capture order.
///
#[derive(Clone, Debug, Serialize)]
pub struct FlightPath {
    pub flight_id: String,
    /// `[longitude, latitude]` per vertex
    pub vertices: Vec<[f64; 2]>,
}

/// The assembled layers, ready for rendering.
///
#[derive(Clone, Debug, Default, Serialize)]
pub struct Layers {
    pub photos: Vec<PhotoRecord>,
    pub route: Vec<RouteSegment>,
    pub flight_paths: Vec<FlightPath>,
}

/// Shape the classified data into the three collections.
///
/// `classified` holds each flight's route points in temporal order, as
/// produced by the classifier; `flights` supplies photo ordering. A
/// flight contributes a path entry only when at least two of its photos
/// carry coordinates, a line needing two vertices.
///
pub fn assemble(flights: &[Flight], classified: &[(String, Vec<ClassifiedRoutePoint>)]) -> Layers {
    let mut layers = Layers::default();

    for f in flights {
        layers.photos.extend(f.photos.iter().cloned());

        let vertices: Vec<[f64; 2]> = f
            .photos
            .iter()
            .filter_map(|p| match (p.longitude, p.latitude) {
                (Some(lon), Some(lat)) => Some([lon, lat]),
                _ => None,
            })
            .collect();
        if vertices.len() >= 2 {
            layers.flight_paths.push(FlightPath {
                flight_id: f.id.clone(),
                vertices,
            });
        }
    }

    for (flight_id, points) in classified {
        for pair in points.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            layers.route.push(RouteSegment {
                flight_id: flight_id.clone(),
                rpt_quality: b.quality,
                rpt_reason: b.reason.clone(),
                rtk_status: b.point.rtk_status,
                from: [a.point.longitude, a.point.latitude],
                to: [b.point.longitude, b.point.latitude],
            });
        }
    }

    layers
}
