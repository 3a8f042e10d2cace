//! Grouping per mission folder and temporal ordering.

use std::collections::BTreeMap;

use rtkqa_formats::{AbnormalWindow, PhotoRecord, RoutePoint};

/// One mission's worth of correlated data. Created at segmentation time,
/// lives for the duration of one run.
///
#[derive(Clone, Debug, Default)]
pub struct Flight {
    pub id: String,
    pub photos: Vec<PhotoRecord>,
    pub route: Vec<RoutePoint>,
    pub windows: Vec<AbnormalWindow>,
}

/// Partition all entities by flight identifier.
///
/// Within a flight, photos sort by capture time ascending; photos without
/// a time sort last and keep their scan order among themselves (stable
/// sort), so a flight path still connects them in a sensible sequence.
/// Route points sort by device timestamp the same way.
///
pub fn segment(
    photos: Vec<PhotoRecord>,
    route: Vec<RoutePoint>,
    windows: BTreeMap<String, Vec<AbnormalWindow>>,
) -> Vec<Flight> {
    let mut flights: BTreeMap<String, Flight> = BTreeMap::new();

    for p in photos {
        flights
            .entry(p.flight_id.clone())
            .or_insert_with(|| Flight {
                id: p.flight_id.clone(),
                ..Default::default()
            })
            .photos
            .push(p);
    }
    for r in route {
        flights
            .entry(r.flight_id.clone())
            .or_insert_with(|| Flight {
                id: r.flight_id.clone(),
                ..Default::default()
            })
            .route
            .push(r);
    }
    for (id, w) in windows {
        flights
            .entry(id.clone())
            .or_insert_with(|| Flight {
                id,
                ..Default::default()
            })
            .windows
            .extend(w);
    }

    for f in flights.values_mut() {
        f.photos.sort_by(|a, b| match (a.time, b.time) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        f.route.sort_by(|a, b| match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    flights.into_values().collect()
}
