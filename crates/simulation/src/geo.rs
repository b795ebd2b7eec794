//! Geographic primitives: haversine distance, planar distance, and ETA math.
//!
//! Two distance functions coexist on purpose. `distance_km` is geodesic and
//! feeds reporting (ETAs, dispatch rationale). `planar_distance` is raw
//! Euclidean degrees and feeds motion-step math and fast proximity
//! comparisons at sub-kilometer scale. Results from the two must never be
//! mixed in the same comparison.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average urban ambulance speed in km/h, accounting for traffic.
pub const AVERAGE_AMBULANCE_SPEED_KMH: f64 = 50.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Haversine great-circle distance between two points, in kilometers.
pub fn distance_km(a: Location, b: Location) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Euclidean distance in raw degree units. Not geodesic; only valid for
/// proximity comparisons and motion steps over short spans.
pub fn planar_distance(a: Location, b: Location) -> f64 {
    let d_lat = b.lat - a.lat;
    let d_lng = b.lng - a.lng;
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

/// Estimated travel time in whole minutes for a distance at a given speed,
/// clamped to a 1-minute minimum.
pub fn eta_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    let minutes = (distance_km / speed_kmh * 60.0).ceil();
    (minutes as u32).max(1)
}

/// ETA between two points at the standard assumed ambulance speed.
pub fn eta_between(from: Location, to: Location) -> u32 {
    eta_minutes(distance_km(from, to), AVERAGE_AMBULANCE_SPEED_KMH)
}

/// Human-readable ETA phrasing for notifications.
pub fn eta_description(eta_minutes: u32) -> String {
    match eta_minutes {
        0 => "Arriving now".to_string(),
        1 => "1 minute away".to_string(),
        2..=5 => format!("{} minutes away", eta_minutes),
        6..=15 => format!("~{} minutes", eta_minutes),
        _ => format!("{} minutes", eta_minutes),
    }
}

/// Move `step` degrees from `from` along the direct vector to `to`.
///
/// Distances under one step snap exactly onto `to`, so equality-based
/// arrival checks downstream are exact rather than epsilon-near.
pub fn step_toward(from: Location, to: Location, step: f64) -> Location {
    let dist = planar_distance(from, to);
    if dist < step {
        return to;
    }
    Location {
        lat: from.lat + (to.lat - from.lat) / dist * step,
        lng: from.lng + (to.lng - from.lng) / dist * step,
    }
}
