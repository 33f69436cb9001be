//! Great-circle math in nautical miles.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in nautical miles (spherical model).
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle distance to `other` in nautical miles.
    pub fn distance_nm(&self, other: &GeoPoint) -> f64 {
        haversine_nm(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Calculate distance between two points in nautical miles using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial great-circle course from point 1 to point 2 in degrees, 0 = north, 90 = east.
pub fn initial_course_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y).to_degrees().rem_euclid(360.0)
}

/// Total length of a route: origin -> fixes... -> destination.
///
/// Airport legs are only counted when the airport position is known and at
/// least one fix exists. With no fixes the direct origin-destination leg is used.
pub fn route_length_nm(origin: Option<GeoPoint>, fixes: &[GeoPoint], dest: Option<GeoPoint>) -> f64 {
    let mut total: f64 = fixes
        .windows(2)
        .map(|leg| leg[0].distance_nm(&leg[1]))
        .sum();

    match (fixes.first(), fixes.last()) {
        (Some(first), Some(last)) => {
            if let Some(origin) = origin {
                total += origin.distance_nm(first);
            }
            if let Some(dest) = dest {
                total += last.distance_nm(&dest);
            }
        }
        _ => {
            if let (Some(origin), Some(dest)) = (origin, dest) {
                total += origin.distance_nm(&dest);
            }
        }
    }

    total
}
