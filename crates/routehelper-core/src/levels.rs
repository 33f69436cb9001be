//! IFR semicircular cruise level rules.

use serde::{Deserialize, Serialize};

use crate::geo::{initial_course_deg, GeoPoint};

const LOWEST_FL: i32 = 100;
const HIGHEST_FL: i32 = 450;
const FL_STEP: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteDirection {
    Eastbound,
    Westbound,
    Unknown,
}

impl RouteDirection {
    /// Eastbound for an initial course in [0, 180), westbound otherwise.
    pub fn from_course(course_deg: f64) -> Self {
        if !course_deg.is_finite() {
            return Self::Unknown;
        }
        if course_deg.rem_euclid(360.0) < 180.0 {
            Self::Eastbound
        } else {
            Self::Westbound
        }
    }

    pub fn between(origin: GeoPoint, dest: GeoPoint) -> Self {
        if origin == dest {
            return Self::Unknown;
        }
        Self::from_course(initial_course_deg(origin.lat, origin.lon, dest.lat, dest.lon))
    }
}

/// Flight levels in `[max(100, lo), min(450, hi)]` allowed for the
/// direction: odd thousands eastbound, even westbound. When the band holds
/// no level of the right parity the whole band is returned.
pub fn eligible_flight_levels(fl_start: i32, fl_end: i32, direction: RouteDirection) -> Vec<String> {
    let (lo, hi) = if fl_start <= fl_end {
        (fl_start, fl_end)
    } else {
        (fl_end, fl_start)
    };
    let range: Vec<i32> = (lo.max(LOWEST_FL)..=hi.min(HIGHEST_FL))
        .step_by(FL_STEP)
        .collect();

    let want_odd = match direction {
        RouteDirection::Eastbound => true,
        RouteDirection::Westbound => false,
        RouteDirection::Unknown => return Vec::new(),
    };
    let mut levels: Vec<i32> = range
        .iter()
        .copied()
        .filter(|fl| ((fl / 10) % 2 == 1) == want_odd)
        .collect();
    if levels.is_empty() {
        levels = range;
    }
    levels.into_iter().map(|fl| format!("FL{fl}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eastbound_keeps_odd_levels() {
        assert_eq!(
            eligible_flight_levels(300, 360, RouteDirection::Eastbound),
            vec!["FL310", "FL330", "FL350"]
        );
    }

    #[test]
    fn westbound_keeps_even_levels() {
        assert_eq!(
            eligible_flight_levels(360, 300, RouteDirection::Westbound),
            vec!["FL300", "FL320", "FL340", "FL360"]
        );
    }

    #[test]
    fn band_is_clamped() {
        let levels = eligible_flight_levels(50, 900, RouteDirection::Westbound);
        assert_eq!(levels.first().map(String::as_str), Some("FL100"));
        assert_eq!(levels.last().map(String::as_str), Some("FL440"));
    }

    #[test]
    fn unknown_direction_yields_nothing() {
        assert!(eligible_flight_levels(300, 360, RouteDirection::Unknown).is_empty());
    }

    #[test]
    fn no_matching_parity_falls_back_to_band() {
        assert_eq!(
            eligible_flight_levels(300, 300, RouteDirection::Eastbound),
            vec!["FL300"]
        );
    }

    #[test]
    fn direction_from_course() {
        assert_eq!(RouteDirection::from_course(0.0), RouteDirection::Eastbound);
        assert_eq!(RouteDirection::from_course(179.9), RouteDirection::Eastbound);
        assert_eq!(RouteDirection::from_course(180.0), RouteDirection::Westbound);
        assert_eq!(RouteDirection::from_course(f64::NAN), RouteDirection::Unknown);

        let frankfurt = GeoPoint::new(50.03, 8.57);
        let paris = GeoPoint::new(49.01, 2.55);
        assert_eq!(RouteDirection::between(frankfurt, paris), RouteDirection::Westbound);
        assert_eq!(RouteDirection::between(paris, frankfurt), RouteDirection::Eastbound);
    }
}
