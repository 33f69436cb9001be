//! Core data models for navigation data and planning results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// Usage class marking a fix as part of the enroute structure.
pub const ENROUTE_USAGE: &str = "ENRT";

/// Traversal direction of an airway segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Raw code `N`
    Both,
    /// Raw code `P`, first endpoint to second only
    Forward,
    /// Raw code `M`, second endpoint to first only
    Reverse,
}

impl Direction {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "N" => Some(Self::Both),
            "P" => Some(Self::Forward),
            "M" => Some(Self::Reverse),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Both => "N",
            Self::Forward => "P",
            Self::Reverse => "M",
        }
    }

    pub fn allows_forward(&self) -> bool {
        matches!(self, Self::Both | Self::Forward)
    }

    pub fn allows_reverse(&self) -> bool {
        matches!(self, Self::Both | Self::Reverse)
    }
}

/// Airspace class of an airway segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteClass {
    Lower,
    Upper,
}

impl RouteClass {
    /// Cruise levels at or above this flight level fly the upper network.
    pub const UPPER_THRESHOLD_FL: i32 = 245;

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Lower),
            2 => Some(Self::Upper),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::Lower => 1,
            Self::Upper => 2,
        }
    }

    pub fn for_cruise_level(cruise_fl: i32) -> Self {
        if cruise_fl >= Self::UPPER_THRESHOLD_FL {
            Self::Upper
        } else {
            Self::Lower
        }
    }
}

/// Inclusive flight-level band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelBand {
    pub lower_fl: i32,
    pub upper_fl: i32,
}

impl LevelBand {
    /// Band spanning two levels given in any order.
    pub fn spanning(a: i32, b: i32) -> Self {
        Self {
            lower_fl: a.min(b),
            upper_fl: a.max(b),
        }
    }

    pub fn overlaps(&self, other: &LevelBand) -> bool {
        !(other.upper_fl < self.lower_fl || other.lower_fl > self.upper_fl)
    }

    /// Midpoint floored to a multiple of ten.
    pub fn representative_level(&self) -> i32 {
        let mid = (i64::from(self.lower_fl) + i64::from(self.upper_fl)).div_euclid(2);
        i32::try_from(mid.div_euclid(10) * 10).unwrap_or(self.lower_fl)
    }
}

/// Graph node key for a fix: `IDENT@COUNTRY`, or the bare ident without a country.
pub fn node_key(ident: &str, country: Option<&str>) -> String {
    let ident = ident.trim().to_ascii_uppercase();
    match country.map(str::trim).filter(|cc| !cc.is_empty()) {
        Some(cc) => format!("{}@{}", ident, cc.to_ascii_uppercase()),
        None => ident,
    }
}

/// Bare ident of a node key (text before `@`).
pub fn node_ident(key: &str) -> &str {
    key.split('@').next().unwrap_or(key)
}

/// A navigational fix as read from the fix source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRecord {
    pub ident: String,
    pub lat: f64,
    pub lon: f64,
    pub usage: Option<String>,
    pub country: Option<String>,
    pub external_id: Option<String>,
    pub name: Option<String>,
}

/// Hashable natural key of a fix: (ident, country, lat bits, lon bits).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FixKey {
    pub ident: String,
    pub country: Option<String>,
    lat_bits: u64,
    lon_bits: u64,
}

impl FixRecord {
    pub fn natural_key(&self) -> FixKey {
        FixKey {
            ident: self.ident.clone(),
            country: self.country.clone(),
            lat_bits: self.lat.to_bits(),
            lon_bits: self.lon.to_bits(),
        }
    }

    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn is_enroute(&self) -> bool {
        self.usage
            .as_deref()
            .is_some_and(|usage| usage.eq_ignore_ascii_case(ENROUTE_USAGE))
    }
}

/// An airway line as read from the airway source, endpoints not yet resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirwayRecord {
    pub from_ident: String,
    pub from_country: String,
    pub to_ident: String,
    pub to_country: String,
    pub direction: Direction,
    pub route_class: RouteClass,
    pub band: LevelBand,
    pub airway: String,
}

/// Airport reference position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRecord {
    pub icao: String,
    pub lat: f64,
    pub lon: f64,
}

/// One endpoint of a persisted airway segment, joined with its fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentEndpoint {
    pub ident: String,
    pub country: Option<String>,
    pub position: GeoPoint,
}

impl SegmentEndpoint {
    pub fn key(&self) -> String {
        node_key(&self.ident, self.country.as_deref())
    }
}

/// A persisted airway segment with both endpoints resolved to positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSegment {
    pub airway: String,
    pub direction: Direction,
    pub route_class: RouteClass,
    pub band: LevelBand,
    pub from: SegmentEndpoint,
    pub to: SegmentEndpoint,
}

/// A stored result of a planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlightPlanRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub origin: String,
    pub dest: String,
    pub aircraft: Option<String>,
    pub fl_start: Option<i32>,
    pub fl_end: Option<i32>,
    pub cycle: Option<String>,
    pub route_text: String,
    pub route_tokens: Vec<String>,
    pub sid_text: String,
    pub star_text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_codes_map_to_edges() {
        assert_eq!(Direction::from_code("n"), Some(Direction::Both));
        assert!(Direction::Both.allows_forward() && Direction::Both.allows_reverse());
        assert!(Direction::Forward.allows_forward() && !Direction::Forward.allows_reverse());
        assert!(!Direction::Reverse.allows_forward() && Direction::Reverse.allows_reverse());
        assert_eq!(Direction::from_code("X"), None);
    }

    #[test]
    fn class_threshold_is_fl245() {
        assert_eq!(RouteClass::for_cruise_level(240), RouteClass::Lower);
        assert_eq!(RouteClass::for_cruise_level(245), RouteClass::Upper);
        assert_eq!(RouteClass::from_code(3), None);
    }

    #[test]
    fn band_overlap_and_representative_level() {
        let segment = LevelBand::spanning(100, 200);
        assert!(LevelBand::spanning(150, 450).overlaps(&segment));
        assert!(!LevelBand::spanning(210, 450).overlaps(&segment));

        assert_eq!(LevelBand::spanning(350, 250).representative_level(), 300);
        assert_eq!(LevelBand::spanning(250, 285).representative_level(), 260);
        assert_eq!(
            LevelBand::spanning(i32::MAX, i32::MAX).representative_level(),
            2_147_483_640
        );
        assert_eq!(LevelBand::spanning(300, i32::MAX).representative_level(), 1_073_741_970);
    }

    #[test]
    fn node_keys_drop_empty_country() {
        assert_eq!(node_key("gilex", Some("ed")), "GILEX@ED");
        assert_eq!(node_key("GILEX", Some(" ")), "GILEX");
        assert_eq!(node_key("GILEX", None), "GILEX");
        assert_eq!(node_ident("GILEX@ED"), "GILEX");
    }
}
