//! Line parsers for the whitespace-delimited navigation data sources.
//!
//! Every parser returns `Ok(None)` for blank and `;` comment lines and a
//! [`ParseError`] for lines that cannot be interpreted; ingestion skips both.

use thiserror::Error;

use crate::models::{AirportRecord, AirwayRecord, Direction, FixRecord, LevelBand, RouteClass};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unknown airway direction code `{0}`")]
    UnknownDirection(String),
    #[error("unknown route class code `{0}`")]
    UnknownRouteClass(i64),
    #[error("invalid cycle file: {0}")]
    InvalidCycle(String),
}

fn is_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with(';')
}

fn parse_f64(token: &str) -> Result<f64, ParseError> {
    token
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseError::InvalidNumber(token.to_string()))
}

fn parse_i64(token: &str) -> Result<i64, ParseError> {
    token
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

fn parse_fl(token: &str) -> Result<i32, ParseError> {
    token
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))
}

fn optional_upper(token: Option<&&str>) -> Option<String> {
    token
        .map(|value| value.trim().to_ascii_uppercase())
        .filter(|value| !value.is_empty())
}

fn optional_raw(token: Option<&&str>) -> Option<String> {
    token
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse a fix line: `lat lon ident [usage] [country] [externalId] [name]`.
pub fn parse_fix_line(raw: &str) -> Result<Option<FixRecord>, ParseError> {
    let line = raw.trim();
    if is_comment(line) {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ParseError::TooFewFields {
            expected: 3,
            found: parts.len(),
        });
    }

    Ok(Some(FixRecord {
        lat: parse_f64(parts[0])?,
        lon: parse_f64(parts[1])?,
        ident: parts[2].to_ascii_uppercase(),
        usage: optional_upper(parts.get(3)),
        country: optional_upper(parts.get(4)),
        external_id: optional_raw(parts.get(5)),
        name: optional_raw(parts.get(6)),
    }))
}

/// Parse an airway line in either layout.
///
/// 13 or more tokens:
/// `id1 cc1 type1 freq1 id2 cc2 type2 freq2 dir class lower upper name`
///
/// 11 or 12 tokens:
/// `id1 cc1 type1 id2 cc2 type2 dir class lower upper name`
pub fn parse_airway_line(raw: &str) -> Result<Option<AirwayRecord>, ParseError> {
    let line = raw.trim();
    if is_comment(line) {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 11 {
        return Err(ParseError::TooFewFields {
            expected: 11,
            found: parts.len(),
        });
    }

    // Index of the second endpoint and of the direction code per layout.
    let (second, tail) = if parts.len() >= 13 { (4, 8) } else { (3, 6) };

    let direction = Direction::from_code(parts[tail])
        .ok_or_else(|| ParseError::UnknownDirection(parts[tail].to_string()))?;
    let class_code = parse_i64(parts[tail + 1])?;
    let route_class =
        RouteClass::from_code(class_code).ok_or(ParseError::UnknownRouteClass(class_code))?;
    let lower_fl = parse_fl(parts[tail + 2])?;
    let upper_fl = parse_fl(parts[tail + 3])?;

    Ok(Some(AirwayRecord {
        from_ident: parts[0].to_ascii_uppercase(),
        from_country: parts[1].to_ascii_uppercase(),
        to_ident: parts[second].to_ascii_uppercase(),
        to_country: parts[second + 1].to_ascii_uppercase(),
        direction,
        route_class,
        band: LevelBand { lower_fl, upper_fl },
        airway: parts[tail + 4].to_ascii_uppercase(),
    }))
}

/// Parse an airport metadata line: `ICAO <field> lat lon ...`.
pub fn parse_airport_line(raw: &str) -> Result<Option<AirportRecord>, ParseError> {
    let line = raw.trim();
    if is_comment(line) {
        return Ok(None);
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(ParseError::TooFewFields {
            expected: 4,
            found: parts.len(),
        });
    }

    Ok(Some(AirportRecord {
        icao: parts[0].to_ascii_uppercase(),
        lat: parse_f64(parts[2])?,
        lon: parse_f64(parts[3])?,
    }))
}
