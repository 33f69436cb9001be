//! AIRAC cycle metadata.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parse::ParseError;

/// Contents of `cycle.json` shipped with a navigation data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleFile {
    pub cycle: String,
    pub name: Option<String>,
    pub revision: Option<String>,
}

fn scalar_to_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
    .filter(|text| !text.is_empty())
}

impl CycleFile {
    /// Parse `cycle.json`. The cycle and revision may be JSON strings or numbers.
    pub fn from_json(text: &str) -> Result<Self, ParseError> {
        let value: Value =
            serde_json::from_str(text).map_err(|err| ParseError::InvalidCycle(err.to_string()))?;
        let cycle = scalar_to_string(value.get("cycle"))
            .ok_or_else(|| ParseError::InvalidCycle("missing `cycle`".to_string()))?;
        Ok(Self {
            cycle,
            name: value
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string),
            revision: scalar_to_string(value.get("revision")),
        })
    }
}

/// Where a [`CycleInfo`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleSource {
    Db,
    Json,
    Missing,
}

/// Summary of the loaded data cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleInfo {
    pub cycle: Option<String>,
    pub name: Option<String>,
    pub revision: Option<String>,
    pub source: CycleSource,
    pub is_current: bool,
}

impl CycleInfo {
    pub fn missing() -> Self {
        Self {
            cycle: None,
            name: None,
            revision: None,
            source: CycleSource::Missing,
            is_current: false,
        }
    }

    pub fn new(
        cycle: &str,
        name: Option<String>,
        revision: Option<String>,
        source: CycleSource,
        today: NaiveDate,
    ) -> Self {
        let cycle = cycle.trim();
        Self {
            cycle: (!cycle.is_empty()).then(|| cycle.to_string()),
            name,
            revision,
            source,
            is_current: is_cycle_current(cycle, today),
        }
    }
}

/// Cycle identifier expected for `today`: two-digit year followed by the month.
pub fn expected_cycle(today: NaiveDate) -> String {
    format!("{:02}{:02}", today.year() % 100, today.month())
}

pub fn is_cycle_current(cycle: &str, today: NaiveDate) -> bool {
    let cycle = cycle.trim();
    !cycle.is_empty() && cycle == expected_cycle(today)
}
