//! ICAO flight plan message.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const PLACEHOLDER_CALLSIGN: &str = "XXXXXX";
const DEFAULT_WAKE_CATEGORY: &str = "M";
const DEFAULT_EQUIPMENT: &str = "SDE3FGIJ1KRWXY/";
const DEFAULT_SURVEILLANCE: &str = "LB1";
const DEFAULT_DEPARTURE_TIME: &str = "0000";
const DEFAULT_SPEED: &str = "N0441";

/// Fields of an ICAO `(FPL-...)` message. Optional item 18 fields are
/// omitted when blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FplFields {
    pub callsign: String,
    pub aircraft_type: String,
    pub wake_category: String,
    pub equipment: String,
    pub surveillance: String,
    pub departure: String,
    pub departure_time: String,
    pub speed: String,
    pub level: String,
    pub route: String,
    pub destination: String,
    pub eet: String,
    pub alternate: String,
    pub second_alternate: String,
    pub pbn: String,
    pub nav: String,
    pub rnp: String,
    pub dof: String,
    pub reg: String,
    pub sel: String,
    pub code: String,
    pub rvr: String,
    pub opr: String,
    pub per: String,
    pub rmk: String,
}

fn spaced(value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        String::new()
    } else {
        format!(" {value}")
    }
}

impl FplFields {
    /// Fields for a planned route with the usual jet equipment and item 18
    /// (PBN/NAV/RNP/DOF/PER) filled in. `level` is the initial flight level.
    pub fn for_route(
        origin: &str,
        dest: &str,
        aircraft: &str,
        level: i32,
        route: &str,
        date_of_flight: NaiveDate,
    ) -> Self {
        Self {
            callsign: PLACEHOLDER_CALLSIGN.to_string(),
            aircraft_type: aircraft.to_string(),
            wake_category: DEFAULT_WAKE_CATEGORY.to_string(),
            equipment: DEFAULT_EQUIPMENT.to_string(),
            surveillance: DEFAULT_SURVEILLANCE.to_string(),
            departure: origin.to_string(),
            departure_time: DEFAULT_DEPARTURE_TIME.to_string(),
            speed: DEFAULT_SPEED.to_string(),
            level: format!("F{level:03}"),
            route: route.to_string(),
            destination: dest.to_string(),
            pbn: "A1B1D1O1S2".to_string(),
            nav: "RNVD1E2A1".to_string(),
            rnp: "2".to_string(),
            dof: date_of_flight.format("%y%m%d").to_string(),
            per: "C".to_string(),
            ..Self::default()
        }
    }

    fn other_information(&self) -> Vec<String> {
        let tagged = [
            ("PBN/", &self.pbn),
            ("NAV/", &self.nav),
            ("RNP", &self.rnp),
            ("DOF/", &self.dof),
            ("REG/", &self.reg),
            ("SEL/", &self.sel),
            ("CODE/", &self.code),
            ("RVR/", &self.rvr),
            ("OPR/", &self.opr),
            ("PER/", &self.per),
            ("RMK/", &self.rmk),
        ];
        tagged
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(tag, value)| format!("{tag}{value}"))
            .collect()
    }
}

/// Multi-line ICAO flight plan; the closing parenthesis ends the last line.
pub fn build_icao_fpl(fields: &FplFields) -> String {
    let mut lines = vec![
        format!("(FPL-{}-IS", fields.callsign),
        format!(
            "-{}/{}-{}{}",
            fields.aircraft_type, fields.wake_category, fields.equipment, fields.surveillance
        ),
        format!("-{}{}", fields.departure, fields.departure_time),
        format!("-{}{}{}", fields.speed, fields.level, spaced(&fields.route)),
        format!(
            "-{}{}{}{}",
            fields.destination,
            fields.eet,
            spaced(&fields.alternate),
            spaced(&fields.second_alternate)
        ),
    ];

    let other = fields.other_information();
    if !other.is_empty() {
        lines.push(format!("-{}", other.join(" ")));
    }
    if let Some(last) = lines.last_mut() {
        last.push(')');
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> FplFields {
        FplFields {
            callsign: "DLH123".into(),
            aircraft_type: "A320".into(),
            wake_category: "M".into(),
            equipment: "SDE2E3FGHIJ1RWY".into(),
            surveillance: "/LB1".into(),
            departure: "EDDF".into(),
            departure_time: "1200".into(),
            speed: "N0450".into(),
            level: "F360".into(),
            route: " GILEX UL607 TOBAK ".into(),
            destination: "LFPG".into(),
            eet: "0105".into(),
            ..FplFields::default()
        }
    }

    #[test]
    fn minimal_message_closes_on_destination_line() {
        let text = build_icao_fpl(&fields());
        assert_eq!(
            text,
            "(FPL-DLH123-IS\n\
             -A320/M-SDE2E3FGHIJ1RWY/LB1\n\
             -EDDF1200\n\
             -N0450F360 GILEX UL607 TOBAK\n\
             -LFPG0105)"
        );
    }

    #[test]
    fn alternates_and_other_information() {
        let text = build_icao_fpl(&FplFields {
            alternate: "LFPO".into(),
            second_alternate: " ".into(),
            pbn: "A1B1".into(),
            rnp: "2".into(),
            dof: "251018".into(),
            rmk: "TCAS".into(),
            ..fields()
        });
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4], "-LFPG0105 LFPO");
        assert_eq!(lines[5], "-PBN/A1B1 RNP2 DOF/251018 RMK/TCAS)");
    }

    #[test]
    fn route_defaults() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
        let text = build_icao_fpl(&FplFields::for_route("EDDF", "LFPG", "A320", 90, "GILEX UL607 TOBAK", date));
        assert_eq!(
            text,
            "(FPL-XXXXXX-IS\n\
             -A320/M-SDE3FGIJ1KRWXY/LB1\n\
             -EDDF0000\n\
             -N0441F090 GILEX UL607 TOBAK\n\
             -LFPG\n\
             -PBN/A1B1D1O1S2 NAV/RNVD1E2A1 RNP2 DOF/251018 PER/C)"
        );
    }

    #[test]
    fn blank_route_has_no_trailing_space() {
        let text = build_icao_fpl(&FplFields {
            route: "  ".into(),
            ..fields()
        });
        assert!(text.contains("\n-N0450F360\n"));
    }
}
