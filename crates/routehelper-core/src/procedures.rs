//! SID/STAR procedure text assembly from per-airport procedure files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Sequence number that opens a new procedure text.
const FIRST_SEGMENT: &str = "010";
const RUNWAY_MARKER: &str = "RW";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcedureKind {
    Sid,
    Star,
}

impl ProcedureKind {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sid => "SID",
            Self::Star => "STAR",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "SID" => Some(Self::Sid),
            "STAR" => Some(Self::Star),
            _ => None,
        }
    }

    /// Text used when a route has no fix to search for.
    pub fn no_fix_message(&self) -> &'static str {
        match self {
            Self::Sid => "No SID fix found.",
            Self::Star => "No STAR fix found.",
        }
    }
}

impl fmt::Display for ProcedureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Procedure identity within one airport and kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProcedureKey {
    pub name: String,
    pub start: String,
}

impl ProcedureKey {
    pub fn new(name: impl Into<String>, start: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: start.into(),
        }
    }

    pub fn is_runway_transition(&self) -> bool {
        self.start.contains(RUNWAY_MARKER)
    }
}

impl fmt::Display for ProcedureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.name, self.start)
    }
}

/// Lines of one procedure file split by record type, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcedureLines {
    pub sids: Vec<String>,
    pub stars: Vec<String>,
    pub approaches: Vec<String>,
    pub runways: Vec<String>,
}

impl ProcedureLines {
    pub fn for_kind(&self, kind: ProcedureKind) -> &[String] {
        match kind {
            ProcedureKind::Sid => &self.sids,
            ProcedureKind::Star => &self.stars,
        }
    }
}

/// Split procedure file lines on their `TYPE:` tag. Lines with other tags are dropped.
pub fn partition_procedure_lines<'a, I>(lines: I) -> ProcedureLines
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = ProcedureLines::default();
    for raw in lines {
        let line = raw.trim_end_matches(['\r', '\n']);
        let Some((tag, _)) = line.split_once(':') else {
            continue;
        };
        let bucket = match tag.trim().to_ascii_uppercase().as_str() {
            "SID" => &mut out.sids,
            "STAR" => &mut out.stars,
            "APPCH" => &mut out.approaches,
            "RWY" => &mut out.runways,
            _ => continue,
        };
        bucket.push(line.to_string());
    }
    out
}

struct ProcedureSegment<'a> {
    seq: &'a str,
    key: ProcedureKey,
    text: String,
}

/// `TYPE:SEQ,<x>,NAME,START,SEGMENT,...`
fn parse_segment(line: &str) -> Option<ProcedureSegment<'_>> {
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 5 {
        return None;
    }
    let (_, seq) = parts[0].split_once(':')?;
    Some(ProcedureSegment {
        seq: seq.trim(),
        key: ProcedureKey::new(parts[2].trim(), parts[3].trim()),
        text: parts[4].replace("  ", " ").trim().to_string(),
    })
}

/// Build `key -> route text` for lines of one kind, then fold runway
/// transitions into their base procedures.
pub fn assemble_procedures<S: AsRef<str>>(
    kind: ProcedureKind,
    lines: &[S],
) -> BTreeMap<ProcedureKey, String> {
    let mut segments: BTreeMap<ProcedureKey, Vec<String>> = BTreeMap::new();
    for line in lines {
        let Some(segment) = parse_segment(line.as_ref()) else {
            continue;
        };
        let texts = segments.entry(segment.key).or_default();
        if segment.seq == FIRST_SEGMENT {
            texts.clear();
        }
        texts.push(segment.text);
    }

    let mut procedures: BTreeMap<ProcedureKey, String> = segments
        .into_iter()
        .map(|(key, texts)| {
            let route = texts
                .iter()
                .filter(|text| !text.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ");
            (key, route)
        })
        .collect();
    merge_runway_transitions(kind, &mut procedures);
    procedures
}

/// Fold every runway-specific entry into the entries of the same procedure
/// name that are not runway-specific. A runway entry without a base stays.
pub fn merge_runway_transitions(kind: ProcedureKind, procedures: &mut BTreeMap<ProcedureKey, String>) {
    let runway_keys: Vec<ProcedureKey> = procedures
        .keys()
        .filter(|key| key.is_runway_transition())
        .cloned()
        .collect();

    for runway_key in runway_keys {
        let base_keys: Vec<ProcedureKey> = procedures
            .keys()
            .filter(|key| key.name == runway_key.name && !key.is_runway_transition())
            .cloned()
            .collect();
        if base_keys.is_empty() {
            continue;
        }
        let Some(runway_text) = procedures.remove(&runway_key) else {
            continue;
        };
        for base_key in base_keys {
            if let Some(base_text) = procedures.get_mut(&base_key) {
                *base_text = match kind {
                    ProcedureKind::Sid => format!(
                        "[{}] {} | {}",
                        runway_key.start,
                        runway_text.replace("  ", ""),
                        base_text
                    ),
                    ProcedureKind::Star => {
                        format!("{} | {} [{}]", base_text, runway_text, runway_key.start)
                    }
                };
            }
        }
    }
}

/// Listing of every entry whose key or route contains `fix`.
pub fn format_procedure_matches<'a, I>(fix: &str, entries: I) -> String
where
    I: IntoIterator<Item = (&'a ProcedureKey, &'a String)>,
{
    let mut lines = vec![format!("- Fix Search: {fix}")];
    for (key, route) in entries {
        let chart = key.to_string();
        if chart.contains(fix) || route.contains(fix) {
            lines.push(format!("* Chart: {chart} || Route: {route}"));
        }
    }
    lines.join("\n").trim().to_string()
}

/// Procedure text for the first (SID) or last (STAR) route token.
pub fn procedure_listing(
    kind: ProcedureKind,
    route_tokens: &[String],
    procedures: &BTreeMap<ProcedureKey, String>,
) -> String {
    let fix = match kind {
        ProcedureKind::Sid => route_tokens.first(),
        ProcedureKind::Star => route_tokens.last(),
    };
    match fix {
        Some(fix) => format_procedure_matches(fix, procedures),
        None => kind.no_fix_message().to_string(),
    }
}
