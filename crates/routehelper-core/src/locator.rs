//! Nearest graph-resident fixes around a position.

use std::cmp::Ordering;

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::graph::NavGraph;

/// A graph node near a reference position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate<'g> {
    pub key: &'g str,
    pub distance_nm: f64,
}

/// Nodes with at least one outgoing edge within `radius_nm` of `point`,
/// nearest first (equal distances ordered by key), at most `limit` of them.
pub fn nearest_fixes<'g>(
    graph: &'g NavGraph,
    point: GeoPoint,
    radius_nm: f64,
    limit: usize,
) -> Vec<Candidate<'g>> {
    let mut out: Vec<Candidate<'g>> = graph
        .coordinates
        .iter()
        .filter(|(key, _)| graph.has_outgoing(key))
        .filter_map(|(key, position)| {
            let distance_nm = point.distance_nm(position);
            (distance_nm <= radius_nm).then_some(Candidate {
                key: key.as_str(),
                distance_nm,
            })
        })
        .collect();

    out.sort_by(|a, b| {
        a.distance_nm
            .partial_cmp(&b.distance_nm)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key.cmp(b.key))
    });
    out.truncate(limit);
    out
}
