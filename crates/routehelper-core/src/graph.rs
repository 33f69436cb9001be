//! Directed airway graph filtered by altitude band and route class.

use std::collections::HashMap;

use crate::geo::GeoPoint;
use crate::models::{LevelBand, ResolvedSegment, RouteClass};

/// Outgoing edge of a graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub to: String,
    pub distance_nm: f64,
    pub airway: String,
}

/// Adjacency list keyed by node key plus the position of every node on an edge.
#[derive(Debug, Clone, Default)]
pub struct NavGraph {
    pub adjacency: HashMap<String, Vec<Edge>>,
    pub coordinates: HashMap<String, GeoPoint>,
}

/// Filter applied while building a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphFilter {
    pub cruise_fl: i32,
    pub band: LevelBand,
    pub strict_class: bool,
}

impl GraphFilter {
    pub fn desired_class(&self) -> RouteClass {
        RouteClass::for_cruise_level(self.cruise_fl)
    }

    pub fn includes(&self, segment: &ResolvedSegment) -> bool {
        if !self.band.overlaps(&segment.band) {
            return false;
        }
        !self.strict_class || segment.route_class == self.desired_class()
    }
}

impl NavGraph {
    /// Build the graph from resolved segments.
    pub fn build(segments: &[ResolvedSegment], filter: &GraphFilter) -> Self {
        let mut graph = NavGraph::default();
        let mut included = 0usize;

        for segment in segments.iter().filter(|segment| filter.includes(segment)) {
            included += 1;
            let from_key = segment.from.key();
            let to_key = segment.to.key();
            graph
                .coordinates
                .entry(from_key.clone())
                .or_insert(segment.from.position);
            graph
                .coordinates
                .entry(to_key.clone())
                .or_insert(segment.to.position);

            let distance_nm = segment.from.position.distance_nm(&segment.to.position);
            if segment.direction.allows_forward() {
                graph.add_edge(&from_key, &to_key, distance_nm, &segment.airway);
            }
            if segment.direction.allows_reverse() {
                graph.add_edge(&to_key, &from_key, distance_nm, &segment.airway);
            }
        }

        tracing::debug!(
            cruise_fl = filter.cruise_fl,
            lower_fl = filter.band.lower_fl,
            upper_fl = filter.band.upper_fl,
            strict_class = filter.strict_class,
            segments = segments.len(),
            included,
            nodes = graph.adjacency.len(),
            edges = graph.edge_count(),
            "Airway graph built"
        );
        graph
    }

    fn add_edge(&mut self, from: &str, to: &str, distance_nm: f64, airway: &str) {
        self.adjacency.entry(from.to_string()).or_default().push(Edge {
            to: to.to_string(),
            distance_nm,
            airway: airway.to_string(),
        });
    }

    pub fn edges_from(&self, key: &str) -> &[Edge] {
        self.adjacency.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_outgoing(&self, key: &str) -> bool {
        !self.edges_from(key).is_empty()
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.edges_from(from).iter().any(|edge| edge.to == to)
    }

    pub fn position(&self, key: &str) -> Option<GeoPoint> {
        self.coordinates.get(key).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }
}
