//! Airway route planner.
//!
//! Attaches the origin and destination airports to the nearest graph fixes,
//! runs Dijkstra over every candidate pair and, when the airway network alone
//! cannot connect them, escalates through bounded DCT bridging and a
//! mixed-class graph before giving up.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::geo::GeoPoint;
use crate::graph::{GraphFilter, NavGraph};
use crate::locator::{nearest_fixes, Candidate};
use crate::models::{node_ident, LevelBand, ResolvedSegment};

/// Label emitted for a direct leg between two graph fixes.
pub const DCT_LABEL: &str = "DCT";
/// Upper bound for the number of DCT legs in one route.
pub const MAX_DCT_STEPS_CAP: u32 = 5;

const RADIUS_MULTIPLIERS: [f64; 5] = [1.0, 1.5, 2.0, 3.0, 4.0];
const MIN_BASE_RADIUS_NM: f64 = 10.0;
const MIN_CANDIDATE_LIMIT: usize = 5;
const STRICT_RADIUS_CAP_NM: f64 = 500.0;
const STRICT_PAIR_CANDIDATES: usize = 7;
const MIXED_RADIUS_CAP_NM: f64 = 600.0;
const MIXED_PAIR_CANDIDATES: usize = 8;
const MIXED_CANDIDATE_LIMIT_FLOOR: usize = 10;
const MIXED_DCT_RADIUS_FLOOR_NM: f64 = 120.0;
const MIXED_DCT_NEIGHBORS_FLOOR: usize = 25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerOptions {
    /// Only use segments whose class matches the cruise level (upper at FL245+).
    pub strict_class_match: bool,
    pub allow_dct_bridging: bool,
    /// Values above [`MAX_DCT_STEPS_CAP`] are capped.
    pub max_dct_steps: u32,
    pub dct_radius_nm: f64,
    pub dct_neighbors_limit: usize,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            strict_class_match: true,
            allow_dct_bridging: true,
            max_dct_steps: 3,
            dct_radius_nm: 120.0,
            dct_neighbors_limit: 25,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("dct_radius_nm must be a positive finite number, got {0}")]
    InvalidDctRadius(f64),
    #[error("dct_neighbors_limit must be at least 1")]
    InvalidNeighborLimit,
}

impl PlannerOptions {
    pub fn validate(&self) -> Result<(), PlannerError> {
        if !self.dct_radius_nm.is_finite() || self.dct_radius_nm <= 0.0 {
            return Err(PlannerError::InvalidDctRadius(self.dct_radius_nm));
        }
        if self.dct_neighbors_limit == 0 {
            return Err(PlannerError::InvalidNeighborLimit);
        }
        Ok(())
    }

    fn dct_step_cap(&self) -> u32 {
        self.max_dct_steps.clamp(1, MAX_DCT_STEPS_CAP)
    }
}

/// Origin/destination pair and the cruise band, in flight levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: String,
    pub dest: String,
    pub fl_start: i32,
    pub fl_end: i32,
}

/// Reason a plan produced no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRoute {
    MissingAirport,
    AirportCoordinates,
    NoNearbyFixes,
    NoGraphPath,
    NoGraphOrDctPath,
    InvalidOptions,
}

impl NoRoute {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingAirport => "No route generated.",
            Self::AirportCoordinates => "No route generated. (Airport coordinates not found)",
            Self::NoNearbyFixes => "No route generated. (No nearby airway fixes)",
            Self::NoGraphPath => "No route generated. (No graph path)",
            Self::NoGraphOrDctPath => "No route generated. (No graph/DCT path)",
            Self::InvalidOptions => "No route generated. (Invalid planner options)",
        }
    }
}

impl fmt::Display for NoRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub tokens: Vec<String>,
    pub text: String,
    pub distance_nm: Option<f64>,
    pub dct_hops: u32,
    pub failure: Option<NoRoute>,
}

impl RoutePlan {
    pub fn failed(reason: NoRoute) -> Self {
        Self {
            tokens: Vec::new(),
            text: reason.message().to_string(),
            distance_nm: None,
            dct_hops: 0,
            failure: Some(reason),
        }
    }

    fn from_path(path: &PathResult) -> Self {
        let tokens = assemble_route_tokens(path);
        Self {
            text: tokens.join(" "),
            tokens,
            distance_nm: Some(path.cost_nm),
            dct_hops: path.dct_hops,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Node path found by a search. `labels[i]` names the leg from `nodes[i]` to
/// `nodes[i + 1]`; DCT legs carry [`DCT_LABEL`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathResult {
    pub nodes: Vec<String>,
    pub labels: Vec<String>,
    pub cost_nm: f64,
    pub dct_hops: u32,
}

/// Limits for synthetic direct legs during a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DctBridging {
    pub max_steps: u32,
    pub radius_nm: f64,
    pub neighbors_limit: usize,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct SearchState<'g> {
    node: &'g str,
    hops: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry<'g> {
    cost: FloatOrd,
    state: SearchState<'g>,
}

impl PartialOrd for OpenEntry<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.state.cmp(&other.state))
    }
}

#[derive(Default)]
struct Frontier<'g> {
    best: HashMap<SearchState<'g>, f64>,
    came_from: HashMap<SearchState<'g>, (SearchState<'g>, &'g str)>,
    open: BinaryHeap<Reverse<OpenEntry<'g>>>,
}

impl<'g> Frontier<'g> {
    fn relax(
        &mut self,
        next: SearchState<'g>,
        cost: f64,
        from: SearchState<'g>,
        label: &'g str,
    ) {
        if cost < self.best.get(&next).copied().unwrap_or(f64::INFINITY) {
            self.best.insert(next, cost);
            self.came_from.insert(next, (from, label));
            self.open.push(Reverse(OpenEntry {
                cost: FloatOrd(cost),
                state: next,
            }));
        }
    }
}

/// Plain Dijkstra over airway edges.
pub fn shortest_path(graph: &NavGraph, start: &str, goal: &str) -> Option<PathResult> {
    search(graph, start, goal, None)
}

/// Dijkstra over `(node, dct legs used)` states, allowing up to
/// `bridging.max_steps` direct legs to nearby graph fixes that are not
/// already airway neighbours.
pub fn shortest_path_with_dct(
    graph: &NavGraph,
    start: &str,
    goal: &str,
    bridging: &DctBridging,
) -> Option<PathResult> {
    search(graph, start, goal, Some(bridging))
}

fn search<'g>(
    graph: &'g NavGraph,
    start: &str,
    goal: &str,
    bridging: Option<&DctBridging>,
) -> Option<PathResult> {
    let (start, _) = graph.coordinates.get_key_value(start)?;
    let (goal, _) = graph.coordinates.get_key_value(goal)?;
    let start = SearchState {
        node: start.as_str(),
        hops: 0,
    };
    let goal = goal.as_str();
    let max_steps = bridging.map(|b| b.max_steps).unwrap_or(0);

    let mut frontier = Frontier::default();
    frontier.best.insert(start, 0.0);
    frontier.open.push(Reverse(OpenEntry {
        cost: FloatOrd(0.0),
        state: start,
    }));
    let mut closed: HashSet<SearchState<'g>> = HashSet::new();
    let mut dct_cache: HashMap<&'g str, Vec<Candidate<'g>>> = HashMap::new();

    while let Some(Reverse(current)) = frontier.open.pop() {
        let state = current.state;
        if !closed.insert(state) {
            continue;
        }
        if state.node == goal {
            // Every state still queued costs at least this much.
            break;
        }
        let cost = current.cost.0;

        for edge in graph.edges_from(state.node) {
            let next = SearchState {
                node: edge.to.as_str(),
                hops: state.hops,
            };
            frontier.relax(next, cost + edge.distance_nm, state, edge.airway.as_str());
        }

        let Some(bridging) = bridging else {
            continue;
        };
        if state.hops >= bridging.max_steps {
            continue;
        }
        let neighbours = dct_cache.entry(state.node).or_insert_with(|| {
            graph
                .position(state.node)
                .map(|point| {
                    nearest_fixes(graph, point, bridging.radius_nm, bridging.neighbors_limit)
                        .into_iter()
                        .filter(|candidate| candidate.key != state.node)
                        .collect()
                })
                .unwrap_or_default()
        });
        for candidate in neighbours.iter() {
            if graph.has_edge(state.node, candidate.key) {
                continue;
            }
            let next = SearchState {
                node: candidate.key,
                hops: state.hops + 1,
            };
            frontier.relax(next, cost + candidate.distance_nm, state, DCT_LABEL);
        }
    }

    let mut best_goal: Option<(SearchState<'g>, f64)> = None;
    for hops in 0..=max_steps {
        let state = SearchState { node: goal, hops };
        if let Some(&cost) = frontier.best.get(&state) {
            if best_goal.map_or(true, |(_, best)| cost < best) {
                best_goal = Some((state, cost));
            }
        }
    }
    let (goal_state, cost_nm) = best_goal?;

    let mut nodes = vec![goal_state.node.to_string()];
    let mut labels = Vec::new();
    let mut cursor = goal_state;
    while cursor != start {
        let (previous, label) = frontier.came_from.get(&cursor)?;
        labels.push(label.to_string());
        nodes.push(previous.node.to_string());
        cursor = *previous;
    }
    nodes.reverse();
    labels.reverse();

    Some(PathResult {
        nodes,
        labels,
        cost_nm,
        dct_hops: goal_state.hops,
    })
}

/// Route tokens for a node path: bare idents, with the leg label inserted
/// only when it changes.
pub fn assemble_route_tokens(path: &PathResult) -> Vec<String> {
    let mut tokens = Vec::with_capacity(path.nodes.len() * 2);
    let mut last_label: Option<&str> = None;

    for (idx, node) in path.nodes.iter().enumerate() {
        if idx > 0 {
            if let Some(label) = path.labels.get(idx - 1).map(String::as_str) {
                if !label.is_empty() && last_label != Some(label) {
                    tokens.push(label.to_string());
                    last_label = Some(label);
                }
            }
        }
        tokens.push(node_ident(node).to_string());
    }

    tokens
}

/// How airport endpoints are attached to a graph.
#[derive(Debug, Clone, Copy)]
struct Attachment {
    base_radius_nm: f64,
    radius_cap_nm: f64,
    limit: usize,
    per_side: usize,
}

impl Attachment {
    /// Widen the search radius until some fix is found.
    fn candidates<'g>(&self, graph: &'g NavGraph, point: GeoPoint) -> Vec<&'g str> {
        for multiplier in RADIUS_MULTIPLIERS {
            let radius_nm = (self.base_radius_nm * multiplier).min(self.radius_cap_nm);
            let found = nearest_fixes(graph, point, radius_nm, self.limit);
            debug!(radius_nm, found = found.len(), "Candidate pass");
            if !found.is_empty() {
                return found
                    .into_iter()
                    .take(self.per_side)
                    .map(|candidate| candidate.key)
                    .collect();
            }
        }
        Vec::new()
    }
}

/// Cheapest result over every origin x destination pair; the first of equal
/// costs is kept.
fn best_over_pairs<F>(origins: &[&str], dests: &[&str], tier: &str, mut search: F) -> Option<PathResult>
where
    F: FnMut(&str, &str) -> Option<PathResult>,
{
    let mut best: Option<PathResult> = None;
    for &start in origins {
        for &goal in dests {
            let found = search(start, goal);
            debug!(
                tier,
                start,
                goal,
                nodes = found.as_ref().map_or(0, |path| path.nodes.len()),
                cost_nm = found.as_ref().map_or(f64::INFINITY, |path| path.cost_nm),
                "Pair searched"
            );
            if let Some(path) = found {
                if best.as_ref().map_or(true, |current| path.cost_nm < current.cost_nm) {
                    best = Some(path);
                }
            }
        }
    }
    best
}

/// DCT search with step caps 1..=`cap`, stopping at the first cap that connects any pair.
fn escalate_dct(
    graph: &NavGraph,
    origins: &[&str],
    dests: &[&str],
    cap: u32,
    radius_nm: f64,
    neighbors_limit: usize,
) -> Option<PathResult> {
    for max_steps in 1..=cap {
        let bridging = DctBridging {
            max_steps,
            radius_nm,
            neighbors_limit,
        };
        let found = best_over_pairs(origins, dests, "dct", |start, goal| {
            shortest_path_with_dct(graph, start, goal, &bridging)
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Plan an enroute airway route between two airports.
///
/// `airport_position` resolves an upper-case ICAO code to its reference
/// position. Data problems yield a failed [`RoutePlan`]; only invalid
/// options are an error.
pub fn plan_route<F>(
    segments: &[ResolvedSegment],
    airport_position: F,
    query: &RouteQuery,
    options: &PlannerOptions,
) -> Result<RoutePlan, PlannerError>
where
    F: Fn(&str) -> Option<GeoPoint>,
{
    options.validate()?;

    let origin = query.origin.trim().to_ascii_uppercase();
    let dest = query.dest.trim().to_ascii_uppercase();
    info!(
        origin = %origin,
        dest = %dest,
        fl_start = query.fl_start,
        fl_end = query.fl_end,
        "Planner start"
    );
    if origin.is_empty() || dest.is_empty() {
        return Ok(RoutePlan::failed(NoRoute::MissingAirport));
    }

    let band = LevelBand::spanning(query.fl_start, query.fl_end);
    let filter = GraphFilter {
        cruise_fl: band.representative_level(),
        band,
        strict_class: options.strict_class_match,
    };
    let graph = NavGraph::build(segments, &filter);

    let (Some(origin_point), Some(dest_point)) =
        (airport_position(&origin), airport_position(&dest))
    else {
        warn!(origin = %origin, dest = %dest, "Missing airport coordinates");
        return Ok(RoutePlan::failed(NoRoute::AirportCoordinates));
    };

    let base_radius_nm = options.dct_radius_nm.max(MIN_BASE_RADIUS_NM);
    let candidate_limit = options.dct_neighbors_limit.max(MIN_CANDIDATE_LIMIT);
    let attachment = Attachment {
        base_radius_nm,
        radius_cap_nm: STRICT_RADIUS_CAP_NM,
        limit: candidate_limit,
        per_side: STRICT_PAIR_CANDIDATES,
    };
    let origins = attachment.candidates(&graph, origin_point);
    let dests = attachment.candidates(&graph, dest_point);
    if origins.is_empty() || dests.is_empty() {
        warn!(
            origin_candidates = origins.len(),
            dest_candidates = dests.len(),
            "No nearby airway fixes"
        );
        return Ok(RoutePlan::failed(NoRoute::NoNearbyFixes));
    }

    if let Some(path) = best_over_pairs(&origins, &dests, "graph", |start, goal| {
        shortest_path(&graph, start, goal)
    }) {
        return Ok(finish(path));
    }

    if !options.allow_dct_bridging || options.max_dct_steps == 0 {
        info!("No graph path found and DCT bridging disabled");
        return Ok(RoutePlan::failed(NoRoute::NoGraphPath));
    }

    info!("No graph-only path found, retrying with DCT bridging");
    let cap = options.dct_step_cap();
    if let Some(path) = escalate_dct(
        &graph,
        &origins,
        &dests,
        cap,
        options.dct_radius_nm,
        options.dct_neighbors_limit,
    ) {
        return Ok(finish(path));
    }

    if !options.strict_class_match {
        info!("No graph/DCT path between any candidate pair");
        return Ok(RoutePlan::failed(NoRoute::NoGraphOrDctPath));
    }

    info!("Retrying with mixed route classes");
    let mixed_graph = NavGraph::build(
        segments,
        &GraphFilter {
            strict_class: false,
            ..filter
        },
    );
    let mixed_attachment = Attachment {
        base_radius_nm,
        radius_cap_nm: MIXED_RADIUS_CAP_NM,
        limit: candidate_limit.max(MIXED_CANDIDATE_LIMIT_FLOOR),
        per_side: MIXED_PAIR_CANDIDATES,
    };
    let origins = mixed_attachment.candidates(&mixed_graph, origin_point);
    let dests = mixed_attachment.candidates(&mixed_graph, dest_point);
    if !origins.is_empty() && !dests.is_empty() {
        let found = best_over_pairs(&origins, &dests, "mixed", |start, goal| {
            shortest_path(&mixed_graph, start, goal)
        })
        .or_else(|| {
            escalate_dct(
                &mixed_graph,
                &origins,
                &dests,
                cap,
                options.dct_radius_nm.max(MIXED_DCT_RADIUS_FLOOR_NM),
                options.dct_neighbors_limit.max(MIXED_DCT_NEIGHBORS_FLOOR),
            )
        });
        if let Some(path) = found {
            return Ok(finish(path));
        }
    }

    info!("No graph/DCT path between any candidate pair, mixed classes included");
    Ok(RoutePlan::failed(NoRoute::NoGraphOrDctPath))
}

fn finish(path: PathResult) -> RoutePlan {
    let plan = RoutePlan::from_path(&path);
    info!(
        tokens = plan.tokens.len(),
        distance_nm = path.cost_nm,
        dct_hops = path.dct_hops,
        start = path.nodes.first().map(String::as_str).unwrap_or(""),
        end = path.nodes.last().map(String::as_str).unwrap_or(""),
        "Planner success"
    );
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, RouteClass, SegmentEndpoint};

    fn fix(ident: &str, lon: f64) -> SegmentEndpoint {
        SegmentEndpoint {
            ident: ident.to_string(),
            country: Some("XX".to_string()),
            position: GeoPoint::new(0.0, lon),
        }
    }

    fn airway(name: &str, from: SegmentEndpoint, to: SegmentEndpoint) -> ResolvedSegment {
        ResolvedSegment {
            airway: name.to_string(),
            direction: Direction::Both,
            route_class: RouteClass::Upper,
            band: LevelBand {
                lower_fl: 245,
                upper_fl: 460,
            },
            from,
            to,
        }
    }

    fn airports(code: &str) -> Option<GeoPoint> {
        match code {
            "ORIG" => Some(GeoPoint::new(0.0, 0.0)),
            "DEST" => Some(GeoPoint::new(0.0, 2.6)),
            "FAR" => Some(GeoPoint::new(0.0, 4.3)),
            _ => None,
        }
    }

    fn query(dest: &str) -> RouteQuery {
        RouteQuery {
            origin: "orig".to_string(),
            dest: dest.to_string(),
            fl_start: 300,
            fl_end: 360,
        }
    }

    fn options(radius_nm: f64) -> PlannerOptions {
        PlannerOptions {
            dct_radius_nm: radius_nm,
            ..PlannerOptions::default()
        }
    }

    fn graph_of(segments: &[ResolvedSegment]) -> NavGraph {
        NavGraph::build(
            segments,
            &GraphFilter {
                cruise_fl: 330,
                band: LevelBand::spanning(300, 360),
                strict_class: true,
            },
        )
    }

    #[test]
    fn same_airway_label_is_not_repeated() {
        let segments = [
            airway("UL607", fix("A", 0.1), fix("B", 1.3)),
            airway("UL607", fix("B", 1.3), fix("C", 2.5)),
        ];
        let plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        assert!(plan.is_success(), "{}", plan.text);
        assert_eq!(plan.tokens, vec!["A", "UL607", "B", "C"]);
        assert_eq!(plan.text, "A UL607 B C");
        assert_eq!(plan.dct_hops, 0);
    }

    #[test]
    fn label_changes_are_emitted() {
        let path = PathResult {
            nodes: vec!["A@XX".into(), "B@XX".into(), "C@XX".into(), "D".into()],
            labels: vec!["UL607".into(), "UN850".into(), "UN850".into()],
            cost_nm: 1.0,
            dct_hops: 0,
        };
        assert_eq!(
            assemble_route_tokens(&path),
            vec!["A", "UL607", "B", "UN850", "C", "D"]
        );
    }

    #[test]
    fn dijkstra_prefers_cheaper_path() {
        let segments = [
            airway("L1", fix("A", 0.0), fix("B", 1.0)),
            airway("L1", fix("B", 1.0), fix("C", 2.0)),
            // Detour through a fix far to the north.
            ResolvedSegment {
                to: SegmentEndpoint {
                    ident: "N".to_string(),
                    country: Some("XX".to_string()),
                    position: GeoPoint::new(3.0, 1.0),
                },
                ..airway("L2", fix("A", 0.0), fix("A", 0.0))
            },
            ResolvedSegment {
                from: SegmentEndpoint {
                    ident: "N".to_string(),
                    country: Some("XX".to_string()),
                    position: GeoPoint::new(3.0, 1.0),
                },
                ..airway("L2", fix("C", 2.0), fix("C", 2.0))
            },
        ];
        let graph = graph_of(&segments);
        let path = shortest_path(&graph, "A@XX", "C@XX").unwrap();
        assert_eq!(path.nodes, vec!["A@XX", "B@XX", "C@XX"]);
        assert_eq!(path.labels, vec!["L1", "L1"]);
        assert!((path.cost_nm - 120.08).abs() < 0.1);
    }

    #[test]
    fn repeated_searches_are_deterministic() {
        // Two equal-cost routes between A and D.
        let segments = [
            airway("L1", fix("A", 0.0), fix("B", 1.0)),
            airway("L1", fix("B", 1.0), fix("D", 2.0)),
            airway("L2", fix("A", 0.0), fix("C", 1.0)),
            airway("L2", fix("C", 1.0), fix("D", 2.0)),
        ];
        let graph = graph_of(&segments);
        let first = shortest_path(&graph, "A@XX", "D@XX").unwrap();
        for _ in 0..20 {
            let again = shortest_path(&graph, "A@XX", "D@XX").unwrap();
            assert_eq!(again, first);
        }
        let first_plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        let second_plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        assert_eq!(first_plan, second_plan);
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let segments = [
            airway("L1", fix("A", 0.0), fix("B", 1.0)),
            airway("L2", fix("C", 3.0), fix("D", 4.0)),
        ];
        let graph = graph_of(&segments);
        assert!(shortest_path(&graph, "A@XX", "D@XX").is_none());
        assert!(shortest_path(&graph, "A@XX", "UNKNOWN").is_none());
    }

    #[test]
    fn dct_bridges_disconnected_clusters() {
        let segments = [
            airway("UL1", fix("O1", 0.1), fix("O2", 0.5)),
            airway("UL2", fix("D1", 2.0), fix("D2", 2.5)),
        ];
        let plan = plan_route(&segments, airports, &query("DEST"), &options(100.0)).unwrap();
        assert!(plan.is_success(), "{}", plan.text);
        assert!(plan.tokens.iter().any(|token| token == DCT_LABEL));
        assert_eq!(plan.dct_hops, 1);
        assert_eq!(plan.tokens, vec!["O2", "DCT", "D1"]);
    }

    #[test]
    fn dct_disabled_reports_no_graph_path() {
        let segments = [
            airway("UL1", fix("O1", 0.1), fix("O2", 0.5)),
            airway("UL2", fix("D1", 2.0), fix("D2", 2.5)),
        ];
        let opts = PlannerOptions {
            allow_dct_bridging: false,
            ..options(100.0)
        };
        let plan = plan_route(&segments, airports, &query("DEST"), &opts).unwrap();
        assert!(plan.tokens.is_empty());
        assert_eq!(plan.text, "No route generated. (No graph path)");

        let opts = PlannerOptions {
            max_dct_steps: 0,
            ..options(100.0)
        };
        let plan = plan_route(&segments, airports, &query("DEST"), &opts).unwrap();
        assert_eq!(plan.failure, Some(NoRoute::NoGraphPath));
    }

    #[test]
    fn dct_hops_never_exceed_the_step_limit() {
        // Three clusters 90 nm apart; crossing them needs two direct legs.
        let segments = [
            airway("UL1", fix("O1", 0.1), fix("O2", 0.5)),
            airway("UL2", fix("M1", 2.0), fix("M2", 2.2)),
            airway("UL3", fix("D1", 3.7), fix("D2", 4.2)),
        ];
        let one_step = PlannerOptions {
            strict_class_match: false,
            max_dct_steps: 1,
            ..options(100.0)
        };
        let plan = plan_route(&segments, airports, &query("FAR"), &one_step).unwrap();
        assert!(plan.tokens.is_empty());
        assert_eq!(plan.text, "No route generated. (No graph/DCT path)");

        let two_steps = PlannerOptions {
            max_dct_steps: 2,
            ..one_step
        };
        let plan = plan_route(&segments, airports, &query("FAR"), &two_steps).unwrap();
        assert!(plan.is_success(), "{}", plan.text);
        assert_eq!(plan.dct_hops, 2);
        assert_eq!(plan.tokens, vec!["O2", "DCT", "M1", "UL2", "M2", "DCT", "D1"]);
    }

    #[test]
    fn dct_search_respects_step_cap_directly() {
        let segments = [
            airway("UL1", fix("O1", 0.1), fix("O2", 0.5)),
            airway("UL2", fix("M1", 2.0), fix("M2", 2.2)),
            airway("UL3", fix("D1", 3.7), fix("D2", 4.2)),
        ];
        let graph = graph_of(&segments);
        for max_steps in 0..=3 {
            let bridging = DctBridging {
                max_steps,
                radius_nm: 100.0,
                neighbors_limit: 25,
            };
            match shortest_path_with_dct(&graph, "O1@XX", "D2@XX", &bridging) {
                Some(path) => {
                    assert!(path.dct_hops <= max_steps);
                    assert_eq!(
                        path.labels.iter().filter(|label| *label == DCT_LABEL).count() as u32,
                        path.dct_hops
                    );
                }
                None => assert!(max_steps < 2),
            }
        }
    }

    #[test]
    fn missing_airport_coordinates() {
        let segments = [airway("UL1", fix("A", 0.1), fix("B", 0.5))];
        let plan = plan_route(&segments, airports, &query("ZZZZ"), &options(100.0)).unwrap();
        assert!(plan.tokens.is_empty());
        assert_eq!(plan.text, "No route generated. (Airport coordinates not found)");
    }

    #[test]
    fn blank_codes_generate_nothing() {
        let plan = plan_route(&[], airports, &query("  "), &options(100.0)).unwrap();
        assert!(plan.tokens.is_empty());
        assert_eq!(plan.text, "No route generated.");
    }

    #[test]
    fn no_nearby_fixes() {
        let segments = [airway("UL1", fix("A", 40.0), fix("B", 41.0))];
        let plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        assert_eq!(plan.failure, Some(NoRoute::NoNearbyFixes));
        assert_eq!(plan.text, "No route generated. (No nearby airway fixes)");
    }

    #[test]
    fn candidate_radius_widens_until_found() {
        // The only fixes are 50-70 nm from each airport; base radius 20 nm
        // needs the 3x pass to reach them.
        let segments = [airway("UL9", fix("P", 0.9), fix("Q", 1.7))];
        let plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        assert_eq!(plan.tokens, vec!["P", "UL9", "Q"]);
    }

    #[test]
    fn mixed_class_fallback_finds_lower_airways() {
        // Upper stubs near each airport give candidates but no connection;
        // only the lower airway links the two sides.
        let segments = [
            airway("UX", fix("X1", 0.2), fix("X2", 0.3)),
            airway("UY", fix("Y1", 2.35), fix("Y2", 2.45)),
            ResolvedSegment {
                route_class: RouteClass::Lower,
                band: LevelBand {
                    lower_fl: 50,
                    upper_fl: 460,
                },
                ..airway("L9", fix("A", 0.1), fix("B", 2.5))
            },
        ];
        let plan = plan_route(&segments, airports, &query("DEST"), &options(20.0)).unwrap();
        assert!(plan.is_success(), "{}", plan.text);
        assert_eq!(plan.tokens, vec!["A", "L9", "B"]);

        let non_strict = PlannerOptions {
            strict_class_match: false,
            ..options(20.0)
        };
        let plan = plan_route(&segments, airports, &query("DEST"), &non_strict).unwrap();
        assert_eq!(plan.tokens, vec!["A", "L9", "B"]);

        let without_lower = &segments[..2];
        let plan = plan_route(without_lower, airports, &query("DEST"), &options(20.0)).unwrap();
        assert_eq!(plan.failure, Some(NoRoute::NoGraphOrDctPath));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let bad_radius = PlannerOptions {
            dct_radius_nm: f64::NAN,
            ..PlannerOptions::default()
        };
        assert!(matches!(
            plan_route(&[], airports, &query("DEST"), &bad_radius),
            Err(PlannerError::InvalidDctRadius(_))
        ));
        let bad_limit = PlannerOptions {
            dct_neighbors_limit: 0,
            ..PlannerOptions::default()
        };
        assert_eq!(
            plan_route(&[], airports, &query("DEST"), &bad_limit),
            Err(PlannerError::InvalidNeighborLimit)
        );
    }
}
