pub mod cycle;
pub mod fpl;
pub mod geo;
pub mod graph;
pub mod levels;
pub mod locator;
pub mod models;
pub mod parse;
pub mod planner;
pub mod procedures;

pub use cycle::{expected_cycle, is_cycle_current, CycleFile, CycleInfo, CycleSource};
pub use fpl::{build_icao_fpl, FplFields};
pub use geo::{haversine_nm, initial_course_deg, route_length_nm, GeoPoint, EARTH_RADIUS_NM};
pub use graph::{Edge, GraphFilter, NavGraph};
pub use levels::{eligible_flight_levels, RouteDirection};
pub use locator::{nearest_fixes, Candidate};
pub use models::{
    node_ident, node_key, AirportRecord, AirwayRecord, Direction, FixKey, FixRecord,
    FlightPlanRecord, LevelBand, ResolvedSegment, RouteClass, SegmentEndpoint, ENROUTE_USAGE,
};
pub use parse::{parse_airport_line, parse_airway_line, parse_fix_line, ParseError};
pub use planner::{
    assemble_route_tokens, plan_route, shortest_path, shortest_path_with_dct, DctBridging,
    NoRoute, PathResult, PlannerError, PlannerOptions, RoutePlan, RouteQuery, DCT_LABEL,
    MAX_DCT_STEPS_CAP,
};
pub use procedures::{
    assemble_procedures, format_procedure_matches, merge_runway_transitions,
    partition_procedure_lines, procedure_listing, ProcedureKey, ProcedureKind, ProcedureLines,
};
