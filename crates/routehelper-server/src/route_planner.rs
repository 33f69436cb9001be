//! Route planning service over the indexed navigation data.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use routehelper_core::cycle::CycleInfo;
use routehelper_core::fpl::{build_icao_fpl, FplFields};
use routehelper_core::levels::{eligible_flight_levels, RouteDirection};
use routehelper_core::models::FlightPlanRecord;
use routehelper_core::planner::{self, NoRoute, PlannerOptions, RoutePlan, RouteQuery};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::geometry::{route_geometry, RouteGeometry};
use crate::persistence::airports::load_airport_positions;
use crate::persistence::airways::load_resolved_segments;
use crate::persistence::flight_plans::insert_flight_plan;
use crate::procedures::infer_sid_star;
use crate::status::current_cycle_info;

const DEFAULT_AIRCRAFT: &str = "A320";

fn default_save() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoutePlanRequest {
    pub origin: String,
    pub dest: String,
    pub fl_start: i32,
    pub fl_end: i32,
    pub aircraft: Option<String>,
    #[serde(default)]
    pub options: PlannerOptions,
    /// Record the result in the flight plan history.
    #[serde(default = "default_save")]
    pub save: bool,
}

impl RoutePlanRequest {
    pub fn new(origin: &str, dest: &str, fl_start: i32, fl_end: i32) -> Self {
        Self {
            origin: origin.to_string(),
            dest: dest.to_string(),
            fl_start,
            fl_end,
            aircraft: None,
            options: PlannerOptions::default(),
            save: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutePlanResponse {
    pub ok: bool,
    pub origin: String,
    pub dest: String,
    pub route: RoutePlan,
    pub sid_text: String,
    pub star_text: String,
    pub direction: RouteDirection,
    pub eligible_levels: Vec<String>,
    pub geometry: Option<RouteGeometry>,
    pub fpl: String,
    pub cycle: CycleInfo,
    pub flight_plan_id: Option<i64>,
    pub errors: Vec<String>,
}

/// Plan a route, attach procedures, levels and the FPL message, and record it.
///
/// A route that cannot be found is a normal response with `ok = false`;
/// only database failures are errors.
pub async fn plan_route(pool: &SqlitePool, request: RoutePlanRequest) -> Result<RoutePlanResponse> {
    plan_route_on(pool, request, Utc::now().date_naive()).await
}

pub async fn plan_route_on(
    pool: &SqlitePool,
    request: RoutePlanRequest,
    today: NaiveDate,
) -> Result<RoutePlanResponse> {
    let origin = request.origin.trim().to_ascii_uppercase();
    let dest = request.dest.trim().to_ascii_uppercase();
    let aircraft = request
        .aircraft
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_AIRCRAFT)
        .to_ascii_uppercase();

    let segments = load_resolved_segments(pool).await?;
    let airports = load_airport_positions(pool).await?;
    let cycle = current_cycle_info(pool, None, today).await?;

    let query = RouteQuery {
        origin: origin.clone(),
        dest: dest.clone(),
        fl_start: request.fl_start,
        fl_end: request.fl_end,
    };
    let route = match planner::plan_route(
        &segments,
        |icao| airports.get(icao).copied(),
        &query,
        &request.options,
    ) {
        Ok(route) => route,
        Err(err) => {
            warn!("Rejected planner options: {}", err);
            return Ok(RoutePlanResponse {
                ok: false,
                origin,
                dest,
                route: RoutePlan::failed(NoRoute::InvalidOptions),
                sid_text: String::new(),
                star_text: String::new(),
                direction: RouteDirection::Unknown,
                eligible_levels: Vec::new(),
                geometry: None,
                fpl: String::new(),
                cycle,
                flight_plan_id: None,
                errors: vec![err.to_string()],
            });
        }
    };

    let origin_point = airports.get(&origin).copied();
    let dest_point = airports.get(&dest).copied();
    let direction = match (origin_point, dest_point) {
        (Some(o), Some(d)) => RouteDirection::between(o, d),
        _ => RouteDirection::Unknown,
    };
    let eligible_levels = eligible_flight_levels(request.fl_start, request.fl_end, direction);

    let (sid_text, star_text) = infer_sid_star(pool, &origin, &dest, &route.tokens).await;
    let geometry = route_geometry(pool, &route.tokens, origin_point, dest_point).await?;

    // failure text never goes into item 15
    let fpl = build_icao_fpl(&FplFields::for_route(
        &origin,
        &dest,
        &aircraft,
        request.fl_start,
        &route.tokens.join(" "),
        today,
    ));

    let mut errors = Vec::new();
    if let Some(reason) = route.failure {
        errors.push(reason.to_string());
    }

    let flight_plan_id = if request.save {
        let record = FlightPlanRecord {
            id: None,
            origin: origin.clone(),
            dest: dest.clone(),
            aircraft: Some(aircraft.clone()),
            fl_start: Some(request.fl_start),
            fl_end: Some(request.fl_end),
            cycle: cycle.cycle.clone(),
            route_text: route.text.clone(),
            route_tokens: route.tokens.clone(),
            sid_text: sid_text.clone(),
            star_text: star_text.clone(),
            created_at: Utc::now(),
        };
        match insert_flight_plan(pool, &record).await {
            Ok(id) => Some(id),
            Err(err) => {
                warn!("Flight plan not saved: {}", err);
                None
            }
        }
    } else {
        None
    };

    info!(
        origin = %origin,
        dest = %dest,
        ok = route.is_success(),
        tokens = route.tokens.len(),
        dct_hops = route.dct_hops,
        "Route planned"
    );

    Ok(RoutePlanResponse {
        ok: route.is_success(),
        origin,
        dest,
        sid_text,
        star_text,
        direction,
        eligible_levels,
        geometry: Some(geometry),
        fpl,
        cycle,
        flight_plan_id,
        errors,
        route,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    #[tokio::test]
    async fn test_invalid_options_reported_in_response() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut request = RoutePlanRequest::new("EDDF", "LFPG", 300, 360);
        request.options.dct_radius_nm = -1.0;

        let response = plan_route(db.pool(), request).await.unwrap();
        assert!(!response.ok);
        assert!(!response.route.is_success());
        assert_eq!(response.route.failure, Some(NoRoute::InvalidOptions));
        assert_eq!(
            response.route.text,
            "No route generated. (Invalid planner options)"
        );
        assert_eq!(response.errors.len(), 1);
        assert!(response.errors[0].contains("dct_radius_nm"));
        assert_eq!(response.flight_plan_id, None);
    }

    #[tokio::test]
    async fn test_unknown_airports_still_recorded() {
        let db = init_database(":memory:", 1).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
        let request = RoutePlanRequest::new(" eddf ", "lfpg", 300, 360);

        let response = plan_route_on(db.pool(), request, today).await.unwrap();
        assert!(!response.ok);
        assert_eq!(response.origin, "EDDF");
        assert_eq!(
            response.route.text,
            "No route generated. (Airport coordinates not found)"
        );
        assert_eq!(response.sid_text, "No SID fix found.");
        assert_eq!(response.direction, RouteDirection::Unknown);
        assert!(response.fpl.contains("-A320/M-"));
        assert!(response.fpl.contains("DOF/251018"));
        assert!(response.fpl.contains("\n-N0441F300\n"));
        assert!(response.flight_plan_id.is_some());
    }
}
