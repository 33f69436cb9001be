//! Flight plan history persistence operations.

use anyhow::Result;
use chrono::{DateTime, Utc};
use routehelper_core::models::FlightPlanRecord;
use sqlx::SqlitePool;

/// Store a planning result. Returns the new row id.
pub async fn insert_flight_plan(pool: &SqlitePool, plan: &FlightPlanRecord) -> Result<i64> {
    let tokens_json = serde_json::to_string(&plan.route_tokens)?;

    let result = sqlx::query(
        r#"
        INSERT INTO flight_plans (
            origin, dest, aircraft, fl_start, fl_end, cycle,
            route_text, route_tokens, sid_text, star_text, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&plan.origin)
    .bind(&plan.dest)
    .bind(&plan.aircraft)
    .bind(plan.fl_start)
    .bind(plan.fl_end)
    .bind(&plan.cycle)
    .bind(&plan.route_text)
    .bind(&tokens_json)
    .bind(&plan.sid_text)
    .bind(&plan.star_text)
    .bind(plan.created_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent flight plans first.
pub async fn recent_flight_plans(pool: &SqlitePool, limit: u32) -> Result<Vec<FlightPlanRecord>> {
    let rows = sqlx::query_as::<_, FlightPlanRow>(
        r#"
        SELECT id, origin, dest, aircraft, fl_start, fl_end, cycle,
               route_text, route_tokens, sid_text, star_text, created_at
        FROM flight_plans
        ORDER BY id DESC
        LIMIT ?1
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(|r| r.try_into()).collect()
}

/// Load a single flight plan by ID.
pub async fn load_flight_plan(pool: &SqlitePool, id: i64) -> Result<Option<FlightPlanRecord>> {
    let row = sqlx::query_as::<_, FlightPlanRow>(
        r#"
        SELECT id, origin, dest, aircraft, fl_start, fl_end, cycle,
               route_text, route_tokens, sid_text, star_text, created_at
        FROM flight_plans
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => Ok(Some(r.try_into()?)),
        None => Ok(None),
    }
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct FlightPlanRow {
    id: i64,
    origin: String,
    dest: String,
    aircraft: Option<String>,
    fl_start: Option<i32>,
    fl_end: Option<i32>,
    cycle: Option<String>,
    route_text: String,
    route_tokens: String,
    sid_text: String,
    star_text: String,
    created_at: String,
}

impl TryFrom<FlightPlanRow> for FlightPlanRecord {
    type Error = anyhow::Error;

    fn try_from(row: FlightPlanRow) -> Result<Self> {
        let route_tokens: Vec<String> = serde_json::from_str(&row.route_tokens)?;

        let created_at = DateTime::parse_from_rfc3339(&row.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(FlightPlanRecord {
            id: Some(row.id),
            origin: row.origin,
            dest: row.dest,
            aircraft: row.aircraft,
            fl_start: row.fl_start,
            fl_end: row.fl_end,
            cycle: row.cycle,
            route_text: row.route_text,
            route_tokens,
            sid_text: row.sid_text,
            star_text: row.star_text,
            created_at,
        })
    }
}
