//! AIRAC cycle persistence.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use routehelper_core::cycle::{CycleFile, CycleInfo, CycleSource};
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::info;

/// Outcome of [`upsert_cycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleUpsert {
    Inserted,
    Updated,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CycleRow {
    pub id: i64,
    pub cycle: String,
    pub name: Option<String>,
    pub revision: Option<String>,
    pub created_at: String,
    pub current: bool,
}

impl CycleRow {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn info(&self, today: NaiveDate) -> CycleInfo {
        CycleInfo::new(
            &self.cycle,
            self.name.clone(),
            self.revision.clone(),
            CycleSource::Db,
            today,
        )
    }
}

pub async fn cycle_exists<'e, E>(executor: E, cycle: &str) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM airac_cycles WHERE cycle = ?1")
        .bind(cycle.trim())
        .fetch_optional(executor)
        .await?;
    Ok(found.is_some())
}

/// Update name/revision of a known cycle, or make a new cycle the only current one.
pub async fn upsert_cycle(
    conn: &mut SqliteConnection,
    file: &CycleFile,
    now: DateTime<Utc>,
) -> Result<CycleUpsert> {
    let cycle = file.cycle.trim();
    let updated = sqlx::query("UPDATE airac_cycles SET name = ?2, revision = ?3 WHERE cycle = ?1")
        .bind(cycle)
        .bind(&file.name)
        .bind(&file.revision)
        .execute(&mut *conn)
        .await?;
    if updated.rows_affected() > 0 {
        info!(cycle, "AIRAC: existing cycle updated");
        return Ok(CycleUpsert::Updated);
    }

    sqlx::query("UPDATE airac_cycles SET current = 0")
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO airac_cycles (cycle, name, revision, created_at, current) VALUES (?1, ?2, ?3, ?4, 1)",
    )
    .bind(cycle)
    .bind(&file.name)
    .bind(&file.revision)
    .bind(now.to_rfc3339())
    .execute(&mut *conn)
    .await?;
    info!(cycle, "AIRAC: inserted cycle");
    Ok(CycleUpsert::Inserted)
}

/// The current cycle, or the most recently inserted one when none is flagged.
pub async fn latest_cycle<'e, E>(executor: E) -> Result<Option<CycleRow>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, CycleRow>(
        "SELECT id, cycle, name, revision, created_at, current FROM airac_cycles ORDER BY current DESC, id DESC LIMIT 1",
    )
    .fetch_optional(executor)
    .await?;
    Ok(row)
}
