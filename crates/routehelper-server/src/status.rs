//! Data set status: table counts and the loaded cycle.

use anyhow::Result;
use chrono::NaiveDate;
use routehelper_core::cycle::{expected_cycle, CycleInfo, CycleSource};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::persistence::cycles::latest_cycle;
use crate::persistence::{table_counts, TableCounts};
use crate::sources::NavDataSources;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub counts: TableCounts,
    pub cycle: CycleInfo,
    pub expected_cycle: String,
}

/// Cycle from the database, else from `cycle.json` in the data directory.
pub async fn current_cycle_info(
    pool: &SqlitePool,
    sources: Option<&NavDataSources>,
    today: NaiveDate,
) -> Result<CycleInfo> {
    if let Some(row) = latest_cycle(pool).await? {
        return Ok(row.info(today));
    }
    if let Some(sources) = sources {
        if let Some(file) = sources.read_cycle().await {
            return Ok(CycleInfo::new(
                &file.cycle,
                file.name,
                file.revision,
                CycleSource::Json,
                today,
            ));
        }
    }
    Ok(CycleInfo::missing())
}

pub async fn status(
    pool: &SqlitePool,
    sources: &NavDataSources,
    today: NaiveDate,
) -> Result<StatusReport> {
    Ok(StatusReport {
        counts: table_counts(pool).await?,
        cycle: current_cycle_info(pool, Some(sources), today).await?,
        expected_cycle: expected_cycle(today),
    })
}
