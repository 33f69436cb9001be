//! Navigation data indexer.
//!
//! Loads the raw source files into SQLite in five steps (cycle, airports,
//! fixes, airways, procedures). A run is skipped when the source cycle is
//! already stored, unless forced; a forced run purges navigation data first.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::Utc;
use routehelper_core::cycle::CycleFile;
use routehelper_core::models::{node_key, FixKey};
use routehelper_core::parse::{parse_airport_line, parse_airway_line, parse_fix_line};
use routehelper_core::procedures::{assemble_procedures, partition_procedure_lines, ProcedureKind};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::persistence::airports::upsert_airport;
use crate::persistence::airways::{airway_exists, insert_airway, NewAirway};
use crate::persistence::cycles::{cycle_exists, upsert_cycle};
use crate::persistence::fixes::{
    find_fix_id, fixes_by_ident, insert_fix, refresh_fix_metadata, resolve_endpoint, StoredFix,
};
use crate::persistence::procedures::upsert_procedure;
use crate::persistence::{purge_navdata, table_counts};
use crate::sources::{NavDataSources, SourceLines};

const MISS_SAMPLE_LIMIT: usize = 5;
const SKIP_REASON: &str = "AIRAC unchanged";

/// Run one row write inside a savepoint. A unique-constraint race rolls the
/// row back and yields `None`; any other error aborts the step.
macro_rules! row_savepoint {
    ($tx:expr, |$conn:ident| $body:expr) => {{
        let mut savepoint = sqlx::Connection::begin(&mut *$tx).await?;
        let $conn: &mut SqliteConnection = &mut savepoint;
        match $body.await {
            Ok(value) => {
                savepoint.commit().await?;
                Some(value)
            }
            Err(err) if $crate::persistence::is_unique_violation(&err) => {
                savepoint.rollback().await?;
                debug!("Skipping duplicate row: {}", err);
                None
            }
            Err(err) => return Err(err),
        }
    }};
}

/// What one indexing run added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// 1 when a cycle file was present, else 0.
    pub cycle: u32,
    pub airports: u64,
    pub fixes: u64,
    pub airways: u64,
    pub sids: u64,
    pub stars: u64,
    pub skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub struct Indexer {
    pool: SqlitePool,
    sources: NavDataSources,
}

impl Indexer {
    pub fn new(pool: SqlitePool, sources: NavDataSources) -> Self {
        Self { pool, sources }
    }

    pub async fn reindex(&self, force: bool) -> Result<IndexReport> {
        info!(
            force,
            root = %self.sources.root().display(),
            "Index pipeline start"
        );

        let cycle_file = self.sources.read_cycle().await;
        if let Some(file) = &cycle_file {
            if !force && cycle_exists(&self.pool, &file.cycle).await? {
                info!(cycle = %file.cycle, "Index skipped: AIRAC unchanged");
                let counts = table_counts(&self.pool).await?;
                return Ok(IndexReport {
                    airports: u64::try_from(counts.airports).unwrap_or_default(),
                    fixes: u64::try_from(counts.fixes).unwrap_or_default(),
                    skipped: true,
                    reason: Some(SKIP_REASON.to_string()),
                    ..IndexReport::default()
                });
            }
        }

        if force {
            info!("Force reindex: clearing airports/fixes/airways/procedures");
            purge_navdata(&self.pool).await?;
        }

        let cycle = self.index_cycle(cycle_file.as_ref()).await?;
        let airports = self.index_airports().await?;
        let fixes = self.index_fixes().await?;
        let airways = self.index_airways().await?;
        let (sids, stars) = self.index_procedures().await?;

        let report = IndexReport {
            cycle,
            airports,
            fixes,
            airways,
            sids,
            stars,
            skipped: false,
            reason: None,
        };
        info!(?report, "Index done");
        Ok(report)
    }

    async fn index_cycle(&self, file: Option<&CycleFile>) -> Result<u32> {
        let Some(file) = file else {
            info!("AIRAC: cycle.json not found; skipping upsert");
            return Ok(0);
        };
        let mut tx = self.pool.begin().await?;
        upsert_cycle(&mut tx, file, Utc::now()).await?;
        tx.commit().await?;
        Ok(1)
    }

    async fn index_airports(&self) -> Result<u64> {
        let Some(path) = self.sources.airport_file().await else {
            info!("Airports: no airport metadata file found");
            return Ok(0);
        };
        let mut lines = SourceLines::open(&path).await?;
        let mut tx = self.pool.begin().await?;
        let (mut parsed, mut added, mut malformed) = (0u64, 0u64, 0u64);

        while let Some(line) = lines.next_line().await? {
            let airport = match parse_airport_line(&line) {
                Ok(Some(airport)) => airport,
                Ok(None) => continue,
                Err(err) => {
                    malformed += 1;
                    debug!("Airports: skipping line {:?}: {}", line, err);
                    continue;
                }
            };
            parsed += 1;
            if row_savepoint!(tx, |conn| upsert_airport(conn, &airport)) == Some(true) {
                added += 1;
            }
        }
        tx.commit().await?;

        info!(
            file = %path.display(),
            parsed,
            added,
            malformed,
            "Airports: indexed (others updated)"
        );
        Ok(added)
    }

    async fn index_fixes(&self) -> Result<u64> {
        let Some(path) = self.sources.fix_file().await else {
            info!("Fixes: earth_fix.dat not found");
            return Ok(0);
        };
        let mut lines = SourceLines::open(&path).await?;
        let mut tx = self.pool.begin().await?;
        let mut seen: HashSet<FixKey> = HashSet::new();
        let (mut added, mut refreshed, mut malformed) = (0u64, 0u64, 0u64);

        while let Some(line) = lines.next_line().await? {
            let fix = match parse_fix_line(&line) {
                Ok(Some(fix)) => fix,
                Ok(None) => continue,
                Err(err) => {
                    malformed += 1;
                    debug!("Fixes: skipping line {:?}: {}", line, err);
                    continue;
                }
            };
            if !seen.insert(fix.natural_key()) {
                continue;
            }
            if let Some(id) = find_fix_id(&mut *tx, &fix).await? {
                refresh_fix_metadata(&mut *tx, id, &fix).await?;
                refreshed += 1;
                continue;
            }
            if row_savepoint!(tx, |conn| insert_fix(conn, &fix)).is_some() {
                added += 1;
            }
        }
        tx.commit().await?;

        info!(added, refreshed, malformed, "Fixes: indexed");
        Ok(added)
    }

    async fn index_airways(&self) -> Result<u64> {
        let Some(path) = self.sources.airway_file().await else {
            info!("Airways: earth_awy.dat not found");
            return Ok(0);
        };
        info!(file = %path.display(), "Airways: reading");
        let mut lines = SourceLines::open(&path).await?;
        let mut tx = self.pool.begin().await?;
        let mut by_ident: HashMap<String, Vec<StoredFix>> = HashMap::new();
        let mut seen: HashSet<NewAirway> = HashSet::new();
        let mut miss_samples: Vec<(String, String)> = Vec::new();
        let (mut parsed, mut resolved, mut added, mut unresolved) = (0u64, 0u64, 0u64, 0u64);

        while let Some(line) = lines.next_line().await? {
            let record = match parse_airway_line(&line) {
                Ok(Some(record)) => record,
                Ok(None) => continue,
                Err(err) => {
                    debug!("Airways: skipping line {:?}: {}", line, err);
                    continue;
                }
            };
            parsed += 1;

            let from = endpoint_id(&mut tx, &mut by_ident, &record.from_ident, &record.from_country).await?;
            let to = endpoint_id(&mut tx, &mut by_ident, &record.to_ident, &record.to_country).await?;
            let (Some(from_fix_id), Some(to_fix_id)) = (from, to) else {
                unresolved += 1;
                if miss_samples.len() < MISS_SAMPLE_LIMIT {
                    miss_samples.push((
                        node_key(&record.from_ident, Some(&record.from_country)),
                        node_key(&record.to_ident, Some(&record.to_country)),
                    ));
                }
                continue;
            };
            resolved += 1;

            let airway = NewAirway {
                name: record.airway,
                from_fix_id,
                to_fix_id,
                direction: record.direction,
                route_class: record.route_class,
                band: record.band,
            };
            if seen.contains(&airway) || airway_exists(&mut *tx, &airway).await? {
                continue;
            }
            if row_savepoint!(tx, |conn| insert_airway(conn, &airway)).is_some() {
                added += 1;
            }
            seen.insert(airway);
        }
        tx.commit().await?;

        info!(parsed, resolved, added, "Airways: indexed");
        if !miss_samples.is_empty() {
            warn!(unresolved, samples = ?miss_samples, "Airways: unresolved endpoint pairs");
        }
        Ok(added)
    }

    async fn index_procedures(&self) -> Result<(u64, u64)> {
        let files = match self.sources.procedure_files().await {
            Ok(files) => files,
            Err(err) => {
                warn!("Procedures: {:#}", err);
                return Ok((0, 0));
            }
        };
        info!(
            root = %self.sources.procedure_dir().await.display(),
            total_files = files.len(),
            "Procedures: reading"
        );

        let (mut sids, mut stars) = (0u64, 0u64);
        for (icao, path) in files {
            let text = match tokio::fs::read(&path).await {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    warn!("Procedures: failed to read {}: {}", path.display(), err);
                    continue;
                }
            };
            let lines = partition_procedure_lines(text.lines());

            let mut tx = self.pool.begin().await?;
            for kind in [ProcedureKind::Sid, ProcedureKind::Star] {
                let procedures = assemble_procedures(kind, lines.for_kind(kind));
                for (key, route) in &procedures {
                    if row_savepoint!(tx, |conn| upsert_procedure(conn, &icao, kind, key, route))
                        == Some(true)
                    {
                        match kind {
                            ProcedureKind::Sid => sids += 1,
                            ProcedureKind::Star => stars += 1,
                        }
                    }
                }
            }
            tx.commit().await?;
            debug!(icao = %icao, "Procedures: airport indexed");
        }

        info!(sids, stars, "Procedures: added");
        Ok((sids, stars))
    }
}

/// Stored fix id for an airway endpoint, loading candidates once per ident.
async fn endpoint_id(
    conn: &mut SqliteConnection,
    by_ident: &mut HashMap<String, Vec<StoredFix>>,
    ident: &str,
    country: &str,
) -> Result<Option<i64>> {
    if !by_ident.contains_key(ident) {
        let rows = fixes_by_ident(&mut *conn, ident).await?;
        by_ident.insert(ident.to_string(), rows);
    }
    Ok(by_ident
        .get(ident)
        .and_then(|rows| resolve_endpoint(rows, country))
        .map(|fix| fix.id))
}
