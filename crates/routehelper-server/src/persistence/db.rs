//! Database connection and initialization.

use anyhow::Result;
use serde::Serialize;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Database connection wrapper.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Get the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Row counts of every table, for status reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub airports: i64,
    pub fixes: i64,
    pub airways: i64,
    pub sids: i64,
    pub stars: i64,
    pub flight_plans: i64,
}

/// Remove all navigation data (airways, procedures, fixes, airports).
/// Cycles and flight plan history are kept.
pub async fn purge_navdata(pool: &SqlitePool) -> Result<()> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM airways").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM procedures").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM fixes").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM airports").execute(&mut *tx).await?;
    tx.commit().await?;
    Ok(())
}

pub async fn table_counts(pool: &SqlitePool) -> Result<TableCounts> {
    let airports: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM airports")
        .fetch_one(pool)
        .await?;
    let fixes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM fixes")
        .fetch_one(pool)
        .await?;
    let airways: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM airways")
        .fetch_one(pool)
        .await?;
    let sids: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM procedures WHERE proc_type = 'SID'")
        .fetch_one(pool)
        .await?;
    let stars: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM procedures WHERE proc_type = 'STAR'")
        .fetch_one(pool)
        .await?;
    let flight_plans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM flight_plans")
        .fetch_one(pool)
        .await?;

    Ok(TableCounts {
        airports,
        fixes,
        airways,
        sids,
        stars,
        flight_plans,
    })
}

/// True when `err` wraps a SQLite unique-constraint violation.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Initialize the SQLite database.
///
/// Creates the database file if it doesn't exist, runs migrations,
/// and returns a connection pool.
pub async fn init_database(db_path: &str, max_connections: u32) -> Result<Database> {
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path);

    info!("Connecting to database: {}", db_path);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(&db_url)
        .await?;

    run_migrations(&pool).await?;

    Ok(Database { pool })
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let migration_sql = include_str!("../../migrations/001_init.sql");

    info!("Running database migrations...");

    // Split by semicolons and execute each statement
    for statement in migration_sql.split(';') {
        let statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let statement = statement.trim();
        if statement.is_empty() {
            continue;
        }

        if let Err(e) = sqlx::query(statement).execute(pool).await {
            let err_str = e.to_string();
            // "already exists" is expected on re-runs
            if err_str.contains("already exists") {
                continue;
            }
            if statement.to_uppercase().starts_with("CREATE") {
                anyhow::bail!("Migration failed on CREATE statement: {}", e);
            }
            warn!("Migration statement failed: {}", e);
        }
    }

    info!("Database migrations complete");
    Ok(())
}
