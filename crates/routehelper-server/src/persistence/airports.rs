//! Airport persistence operations.

use std::collections::HashMap;

use anyhow::Result;
use routehelper_core::geo::GeoPoint;
use routehelper_core::models::AirportRecord;
use sqlx::{Executor, Sqlite, SqliteConnection};

/// Insert the airport or refresh its position. Returns true when inserted.
pub async fn upsert_airport(conn: &mut SqliteConnection, airport: &AirportRecord) -> Result<bool> {
    let updated = sqlx::query("UPDATE airports SET lat = ?2, lon = ?3 WHERE icao = ?1")
        .bind(&airport.icao)
        .bind(airport.lat)
        .bind(airport.lon)
        .execute(&mut *conn)
        .await?;
    if updated.rows_affected() > 0 {
        return Ok(false);
    }

    sqlx::query("INSERT INTO airports (icao, lat, lon) VALUES (?1, ?2, ?3)")
        .bind(&airport.icao)
        .bind(airport.lat)
        .bind(airport.lon)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

/// Every airport position keyed by ICAO code.
pub async fn load_airport_positions<'e, E>(executor: E) -> Result<HashMap<String, GeoPoint>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, f64, f64)> = sqlx::query_as("SELECT icao, lat, lon FROM airports")
        .fetch_all(executor)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(icao, lat, lon)| (icao.to_ascii_uppercase(), GeoPoint::new(lat, lon)))
        .collect())
}

/// ICAO codes starting with `prefix`, ascending.
pub async fn suggest_airports<'e, E>(executor: E, prefix: &str, limit: u32) -> Result<Vec<String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let pattern = format!("{}%", prefix.trim().to_ascii_uppercase());
    let codes: Vec<String> = sqlx::query_scalar("SELECT icao FROM airports WHERE icao LIKE ?1 ORDER BY icao ASC LIMIT ?2")
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(executor)
        .await?;
    Ok(codes)
}
