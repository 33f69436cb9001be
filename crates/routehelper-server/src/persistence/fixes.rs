//! Fix persistence operations.

use std::collections::HashMap;

use anyhow::Result;
use routehelper_core::geo::GeoPoint;
use routehelper_core::models::{FixRecord, ENROUTE_USAGE};
use sqlx::{Executor, Sqlite, SqliteConnection};

/// A stored fix. `country` is `None` when stored as the empty string.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFix {
    pub id: i64,
    pub ident: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub usage: Option<String>,
}

impl StoredFix {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn is_enroute(&self) -> bool {
        self.usage
            .as_deref()
            .is_some_and(|usage| usage.eq_ignore_ascii_case(ENROUTE_USAGE))
    }
}

#[derive(sqlx::FromRow)]
struct FixRow {
    id: i64,
    ident: String,
    country: String,
    lat: f64,
    lon: f64,
    usage: Option<String>,
}

impl From<FixRow> for StoredFix {
    fn from(row: FixRow) -> Self {
        Self {
            id: row.id,
            ident: row.ident,
            country: (!row.country.is_empty()).then_some(row.country),
            lat: row.lat,
            lon: row.lon,
            usage: row.usage,
        }
    }
}

fn stored_country(fix: &FixRecord) -> &str {
    fix.country.as_deref().unwrap_or("")
}

/// Row id of the fix with the same natural key (ident, country, lat, lon).
pub async fn find_fix_id<'e, E>(executor: E, fix: &FixRecord) -> Result<Option<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let id: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM fixes WHERE ident = ?1 AND country = ?2 AND lat = ?3 AND lon = ?4",
    )
    .bind(&fix.ident)
    .bind(stored_country(fix))
    .bind(fix.lat)
    .bind(fix.lon)
    .fetch_optional(executor)
    .await?;
    Ok(id)
}

pub async fn insert_fix(conn: &mut SqliteConnection, fix: &FixRecord) -> Result<i64> {
    let result = sqlx::query(
        "INSERT INTO fixes (ident, country, lat, lon, usage, external_id, name) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(&fix.ident)
    .bind(stored_country(fix))
    .bind(fix.lat)
    .bind(fix.lon)
    .bind(&fix.usage)
    .bind(&fix.external_id)
    .bind(&fix.name)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

/// Overwrite usage, external id and name of an existing row.
pub async fn refresh_fix_metadata<'e, E>(executor: E, id: i64, fix: &FixRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE fixes SET usage = ?2, external_id = ?3, name = ?4 WHERE id = ?1")
        .bind(id)
        .bind(&fix.usage)
        .bind(&fix.external_id)
        .bind(&fix.name)
        .execute(executor)
        .await?;
    Ok(())
}

/// All rows with `ident`, in insertion order.
pub async fn fixes_by_ident<'e, E>(executor: E, ident: &str) -> Result<Vec<StoredFix>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, FixRow>(
        "SELECT id, ident, country, lat, lon, usage FROM fixes WHERE ident = ?1 ORDER BY id",
    )
    .bind(ident.trim().to_ascii_uppercase())
    .fetch_all(executor)
    .await?;
    Ok(rows.into_iter().map(StoredFix::from).collect())
}

/// Rows for each of `idents`, grouped by ident.
pub async fn fixes_for_idents(
    conn: &mut SqliteConnection,
    idents: &[String],
) -> Result<HashMap<String, Vec<StoredFix>>> {
    let mut out = HashMap::new();
    for ident in idents {
        let ident = ident.trim().to_ascii_uppercase();
        if out.contains_key(&ident) {
            continue;
        }
        let rows = fixes_by_ident(&mut *conn, &ident).await?;
        out.insert(ident, rows);
    }
    Ok(out)
}

/// Pick the row for an airway endpoint: exact country, else enroute usage,
/// else the first row.
pub fn resolve_endpoint<'a>(candidates: &'a [StoredFix], country: &str) -> Option<&'a StoredFix> {
    let country = country.trim();
    if !country.is_empty() {
        if let Some(exact) = candidates
            .iter()
            .find(|fix| fix.country.as_deref().is_some_and(|cc| cc.eq_ignore_ascii_case(country)))
        {
            return Some(exact);
        }
    }
    candidates
        .iter()
        .find(|fix| fix.is_enroute())
        .or_else(|| candidates.first())
}

/// Position for a route token: enroute row first, else the first row.
pub fn preferred_position(candidates: &[StoredFix]) -> Option<GeoPoint> {
    candidates
        .iter()
        .find(|fix| fix.is_enroute())
        .or_else(|| candidates.first())
        .map(StoredFix::position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    fn fix(ident: &str, country: Option<&str>, usage: Option<&str>, lat: f64) -> FixRecord {
        FixRecord {
            ident: ident.to_string(),
            lat,
            lon: 8.0,
            usage: usage.map(str::to_string),
            country: country.map(str::to_string),
            external_id: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_natural_key_lookup_and_refresh() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let record = fix("GILEX", None, Some("ENRT"), 50.0);
        assert!(find_fix_id(&mut *conn, &record).await.unwrap().is_none());
        let id = insert_fix(&mut conn, &record).await.unwrap();
        assert_eq!(find_fix_id(&mut *conn, &record).await.unwrap(), Some(id));

        let refreshed = FixRecord {
            name: Some("GILEX POINT".to_string()),
            usage: Some("TERM".to_string()),
            ..record.clone()
        };
        refresh_fix_metadata(&mut *conn, id, &refreshed).await.unwrap();
        let rows = fixes_by_ident(&mut *conn, "gilex").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, None);
        assert_eq!(rows[0].usage.as_deref(), Some("TERM"));

        let err = insert_fix(&mut conn, &record).await.unwrap_err();
        assert!(crate::persistence::is_unique_violation(&err));
    }

    #[test]
    fn test_endpoint_resolution_order() {
        let rows = vec![
            StoredFix {
                id: 1,
                ident: "ABC".into(),
                country: Some("LF".into()),
                lat: 1.0,
                lon: 1.0,
                usage: Some("TERM".into()),
            },
            StoredFix {
                id: 2,
                ident: "ABC".into(),
                country: Some("ED".into()),
                lat: 2.0,
                lon: 2.0,
                usage: Some("ENRT".into()),
            },
            StoredFix {
                id: 3,
                ident: "ABC".into(),
                country: Some("EG".into()),
                lat: 3.0,
                lon: 3.0,
                usage: None,
            },
        ];
        assert_eq!(resolve_endpoint(&rows, "EG").map(|f| f.id), Some(3));
        assert_eq!(resolve_endpoint(&rows, "XX").map(|f| f.id), Some(2));
        assert_eq!(resolve_endpoint(&rows[..1], "XX").map(|f| f.id), Some(1));
        assert!(resolve_endpoint(&[], "ED").is_none());
        assert_eq!(preferred_position(&rows), Some(GeoPoint::new(2.0, 2.0)));
    }
}
