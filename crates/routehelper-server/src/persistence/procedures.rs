//! SID/STAR procedure persistence operations.

use std::collections::BTreeMap;

use anyhow::Result;
use routehelper_core::procedures::{ProcedureKey, ProcedureKind};
use sqlx::{Executor, Sqlite, SqliteConnection};

/// Insert the procedure or replace its route text. Returns true when inserted.
pub async fn upsert_procedure(
    conn: &mut SqliteConnection,
    icao: &str,
    kind: ProcedureKind,
    key: &ProcedureKey,
    route: &str,
) -> Result<bool> {
    let updated = sqlx::query(
        "UPDATE procedures SET route = ?5 WHERE icao = ?1 AND proc_type = ?2 AND name = ?3 AND start = ?4",
    )
    .bind(icao)
    .bind(kind.code())
    .bind(&key.name)
    .bind(&key.start)
    .bind(route)
    .execute(&mut *conn)
    .await?;
    if updated.rows_affected() > 0 {
        return Ok(false);
    }

    sqlx::query("INSERT INTO procedures (icao, proc_type, name, start, route) VALUES (?1, ?2, ?3, ?4, ?5)")
        .bind(icao)
        .bind(kind.code())
        .bind(&key.name)
        .bind(&key.start)
        .bind(route)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

/// Stored procedures of one kind for an airport.
pub async fn procedure_texts<'e, E>(
    executor: E,
    icao: &str,
    kind: ProcedureKind,
) -> Result<BTreeMap<ProcedureKey, String>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT name, start, route FROM procedures WHERE icao = ?1 AND proc_type = ?2",
    )
    .bind(icao.trim().to_ascii_uppercase())
    .bind(kind.code())
    .fetch_all(executor)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(name, start, route)| (ProcedureKey { name, start }, route))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::init_database;

    #[tokio::test]
    async fn test_upsert_replaces_route() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let key = ProcedureKey::new("GIX1A", "ALL");

        assert!(upsert_procedure(&mut conn, "EDDF", ProcedureKind::Sid, &key, "A B").await.unwrap());
        assert!(!upsert_procedure(&mut conn, "EDDF", ProcedureKind::Sid, &key, "A B C").await.unwrap());
        assert!(upsert_procedure(&mut conn, "EDDF", ProcedureKind::Star, &key, "X").await.unwrap());

        let sids = procedure_texts(&mut *conn, "eddf", ProcedureKind::Sid).await.unwrap();
        assert_eq!(sids.len(), 1);
        assert_eq!(sids[&key], "A B C");
        assert!(procedure_texts(&mut *conn, "LFPG", ProcedureKind::Sid)
            .await
            .unwrap()
            .is_empty());
    }
}
