//! Airway segment persistence operations.

use anyhow::Result;
use routehelper_core::geo::GeoPoint;
use routehelper_core::models::{Direction, LevelBand, ResolvedSegment, RouteClass, SegmentEndpoint};
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::warn;

/// An airway segment between two stored fixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewAirway {
    pub name: String,
    pub from_fix_id: i64,
    pub to_fix_id: i64,
    pub direction: Direction,
    pub route_class: RouteClass,
    pub band: LevelBand,
}

pub async fn airway_exists<'e, E>(executor: E, airway: &NewAirway) -> Result<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let found: Option<i64> = sqlx::query_scalar(
        r#"
        SELECT id FROM airways
        WHERE name = ?1 AND from_fix_id = ?2 AND to_fix_id = ?3 AND direction = ?4
          AND route_class = ?5 AND lower_fl = ?6 AND upper_fl = ?7
        "#,
    )
    .bind(&airway.name)
    .bind(airway.from_fix_id)
    .bind(airway.to_fix_id)
    .bind(airway.direction.code())
    .bind(airway.route_class.code())
    .bind(airway.band.lower_fl)
    .bind(airway.band.upper_fl)
    .fetch_optional(executor)
    .await?;
    Ok(found.is_some())
}

pub async fn insert_airway(conn: &mut SqliteConnection, airway: &NewAirway) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO airways (name, from_fix_id, to_fix_id, direction, route_class, lower_fl, upper_fl)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&airway.name)
    .bind(airway.from_fix_id)
    .bind(airway.to_fix_id)
    .bind(airway.direction.code())
    .bind(airway.route_class.code())
    .bind(airway.band.lower_fl)
    .bind(airway.band.upper_fl)
    .execute(&mut *conn)
    .await?;
    Ok(result.last_insert_rowid())
}

// Internal row type for SQLx
#[derive(sqlx::FromRow)]
struct SegmentRow {
    name: String,
    direction: String,
    route_class: i64,
    lower_fl: i32,
    upper_fl: i32,
    from_ident: String,
    from_country: String,
    from_lat: f64,
    from_lon: f64,
    to_ident: String,
    to_country: String,
    to_lat: f64,
    to_lon: f64,
}

fn endpoint(ident: String, country: String, lat: f64, lon: f64) -> SegmentEndpoint {
    SegmentEndpoint {
        ident,
        country: (!country.is_empty()).then_some(country),
        position: GeoPoint::new(lat, lon),
    }
}

impl TryFrom<SegmentRow> for ResolvedSegment {
    type Error = anyhow::Error;

    fn try_from(row: SegmentRow) -> Result<Self> {
        let direction = Direction::from_code(&row.direction)
            .ok_or_else(|| anyhow::anyhow!("unknown direction code {:?}", row.direction))?;
        let route_class = RouteClass::from_code(row.route_class)
            .ok_or_else(|| anyhow::anyhow!("unknown route class {}", row.route_class))?;

        Ok(ResolvedSegment {
            airway: row.name,
            direction,
            route_class,
            band: LevelBand {
                lower_fl: row.lower_fl,
                upper_fl: row.upper_fl,
            },
            from: endpoint(row.from_ident, row.from_country, row.from_lat, row.from_lon),
            to: endpoint(row.to_ident, row.to_country, row.to_lat, row.to_lon),
        })
    }
}

/// Every stored segment joined with both endpoint fixes, in insertion order.
/// Rows with codes this build does not understand are skipped.
pub async fn load_resolved_segments<'e, E>(executor: E) -> Result<Vec<ResolvedSegment>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, SegmentRow>(
        r#"
        SELECT a.name, a.direction, a.route_class, a.lower_fl, a.upper_fl,
               f1.ident AS from_ident, f1.country AS from_country, f1.lat AS from_lat, f1.lon AS from_lon,
               f2.ident AS to_ident, f2.country AS to_country, f2.lat AS to_lat, f2.lon AS to_lon
        FROM airways a
        JOIN fixes f1 ON f1.id = a.from_fix_id
        JOIN fixes f2 ON f2.id = a.to_fix_id
        ORDER BY a.id
        "#,
    )
    .fetch_all(executor)
    .await?;

    let mut segments = Vec::with_capacity(rows.len());
    for row in rows {
        match ResolvedSegment::try_from(row) {
            Ok(segment) => segments.push(segment),
            Err(err) => warn!("Skipping stored airway segment: {}", err),
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::fixes::insert_fix;
    use crate::persistence::init_database;
    use routehelper_core::models::FixRecord;

    fn fix(ident: &str, country: Option<&str>, lon: f64) -> FixRecord {
        FixRecord {
            ident: ident.to_string(),
            lat: 50.0,
            lon,
            usage: Some("ENRT".to_string()),
            country: country.map(str::to_string),
            external_id: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_load_segments() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        let a = insert_fix(&mut conn, &fix("AAA", Some("ED"), 8.0)).await.unwrap();
        let b = insert_fix(&mut conn, &fix("BBB", None, 9.0)).await.unwrap();

        let airway = NewAirway {
            name: "UL607".to_string(),
            from_fix_id: a,
            to_fix_id: b,
            direction: Direction::Forward,
            route_class: RouteClass::Upper,
            band: LevelBand {
                lower_fl: 245,
                upper_fl: 460,
            },
        };
        assert!(!airway_exists(&mut *conn, &airway).await.unwrap());
        insert_airway(&mut conn, &airway).await.unwrap();
        assert!(airway_exists(&mut *conn, &airway).await.unwrap());

        let segments = load_resolved_segments(&mut *conn).await.unwrap();
        assert_eq!(segments.len(), 1);
        let segment = &segments[0];
        assert_eq!(segment.airway, "UL607");
        assert_eq!(segment.direction, Direction::Forward);
        assert_eq!(segment.from.key(), "AAA@ED");
        assert_eq!(segment.to.key(), "BBB");
        assert_eq!(segment.to.position, GeoPoint::new(50.0, 9.0));
    }
}
