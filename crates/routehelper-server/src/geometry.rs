//! Map geometry for a planned route.

use anyhow::Result;
use routehelper_core::geo::{route_length_nm, GeoPoint};
use routehelper_core::planner::DCT_LABEL;
use serde::Serialize;
use sqlx::SqlitePool;

use crate::persistence::fixes::{fixes_for_idents, preferred_position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteFix {
    pub ident: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub origin: Option<GeoPoint>,
    pub dest: Option<GeoPoint>,
    pub fixes: Vec<RouteFix>,
    pub length_nm: f64,
}

/// Positions of the fixes named in a token sequence. Airway labels and
/// unknown tokens have no fix row and are dropped.
pub async fn route_geometry(
    pool: &SqlitePool,
    tokens: &[String],
    origin: Option<GeoPoint>,
    dest: Option<GeoPoint>,
) -> Result<RouteGeometry> {
    let idents: Vec<String> = tokens
        .iter()
        .map(|token| token.trim().to_ascii_uppercase())
        .filter(|token| !token.is_empty() && token != DCT_LABEL)
        .collect();

    let mut conn = pool.acquire().await?;
    let rows = fixes_for_idents(&mut conn, &idents).await?;

    let fixes: Vec<RouteFix> = idents
        .into_iter()
        .filter_map(|ident| {
            let point = rows.get(&ident).and_then(|found| preferred_position(found))?;
            Some(RouteFix {
                ident,
                lat: point.lat,
                lon: point.lon,
            })
        })
        .collect();

    let points: Vec<GeoPoint> = fixes.iter().map(|fix| GeoPoint::new(fix.lat, fix.lon)).collect();
    Ok(RouteGeometry {
        origin,
        dest,
        length_nm: route_length_nm(origin, &points, dest),
        fixes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::fixes::insert_fix;
    use crate::persistence::init_database;
    use routehelper_core::models::FixRecord;

    fn fix(ident: &str, country: &str, lat: f64, lon: f64, usage: &str) -> FixRecord {
        FixRecord {
            ident: ident.to_string(),
            country: Some(country.to_string()),
            lat,
            lon,
            usage: Some(usage.to_string()),
            external_id: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_airways_and_unknown_tokens_dropped() {
        let db = init_database(":memory:", 1).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();
        insert_fix(&mut conn, &fix("ALPHA", "ED", 50.0, 8.0, "TERM")).await.unwrap();
        insert_fix(&mut conn, &fix("BRAVO", "LF", 49.0, 4.0, "TERM")).await.unwrap();
        insert_fix(&mut conn, &fix("BRAVO", "ED", 49.0, 9.0, "ENRT")).await.unwrap();
        drop(conn);

        let tokens: Vec<String> = ["ALPHA", "UL1", "NOWHERE", "DCT", "BRAVO"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let geometry = route_geometry(db.pool(), &tokens, None, None).await.unwrap();

        let idents: Vec<&str> = geometry.fixes.iter().map(|f| f.ident.as_str()).collect();
        assert_eq!(idents, vec!["ALPHA", "BRAVO"]);
        // enroute row wins over the first row
        assert_eq!(geometry.fixes[1].lon, 9.0);
        assert!(geometry.length_nm > 0.0);
    }

    #[tokio::test]
    async fn test_empty_tokens_measure_airport_to_airport() {
        let db = init_database(":memory:", 1).await.unwrap();
        let origin = GeoPoint::new(50.0, 8.0);
        let dest = GeoPoint::new(50.0, 9.0);
        let geometry = route_geometry(db.pool(), &[], Some(origin), Some(dest)).await.unwrap();
        assert!(geometry.fixes.is_empty());
        assert!((geometry.length_nm - origin.distance_nm(&dest)).abs() < 1e-9);
    }
}
