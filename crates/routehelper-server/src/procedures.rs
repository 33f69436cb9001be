//! SID/STAR suggestions for a planned route.

use routehelper_core::procedures::{procedure_listing, ProcedureKind};
use sqlx::SqlitePool;
use tracing::warn;

use crate::persistence::procedures::procedure_texts;

/// Stored procedures of `kind` at `icao` that touch the route's first (SID)
/// or last (STAR) token. Lookup failures come back as `Error: ...` text.
pub async fn procedure_text(
    pool: &SqlitePool,
    icao: &str,
    kind: ProcedureKind,
    route_tokens: &[String],
) -> String {
    if route_tokens.is_empty() {
        return kind.no_fix_message().to_string();
    }
    match procedure_texts(pool, icao, kind).await {
        Ok(procedures) => procedure_listing(kind, route_tokens, &procedures),
        Err(err) => {
            warn!("{} lookup for {} failed: {}", kind, icao, err);
            format!("Error: {err}")
        }
    }
}

/// SID text at the origin and STAR text at the destination.
pub async fn infer_sid_star(
    pool: &SqlitePool,
    origin: &str,
    dest: &str,
    route_tokens: &[String],
) -> (String, String) {
    let sid = procedure_text(pool, origin, ProcedureKind::Sid, route_tokens).await;
    let star = procedure_text(pool, dest, ProcedureKind::Star, route_tokens).await;
    (sid, star)
}
