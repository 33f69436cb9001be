//! Configuration from environment.

use std::env;
use std::path::PathBuf;

use routehelper_core::planner::PlannerOptions;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `cycle.json`, the `earth_*.dat` files and `CIFP/`.
    pub data_path: PathBuf,
    pub db_path: String,
    pub db_max_connections: u32,
    pub planner: PlannerOptions,
}

fn parsed<T: std::str::FromStr>(value: Option<String>) -> Option<T> {
    value.and_then(|s| s.trim().parse().ok())
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = PlannerOptions::default();
        Self {
            data_path: lookup("ROUTEHELPER_DATA_PATH")
                .or_else(|| lookup("DATA_PATH"))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
            db_path: lookup("ROUTEHELPER_DB_PATH")
                .unwrap_or_else(|| "var/lib/routehelper/routehelper.db".to_string()),
            db_max_connections: parsed(lookup("ROUTEHELPER_DB_MAX_CONNECTIONS")).unwrap_or(4),
            planner: PlannerOptions {
                dct_radius_nm: parsed(lookup("ROUTEHELPER_DCT_RADIUS_NM"))
                    .unwrap_or(defaults.dct_radius_nm),
                dct_neighbors_limit: parsed(lookup("ROUTEHELPER_DCT_NEIGHBORS"))
                    .unwrap_or(defaults.dct_neighbors_limit),
                max_dct_steps: parsed(lookup("ROUTEHELPER_MAX_DCT_STEPS"))
                    .unwrap_or(defaults.max_dct_steps),
                ..defaults
            },
        }
    }
}
