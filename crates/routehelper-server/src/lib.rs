//! Shared library surface for the route helper indexer, planning services and tests.

pub mod config;
pub mod geometry;
pub mod indexer;
pub mod persistence;
pub mod procedures;
pub mod route_planner;
pub mod sources;
pub mod status;

pub use config::Config;
pub use indexer::{IndexReport, Indexer};
pub use route_planner::{plan_route, RoutePlanRequest, RoutePlanResponse};
pub use sources::NavDataSources;
pub use status::{status, StatusReport};
