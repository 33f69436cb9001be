//! Persistence layer for RouteHelper.
//!
//! SQLite-backed storage for AIRAC cycles, airports, fixes, airway segments,
//! SID/STAR procedures and flight plan history.

pub mod airports;
pub mod airways;
pub mod cycles;
pub mod db;
pub mod fixes;
pub mod flight_plans;
pub mod procedures;

pub use db::{init_database, is_unique_violation, purge_navdata, table_counts, Database, TableCounts};
