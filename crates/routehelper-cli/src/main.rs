//! Route helper command line.
//!
//! Usage:
//!   routehelper index [--force]
//!   routehelper plan EDDF LFPG --fl-start 300 --fl-end 360
//!   routehelper status

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use routehelper_server::persistence::airports::suggest_airports;
use routehelper_server::persistence::flight_plans::recent_flight_plans;
use routehelper_server::persistence::init_database;
use routehelper_server::route_planner::{plan_route, RoutePlanRequest, RoutePlanResponse};
use routehelper_server::{status, Config, Indexer, NavDataSources};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Airway route planner over X-Plane navigation data")]
struct Cli {
    /// Data directory (cycle.json, earth_*.dat, CIFP/)
    #[arg(long, global = true)]
    data_path: Option<std::path::PathBuf>,

    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the data directory into the database
    Index {
        /// Purge navigation data and reindex even when the cycle is unchanged
        #[arg(long)]
        force: bool,
    },
    /// Plan a route between two airports
    Plan(PlanArgs),
    /// Show table counts and the loaded cycle
    Status,
    /// List airport codes by prefix
    Airports {
        #[arg(default_value = "")]
        prefix: String,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show recently planned routes
    History {
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
}

#[derive(Args, Debug)]
struct PlanArgs {
    origin: String,
    dest: String,

    #[arg(long, default_value_t = 300)]
    fl_start: i32,

    #[arg(long, default_value_t = 360)]
    fl_end: i32,

    #[arg(long)]
    aircraft: Option<String>,

    /// Allow lower and upper airways regardless of cruise level
    #[arg(long)]
    mixed_classes: bool,

    /// Disable direct legs between disconnected fixes
    #[arg(long)]
    no_dct: bool,

    #[arg(long)]
    max_dct_steps: Option<u32>,

    #[arg(long)]
    dct_radius: Option<f64>,

    #[arg(long)]
    dct_neighbors: Option<usize>,

    /// Do not record the plan in the history
    #[arg(long)]
    no_save: bool,
}

impl PlanArgs {
    fn into_request(self, config: &Config) -> RoutePlanRequest {
        let mut options = config.planner.clone();
        options.strict_class_match = !self.mixed_classes;
        options.allow_dct_bridging = !self.no_dct;
        if let Some(steps) = self.max_dct_steps {
            options.max_dct_steps = steps;
        }
        if let Some(radius) = self.dct_radius {
            options.dct_radius_nm = radius;
        }
        if let Some(neighbors) = self.dct_neighbors {
            options.dct_neighbors_limit = neighbors;
        }
        RoutePlanRequest {
            origin: self.origin,
            dest: self.dest,
            fl_start: self.fl_start,
            fl_end: self.fl_end,
            aircraft: self.aircraft,
            options,
            save: !self.no_save,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("routehelper_server=info".parse()?)
                .add_directive("routehelper_core=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(path) = cli.data_path {
        config.data_path = path;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    tracing::debug!(
        data_path = %config.data_path.display(),
        db_path = %config.db_path,
        "Route helper starting"
    );

    let db = init_database(&config.db_path, config.db_max_connections).await?;
    let pool = db.pool();
    let sources = NavDataSources::new(&config.data_path);

    match cli.command {
        Command::Index { force } => {
            let report = Indexer::new(pool.clone(), sources).reindex(force).await?;
            if cli.json {
                print_json(&report)?;
            } else if report.skipped {
                println!(
                    "Skipped: {}",
                    report.reason.as_deref().unwrap_or("nothing to do")
                );
            } else {
                println!(
                    "Indexed cycle={} airports={} fixes={} airways={} sids={} stars={}",
                    report.cycle,
                    report.airports,
                    report.fixes,
                    report.airways,
                    report.sids,
                    report.stars
                );
            }
        }
        Command::Plan(args) => {
            let response = plan_route(pool, args.into_request(&config)).await?;
            if cli.json {
                print_json(&response)?;
            } else {
                print_plan(&response);
            }
        }
        Command::Status => {
            let report = status(pool, &sources, Utc::now().date_naive()).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                let cycle = report.cycle.cycle.as_deref().unwrap_or("none");
                println!(
                    "AIRAC {} ({:?}, expected {}, current: {})",
                    cycle, report.cycle.source, report.expected_cycle, report.cycle.is_current
                );
                let counts = report.counts;
                println!(
                    "airports={} fixes={} airways={} sids={} stars={} flight_plans={}",
                    counts.airports,
                    counts.fixes,
                    counts.airways,
                    counts.sids,
                    counts.stars,
                    counts.flight_plans
                );
            }
        }
        Command::Airports { prefix, limit } => {
            let codes = suggest_airports(pool, &prefix, limit).await?;
            if cli.json {
                print_json(&codes)?;
            } else {
                for code in codes {
                    println!("{code}");
                }
            }
        }
        Command::History { limit } => {
            let plans = recent_flight_plans(pool, limit).await?;
            if cli.json {
                print_json(&plans)?;
            } else {
                for plan in plans {
                    println!(
                        "#{} {} {}-{} {}",
                        plan.id.unwrap_or_default(),
                        plan.created_at.format("%Y-%m-%d %H:%M"),
                        plan.origin,
                        plan.dest,
                        plan.route_text
                    );
                }
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_plan(response: &RoutePlanResponse) {
    println!("{} -> {}", response.origin, response.dest);
    println!("Route: {}", response.route.text);
    if let Some(distance) = response.route.distance_nm {
        println!(
            "Distance: {:.0} nm ({} DCT legs)",
            distance, response.route.dct_hops
        );
    }
    for error in &response.errors {
        println!("Error: {error}");
    }
    println!();
    println!("SID:\n{}", response.sid_text);
    println!();
    println!("STAR:\n{}", response.star_text);
    println!();
    if !response.eligible_levels.is_empty() {
        println!("Levels ({:?}): {}", response.direction, response.eligible_levels.join(" "));
    }
    if let Some(id) = response.flight_plan_id {
        println!("Saved as flight plan #{id}");
    }
    println!();
    println!("{}", response.fpl);
}
