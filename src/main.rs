//! drt-scheduler - dial-a-ride insertion scheduler
//!
//! Loads a scenario, schedules its customers on the fleet and prints the
//! run report as JSON.

mod cli;
mod config;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drt_scheduler::defaults;
use drt_scheduler::services::loader::build_database;
use drt_scheduler::services::request_generator::{generate_customers, GeneratorSettings};
use drt_scheduler::services::{build_scheduler, Database, Scheduler, SchedulerSettings};
use drt_scheduler::types::{RunReport, RunStatus, Scenario};

use cli::{Cli, Command, GenerateArgs, NeighborsArgs, RunArgs};

/// How often progress is logged while a run is in flight
const PROGRESS_INTERVAL_MS: u64 = 500;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = config::Config::from_env()?;

    std::fs::create_dir_all(&config.logs_dir).ok();

    // File appender for persistent logs (daily rotation)
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &config.logs_dir, "drt-scheduler.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // stdout carries the JSON output, so console logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| defaults::DEFAULT_LOG_FILTER.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with((!config.log_json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking.clone())
                .with_ansi(false)
        }))
        .with(config.log_json.then(|| tracing_subscriber::fmt::layer().json().with_writer(non_blocking)))
        .init();

    info!("Configuration loaded: {:?}", config.settings.policy);

    match cli.command {
        Command::Run(args) => run(args, config.settings).await,
        Command::Generate(args) => generate(args),
        Command::Neighbors(args) => neighbors(args, config.settings),
    }
}

async fn run(args: RunArgs, mut settings: SchedulerSettings) -> Result<()> {
    if let Some(order) = args.order {
        settings.policy.order = order;
    }
    if let Some(selection) = args.selection {
        settings.policy.selection = selection;
    }
    settings.clamp_pickup_window |= args.clamp_pickup_window;

    let scenario = load_scenario(&args.scenario)?;
    let scheduler = build_scheduler(&scenario, &settings)
        .with_context(|| format!("Failed to load scenario {}", args.scenario.display()))?;
    info!(
        "Starting run {} ({} / {})",
        scheduler.run_id(),
        settings.policy.order,
        settings.policy.selection
    );

    let report = run_scheduler(scheduler).await?;
    info!(
        "Run {} finished in {} ms: {}/{} served, cost {:.1}",
        report.run_id, report.duration_ms, report.served_requests, report.total_requests, report.total_cost
    );
    if !report.unserved.is_empty() {
        warn!("Unserved customers: {:?}", report.unserved);
    }

    write_json(&report, args.output.as_deref(), args.pretty)
}

/// Runs the scheduler on the blocking pool and logs its progress until it
/// finishes.
async fn run_scheduler(mut scheduler: Scheduler) -> Result<RunReport> {
    let status = scheduler.status_handle();
    let mut task = tokio::task::spawn_blocking(move || scheduler.run_to_completion());
    let mut ticker = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));

    loop {
        tokio::select! {
            joined = &mut task => {
                let report = joined.context("Scheduler task panicked")??;
                return Ok(report);
            }
            _ = ticker.tick() => {
                let progress = status.snapshot();
                if progress.status == RunStatus::Running {
                    info!(
                        "Progress: {}/{} ({:.0}%), phase {:?}, served {}, unserved {}",
                        progress.processed,
                        progress.total,
                        progress.percent(),
                        progress.phase,
                        progress.served,
                        progress.unserved
                    );
                }
            }
        }
    }
}

fn generate(args: GenerateArgs) -> Result<()> {
    let mut scenario = load_scenario(&args.scenario)?;
    let db = build_database(&scenario, &Default::default())?;
    let settings = GeneratorSettings {
        count: args.count,
        duration_minutes: args.duration,
        seed: args.seed,
        ..Default::default()
    };
    let customers = generate_customers(db.as_ref(), &settings)?;

    if !args.append {
        return write_json(&customers, None, true);
    }

    scenario.customers.extend(customers);
    // Write next to the target and rename so a failed write keeps the old file
    let tmp = args.scenario.with_extension("json.tmp");
    write_json(&scenario, Some(&tmp), true)?;
    std::fs::rename(&tmp, &args.scenario)
        .with_context(|| format!("Failed to replace {}", args.scenario.display()))?;
    info!("Appended {} customers to {}", settings.count, args.scenario.display());
    Ok(())
}

#[derive(Serialize)]
struct Neighbor<'a> {
    stop_id: &'a str,
    distance_km: f64,
}

fn neighbors(args: NeighborsArgs, settings: SchedulerSettings) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    let db = build_database(&scenario, &settings)?;
    let stop = db.stop_id(&args.stop)?;

    let found = db.neighbors(stop, args.max_km)?;
    let mut list = Vec::with_capacity(found.len());
    for (id, km) in found {
        list.push(Neighbor {
            stop_id: db
                .stop_code(id)
                .with_context(|| format!("Stop {id} has no catalogue id"))?,
            distance_km: km,
        });
    }
    write_json(&list, None, true)
}

fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse scenario {}", path.display()))
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match path {
        Some(path) => std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}
