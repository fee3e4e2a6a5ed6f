//! CLI argument parsing for the drt-scheduler binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use drt_scheduler::services::{CandidateSelection, SchedulingOrder};

#[derive(Parser)]
#[command(name = "drt-scheduler", about = "Dial-a-ride insertion scheduler", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Schedule every customer of a scenario and print the report as JSON
    Run(RunArgs),
    /// Generate synthetic customers over a scenario's stop catalogue
    Generate(GenerateArgs),
    /// List stops within a distance of a catalogued stop
    Neighbors(NeighborsArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Scenario JSON file
    pub scenario: PathBuf,

    /// Queue order (overrides DRT_SCHEDULING_ORDER): time_order or minimal_cost
    #[arg(long)]
    pub order: Option<SchedulingOrder>,

    /// Candidate selection (overrides DRT_CANDIDATE_SELECTION): best_fit or first_fit
    #[arg(long)]
    pub selection: Option<CandidateSelection>,

    /// Cap explicit pickup windows at the maximum waiting time
    #[arg(long)]
    pub clamp_pickup_window: bool,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Scenario JSON file providing the stop catalogue
    pub scenario: PathBuf,

    /// Number of customers
    #[arg(short = 'n', long, default_value_t = 20)]
    pub count: usize,

    /// Minutes over which issue times are spread
    #[arg(short, long, default_value_t = 20.0)]
    pub duration: f64,

    /// Seed for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Append the customers to the scenario file instead of printing them
    #[arg(long)]
    pub append: bool,
}

#[derive(Args)]
pub struct NeighborsArgs {
    /// Scenario JSON file
    pub scenario: PathBuf,

    /// Catalogue id of the stop
    #[arg(long)]
    pub stop: String,

    /// Maximum route distance in km
    #[arg(long, default_value_t = 1.0)]
    pub max_km: f64,
}
