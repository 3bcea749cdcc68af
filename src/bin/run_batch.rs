//! Evaluate every profile in a profiles CSV
//!
//! Outputs one summary row per profile (recommended chunk, payoff months,
//! net savings or the error that stopped it)

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use velocity_banking::profile::{load_profiles, DEFAULT_PROFILES_PATH};
use velocity_banking::runner::{ProfileOutcome, StrategyRequest};
use velocity_banking::{OptimizerConfig, StrategyRunner};

/// Run every profile's request in parallel and write a summary CSV
#[derive(Parser)]
#[command(name = "run_batch", version)]
struct Cli {
    /// Profiles CSV
    #[arg(long, default_value = DEFAULT_PROFILES_PATH)]
    profiles: PathBuf,

    /// Optimizer overrides (key,value CSV)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Summary output path
    #[arg(long, default_value = "batch_summary.csv")]
    output: PathBuf,
}

/// One output row
#[derive(Debug, Serialize)]
struct SummaryRow {
    #[serde(rename = "ProfileID")]
    profile_id: u32,
    #[serde(rename = "Request")]
    request: String,
    #[serde(rename = "ChunkAmount")]
    chunk_amount: Option<f64>,
    #[serde(rename = "Months")]
    months: Option<u32>,
    #[serde(rename = "NetSavings")]
    net_savings: Option<f64>,
    #[serde(rename = "Error")]
    error: String,
}

impl SummaryRow {
    fn from_outcome(outcome: &ProfileOutcome) -> Self {
        let request = match &outcome.request {
            StrategyRequest::Simulate { chunk_amount } => format!("simulate {chunk_amount:.0}"),
            StrategyRequest::Target { target_years } => format!("target {target_years}y"),
            StrategyRequest::Scenarios => "scenarios".to_string(),
            StrategyRequest::Objective { objective } => format!("objective {objective}"),
            StrategyRequest::AllObjectives => "all objectives".to_string(),
        };
        match &outcome.outcome {
            Ok(result) => Self {
                profile_id: outcome.profile_id,
                request,
                chunk_amount: result.chunk_amount(),
                months: result.months(),
                net_savings: result.net_savings().map(|s| (s * 100.0).round() / 100.0),
                error: String::new(),
            },
            Err(e) => Self {
                profile_id: outcome.profile_id,
                request,
                chunk_amount: None,
                months: None,
                net_savings: None,
                error: e.to_string(),
            },
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let start = Instant::now();
    println!("Loading profiles from {}...", cli.profiles.display());
    let profiles = load_profiles(&cli.profiles)
        .with_context(|| format!("Failed to load {}", cli.profiles.display()))?;
    println!("Loaded {} profiles in {:?}", profiles.len(), start.elapsed());

    let config = match &cli.config {
        Some(path) => OptimizerConfig::from_csv_path(path)
            .with_context(|| format!("Failed to load optimizer config {}", path.display()))?,
        None => OptimizerConfig::default(),
    };
    let runner = StrategyRunner::with_config(config);

    println!("Running strategies...");
    let run_start = Instant::now();
    let outcomes = runner.run_batch(&profiles);
    println!("Strategies complete in {:?}", run_start.elapsed());

    let mut writer = csv::Writer::from_path(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    let mut failed = 0;
    for outcome in &outcomes {
        let row = SummaryRow::from_outcome(outcome);
        if !row.error.is_empty() {
            failed += 1;
        }
        writer.serialize(&row)?;
    }
    writer.flush()?;
    println!("Output written to {}", cli.output.display());

    println!("\nBatch Summary:");
    println!("  Profiles:  {}", outcomes.len());
    println!("  Failed:    {}", failed);
    let total_savings: f64 = outcomes
        .iter()
        .filter_map(|o| o.outcome.as_ref().ok())
        .filter_map(|o| o.net_savings())
        .sum();
    println!("  Savings:   ${:.0} across all profiles", total_savings);

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
