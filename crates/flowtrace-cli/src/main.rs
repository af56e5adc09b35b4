//! CLI for transaction-network forensics.

mod csv_source;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flowtrace_core::DetectionConfig;
use flowtrace_engine::ForensicEngine;

use crate::csv_source::CsvTransactionSource;

#[derive(Parser)]
#[command(name = "flowtrace")]
#[command(about = "Forensic analysis of transaction networks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a transaction CSV and emit the forensic report as JSON
    Analyze {
        /// Path to the transaction CSV
        input: PathBuf,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,

        /// Override the cycle enumeration budget
        #[arg(long)]
        cycle_budget: Option<usize>,

        /// Seed for betweenness source sampling
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            output,
            pretty,
            cycle_budget,
            seed,
        } => run_analyze(input, output, pretty, cycle_budget, seed),
    }
}

fn run_analyze(
    input: PathBuf,
    output: Option<PathBuf>,
    pretty: bool,
    cycle_budget: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let file = File::open(&input)
        .with_context(|| format!("cannot open transaction file {}", input.display()))?;
    let source = CsvTransactionSource::new(BufReader::new(file))?;

    let mut config = DetectionConfig::default();
    if let Some(budget) = cycle_budget {
        config.cycle_budget = budget;
    }
    if let Some(seed) = seed {
        config.betweenness_seed = seed;
    }

    let engine = ForensicEngine::new(config);
    let report = engine
        .analyze(source)
        .with_context(|| format!("analysis of {} failed", input.display()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("cannot write report to {}", path.display()))?;
            info!(report = %path.display(), "report written");
        }
        None => println!("{json}"),
    }

    info!(
        accounts = report.summary.total_accounts_analyzed,
        flagged = report.summary.suspicious_accounts_flagged,
        rings = report.summary.fraud_rings_detected,
        seconds = report.summary.processing_time_seconds,
        "analysis finished"
    );
    Ok(())
}
