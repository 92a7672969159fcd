//! src/bin/lltv_sim.rs
//!
//! Runs one lending-market simulation and writes the step records plus a
//! summary report as JSON.
//!
//! ```bash
//! cargo run --bin lltv_sim -- --seed 101 --n-borrow-agents 10 --sigma 0.3 --n-steps 100
//! cargo run --bin lltv_sim -- --init-cache cache/
//! cargo run --bin lltv_sim -- --snapshot cache/ledger_18000000.json --output run.json
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use lltv_sim::config::MAX_BORROW_AGENTS;
use lltv_sim::{RunReport, SimulationConfig, StepRecord, scenario};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Agent-based simulation of a lending market coupled to an AMM pool
#[derive(Parser, Debug)]
#[command(name = "lltv_sim")]
#[command(about = "Simulates borrowers, a liquidator and an AMM arbitrageur to tune the LLTV")]
struct Args {
    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Number of borrowing agents (1 to 99)
    #[arg(long)]
    n_borrow_agents: Option<usize>,

    /// Volatility of the external market
    #[arg(long)]
    sigma: Option<f64>,

    /// Number of simulation steps
    #[arg(long)]
    n_steps: Option<u64>,

    /// Liquidation loan-to-value threshold of the market
    #[arg(long)]
    lltv: Option<f64>,

    /// JSON file with a full simulation config; flags above override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start from a stored ledger snapshot instead of a fresh ledger
    #[arg(long, conflicts_with = "init_cache")]
    snapshot: Option<PathBuf>,

    /// Build the snapshot cache in this directory and exit
    #[arg(long)]
    init_cache: Option<PathBuf>,

    /// Where to write records and report (stdout when omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct RunOutput<'a> {
    config: &'a SimulationConfig,
    report: RunReport,
    records: &'a [StepRecord],
}

fn build_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(n) = args.n_borrow_agents {
        config.n_borrow_agents = n;
    }
    if let Some(sigma) = args.sigma {
        config.market_maker.volatility = sigma;
    }
    if let Some(n_steps) = args.n_steps {
        config.n_steps = n_steps;
    }
    if let Some(lltv) = args.lltv {
        config.market.lltv = lltv;
    }
    config.validate().with_context(|| {
        format!("Invalid simulation config (borrow agents must be 1..={MAX_BORROW_AGENTS})")
    })?;
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format_timestamp_secs()
        .format_target(false)
        .init();

    let args = Args::parse();
    let config = build_config(&args)?;

    if let Some(dir) = &args.init_cache {
        let path = scenario::init_cache(&config, dir).context("Failed to build snapshot cache")?;
        log::info!("Snapshot cache written to {}", path.display());
        return Ok(());
    }

    let records = match &args.snapshot {
        Some(path) => scenario::run_from_cache(&config, path)
            .with_context(|| format!("Failed to run from snapshot {}", path.display()))?,
        None => scenario::simulation(&config)
            .context("Failed to set up simulation")?
            .run(config.n_steps)
            .context("Simulation halted")?,
    };

    let report = RunReport::from_records(&records);
    log::info!(
        "{} of {} borrowers liquidated, {} underwater, mean price divergence {:.4}%",
        report.liquidated_count,
        report.borrowers.len(),
        report.underwater_count,
        100.0 * report.divergence_mean
    );

    let output = RunOutput {
        config: &config,
        report,
        records: &records,
    };
    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writer.flush()?;
            log::info!("Results written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &output)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
