// In app/src/main.rs

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Result;
use app_config::{Settings, StrategySettings};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use strategies::{GridStrategy, MacdStrategy, Strategy};
use tracing::Level;
use tracing_subscriber::prelude::*;

mod analyzer;
mod data;
mod sweep;

use crate::analyzer::RankedOutcome;

// --- Command-Line Interface Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "A deterministic strategy backtesting engine.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Runs a historical backtest of the configured strategy.
    Backtest {
        /// Path to a `timestamp,price` CSV file with the historical bars.
        #[arg(short, long)]
        data: PathBuf,

        /// The start date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        start_date: String,

        /// The end date for the backtest in YYYY-MM-DD format.
        #[arg(long)]
        end_date: String,

        /// Initial account capital for the run.
        #[arg(long, default_value = "10000")]
        capital: Decimal,
    },

    /// Runs a full parameter sweep job.
    Sweep,
}

// --- Main Application Entry Point ---

fn main() -> Result<()> {
    // Load environment variables from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = app_config::load_settings()?;

    let level: Level = settings.app.log_level.parse().unwrap_or(Level::INFO);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_filter(tracing_subscriber::filter::Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::info!(environment = %settings.app.environment, "Starting Vega application");

    match cli.command {
        Commands::Backtest {
            data,
            start_date,
            end_date,
            capital,
        } => {
            handle_backtest(&settings, &data, &start_date, &end_date, capital)?;
        }
        Commands::Sweep => {
            handle_sweep(&settings)?;
        }
    }

    tracing::info!("Vega application has finished successfully.");

    Ok(())
}

/// Builds the first strategy that has a settings block in the configuration.
fn build_strategy(strategies: &StrategySettings) -> Result<(&'static str, Box<dyn Strategy + Send>)> {
    if let Some(settings) = strategies.grid.as_ref() {
        Ok(("grid", Box::new(GridStrategy::new(settings.clone())?)))
    } else if let Some(settings) = strategies.macd.as_ref() {
        Ok(("macd", Box::new(MacdStrategy::new(settings.clone())?)))
    } else {
        anyhow::bail!("No strategy is configured in the config file.")
    }
}

/// Handles the logic for the `backtest` subcommand.
fn handle_backtest(
    settings: &Settings,
    data_path: &Path,
    start_date: &str,
    end_date: &str,
    capital: Decimal,
) -> Result<()> {
    // --- 1. Parse Dates & Instantiate the Strategy ---
    let start_dt = data::parse_date(start_date, true)?;
    let end_dt = data::parse_date(end_date, false)?;
    let (strategy_name, strategy) = build_strategy(&settings.strategies)?;

    // --- 2. Load Data ---
    tracing::info!(strategy = strategy_name, "Loading historical data for backtest...");
    let bars = data::load_bars(data_path)?;
    tracing::info!("Loaded {} bars from {}.", bars.len(), data_path.display());

    // --- 3. Run the Backtester ---
    let result = backtester::run_backtest(
        &bars,
        capital,
        start_dt,
        end_dt,
        strategy,
        settings.risk.clone(),
        settings.sizer.clone(),
    )?;

    backtester::print_report(&result.report);

    Ok(())
}

/// Handles the logic for the `sweep` subcommand.
fn handle_sweep(settings: &Settings) -> Result<()> {
    let start_time = Instant::now();
    tracing::info!("Starting sweep job...");

    let sweep_config = sweep::load_sweep_config()?;
    let param_sets = sweep::generate_parameter_sets(&sweep_config)?;
    if param_sets.is_empty() {
        anyhow::bail!("No valid parameter sets were generated.");
    }
    tracing::info!(
        job = %sweep_config.job.name,
        sets = param_sets.len(),
        "Generated parameter sets."
    );

    let outcomes = sweep::run_sweep(settings, &sweep_config, param_sets)?;
    let ranked = analyzer::analyze_and_rank_results(outcomes);

    print_sweep_report(&ranked);

    tracing::info!(duration = ?start_time.elapsed(), "Sweep job and analysis finished.");
    Ok(())
}

/// Helper function to print the final sweep summary.
fn print_sweep_report(results: &[RankedOutcome]) {
    println!("\n--- Sweep Job Complete ---");
    println!("---------------------------------");
    println!("Top 5 Parameter Sets by Score:");
    println!("---------------------------------");

    for (i, ranked) in results.iter().take(5).enumerate() {
        println!("\n[Rank {} | Score: {:.2}]", i + 1, ranked.score);
        println!(
            "  - Parameters: {}",
            serde_json::to_string_pretty(&ranked.outcome.parameters).unwrap_or_default()
        );

        let report = &ranked.outcome.report;
        println!(
            "  - P&L: ${:.2} ({:.2}%) | Max Drawdown: {:.2}% | Sharpe: {:.2} | Trades: {}",
            report.net_pnl,
            report.total_return_percentage,
            report.max_drawdown * 100.0,
            report.sharpe_ratio,
            report.total_trades
        );
    }
    println!("\n---------------------------------");

    if let Some(best) = results.first() {
        println!("Recommendation: The parameter set with the highest score is:");
        println!(
            "  {}",
            serde_json::to_string_pretty(&best.outcome.parameters).unwrap_or_default()
        );
    } else {
        println!("Recommendation: No parameter sets passed the minimum threshold.");
    }
}
