//! Example: search for the trailing intraday window in which every column is
//! stationary
//!
//! Loads the two session tables, prints the raw-data report of the
//! secondary one, then narrows the window on the primary one.
//!
//! Usage:
//! ```
//! cargo run --bin find_stable_window -- --config stationarity.toml
//! ```

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tick_stationarity::{
    find_stable_window_with, load_tables, logging, test_stationarity, Config, TesterOptions,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Find the trailing window where all columns are stationary")]
struct Args {
    /// TOML config (defaults to ./stationarity.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Table searched for a stationary window
    #[arg(long)]
    primary: Option<PathBuf>,

    /// Table reported as raw data
    #[arg(long)]
    secondary: Option<PathBuf>,

    /// Session date (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Starting upper bound hour
    #[arg(long)]
    start_hour: Option<u32>,

    /// Starting upper bound minute
    #[arg(long)]
    start_minute: Option<u32>,

    /// Maximum number of narrowing steps
    #[arg(short, long)]
    max_iterations: Option<usize>,

    /// Print the report of every window tested
    #[arg(long)]
    verbose_windows: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default()?,
    };
    if let Some(path) = args.primary {
        config.data.primary = path;
    }
    if let Some(path) = args.secondary {
        config.data.secondary = path;
    }
    if let Some(date) = args.date {
        config.window.date = date;
    }
    if let Some(hour) = args.start_hour {
        config.window.start_hour = hour;
    }
    if let Some(minute) = args.start_minute {
        config.window.start_minute = minute;
    }
    if args.max_iterations.is_some() {
        config.window.max_iterations = args.max_iterations;
    }
    config.validate()?;

    let (primary, secondary) = load_tables(&config.data.primary, &config.data.secondary)
        .context("Failed to load session tables")?;

    let options: TesterOptions = config.tester_options();

    // Raw data gets the two-label decision
    let raw_options = TesterOptions {
        signif: options.signif,
        kpss_regression: options.kpss_regression,
        ..TesterOptions::binary()
    }
    .with_title("Raw data");
    let raw = test_stationarity(&secondary, &raw_options);
    println!("\n{}", raw.heading().bold().blue());
    println!("{}", raw.to_table());

    let search = config.window_search()?;
    let verbose = args.verbose_windows;
    let outcome = find_stable_window_with(
        &primary,
        &options.with_title("Stable window"),
        &search,
        |bound, report| {
            if verbose {
                println!("\n{} {}", "Window up to".bold(), bound);
                println!("{}", report.to_table());
            }
        },
    )?;

    println!("\n{}", outcome.report.heading().bold().blue());
    println!("{}", outcome.report.to_table());

    match outcome.bound {
        Some(bound) => println!("\n{} {}", bound.minute, bound.hour),
        None => println!("\n{}", "Bound stepped past midnight".yellow()),
    }
    match (outcome.converged, outcome.tested_bound) {
        (true, Some(bound)) => println!(
            "{} window up to {} on {} after {} steps",
            "Stationary:".green().bold(),
            bound,
            search.date,
            outcome.iterations
        ),
        (true, None) => println!("{}", "Full table is already stationary".green().bold()),
        (false, _) => println!(
            "{} no stationary window down to {} ({} steps)",
            "Not found:".red().bold(),
            search.floor,
            outcome.iterations
        ),
    }
    Ok(())
}
