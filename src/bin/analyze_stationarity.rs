//! Example: joint ADF/KPSS stationarity report for one CSV table
//!
//! Usage:
//! ```
//! cargo run --bin analyze_stationarity -- --file Data/unstationnary_data.csv --title "Raw data"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tick_stationarity::analysis::{mean, std_dev};
use tick_stationarity::{load_table, logging, test_stationarity, Config, Decision, KpssRegression};

#[derive(Parser, Debug)]
#[command(author, version, about = "Joint ADF/KPSS stationarity report for a CSV table")]
struct Args {
    /// Input CSV file with a `datetime` column
    #[arg(short, long)]
    file: PathBuf,

    /// TOML config (defaults to ./stationarity.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Significance level
    #[arg(short, long)]
    signif: Option<f64>,

    /// KPSS deterministic term: c or ct
    #[arg(short, long)]
    kpss: Option<KpssRegression>,

    /// Two-label decision (stationary / non-stationary)
    #[arg(long)]
    binary: bool,

    /// Test columns even when they have fewer than 10 observations
    #[arg(long)]
    no_guard: bool,

    /// Report title
    #[arg(short, long)]
    title: Option<String>,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Variable")]
    variable: String,
    #[tabled(rename = "N")]
    count: usize,
    #[tabled(rename = "Missing")]
    missing: usize,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Std")]
    std: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default()?,
    };
    if let Some(signif) = args.signif {
        config.test.signif = signif;
    }
    if let Some(kpss) = args.kpss {
        config.test.kpss_regression = kpss;
    }
    if args.binary {
        config.test.binary = true;
    }
    if args.no_guard {
        config.test.min_observations = 0;
    }
    config.validate()?;

    let table = load_table(&args.file)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    println!(
        "{} {} rows, {} numeric columns from {}",
        "Loaded:".green(),
        table.len(),
        table.numeric_columns().count(),
        args.file.display()
    );

    let summary: Vec<SummaryRow> = table
        .numeric_columns()
        .map(|col| {
            let values = col.observations();
            SummaryRow {
                variable: col.name.clone(),
                count: values.len(),
                missing: table.len() - values.len(),
                mean: format!("{:.4}", mean(&values)),
                std: format!("{:.4}", std_dev(&values)),
            }
        })
        .collect();
    println!("\n{}", "Descriptive Statistics".bold());
    println!("{}", Table::new(summary));

    let mut options = config.tester_options();
    options.title = args.title;
    let report = test_stationarity(&table, &options);

    println!("\n{}", report.heading().bold().blue());
    println!("{}", report.to_table());

    println!("\n{}", "Interpretation:".bold());
    for row in &report.rows {
        let note = match &row.decision {
            Decision::Stationary => format!("{} stationary", "✓".green()),
            Decision::NonStationary => format!("{} unit root, consider differencing", "✗".red()),
            Decision::TrendStationary => {
                format!("{} stationary around a trend, consider detrending", "→".yellow())
            }
            Decision::Inconclusive => format!("{} ADF and KPSS disagree", "?".yellow()),
            Decision::InsufficientData => format!("{} too few observations", "?".yellow()),
            Decision::Error(message) => format!("{} {}", "!".red(), message),
        };
        println!("  {:<20} {}", row.variable, note);
    }

    if report.all_stationary() {
        println!("\n{}", "All columns are stationary.".green().bold());
    } else {
        println!("\n{}", "Not all columns are stationary.".yellow().bold());
    }
    Ok(())
}
