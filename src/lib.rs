//! # Stationarity diagnostics for intraday bar data
//!
//! Loads time-indexed CSV tables, runs joint ADF/KPSS tests over every
//! numeric column, and searches for the trailing intraday window in which
//! all columns are stationary.
//!
//! ## Modules
//!
//! - `data` - CSV loading, cleaning and the time-indexed table
//! - `analysis` - ADF and KPSS tests and the per-column report
//! - `search` - shrinking the time window until the report passes
//! - `config` - TOML configuration
//! - `logging` - tracing subscriber setup for the binaries
//!
//! ## Example
//!
//! ```rust,no_run
//! use tick_stationarity::{find_stable_window, load_table, TesterOptions, WindowSearchConfig};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let table = load_table(Path::new("processed_data_5min.csv"))?;
//!     let outcome = find_stable_window(&table, &TesterOptions::default(), &WindowSearchConfig::default())?;
//!     println!("{}", outcome.report);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod search;
pub mod types;

pub use analysis::{
    adf_test, kpss_test, test_stationarity, ColumnReport, Decision, DecisionPolicy,
    StationarityReport, TesterOptions,
};
pub use config::Config;
pub use data::{load_table, load_tables, read_table, Column, ColumnData, TimeSeriesTable};
pub use error::{ConfigError, DataError, StatError};
pub use search::{
    filter_window, find_stable_window, find_stable_window_with, WindowBound, WindowSearchConfig,
    WindowSearchOutcome,
};
pub use types::{KpssRegression, TestResult};
