//! # Time series diagnostics
//!
//! Unit-root and stationarity tests and the per-column report built on them.

mod report;
mod statistics;
mod stationarity;

pub use report::*;
pub use statistics::*;
pub use stationarity::*;
