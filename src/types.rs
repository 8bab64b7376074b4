//! Shared result types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Outcome of a single hypothesis test on one series.
#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub test_name: String,
    pub statistic: f64,
    pub p_value: f64,
    /// (level, value) pairs, e.g. ("5%", -2.86)
    pub critical_values: Vec<(String, f64)>,
    /// Lags used by the regression or the long-run variance estimate
    pub lags: usize,
    /// Observations entering the final statistic
    pub nobs: usize,
}

impl TestResult {
    /// Whether the null hypothesis is rejected at `signif`.
    pub fn rejects_null(&self, signif: f64) -> bool {
        self.p_value < signif
    }

    pub fn critical_value(&self, level: &str) -> Option<f64> {
        self.critical_values
            .iter()
            .find(|(name, _)| name == level)
            .map(|(_, value)| *value)
    }
}

/// Deterministic term of the KPSS regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KpssRegression {
    /// Level stationarity ("c")
    #[default]
    #[serde(rename = "c")]
    Constant,
    /// Trend stationarity ("ct")
    #[serde(rename = "ct")]
    ConstantTrend,
}

impl KpssRegression {
    pub fn code(&self) -> &'static str {
        match self {
            KpssRegression::Constant => "c",
            KpssRegression::ConstantTrend => "ct",
        }
    }
}

impl fmt::Display for KpssRegression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for KpssRegression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "c" | "constant" => Ok(KpssRegression::Constant),
            "ct" | "trend" | "constant-trend" => Ok(KpssRegression::ConstantTrend),
            other => Err(format!("unknown KPSS regression: {other} (expected 'c' or 'ct')")),
        }
    }
}
