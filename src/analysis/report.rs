//! Joint ADF/KPSS report over the numeric columns of a table

use crate::analysis::statistics::round_to;
use crate::analysis::stationarity::{adf_test, kpss_test};
use crate::data::TimeSeriesTable;
use crate::error::StatError;
use crate::types::{KpssRegression, TestResult};
use std::fmt;
use std::str::FromStr;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::debug;

/// Columns holding raw date/time strings are never tested.
const DATETIME_COLUMNS: [&str; 2] = ["date", "time"];

/// Classification of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Stationary,
    NonStationary,
    TrendStationary,
    Inconclusive,
    InsufficientData,
    Error(String),
}

impl Decision {
    /// Joint decision from the two p-values.
    ///
    /// ADF rejects a unit root when `adf_p < signif`; KPSS keeps stationarity
    /// when `kpss_p > signif`.
    pub fn from_p_values(adf_p: f64, kpss_p: f64, signif: f64, policy: DecisionPolicy) -> Self {
        let adf_stationary = adf_p < signif;
        let kpss_stationary = kpss_p > signif;

        match (policy, adf_stationary, kpss_stationary) {
            (_, true, true) => Decision::Stationary,
            (DecisionPolicy::Binary, _, _) => Decision::NonStationary,
            (DecisionPolicy::Detailed, false, false) => Decision::NonStationary,
            (DecisionPolicy::Detailed, true, false) => Decision::TrendStationary,
            (DecisionPolicy::Detailed, false, true) => Decision::Inconclusive,
        }
    }

    pub fn is_stationary(&self) -> bool {
        matches!(self, Decision::Stationary)
    }

    pub fn label(&self) -> String {
        match self {
            Decision::Stationary => "Stationary".to_string(),
            Decision::NonStationary => "Non-stationary".to_string(),
            Decision::TrendStationary => "Trend-stationary".to_string(),
            Decision::Inconclusive => "Inconclusive".to_string(),
            Decision::InsufficientData => "Insufficient data".to_string(),
            Decision::Error(message) => format!("Error: {message}"),
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Decision {
    type Err = String;

    /// Accepts the current labels and the legacy spellings
    /// `Stationnary` / `Unstationnary`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(message) = s.strip_prefix("Error") {
            let message = message.trim_start().trim_start_matches(':').trim();
            return Ok(Decision::Error(message.to_string()));
        }
        match s {
            "Stationary" | "Stationnary" => Ok(Decision::Stationary),
            "Non-stationary" | "Unstationnary" => Ok(Decision::NonStationary),
            "Trend-stationary" => Ok(Decision::TrendStationary),
            "Inconclusive" => Ok(Decision::Inconclusive),
            "Insufficient data" => Ok(Decision::InsufficientData),
            other => Err(format!("unknown decision label: {other}")),
        }
    }
}

/// How the two p-values are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecisionPolicy {
    /// Four-way table: stationary, non-stationary, trend-stationary,
    /// inconclusive
    #[default]
    Detailed,
    /// Stationary when both tests agree, non-stationary otherwise
    Binary,
}

/// Parameters of [`test_stationarity`].
#[derive(Debug, Clone)]
pub struct TesterOptions {
    pub signif: f64,
    pub kpss_regression: KpssRegression,
    /// Columns with fewer observations are reported as insufficient data
    /// without running the tests; `None` disables the guard.
    pub min_observations: Option<usize>,
    /// Skip columns named `date` / `time` (any case)
    pub skip_datetime_columns: bool,
    pub policy: DecisionPolicy,
    pub title: Option<String>,
}

impl Default for TesterOptions {
    fn default() -> Self {
        Self {
            signif: 0.05,
            kpss_regression: KpssRegression::Constant,
            min_observations: Some(10),
            skip_datetime_columns: true,
            policy: DecisionPolicy::Detailed,
            title: None,
        }
    }
}

impl TesterOptions {
    /// Two-label variant without the short-series guard.
    pub fn binary() -> Self {
        Self {
            min_observations: None,
            skip_datetime_columns: false,
            policy: DecisionPolicy::Binary,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Test results for one column.
#[derive(Debug, Clone)]
pub struct ColumnReport {
    pub variable: String,
    pub adf: Option<TestResult>,
    pub kpss: Option<TestResult>,
    pub decision: Decision,
}

impl ColumnReport {
    pub fn adf_stat(&self) -> Option<f64> {
        self.adf.as_ref().map(|r| r.statistic)
    }

    pub fn adf_p_value(&self) -> Option<f64> {
        self.adf.as_ref().map(|r| r.p_value)
    }

    pub fn kpss_stat(&self) -> Option<f64> {
        self.kpss.as_ref().map(|r| r.statistic)
    }

    pub fn kpss_p_value(&self) -> Option<f64> {
        self.kpss.as_ref().map(|r| r.p_value)
    }
}

/// One row per tested column.
#[derive(Debug, Clone)]
pub struct StationarityReport {
    pub title: String,
    pub signif: f64,
    pub rows: Vec<ColumnReport>,
}

impl StationarityReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, variable: &str) -> Option<&ColumnReport> {
        self.rows.iter().find(|r| r.variable == variable)
    }

    /// True when the report has rows and every one is stationary.
    pub fn all_stationary(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.decision.is_stationary())
    }

    /// Significance as a whole percentage, truncated: 5 for 0.05, 7 for 0.075
    pub fn signif_percent(&self) -> u32 {
        (self.signif * 100.0).trunc() as u32
    }

    /// Header of the decision column, e.g. `Decision (5 %)`
    pub fn decision_header(&self) -> String {
        format!("Decision ({} %)", self.signif_percent())
    }

    /// `=== Title (α = 5 %) ===`
    pub fn heading(&self) -> String {
        format!("=== {} (α = {} %) ===", self.title, self.signif_percent())
    }

    /// Table with statistics rounded to 3 decimals and p-values to 4.
    pub fn to_table(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record([
            "Variable".to_string(),
            "ADF_stat".to_string(),
            "ADF_p-value".to_string(),
            "KPSS_stat".to_string(),
            "KPSS_p-value".to_string(),
            self.decision_header(),
        ]);

        for row in &self.rows {
            builder.push_record([
                row.variable.clone(),
                display_value(row.adf_stat(), 3),
                display_value(row.adf_p_value(), 4),
                display_value(row.kpss_stat(), 3),
                display_value(row.kpss_p_value(), 4),
                row.decision.label(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern());
        table.to_string()
    }
}

impl fmt::Display for StationarityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{}", self.heading())?;
        write!(f, "{}", self.to_table())
    }
}

fn display_value(value: Option<f64>, decimals: i32) -> String {
    match value {
        Some(v) => format!("{:.*}", decimals as usize, round_to(v, decimals)),
        None => "None".to_string(),
    }
}

/// Run ADF and KPSS on every numeric column of `table`.
///
/// Missing values are dropped per column. A failure of either test turns
/// into [`Decision::Error`] for that column; the other columns are still
/// tested.
pub fn test_stationarity(table: &TimeSeriesTable, options: &TesterOptions) -> StationarityReport {
    let mut rows = Vec::new();

    for column in table.numeric_columns() {
        if options.skip_datetime_columns
            && DATETIME_COLUMNS
                .iter()
                .any(|name| column.name.eq_ignore_ascii_case(name))
        {
            continue;
        }

        let series = column.observations();
        let row = test_series(&column.name, &series, options);
        debug!(variable = %row.variable, decision = %row.decision, n = series.len(), "Tested column");
        rows.push(row);
    }

    StationarityReport {
        title: options
            .title
            .clone()
            .unwrap_or_else(|| "Stationarity Test".to_string()),
        signif: options.signif,
        rows,
    }
}

/// Test a single series that has already had its missing values removed.
pub fn test_series(variable: &str, series: &[f64], options: &TesterOptions) -> ColumnReport {
    if let Some(min) = options.min_observations {
        if series.len() < min {
            return ColumnReport {
                variable: variable.to_string(),
                adf: None,
                kpss: None,
                decision: Decision::InsufficientData,
            };
        }
    }

    let tested: Result<(TestResult, TestResult), StatError> = adf_test(series, None)
        .and_then(|adf| kpss_test(series, options.kpss_regression).map(|kpss| (adf, kpss)));

    match tested {
        Ok((adf, kpss)) => {
            let decision =
                Decision::from_p_values(adf.p_value, kpss.p_value, options.signif, options.policy);
            ColumnReport {
                variable: variable.to_string(),
                adf: Some(adf),
                kpss: Some(kpss),
                decision,
            }
        }
        Err(e) => ColumnReport {
            variable: variable.to_string(),
            adf: None,
            kpss: None,
            decision: Decision::Error(e.to_string()),
        },
    }
}
