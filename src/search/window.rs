//! Shrinking the trailing time window until every column is stationary

use crate::analysis::{test_stationarity, StationarityReport, TesterOptions};
use crate::data::TimeSeriesTable;
use crate::error::DataError;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Inclusive upper time bound within the search date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowBound {
    pub hour: u32,
    pub minute: u32,
}

impl WindowBound {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    fn minutes(&self) -> u32 {
        self.hour * 60 + self.minute
    }

    /// Move the bound `step` minutes earlier, wrapping into the previous
    /// hour. `None` once the bound would fall before midnight.
    pub fn step_back(&self, step: u32) -> Option<Self> {
        let total = self.minutes().checked_sub(step)?;
        Some(Self {
            hour: total / 60,
            minute: total % 60,
        })
    }

    /// Whether a clock time falls at or before this bound
    pub fn admits(&self, time: NaiveTime) -> bool {
        (time.hour(), time.minute(), time.second(), time.nanosecond()) <= (self.hour, self.minute, 0, 0)
    }
}

impl fmt::Display for WindowBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:00", self.hour, self.minute)
    }
}

/// Parameters of the window search.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSearchConfig {
    /// Value matched against the `date` column
    pub date: NaiveDate,
    /// First upper bound
    pub start: WindowBound,
    pub step_minutes: u32,
    /// The search gives up once the bound drops below this
    pub floor: WindowBound,
    /// Optional hard cap on narrowing iterations
    pub max_iterations: Option<usize>,
}

impl Default for WindowSearchConfig {
    fn default() -> Self {
        Self {
            date: NaiveDate::from_ymd_opt(2017, 3, 13).unwrap_or_default(),
            start: WindowBound { hour: 15, minute: 55 },
            step_minutes: 5,
            floor: WindowBound { hour: 0, minute: 0 },
            max_iterations: None,
        }
    }
}

/// Result of [`find_stable_window`].
#[derive(Debug, Clone)]
pub struct WindowSearchOutcome {
    /// Bound after the last step; `None` if it stepped past midnight
    pub bound: Option<WindowBound>,
    /// Bound of the window whose report is returned; `None` when the full
    /// table already passed
    pub tested_bound: Option<WindowBound>,
    pub iterations: usize,
    pub converged: bool,
    pub report: StationarityReport,
}

/// Rows whose `date` equals `date` and whose `time` is at or before `bound`.
///
/// Times are compared as clock values, so `9:05:00` and `09:05:00` are
/// equivalent; rows with an unparsable time never match.
pub fn filter_window(
    table: &TimeSeriesTable,
    date: NaiveDate,
    bound: WindowBound,
) -> Result<TimeSeriesTable, DataError> {
    let dates = table.text_column("date")?;
    let times = table.text_column("time")?;
    let date = date.format("%Y-%m-%d").to_string();

    let mask: Vec<bool> = dates
        .iter()
        .zip(times)
        .map(|(d, t)| {
            d.as_deref() == Some(date.as_str())
                && t.as_deref().and_then(parse_time).is_some_and(|t| bound.admits(t))
        })
        .collect();

    table.filter_rows(&mask)
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Narrow the window ending at `config.start` until every numeric column is
/// stationary.
///
/// The full table is tested first. Each iteration filters the rows up to the
/// current bound, moves the bound `step_minutes` earlier and tests the
/// filtered rows. The search stops without converging once the bound falls
/// below `config.floor` or `max_iterations` is reached, so it runs at most
/// `(start - floor) / step + 1` iterations.
pub fn find_stable_window(
    table: &TimeSeriesTable,
    options: &TesterOptions,
    config: &WindowSearchConfig,
) -> Result<WindowSearchOutcome, DataError> {
    find_stable_window_with(table, options, config, |_, _| {})
}

/// Same as [`find_stable_window`], calling `on_window` with the bound and
/// report of every window tested.
pub fn find_stable_window_with<F>(
    table: &TimeSeriesTable,
    options: &TesterOptions,
    config: &WindowSearchConfig,
    mut on_window: F,
) -> Result<WindowSearchOutcome, DataError>
where
    F: FnMut(WindowBound, &StationarityReport),
{
    let mut report = test_stationarity(table, options);
    let mut bound = Some(config.start);
    let mut tested_bound = None;
    let mut iterations = 0;
    // A zero step would never move the bound
    let step = config.step_minutes.max(1);

    while !report.all_stationary() {
        let current = match bound {
            Some(b) if b >= config.floor => b,
            _ => break,
        };
        if config.max_iterations.is_some_and(|max| iterations >= max) {
            break;
        }

        let window = filter_window(table, config.date, current)?;
        bound = current.step_back(step);
        iterations += 1;

        debug!(bound = %current, rows = window.len(), iterations, "Testing window");
        report = test_stationarity(&window, options);
        on_window(current, &report);
        tested_bound = Some(current);
    }

    let converged = report.all_stationary();
    let outcome = WindowSearchOutcome {
        bound,
        tested_bound,
        iterations,
        converged,
        report,
    };

    match (converged, outcome.tested_bound) {
        (true, Some(b)) => info!(bound = %b, iterations, "Found stationary window"),
        (true, None) => info!("Full table is stationary"),
        (false, _) => warn!(iterations, "No stationary window before the floor"),
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Decision;
    use crate::data::Column;
    use chrono::NaiveDateTime;

    #[test]
    fn test_step_back_wraps_hour() {
        let b = WindowBound::new(15, 0).unwrap();
        assert_eq!(b.step_back(5), WindowBound::new(14, 55));
        assert_eq!(WindowBound::new(15, 55).unwrap().step_back(5), WindowBound::new(15, 50));
        assert_eq!(WindowBound::new(0, 5).unwrap().step_back(5), WindowBound::new(0, 0));
        assert_eq!(WindowBound::new(0, 0).unwrap().step_back(5), None);
    }

    #[test]
    fn test_admits() {
        let bound = WindowBound::new(15, 0).unwrap();
        assert!(bound.admits(NaiveTime::from_hms_opt(15, 0, 0).unwrap()));
        assert!(bound.admits(NaiveTime::from_hms_opt(14, 59, 59).unwrap()));
        assert!(!bound.admits(NaiveTime::from_hms_opt(15, 0, 2).unwrap()));
        assert!(!bound.admits(NaiveTime::from_hms_milli_opt(15, 0, 0, 500).unwrap()));
    }

    #[test]
    fn test_bound_new_and_display() {
        assert!(WindowBound::new(24, 0).is_none());
        assert!(WindowBound::new(10, 60).is_none());
        assert_eq!(WindowBound::new(9, 5).unwrap().to_string(), "09:05:00");
        assert!(WindowBound::new(14, 55) < WindowBound::new(15, 0));
    }

    fn minute_table(rows: &[(&str, &str, f64)]) -> TimeSeriesTable {
        let index = rows
            .iter()
            .map(|(d, t, _)| {
                NaiveDateTime::parse_from_str(&format!("{d} {t}"), "%Y-%m-%d %H:%M:%S").unwrap()
            })
            .collect();
        TimeSeriesTable::new(
            index,
            vec![
                Column::text("date", rows.iter().map(|(d, _, _)| Some(d.to_string())).collect()),
                Column::text("time", rows.iter().map(|(_, t, _)| Some(t.to_string())).collect()),
                Column::numeric("x", rows.iter().map(|(_, _, v)| Some(*v)).collect()),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_filter_window() {
        let table = minute_table(&[
            ("2017-03-12", "15:00:00", 1.0),
            ("2017-03-13", "09:05:00", 2.0),
            ("2017-03-13", "15:55:00", 3.0),
            ("2017-03-13", "16:00:00", 4.0),
        ]);
        let date = NaiveDate::from_ymd_opt(2017, 3, 13).unwrap();

        let window = filter_window(&table, date, WindowBound::new(15, 55).unwrap()).unwrap();
        assert_eq!(window.column("x").unwrap().observations(), vec![2.0, 3.0]);

        let window = filter_window(&table, date, WindowBound::new(9, 0).unwrap()).unwrap();
        assert!(window.is_empty());
    }

    #[test]
    fn test_filter_window_requires_columns() {
        let table = TimeSeriesTable::default();
        let date = NaiveDate::from_ymd_opt(2017, 3, 13).unwrap();
        let result = filter_window(&table, date, WindowBound::new(10, 0).unwrap());
        assert!(matches!(result, Err(DataError::MissingColumn(name)) if name == "date"));
    }

    #[test]
    fn test_parse_time_variants() {
        assert_eq!(parse_time("9:05:00"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("09:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("09:05:00.5"), NaiveTime::from_hms_milli_opt(9, 5, 0, 500));
        assert_eq!(parse_time("-1:55:00"), None);
    }

    #[test]
    fn test_search_terminates_on_empty_windows() {
        // Too few rows for the full table, and no row matches the date
        let rows: Vec<(&str, &str, f64)> = (0..5).map(|i| ("2017-03-14", "10:00:00", i as f64)).collect();
        let table = minute_table(&rows);
        let config = WindowSearchConfig {
            start: WindowBound::new(1, 0).unwrap(),
            ..WindowSearchConfig::default()
        };

        let outcome = find_stable_window(&table, &TesterOptions::default(), &config).unwrap();
        assert!(!outcome.converged);
        // 01:00 down to 00:00 in 5 minute steps
        assert_eq!(outcome.iterations, 13);
        assert_eq!(outcome.bound, None);
        assert_eq!(outcome.tested_bound, WindowBound::new(0, 0));
        assert_eq!(outcome.report.rows[0].decision, Decision::InsufficientData);
    }

    #[test]
    fn test_search_respects_iteration_cap() {
        let rows: Vec<(&str, &str, f64)> = (0..5).map(|i| ("2017-03-14", "10:00:00", i as f64)).collect();
        let config = WindowSearchConfig {
            max_iterations: Some(3),
            ..WindowSearchConfig::default()
        };
        let outcome = find_stable_window(&minute_table(&rows), &TesterOptions::default(), &config).unwrap();
        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.bound, WindowBound::new(15, 40));
        assert!(!outcome.converged);
    }

    #[test]
    fn test_search_respects_floor() {
        let rows: Vec<(&str, &str, f64)> = (0..5).map(|i| ("2017-03-14", "10:00:00", i as f64)).collect();
        let config = WindowSearchConfig {
            floor: WindowBound::new(15, 30).unwrap(),
            ..WindowSearchConfig::default()
        };
        let outcome = find_stable_window(&minute_table(&rows), &TesterOptions::default(), &config).unwrap();
        // 15:55, 15:50, ..., 15:30
        assert_eq!(outcome.iterations, 6);
        assert_eq!(outcome.tested_bound, WindowBound::new(15, 30));
    }

    #[test]
    fn test_search_reports_every_window() {
        let rows: Vec<(&str, &str, f64)> = (0..5).map(|i| ("2017-03-14", "10:00:00", i as f64)).collect();
        let config = WindowSearchConfig {
            floor: WindowBound::new(15, 40).unwrap(),
            ..WindowSearchConfig::default()
        };
        let mut seen = Vec::new();
        let outcome = find_stable_window_with(
            &minute_table(&rows),
            &TesterOptions::default(),
            &config,
            |bound, report| seen.push((bound, report.len())),
        )
        .unwrap();

        assert_eq!(outcome.iterations, seen.len());
        assert_eq!(
            seen.iter().map(|(b, _)| b.to_string()).collect::<Vec<_>>(),
            vec!["15:55:00", "15:50:00", "15:45:00", "15:40:00"]
        );
        assert!(seen.iter().all(|(_, rows)| *rows == 1));
    }
}
