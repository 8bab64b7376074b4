//! Configuration management
//!
//! Settings are read from a TOML file; every field has a default matching
//! the intraday session this tool was written for.

use crate::analysis::{DecisionPolicy, TesterOptions};
use crate::error::ConfigError;
use crate::search::{WindowBound, WindowSearchConfig};
use crate::types::KpssRegression;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "stationarity.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub test: TestConfig,
    pub window: WindowConfig,
}

/// Input tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Table searched for a stationary window
    pub primary: PathBuf,
    /// Table reported as raw data
    pub secondary: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary: PathBuf::from("processed_data_5min.csv"),
            secondary: PathBuf::from("Data/unstationnary_data.csv"),
        }
    }
}

/// Stationarity test settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub signif: f64,
    pub kpss_regression: KpssRegression,
    /// 0 disables the short-series guard
    pub min_observations: usize,
    pub skip_datetime_columns: bool,
    /// Two-label decisions (stationary / non-stationary)
    pub binary: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            signif: 0.05,
            kpss_regression: KpssRegression::Constant,
            min_observations: 10,
            skip_datetime_columns: true,
            binary: false,
        }
    }
}

/// Window search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub date: NaiveDate,
    pub start_hour: u32,
    pub start_minute: u32,
    pub step_minutes: u32,
    pub floor_hour: u32,
    pub floor_minute: u32,
    pub max_iterations: Option<usize>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        let search = WindowSearchConfig::default();
        Self {
            date: search.date,
            start_hour: search.start.hour,
            start_minute: search.start.minute,
            step_minutes: search.step_minutes,
            floor_hour: search.floor.hour,
            floor_minute: search.floor.minute,
            max_iterations: search.max_iterations,
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `stationarity.toml` from the working directory, falling back to
    /// defaults when it does not exist.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.test.signif > 0.0 && self.test.signif < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "test.signif must be in (0, 1), got {}",
                self.test.signif
            )));
        }
        if self.window.step_minutes == 0 {
            return Err(ConfigError::Invalid("window.step_minutes must be positive".into()));
        }
        let start = self.start_bound()?;
        let floor = self.floor_bound()?;
        if floor > start {
            return Err(ConfigError::Invalid(format!(
                "window floor {floor} is after start {start}"
            )));
        }
        Ok(())
    }

    fn start_bound(&self) -> Result<WindowBound, ConfigError> {
        WindowBound::new(self.window.start_hour, self.window.start_minute).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid window start {}:{}",
                self.window.start_hour, self.window.start_minute
            ))
        })
    }

    fn floor_bound(&self) -> Result<WindowBound, ConfigError> {
        WindowBound::new(self.window.floor_hour, self.window.floor_minute).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "invalid window floor {}:{}",
                self.window.floor_hour, self.window.floor_minute
            ))
        })
    }

    pub fn tester_options(&self) -> TesterOptions {
        TesterOptions {
            signif: self.test.signif,
            kpss_regression: self.test.kpss_regression,
            min_observations: (self.test.min_observations > 0).then_some(self.test.min_observations),
            skip_datetime_columns: self.test.skip_datetime_columns,
            policy: if self.test.binary {
                DecisionPolicy::Binary
            } else {
                DecisionPolicy::Detailed
            },
            title: None,
        }
    }

    pub fn window_search(&self) -> Result<WindowSearchConfig, ConfigError> {
        Ok(WindowSearchConfig {
            date: self.window.date,
            start: self.start_bound()?,
            step_minutes: self.window.step_minutes,
            floor: self.floor_bound()?,
            max_iterations: self.window.max_iterations,
        })
    }

    /// Save configuration to a file path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_match_session() {
        let config = Config::default();
        assert!(config.validate().is_ok());

        let search = config.window_search().unwrap();
        assert_eq!(search, WindowSearchConfig::default());
        assert_eq!(search.date.to_string(), "2017-03-13");
        assert_eq!(search.start, WindowBound { hour: 15, minute: 55 });

        let options = config.tester_options();
        assert_eq!(options.signif, 0.05);
        assert_eq!(options.min_observations, Some(10));
        assert_eq!(options.policy, DecisionPolicy::Detailed);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [test]
            signif = 0.1
            kpss_regression = "ct"
            min_observations = 0
            binary = true

            [window]
            date = "2017-03-14"
            start_hour = 12
            start_minute = 0
            max_iterations = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.data, DataConfig::default());
        let options = config.tester_options();
        assert_eq!(options.kpss_regression, KpssRegression::ConstantTrend);
        assert_eq!(options.min_observations, None);
        assert_eq!(options.policy, DecisionPolicy::Binary);

        let search = config.window_search().unwrap();
        assert_eq!(search.start, WindowBound { hour: 12, minute: 0 });
        assert_eq!(search.step_minutes, 5);
        assert_eq!(search.max_iterations, Some(20));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.test.signif = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.window.start_minute = 75;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.floor_hour = 16;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.window.step_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stationarity.toml");

        let mut config = Config::default();
        config.window.max_iterations = Some(7);
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[test\nsignif = ").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::ParseError(_))));
    }
}
