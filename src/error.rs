//! Error types.

use thiserror::Error;

/// Errors raised while loading or slicing tables.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Invalid datetime at row {row}: {value:?}")]
    InvalidDatetime { row: usize, value: String },

    #[error("Column {column} has {len} values, index has {rows}")]
    RaggedColumn {
        column: String,
        len: usize,
        rows: usize,
    },

    #[error("Row mask has {mask} entries, table has {rows} rows")]
    MaskLength { mask: usize, rows: usize },
}

/// Numerical failures of a single statistical test.
///
/// These never abort a report: the tester turns them into an error decision
/// for the affected column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatError {
    #[error("sample size is too short to use selected regression component")]
    SampleTooShort,

    #[error("Invalid input, x is constant")]
    ConstantSeries,

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("singular regression matrix")]
    SingularMatrix,

    #[error("long-run variance estimate is zero")]
    ZeroVariance,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}
