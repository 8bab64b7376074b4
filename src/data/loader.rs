//! Loading and cleaning CSV tables

use crate::data::table::{Column, TimeSeriesTable};
use crate::error::DataError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Name of the column used as the row index
pub const DATETIME_COLUMN: &str = "datetime";

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

const MISSING_MARKERS: [&str; 7] = ["", "nan", "na", "n/a", "null", "none", "-nan"];

/// Load a CSV file into a sorted, datetime-indexed table.
pub fn load_table(path: &Path) -> Result<TimeSeriesTable, DataError> {
    let file = File::open(path)?;
    let table = read_table(file)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        columns = table.columns().len(),
        "Loaded table"
    );
    Ok(table)
}

/// Load both session tables.
pub fn load_tables(
    first: &Path,
    second: &Path,
) -> Result<(TimeSeriesTable, TimeSeriesTable), DataError> {
    Ok((load_table(first)?, load_table(second)?))
}

/// Read CSV data with a header row.
///
/// Fully-empty rows are dropped, the `datetime` column becomes the sorted
/// index, and every other column is numeric when all of its non-missing
/// cells parse as numbers, text otherwise.
pub fn read_table<R: Read>(reader: R) -> Result<TimeSeriesTable, DataError> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let dt_pos = headers
        .iter()
        .position(|h| h == DATETIME_COLUMN)
        .ok_or_else(|| DataError::MissingColumn(DATETIME_COLUMN.to_string()))?;

    let mut rows: Vec<StringRecord> = Vec::new();
    let mut dropped = 0usize;
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            dropped += 1;
            continue;
        }
        rows.push(record);
    }
    if dropped > 0 {
        debug!(dropped, "Dropped empty rows");
    }

    let mut index = Vec::with_capacity(rows.len());
    for (i, record) in rows.iter().enumerate() {
        let raw = record.get(dt_pos).unwrap_or("").trim();
        let ts = parse_datetime(raw).ok_or_else(|| DataError::InvalidDatetime {
            // 1-based, counting the header
            row: i + 2,
            value: raw.to_string(),
        })?;
        index.push(ts);
    }

    let columns = headers
        .iter()
        .enumerate()
        .filter(|(pos, _)| *pos != dt_pos)
        .map(|(pos, name)| {
            let cells: Vec<Option<&str>> = rows
                .iter()
                .map(|record| record.get(pos).map(str::trim).filter(|c| !is_missing(c)))
                .collect();
            infer_column(name, &cells)
        })
        .collect();

    TimeSeriesTable::new(index, columns)
}

fn infer_column(name: &str, cells: &[Option<&str>]) -> Column {
    let parsed: Option<Vec<Option<f64>>> = cells
        .iter()
        .map(|cell| match cell {
            Some(text) => text.parse::<f64>().ok().map(Some),
            None => Some(None),
        })
        .collect();

    match parsed {
        Some(values) => Column::numeric(name, values),
        None => Column::text(name, cells.iter().map(|c| c.map(str::to_string)).collect()),
    }
}

fn is_missing(cell: &str) -> bool {
    let lower = cell.to_ascii_lowercase();
    MISSING_MARKERS.contains(&lower.as_str())
}

/// Parse the datetime formats found in bar exports.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::ColumnData;
    use chrono::Timelike;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
datetime,date,time,Vol_lo_bid,Vol_lo_ask
2017-03-13 09:10:00,2017-03-13,09:10:00,5,7
,,,,
2017-03-13 09:00:00,2017-03-13,09:00:00,3,
2017-03-13 09:05:00,2017-03-13,09:05:00,NaN,4.5
";

    #[test]
    fn test_read_table_cleans_and_sorts() {
        let table = read_table(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.len(), 3);
        let minutes: Vec<u32> = table.index().iter().map(|ts| ts.minute()).collect();
        assert_eq!(minutes, vec![0, 5, 10]);

        assert_eq!(
            table.column("Vol_lo_bid").unwrap().data,
            ColumnData::Numeric(vec![Some(3.0), None, Some(5.0)])
        );
        assert_eq!(
            table.column("Vol_lo_ask").unwrap().data,
            ColumnData::Numeric(vec![None, Some(4.5), Some(7.0)])
        );
        assert!(!table.column("date").unwrap().is_numeric());
        assert_eq!(table.text_column("time").unwrap()[2].as_deref(), Some("09:10:00"));
        assert!(table.column(DATETIME_COLUMN).is_none());
    }

    #[test]
    fn test_missing_datetime_column() {
        let result = read_table("date,value\n2017-03-13,1\n".as_bytes());
        assert!(matches!(result, Err(DataError::MissingColumn(name)) if name == "datetime"));
    }

    #[test]
    fn test_invalid_datetime() {
        let data = "datetime,value\n2017-03-13 09:00:00,1\nnot a date,2\n";
        match read_table(data.as_bytes()) {
            Err(DataError::InvalidDatetime { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "not a date");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_datetime_formats() {
        assert!(parse_datetime("2017-03-13 15:55:00").is_some());
        assert!(parse_datetime("2017-03-13T15:55:00").is_some());
        assert!(parse_datetime("2017-03-13 15:55:00.250").is_some());
        assert!(parse_datetime("2017-03-13T15:55:00Z").is_some());
        assert!(parse_datetime("2017-03-13 15:55").is_some());
        assert_eq!(parse_datetime("2017-03-13").map(|d| d.hour()), Some(0));
        assert!(parse_datetime("15:55").is_none());
    }

    #[test]
    fn test_load_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let table = load_table(file.path()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.numeric_columns().count(), 2);
    }

    #[test]
    fn test_load_table_missing_file() {
        let result = load_table(Path::new("definitely/not/here.csv"));
        assert!(matches!(result, Err(DataError::Io(_))));
    }
}
