//! In-memory time-indexed table

use crate::error::DataError;
use chrono::NaiveDateTime;

/// Values of a single column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select(&self, mask: &[bool]) -> ColumnData {
        fn keep<T: Clone>(values: &[T], mask: &[bool]) -> Vec<T> {
            values
                .iter()
                .zip(mask)
                .filter(|(_, &keep)| keep)
                .map(|(v, _)| v.clone())
                .collect()
        }
        match self {
            ColumnData::Numeric(values) => ColumnData::Numeric(keep(values, mask)),
            ColumnData::Text(values) => ColumnData::Text(keep(values, mask)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.data, ColumnData::Numeric(_))
    }

    /// Non-missing numeric values in row order (empty for text columns)
    pub fn observations(&self) -> Vec<f64> {
        match &self.data {
            ColumnData::Numeric(values) => values
                .iter()
                .filter_map(|v| *v)
                .filter(|v| !v.is_nan())
                .collect(),
            ColumnData::Text(_) => Vec::new(),
        }
    }
}

/// Rows keyed by timestamp, sorted ascending.
///
/// Duplicate timestamps are allowed and keep their input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeriesTable {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl TimeSeriesTable {
    /// Build a table, sorting rows by timestamp.
    ///
    /// Every column must have one value per index entry.
    pub fn new(index: Vec<NaiveDateTime>, columns: Vec<Column>) -> Result<Self, DataError> {
        if let Some(col) = columns.iter().find(|c| c.data.len() != index.len()) {
            return Err(DataError::RaggedColumn {
                column: col.name.clone(),
                len: col.data.len(),
                rows: index.len(),
            });
        }

        let mut order: Vec<usize> = (0..index.len()).collect();
        order.sort_by_key(|&i| index[i]);

        if order.iter().enumerate().all(|(pos, &i)| pos == i) {
            return Ok(Self { index, columns });
        }

        let index = order.iter().map(|&i| index[i]).collect();
        let columns = columns
            .into_iter()
            .map(|col| {
                let data = match col.data {
                    ColumnData::Numeric(values) => {
                        ColumnData::Numeric(order.iter().map(|&i| values[i]).collect())
                    }
                    ColumnData::Text(values) => {
                        ColumnData::Text(order.iter().map(|&i| values[i].clone()).collect())
                    }
                };
                Column { name: col.name, data }
            })
            .collect();

        Ok(Self { index, columns })
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_numeric())
    }

    /// Text values of `name`, failing if the column is absent or numeric.
    pub fn text_column(&self, name: &str) -> Result<&[Option<String>], DataError> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Text(values)) => Ok(values),
            _ => Err(DataError::MissingColumn(name.to_string())),
        }
    }

    /// Keep the rows where `mask` is true.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self, DataError> {
        if mask.len() != self.len() {
            return Err(DataError::MaskLength {
                mask: mask.len(),
                rows: self.len(),
            });
        }

        let index = self
            .index
            .iter()
            .zip(mask)
            .filter(|(_, &keep)| keep)
            .map(|(ts, _)| *ts)
            .collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data: c.data.select(mask),
            })
            .collect();

        Ok(Self { index, columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2017, 3, 13)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_new_sorts_rows() {
        let table = TimeSeriesTable::new(
            vec![ts(10, 5), ts(10, 0), ts(10, 10)],
            vec![
                Column::numeric("Vol_lo_bid", vec![Some(2.0), Some(1.0), None]),
                Column::text("time", vec![Some("10:05:00".into()), Some("10:00:00".into()), Some("10:10:00".into())]),
            ],
        )
        .unwrap();

        assert_eq!(table.index(), &[ts(10, 0), ts(10, 5), ts(10, 10)]);
        assert_eq!(
            table.column("Vol_lo_bid").unwrap().data,
            ColumnData::Numeric(vec![Some(1.0), Some(2.0), None])
        );
        assert_eq!(table.text_column("time").unwrap()[0].as_deref(), Some("10:00:00"));
    }

    #[test]
    fn test_new_rejects_ragged_columns() {
        let result = TimeSeriesTable::new(vec![ts(9, 0)], vec![Column::numeric("x", vec![])]);
        assert!(matches!(result, Err(DataError::RaggedColumn { len: 0, rows: 1, .. })));
    }

    #[test]
    fn test_observations_skip_missing() {
        let col = Column::numeric("x", vec![Some(1.0), None, Some(f64::NAN), Some(3.0)]);
        assert_eq!(col.observations(), vec![1.0, 3.0]);
        assert!(Column::text("date", vec![Some("2017-03-13".into())]).observations().is_empty());
    }

    #[test]
    fn test_filter_rows() {
        let table = TimeSeriesTable::new(
            vec![ts(9, 0), ts(9, 5), ts(9, 10)],
            vec![Column::numeric("x", vec![Some(1.0), Some(2.0), Some(3.0)])],
        )
        .unwrap();

        let filtered = table.filter_rows(&[true, false, true]).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.column("x").unwrap().observations(), vec![1.0, 3.0]);

        let empty = table.filter_rows(&[false; 3]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.numeric_columns().count(), 1);

        assert!(table.filter_rows(&[true]).is_err());
    }

    #[test]
    fn test_text_column_missing() {
        let table = TimeSeriesTable::new(vec![ts(9, 0)], vec![Column::numeric("time", vec![Some(1.0)])]).unwrap();
        assert!(matches!(table.text_column("time"), Err(DataError::MissingColumn(_))));
        assert!(matches!(table.text_column("date"), Err(DataError::MissingColumn(_))));
    }
}
