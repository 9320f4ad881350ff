//! Series Table Module
//! One location's readings, keyed by time of day.

use crate::config::LocationColumns;
use polars::prelude::*;

/// Ordered mapping from timestamp to reading for one monitored location.
///
/// Backed by a two-column `DataFrame` named after the CSV header cells. Rows
/// keep file order. The key is unset until the table is normalized.
#[derive(Debug, Clone)]
pub struct SeriesTable {
    location: String,
    time_column: String,
    value_column: String,
    frame: DataFrame,
    key: Option<String>,
}

impl SeriesTable {
    /// Build a table from a time column and a value column.
    pub fn new(columns: &LocationColumns, times: Column, values: Column) -> PolarsResult<Self> {
        let frame = DataFrame::new(vec![
            times.with_name(columns.time_column.as_str().into()),
            values.with_name(columns.value_column.as_str().into()),
        ])?;

        Ok(Self::from_frame(columns, frame))
    }

    /// Wrap an existing frame. Missing columns surface later as lookup errors.
    pub fn from_frame(columns: &LocationColumns, frame: DataFrame) -> Self {
        Self {
            location: columns.display_name().to_string(),
            time_column: columns.time_column.clone(),
            value_column: columns.value_column.clone(),
            frame,
            key: None,
        }
    }

    /// Convenience constructor from raw CSV cells.
    pub fn from_cells(
        columns: &LocationColumns,
        times: &[&str],
        values: &[Option<&str>],
    ) -> PolarsResult<Self> {
        Self::new(
            columns,
            Column::new("time".into(), times),
            Column::new("value".into(), values),
        )
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn time_column(&self) -> &str {
        &self.time_column
    }

    pub fn value_column(&self) -> &str {
        &self.value_column
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub(crate) fn frame_mut(&mut self) -> &mut DataFrame {
        &mut self.frame
    }

    /// Name of the column used as the lookup key, once normalized.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = Some(key);
    }

    pub fn is_normalized(&self) -> bool {
        self.key.is_some()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }
}

impl PartialEq for SeriesTable {
    fn eq(&self, other: &Self) -> bool {
        self.location == other.location
            && self.time_column == other.time_column
            && self.value_column == other.value_column
            && self.key == other.key
            && self.frame.equals_missing(&other.frame)
    }
}
