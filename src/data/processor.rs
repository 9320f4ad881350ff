//! Data Processor Module
//! Handles coercion of raw readings and normalization of series tables.

use crate::data::SeriesTable;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{location}: no column named {column:?}")]
    NoSuchColumn { location: String, column: String },
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Parse a single CSV cell as a reading.
    ///
    /// Empty, unparsable and non-finite cells are missing readings.
    pub fn parse_reading(cell: &str) -> Option<f64> {
        cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Coerce a column to `Float64`, turning bad cells into nulls.
    pub fn coerce_readings(column: &Column) -> Result<Column, ProcessorError> {
        match column.dtype() {
            DataType::String => {
                let values: Vec<Option<f64>> = column
                    .str()?
                    .into_iter()
                    .map(|cell| cell.and_then(Self::parse_reading))
                    .collect();
                Ok(Column::new(column.name().clone(), values))
            }
            dtype => {
                let cast = match dtype {
                    DataType::Float64 => column.clone(),
                    _ => column.cast(&DataType::Float64)?,
                };
                let values: Vec<Option<f64>> = cast
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|v| v.is_finite()))
                    .collect();
                Ok(Column::new(column.name().clone(), values))
            }
        }
    }

    /// Render a column as string keys.
    pub fn stringify_keys(column: &Column) -> Result<Column, ProcessorError> {
        match column.dtype() {
            DataType::String => Ok(column.clone()),
            _ => Ok(column.cast(&DataType::String)?),
        }
    }

    /// Look up one of the table's declared columns.
    pub fn column<'a>(table: &'a SeriesTable, name: &str) -> Result<&'a Column, ProcessorError> {
        table
            .frame()
            .column(name)
            .map_err(|_| ProcessorError::NoSuchColumn {
                location: table.location().to_string(),
                column: name.to_string(),
            })
    }

    /// Coerce the value column to floats and key the table by its time column.
    ///
    /// Running it again on a normalized table changes nothing.
    pub fn normalize(table: &mut SeriesTable) -> Result<(), ProcessorError> {
        let values = Self::coerce_readings(Self::column(table, table.value_column())?)?;
        let times = Self::stringify_keys(Self::column(table, table.time_column())?)?;

        let key = table.time_column().to_string();
        let frame = table.frame_mut();
        frame.with_column(times)?;
        frame.with_column(values)?;
        table.set_key(key);

        Ok(())
    }

    /// Readings of a table in row order, coerced without touching the table.
    pub fn readings(table: &SeriesTable) -> Result<Vec<Option<f64>>, ProcessorError> {
        let column = Self::coerce_readings(Self::column(table, table.value_column())?)?;
        let values = column.f64()?.into_iter().collect();
        Ok(values)
    }

    /// Timestamps of a table in row order.
    pub fn timestamps(table: &SeriesTable) -> Result<Vec<String>, ProcessorError> {
        let column = Self::stringify_keys(Self::column(table, table.time_column())?)?;
        let keys = column
            .str()?
            .into_iter()
            .map(|t| t.unwrap_or_default().to_string())
            .collect();
        Ok(keys)
    }
}
