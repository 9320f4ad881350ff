//! Statistics Calculator Module
//! Handles the mean, rolling standard deviation and peak-deviation window of a
//! location's readings.

use crate::data::{DataProcessor, ProcessorError, SeriesTable};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::statistics::Statistics;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum AnalyserError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("{location}: no column named {column:?}")]
    NoSuchColumn { location: String, column: String },
    #[error("{location}: no valid value in {what}")]
    AllMissing { location: String, what: &'static str },
    #[error("Rolling window must span at least 2 readings, got {0}")]
    InvalidWindow(usize),
}

impl From<ProcessorError> for AnalyserError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::PolarsError(e) => AnalyserError::PolarsError(e),
            ProcessorError::NoSuchColumn { location, column } => {
                AnalyserError::NoSuchColumn { location, column }
            }
        }
    }
}

/// Round to 2 decimal places, exact halves to the even digit.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Rolling standard deviation of one location, aligned with its timestamps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingSeries {
    pub location: String,
    pub window: usize,
    pub timestamps: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl RollingSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Deviation of the window ending at `timestamp`.
    pub fn get(&self, timestamp: &str) -> Option<Option<f64>> {
        self.timestamps
            .iter()
            .position(|t| t == timestamp)
            .map(|i| self.values[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.timestamps
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

/// Summary of one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub readings: usize,
    pub missing: usize,
    pub mean: f64,
    pub max_std: f64,
    pub max_std_at: String,
}

/// Handles statistical calculations over series tables.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Arithmetic mean of the valid readings, rounded to 2 decimals.
    pub fn mean(table: &SeriesTable) -> Result<f64, AnalyserError> {
        let column = DataProcessor::column(table, table.value_column())?;
        let readings = DataProcessor::coerce_readings(column)?;

        readings
            .f64()?
            .mean()
            .map(round2)
            .ok_or_else(|| AnalyserError::AllMissing {
                location: table.location().to_string(),
                what: "value column",
            })
    }

    /// Sample standard deviation over each full window, rounded to 2 decimals.
    ///
    /// Position `i` is missing until `window` readings end at it, and whenever
    /// one of those readings is missing.
    pub fn rolling_std_values(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
        (0..values.len())
            .map(|i| {
                if i + 1 < window {
                    return None;
                }
                let full: Option<Vec<f64>> = values[i + 1 - window..=i].iter().copied().collect();
                full.map(|w| round2(w.iter().std_dev()))
            })
            .collect()
    }

    pub fn rolling_std(table: &SeriesTable, window: usize) -> Result<RollingSeries, AnalyserError> {
        if window < 2 {
            return Err(AnalyserError::InvalidWindow(window));
        }

        let readings = DataProcessor::readings(table)?;
        let timestamps = DataProcessor::timestamps(table)?;

        Ok(RollingSeries {
            location: table.location().to_string(),
            window,
            timestamps,
            values: Self::rolling_std_values(&readings, window),
        })
    }

    /// Largest deviation and the timestamp of its first occurrence.
    pub fn max_std(rolling: &RollingSeries) -> Result<(f64, String), AnalyserError> {
        let mut best: Option<(f64, &str)> = None;

        for (timestamp, value) in rolling.iter() {
            let Some(v) = value else { continue };
            if best.map_or(true, |(b, _)| v > b) {
                best = Some((v, timestamp));
            }
        }

        best.map(|(v, t)| (v, t.to_string()))
            .ok_or_else(|| AnalyserError::AllMissing {
                location: rolling.location.clone(),
                what: "rolling deviation",
            })
    }

    /// Normalize a table and compute its summary.
    pub fn summarize(table: &mut SeriesTable, window: usize) -> Result<LocationSummary, AnalyserError> {
        DataProcessor::normalize(table)?;

        let readings = DataProcessor::readings(table)?;
        let valid = readings.iter().filter(|v| v.is_some()).count();
        let mean = Self::mean(table)?;
        let rolling = Self::rolling_std(table, window)?;
        let (max_std, max_std_at) = Self::max_std(&rolling)?;

        debug!(
            location = table.location(),
            mean,
            max_std,
            max_std_at = %max_std_at,
            "summarized location"
        );

        Ok(LocationSummary {
            location: table.location().to_string(),
            readings: valid,
            missing: readings.len() - valid,
            mean,
            max_std,
            max_std_at,
        })
    }

    /// Summarize independent tables in parallel.
    pub fn summarize_all_parallel(
        tables: &mut [SeriesTable],
        window: usize,
    ) -> Vec<Result<LocationSummary, AnalyserError>> {
        tables
            .par_iter_mut()
            .map(|table| Self::summarize(table, window))
            .collect()
    }
}
