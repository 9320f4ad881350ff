//! Chart Plotter Module
//! Builds the point sets a chart front end draws: raw readings over time and a
//! normal approximation of each location's distribution.

use crate::data::{DataProcessor, ProcessorError, SeriesTable};
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use thiserror::Error;

/// Points sampled along a Gaussian curve unless told otherwise.
pub const DEFAULT_CURVE_POINTS: usize = 100;

/// Half-width of the curve's x range, in standard deviations.
pub const CURVE_SPAN_SIGMAS: f64 = 3.0;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No normal distribution with mean {mean} and standard deviation {std_dev}")]
    DegenerateDistribution { mean: f64, std_dev: f64 },
    #[error("A curve needs at least 2 points, got {0}")]
    TooFewPoints(usize),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
}

/// Readings of one location in file order, missing values omitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub location: String,
    pub points: Vec<(String, f64)>,
}

/// Density of a normal distribution sampled over mean ± 3σ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GaussianCurve {
    pub mean: f64,
    pub std_dev: f64,
    pub xs: Vec<f64>,
    pub densities: Vec<f64>,
}

impl GaussianCurve {
    pub fn new(mean: f64, std_dev: f64, points: usize) -> Result<Self, ChartError> {
        if points < 2 {
            return Err(ChartError::TooFewPoints(points));
        }
        let degenerate = || ChartError::DegenerateDistribution { mean, std_dev };
        if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
            return Err(degenerate());
        }
        let normal = Normal::new(mean, std_dev).map_err(|_| degenerate())?;

        let xs = ChartPlotter::linspace(
            mean - CURVE_SPAN_SIGMAS * std_dev,
            mean + CURVE_SPAN_SIGMAS * std_dev,
            points,
        );
        let densities = xs.iter().map(|&x| normal.pdf(x)).collect();

        Ok(Self {
            mean,
            std_dev,
            xs,
            densities,
        })
    }

    /// Inclusive x range covered by the curve.
    pub fn range(&self) -> (f64, f64) {
        (
            self.xs.first().copied().unwrap_or(self.mean),
            self.xs.last().copied().unwrap_or(self.mean),
        )
    }
}

/// Chart payload for a single location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub line: LineSeries,
    pub gaussian: Option<GaussianCurve>,
}

/// Creates chart payloads from series tables.
pub struct ChartPlotter;

impl ChartPlotter {
    /// `n` evenly spaced values from `start` to `end`, both included.
    pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                    .collect()
            }
        }
    }

    /// Timestamp/value points for the line plot.
    pub fn line_series(table: &SeriesTable) -> Result<LineSeries, ChartError> {
        let timestamps = DataProcessor::timestamps(table)?;
        let readings = DataProcessor::readings(table)?;

        let points = timestamps
            .into_iter()
            .zip(readings)
            .filter_map(|(t, v)| v.map(|v| (t, v)))
            .collect();

        Ok(LineSeries {
            location: table.location().to_string(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationColumns;
    use approx::assert_relative_eq;

    #[test]
    fn linspace_includes_both_ends() {
        let xs = ChartPlotter::linspace(0.0, 1.0, 5);
        assert_eq!(xs, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(ChartPlotter::linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(ChartPlotter::linspace(2.0, 9.0, 1), vec![2.0]);
    }

    #[test]
    fn curve_spans_three_sigmas_and_peaks_at_mean() {
        let curve = GaussianCurve::new(800.0, 50.0, 101).unwrap();

        assert_eq!(curve.xs.len(), 101);
        assert_eq!(curve.densities.len(), 101);
        assert_eq!(curve.range(), (650.0, 950.0));
        assert_relative_eq!(curve.xs[50], 800.0, max_relative = 1e-12);

        let peak = 1.0 / (50.0 * (2.0 * std::f64::consts::PI).sqrt());
        assert_relative_eq!(curve.densities[50], peak, max_relative = 1e-9);
        assert_relative_eq!(curve.densities[0], curve.densities[100], max_relative = 1e-9);
    }

    #[test]
    fn zero_deviation_has_no_curve() {
        assert!(matches!(
            GaussianCurve::new(400.0, 0.0, 100),
            Err(ChartError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            GaussianCurve::new(400.0, f64::NAN, 100),
            Err(ChartError::DegenerateDistribution { .. })
        ));
        assert!(matches!(
            GaussianCurve::new(400.0, 10.0, 1),
            Err(ChartError::TooFewPoints(1))
        ));
    }

    #[test]
    fn line_series_omits_missing_readings() {
        let table = SeriesTable::from_cells(
            &LocationColumns::new("Time", "Site"),
            &["09:00", "09:01", "09:02"],
            &[Some("410"), Some("--"), Some("415.5")],
        )
        .unwrap();

        let line = ChartPlotter::line_series(&table).unwrap();
        assert_eq!(line.location, "Site");
        assert_eq!(
            line.points,
            vec![("09:00".to_string(), 410.0), ("09:02".to_string(), 415.5)]
        );
    }
}
