//! Analysis Report Module
//! Runs the per-location analysis and bundles the results for a front end.

use crate::charts::{ChartData, ChartError, ChartPlotter, GaussianCurve, DEFAULT_CURVE_POINTS};
use crate::config::DEFAULT_WINDOW;
use crate::data::SeriesTable;
use crate::stats::{round2, AnalyserError, LocationSummary, StatsCalculator};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Analysis failed for {location}: {source}")]
    Analysis {
        location: String,
        source: AnalyserError,
    },
    #[error("Chart data failed for {location}: {source}")]
    Chart {
        location: String,
        source: ChartError,
    },
    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisOptions {
    pub window: usize,
    pub curve_points: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            curve_points: DEFAULT_CURVE_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationReport {
    pub summary: LocationSummary,
    pub chart: ChartData,
}

/// Results for both locations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub window: usize,
    pub locations: Vec<LocationReport>,
    /// Second location's mean minus the first's, rounded to 2 decimals.
    pub mean_difference: f64,
}

impl AnalysisReport {
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub struct Analysis;

impl Analysis {
    /// Normalize and summarize both tables, then build their chart payloads.
    ///
    /// The curve of a location is the normal density with its mean and its
    /// largest rolling deviation; a zero deviation leaves it out.
    pub fn run(
        first: SeriesTable,
        second: SeriesTable,
        options: &AnalysisOptions,
    ) -> Result<AnalysisReport, ReportError> {
        let mut tables = [first, second];
        let summaries = StatsCalculator::summarize_all_parallel(&mut tables, options.window);

        let mut locations = Vec::with_capacity(tables.len());
        for (table, summary) in tables.iter().zip(summaries) {
            let summary = summary.map_err(|source| ReportError::Analysis {
                location: table.location().to_string(),
                source,
            })?;
            let chart = Self::chart_data(table, &summary, options.curve_points)?;
            locations.push(LocationReport { summary, chart });
        }

        let mean_difference = round2(locations[1].summary.mean - locations[0].summary.mean);
        info!(
            window = options.window,
            mean_difference, "analysis complete"
        );

        Ok(AnalysisReport {
            window: options.window,
            locations,
            mean_difference,
        })
    }

    fn chart_data(
        table: &SeriesTable,
        summary: &LocationSummary,
        curve_points: usize,
    ) -> Result<ChartData, ReportError> {
        let chart_err = |source: ChartError| ReportError::Chart {
            location: table.location().to_string(),
            source,
        };

        let line = ChartPlotter::line_series(table).map_err(chart_err)?;
        let gaussian = match GaussianCurve::new(summary.mean, summary.max_std, curve_points) {
            Ok(curve) => Some(curve),
            Err(ChartError::DegenerateDistribution { std_dev, .. }) => {
                warn!(location = table.location(), std_dev, "no distribution curve");
                None
            }
            Err(e) => return Err(chart_err(e)),
        };

        Ok(ChartData { line, gaussian })
    }
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean CO2 Level")?;
        for loc in &self.locations {
            writeln!(f, "  {}: {:.2}", loc.summary.location, loc.summary.mean)?;
        }
        writeln!(
            f,
            "  The mean difference for the two locations: {:.2}",
            self.mean_difference
        )?;

        writeln!(f)?;
        writeln!(
            f,
            "Highest standard deviation from a {}-point window",
            self.window
        )?;
        for loc in &self.locations {
            writeln!(
                f,
                "  {}: {:.2} at {}",
                loc.summary.location, loc.summary.max_std, loc.summary.max_std_at
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Plot")?;
        for loc in &self.locations {
            write!(
                f,
                "  {}: {} readings, {} missing",
                loc.summary.location, loc.summary.readings, loc.summary.missing
            )?;
            match &loc.chart.gaussian {
                Some(curve) => {
                    let (lo, hi) = curve.range();
                    writeln!(f, ", curve over [{lo:.2}, {hi:.2}]")?;
                }
                None => writeln!(f, ", no curve")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationColumns;

    fn table(value_column: &str, values: &[&str]) -> SeriesTable {
        let times: Vec<String> = (0..values.len()).map(|i| format!("10:00:{i:02}")).collect();
        let times: Vec<&str> = times.iter().map(String::as_str).collect();
        let cells: Vec<Option<&str>> = values.iter().map(|v| Some(*v)).collect();
        SeriesTable::from_cells(&LocationColumns::new("Time", value_column), &times, &cells).unwrap()
    }

    #[test]
    fn report_covers_both_locations() {
        let first = table("North", &["10", "10", "10", "13", "7"]);
        let second = table("South", &["20", "22", "24", "20", "x"]);

        let report = Analysis::run(first, second, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.window, 3);
        assert_eq!(report.locations[0].summary.mean, 10.0);
        assert_eq!(report.locations[0].summary.max_std, 3.0);
        assert_eq!(report.locations[0].summary.max_std_at, "10:00:04");
        assert_eq!(report.locations[1].summary.mean, 21.5);
        assert_eq!(report.locations[1].summary.missing, 1);
        assert_eq!(report.mean_difference, 11.5);
        assert_eq!(report.locations[1].chart.line.points.len(), 4);
        assert_eq!(
            report.locations[0].chart.gaussian.as_ref().map(|c| c.xs.len()),
            Some(DEFAULT_CURVE_POINTS)
        );
    }

    #[test]
    fn flat_readings_have_no_curve() {
        let first = table("North", &["5", "5", "5"]);
        let second = table("South", &["1", "2", "3"]);

        let report = Analysis::run(first, second, &AnalysisOptions::default()).unwrap();
        assert!(report.locations[0].chart.gaussian.is_none());
        assert!(report.locations[1].chart.gaussian.is_some());
        assert!(report.to_string().contains("North: 3 readings, 0 missing, no curve"));
    }

    #[test]
    fn failure_names_the_location() {
        let first = table("North", &["1", "2", "3"]);
        let second = table("South", &["1", "2"]);

        let err = Analysis::run(first, second, &AnalysisOptions::default()).unwrap_err();
        match err {
            ReportError::Analysis { location, source } => {
                assert_eq!(location, "South");
                assert!(matches!(source, AnalyserError::AllMissing { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_rendering_has_three_sections() {
        let first = table("North", &["10", "10", "10", "13", "7"]);
        let second = table("South", &["20", "22", "24", "20", "21"]);
        let text = Analysis::run(first, second, &AnalysisOptions::default())
            .unwrap()
            .to_string();

        assert!(text.starts_with("Mean CO2 Level\n"));
        assert!(text.contains("  North: 10.00\n"));
        assert!(text.contains("Highest standard deviation from a 3-point window\n"));
        assert!(text.contains("  North: 3.00 at 10:00:04\n"));
        assert!(text.contains("\nPlot\n"));
    }

    #[test]
    fn json_rendering_carries_summaries() {
        let first = table("North", &["10", "10", "10", "13", "7"]);
        let second = table("South", &["20", "22", "24", "20", "21"]);
        let report = Analysis::run(first, second, &AnalysisOptions::default()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["window"], 3);
        assert_eq!(value["locations"][0]["summary"]["max_std_at"], "10:00:04");
        assert_eq!(value["locations"][1]["summary"]["location"], "South");
    }
}
