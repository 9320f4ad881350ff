//! CO2 Analyser - sensor export loading and statistics
//!
//! Loads a two-location CO2 sensor CSV, normalizes each location's readings
//! and computes means, rolling standard deviations and distribution curves.

pub mod charts;
pub mod config;
pub mod data;
pub mod report;
pub mod stats;

pub use config::{LayoutSchema, LocationColumns};
pub use data::{DataLoader, SeriesTable};
pub use report::{Analysis, AnalysisOptions, AnalysisReport};
