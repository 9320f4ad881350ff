//! Stats module - Statistical calculations

mod calculator;

pub use calculator::{round2, AnalyserError, LocationSummary, RollingSeries, StatsCalculator};
