//! Charts module - Chart payloads

mod plotter;

pub use plotter::{
    ChartData, ChartError, ChartPlotter, GaussianCurve, LineSeries, CURVE_SPAN_SIGMAS,
    DEFAULT_CURVE_POINTS,
};
