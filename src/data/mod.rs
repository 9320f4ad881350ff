//! Data module - CSV loading and normalization

mod loader;
mod processor;
mod table;

pub use loader::{dedup_header, DataLoader, LoaderError};
pub use processor::{DataProcessor, ProcessorError};
pub use table::SeriesTable;
