//! CSV Data Loader Module
//! Reads a sensor export at its declared layout and splits it into one series
//! table per location.

use crate::config::{ConfigError, LayoutSchema, LocationColumns};
use crate::data::SeriesTable;
use polars::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Cannot access {path}: {source}")]
    FileAccess {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("File ends before header row {header_row}")]
    MissingHeader { header_row: usize },
    #[error("Header is missing columns for {location}: {missing:?}")]
    Schema {
        location: String,
        missing: Vec<String>,
    },
    #[error("{location}: timestamp {timestamp} appears more than once")]
    DuplicateTimestamp { location: String, timestamp: String },
    #[error("Invalid layout schema: {0}")]
    InvalidSchema(#[from] ConfigError),
    #[error("No data loaded")]
    NoData,
}

/// Name header cells the way spreadsheet exports are usually read back:
/// repeats get `.1`, `.2`, ... and blank cells become `Unnamed: <index>`.
pub fn dedup_header(cells: &[Option<&str>]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let base = match cell {
                Some(c) if !c.is_empty() => c.to_string(),
                _ => format!("Unnamed: {i}"),
            };

            let mut name = base.clone();
            while seen.contains(&name) {
                let n = counts.entry(base.clone()).or_insert(0);
                *n += 1;
                name = format!("{base}.{n}");
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}

/// Loads sensor exports with Polars.
pub struct DataLoader {
    schema: LayoutSchema,
    df: Option<DataFrame>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new(LayoutSchema::default())
    }
}

impl DataLoader {
    pub fn new(schema: LayoutSchema) -> Self {
        Self {
            schema,
            df: None,
            file_path: None,
        }
    }

    /// Read a CSV file and split it into the two location tables.
    pub fn load(
        &mut self,
        file_path: impl AsRef<Path>,
    ) -> Result<(SeriesTable, SeriesTable), LoaderError> {
        self.schema.validate()?;
        self.load_csv(file_path)?;
        self.extract_tables()
    }

    /// Load the data block of a CSV file with its de-duplicated header.
    ///
    /// Every cell is kept as a string; coercion happens on normalization.
    pub fn load_csv(&mut self, file_path: impl AsRef<Path>) -> Result<&DataFrame, LoaderError> {
        let path = file_path.as_ref();
        let file_access = |source: std::io::Error| LoaderError::FileAccess {
            path: path.display().to_string(),
            source,
        };

        let meta = std::fs::metadata(path).map_err(file_access)?;
        if !meta.is_file() {
            return Err(file_access(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        self.file_path = Some(path.to_path_buf());

        let file = std::fs::File::open(path).map_err(file_access)?;
        let lines = BufReader::new(file).lines().take(self.schema.header_row + 1).count();
        if lines <= self.schema.header_row {
            return Err(LoaderError::MissingHeader {
                header_row: self.schema.header_row,
            });
        }

        let raw = match LazyCsvReader::new(path)
            .with_has_header(false)
            .with_skip_rows(self.schema.header_row)
            .with_infer_schema_length(Some(0))
            .with_truncate_ragged_lines(true)
            .finish()
            .and_then(|lazy| lazy.collect())
        {
            Ok(df) => df,
            Err(PolarsError::NoData(_)) => {
                return Err(LoaderError::MissingHeader {
                    header_row: self.schema.header_row,
                })
            }
            Err(e) => return Err(e.into()),
        };

        if raw.height() == 0 {
            return Err(LoaderError::MissingHeader {
                header_row: self.schema.header_row,
            });
        }

        let cells: Vec<Option<&str>> = raw
            .get_columns()
            .iter()
            .map(|col| col.str().map(|ca| ca.get(0)))
            .collect::<PolarsResult<_>>()?;
        let names = dedup_header(&cells);
        debug!(columns = ?names, "parsed header");

        let mut df = raw.slice((1 + self.schema.skip_after_header) as i64, raw.height());
        df.set_column_names(names.iter().map(String::as_str))?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "loaded sensor export"
        );

        self.df = Some(df);
        self.df.as_ref().ok_or(LoaderError::NoData)
    }

    /// Split the loaded frame into one table per declared location.
    pub fn extract_tables(&self) -> Result<(SeriesTable, SeriesTable), LoaderError> {
        self.schema.validate()?;
        let df = self.df.as_ref().ok_or(LoaderError::NoData)?;
        self.check_schema(df)?;

        let mut tables = self
            .schema
            .locations
            .iter()
            .map(|loc| Self::extract_location(df, loc))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter();

        match (tables.next(), tables.next()) {
            (Some(first), Some(second)) => Ok((first, second)),
            _ => Err(LoaderError::NoData),
        }
    }

    fn check_schema(&self, df: &DataFrame) -> Result<(), LoaderError> {
        let header: HashSet<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();

        for loc in &self.schema.locations {
            let missing: Vec<String> = [&loc.time_column, &loc.value_column]
                .into_iter()
                .filter(|name| !header.contains(name.as_str()))
                .cloned()
                .collect();

            if !missing.is_empty() {
                return Err(LoaderError::Schema {
                    location: loc.display_name().to_string(),
                    missing,
                });
            }
        }

        Ok(())
    }

    fn extract_location(df: &DataFrame, loc: &LocationColumns) -> Result<SeriesTable, LoaderError> {
        let pair = df.select([loc.time_column.as_str(), loc.value_column.as_str()])?;

        // Rows past the end of a shorter location have no timestamp.
        let times = pair.column(&loc.time_column)?.str()?;
        let mask: BooleanChunked = times
            .into_iter()
            .map(|t| t.is_some_and(|t| !t.trim().is_empty()))
            .collect();
        let pair = pair.filter(&mask)?;

        let dropped = df.height() - pair.height();
        if dropped > 0 {
            warn!(location = loc.display_name(), dropped, "skipped rows without a timestamp");
        }

        let mut seen = HashSet::new();
        for t in pair.column(&loc.time_column)?.str()?.into_iter().flatten() {
            if !seen.insert(t) {
                return Err(LoaderError::DuplicateTimestamp {
                    location: loc.display_name().to_string(),
                    timestamp: t.to_string(),
                });
            }
        }

        debug!(location = loc.display_name(), rows = pair.height(), "extracted location");
        Ok(SeriesTable::from_frame(loc, pair))
    }

    /// Get list of column names from the loaded data block.
    pub fn get_columns(&self) -> Vec<String> {
        self.df
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get the number of data rows.
    pub fn get_row_count(&self) -> usize {
        self.df.as_ref().map(|df| df.height()).unwrap_or(0)
    }

    pub fn get_file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    pub fn schema(&self) -> &LayoutSchema {
        &self.schema
    }
}
