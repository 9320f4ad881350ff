//! Layout Schema Module
//! Declares where the header sits in the sensor export and which column pairs
//! hold each location's readings.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Number of locations a sensor export carries.
pub const LOCATION_COUNT: usize = 2;

/// Default rolling window size.
pub const DEFAULT_WINDOW: usize = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read schema file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid schema file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Schema must declare exactly {LOCATION_COUNT} locations, found {0}")]
    LocationCount(usize),
    #[error("Location #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },
}

/// The `(timestamp, value)` column pair for one monitored location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationColumns {
    /// Display name; falls back to the value column when omitted.
    #[serde(default)]
    pub name: String,
    pub time_column: String,
    pub value_column: String,
}

impl LocationColumns {
    pub fn new(time_column: &str, value_column: &str) -> Self {
        Self {
            name: value_column.trim().to_string(),
            time_column: time_column.to_string(),
            value_column: value_column.to_string(),
        }
    }

    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.value_column.trim()
        } else {
            &self.name
        }
    }
}

/// Row layout and column pairs of a sensor export.
///
/// Rows are 0-indexed physical CSV lines. Everything above `header_row` is
/// metadata, as are the `skip_after_header` lines right below it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSchema {
    pub header_row: usize,
    pub skip_after_header: usize,
    pub locations: Vec<LocationColumns>,
}

impl Default for LayoutSchema {
    fn default() -> Self {
        Self {
            header_row: 6,
            skip_after_header: 2,
            locations: vec![
                LocationColumns::new("Time", "Harris Church of England Academy, Rugby"),
                LocationColumns::new("Time.1", "Cardinal Newman Catholic Secondary School "),
            ],
        }
    }
}

impl LayoutSchema {
    /// Read a schema from a TOML file and validate it.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let schema: LayoutSchema = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        schema.validate()?;
        Ok(schema)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locations.len() != LOCATION_COUNT {
            return Err(ConfigError::LocationCount(self.locations.len()));
        }
        for (index, loc) in self.locations.iter().enumerate() {
            if loc.time_column.is_empty() {
                return Err(ConfigError::EmptyField {
                    index,
                    field: "time_column",
                });
            }
            if loc.value_column.is_empty() {
                return Err(ConfigError::EmptyField {
                    index,
                    field: "value_column",
                });
            }
        }
        Ok(())
    }

    /// First physical row holding readings.
    pub fn first_data_row(&self) -> usize {
        self.header_row + 1 + self.skip_after_header
    }
}
