use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::filter::YearRange;
use crate::data::loader::{LoadMode, LoaderConfig};

// ---------------------------------------------------------------------------
// Application configuration
// ---------------------------------------------------------------------------

/// Settings read from an optional JSON file. Every field has a default, so
/// `{}` is a valid config.
///
/// ```json
/// {
///   "source": "data/metadata.csv",
///   "mode": "sample_medium",
///   "loader": { "row_cap": 250000 },
///   "view": { "category_column": "source_x", "top_n": 15 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// CSV file to explore.
    pub source: PathBuf,
    /// Mode used for the first load.
    pub mode: LoadMode,
    pub loader: LoaderConfig,
    pub view: ViewConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("metadata.csv"),
            mode: LoadMode::SampleSmall,
            loader: LoaderConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

/// Column names and display defaults for the derived views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Column coerced to a publication year.
    pub date_column: String,
    /// Column whose most frequent values are charted.
    pub category_column: String,
    /// Year given to every row when `date_column` is missing.
    pub default_year: i32,
    /// Initial year range, clamped to the data.
    pub default_year_range: [i32; 2],
    pub top_n: usize,
    pub preview_rows: usize,
    pub filtered_preview_rows: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            date_column: "publish_time".to_string(),
            category_column: "journal".to_string(),
            default_year: 2020,
            default_year_range: [2020, 2021],
            top_n: 10,
            preview_rows: 10,
            filtered_preview_rows: 20,
        }
    }
}

impl ViewConfig {
    pub fn default_range(&self) -> YearRange {
        let [start, end] = self.default_year_range;
        YearRange::new(start, end)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parsing config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let loader = &self.loader;
        let counts = [
            ("loader.sample_small_rows", loader.sample_small_rows),
            ("loader.sample_medium_rows", loader.sample_medium_rows),
            ("loader.chunk_size", loader.chunk_size),
            ("loader.row_cap", loader.row_cap),
            ("loader.progress_assumed_max_rows", loader.progress_assumed_max_rows),
            ("view.top_n", self.view.top_n),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, n)| *n == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be greater than zero")));
        }

        let [start, end] = self.view.default_year_range;
        if start > end {
            return Err(ConfigError::Invalid(format!(
                "view.default_year_range is inverted: [{start}, {end}]"
            )));
        }
        Ok(())
    }
}
