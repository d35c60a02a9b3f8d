/// Report settings read from the environment
///
/// | Variable           | Meaning                                  | Default        |
/// |--------------------|------------------------------------------|----------------|
/// | `SHOPDASH_DATA`    | source file (`.csv` or `.json`)          | `all_data.csv` |
/// | `SHOPDASH_YEARS`   | comma-separated purchase years           | all years      |
/// | `SHOPDASH_REGIONS` | comma-separated regions, `(unset)` too   | all regions    |
/// | `SHOPDASH_TOP`     | categories to keep, clamped to 5..=20    | 10             |
/// | `SHOPDASH_PRETTY`  | `1`/`true` pretty-prints the JSON output | off            |
///
/// In `SHOPDASH_REGIONS`, `(unset)` selects rows without a region; a region
/// literally named `(unset)` is written `\(unset)`.

use crate::column::Label;
use crate::view::FilterSpec;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use thiserror::Error;

pub const DATA_VAR: &str = "SHOPDASH_DATA";
pub const YEARS_VAR: &str = "SHOPDASH_YEARS";
pub const REGIONS_VAR: &str = "SHOPDASH_REGIONS";
pub const TOP_VAR: &str = "SHOPDASH_TOP";
pub const PRETTY_VAR: &str = "SHOPDASH_PRETTY";

pub const DEFAULT_DATA_PATH: &str = "all_data.csv";
pub const DEFAULT_TOP_CATEGORIES: usize = 10;
pub const TOP_CATEGORIES_RANGE: RangeInclusive<usize> = 5..=20;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: '{value}' is not a year")]
    InvalidYear { var: &'static str, value: String },
    #[error("{var}: '{value}' is not a count")]
    InvalidCount { var: &'static str, value: String },
    #[error("{var}: '{value}' is not a boolean (use 1/0 or true/false)")]
    InvalidFlag { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub data_path: PathBuf,
    pub filter: FilterSpec,
    pub top_categories: usize,
    pub pretty: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            filter: FilterSpec::all(),
            top_categories: DEFAULT_TOP_CATEGORIES,
            pretty: false,
        }
    }
}

impl ReportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup. Unset and blank variables take their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = ReportConfig::default();

        if let Some(path) = get(DATA_VAR) {
            config.data_path = PathBuf::from(path.trim());
        }

        let years = match get(YEARS_VAR) {
            Some(value) => parse_years(&value)?,
            None => Vec::new(),
        };
        let regions = get(REGIONS_VAR)
            .map(|value| parse_regions(&value))
            .unwrap_or_default();
        config.filter = FilterSpec::new(years, regions);

        if let Some(value) = get(TOP_VAR) {
            let n: usize = value.trim().parse().map_err(|_| ConfigError::InvalidCount {
                var: TOP_VAR,
                value: value.clone(),
            })?;
            config.top_categories = n.clamp(*TOP_CATEGORIES_RANGE.start(), *TOP_CATEGORIES_RANGE.end());
        }

        if let Some(value) = get(PRETTY_VAR) {
            config.pretty = parse_flag(PRETTY_VAR, &value)?;
        }

        Ok(config)
    }
}

fn list_items(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn parse_years(value: &str) -> Result<Vec<i32>, ConfigError> {
    list_items(value)
        .map(|item| {
            item.parse().map_err(|_| ConfigError::InvalidYear {
                var: YEARS_VAR,
                value: item.to_string(),
            })
        })
        .collect()
}

fn parse_regions(value: &str) -> Vec<Label> {
    list_items(value)
        .map(|item| item.parse::<Label>().unwrap_or_else(|never| match never {}))
        .collect()
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            var,
            value: value.to_string(),
        }),
    }
}
