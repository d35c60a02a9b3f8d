/// Source loading
///
/// Reads CSV or JSON sources into normalized tables. The `*_or_empty`
/// functions never fail: a source that cannot be read or parsed yields
/// `NormalizedTable::empty()` and a load report whose `load_error` carries
/// the `DataLoadError` message.

use std::fs;
use std::path::Path;

use crate::error::DataLoadError;
use crate::raw::RawTable;
use crate::table::{normalize_with_report, LoadReport, NormalizeOptions, NormalizedTable};

/// Serialization of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFormat {
    #[default]
    Csv,
    Json,
}

impl SourceFormat {
    /// `.json` files are JSON, everything else is read as CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Csv,
        }
    }
}

/// A normalized table and the report produced while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub table: NormalizedTable,
    pub report: LoadReport,
}

impl Loaded {
    /// Empty, schema-valid table standing in for a failed load.
    pub fn failed(error: &DataLoadError) -> Self {
        log::warn!("data load failed, continuing with an empty table: {}", error);
        Loaded {
            table: NormalizedTable::empty(),
            report: LoadReport::failed(error),
        }
    }
}

/// Parse source bytes into a raw table.
pub fn parse_source(bytes: &[u8], format: SourceFormat) -> Result<RawTable, DataLoadError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(DataLoadError::Empty);
    }
    match format {
        SourceFormat::Csv => RawTable::from_csv_reader(bytes),
        SourceFormat::Json => RawTable::from_json_slice(bytes),
    }
}

pub fn load_bytes(
    bytes: &[u8],
    format: SourceFormat,
    options: &NormalizeOptions,
) -> Result<Loaded, DataLoadError> {
    let raw = parse_source(bytes, format)?;
    let (table, report) = normalize_with_report(&raw, options);
    Ok(Loaded { table, report })
}

pub fn load_bytes_or_empty(bytes: &[u8], format: SourceFormat, options: &NormalizeOptions) -> Loaded {
    load_bytes(bytes, format, options).unwrap_or_else(|e| Loaded::failed(&e))
}

pub fn load_path(path: &Path, options: &NormalizeOptions) -> Result<Loaded, DataLoadError> {
    let bytes = fs::read(path)?;
    log::info!("loading {} ({} bytes)", path.display(), bytes.len());
    load_bytes(&bytes, SourceFormat::from_path(path), options)
}

pub fn load_path_or_empty(path: &Path, options: &NormalizeOptions) -> Loaded {
    load_path(path, options).unwrap_or_else(|e| Loaded::failed(&e))
}
