/// Raw transaction tables
///
/// A `RawTable` is the un-normalized source: ordered column names and rows
/// of `RawValue` cells. It is built from CSV text, a JSON array of objects,
/// or row by row, and it can be written back out as CSV.
///
/// # Examples
///
/// ```
/// use shopdash::{RawTable, RawValue};
///
/// let csv = "order_id,customer_state,price\no1,SP,10.5\no2,,7";
/// let raw = RawTable::from_csv(csv).unwrap();
///
/// assert_eq!(raw.len(), 2);
/// assert_eq!(raw.value(1, "customer_state"), &RawValue::Null);
/// assert_eq!(raw.value(0, "price"), &RawValue::from("10.5"));
/// ```

use crate::column::RawValue;
use crate::error::DataLoadError;
use std::collections::HashMap;
use std::io::{self, Read};

static NULL: RawValue = RawValue::Null;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(columns: Vec<String>) -> Self {
        RawTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    /// Cell at (`row`, `col_idx`). Short rows and out-of-range reads are null.
    #[inline]
    pub fn value_by_index(&self, row: usize, col_idx: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col_idx))
            .unwrap_or(&NULL)
    }

    /// Cell at (`row`, `column`). Unknown columns read as null.
    pub fn value(&self, row: usize, column: &str) -> &RawValue {
        match self.column_index(column) {
            Some(idx) => self.value_by_index(row, idx),
            None => &NULL,
        }
    }

    /// Append a row given in column order. Missing trailing cells are null,
    /// surplus cells are dropped.
    pub fn push_row(&mut self, mut values: Vec<RawValue>) {
        values.resize(self.columns.len(), RawValue::Null);
        self.rows.push(values);
    }

    /// Append a row given by column name. Names not seen before become new
    /// columns (null in every earlier row); columns the row omits are null.
    pub fn append_row(&mut self, mut row: HashMap<String, RawValue>) {
        let mut new_columns: Vec<String> = row
            .keys()
            .filter(|k| !self.has_column(k))
            .cloned()
            .collect();
        new_columns.sort();
        for name in new_columns {
            self.add_column(name);
        }

        let values = self
            .columns
            .iter()
            .map(|name| row.remove(name).unwrap_or(RawValue::Null))
            .collect();
        self.rows.push(values);
    }

    fn add_column(&mut self, name: String) {
        self.columns.push(name);
        for row in &mut self.rows {
            row.push(RawValue::Null);
        }
    }

    /// Parse CSV text. The first record is the header; empty cells are null.
    pub fn from_csv(csv: &str) -> Result<RawTable, DataLoadError> {
        Self::from_csv_reader(csv.as_bytes())
    }

    /// Parse CSV from any reader.
    ///
    /// Rows may have fewer or more fields than the header; short rows are
    /// padded with null and surplus fields are ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<RawTable, DataLoadError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        if headers.is_empty() {
            return Err(DataLoadError::Empty);
        }
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(DataLoadError::MissingHeader);
        }

        let columns: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let mut table = RawTable::new(columns);

        for record in rdr.records() {
            let record = record?;
            let values = record
                .iter()
                .map(|cell| {
                    if cell.trim().is_empty() {
                        RawValue::Null
                    } else {
                        RawValue::Text(cell.to_string())
                    }
                })
                .collect();
            table.push_row(values);
        }

        Ok(table)
    }

    /// Parse a JSON array of objects.
    ///
    /// Columns are the union of object keys in first-seen order. Numbers
    /// become `Int` or `Float`, nested arrays/objects are kept as JSON text.
    pub fn from_json(json: &str) -> Result<RawTable, DataLoadError> {
        let parsed: serde_json::Value = serde_json::from_str(json)?;
        Self::from_json_value(parsed)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<RawTable, DataLoadError> {
        let parsed: serde_json::Value = serde_json::from_slice(bytes)?;
        Self::from_json_value(parsed)
    }

    fn from_json_value(parsed: serde_json::Value) -> Result<RawTable, DataLoadError> {
        let items = match parsed {
            serde_json::Value::Array(items) => items,
            other => return Err(DataLoadError::JsonShape(json_type_name(&other).to_string())),
        };

        if items.is_empty() {
            return Err(DataLoadError::Empty);
        }

        let mut table = RawTable::default();
        for item in items {
            let obj = match item {
                serde_json::Value::Object(obj) => obj,
                other => {
                    return Err(DataLoadError::JsonShape(format!(
                        "array containing {}",
                        json_type_name(&other)
                    )))
                }
            };

            for key in obj.keys() {
                if !table.has_column(key) {
                    table.add_column(key.clone());
                }
            }

            let mut values = vec![RawValue::Null; table.columns.len()];
            for (key, value) in obj {
                if let Some(idx) = table.column_index(&key) {
                    values[idx] = json_to_raw(value);
                }
            }
            table.rows.push(values);
        }

        Ok(table)
    }

    /// Export as CSV text with a header row. Null cells are empty.
    ///
    /// A table without columns has no header to write and is rejected.
    pub fn to_csv(&self) -> Result<String, DataLoadError> {
        if self.columns.is_empty() {
            return Err(DataLoadError::MissingHeader);
        }
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(RawValue::render))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DataLoadError::Io(e.into_error()))?;
        String::from_utf8(bytes)
            .map_err(|e| DataLoadError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

fn json_to_raw(value: serde_json::Value) -> RawValue {
    match value {
        serde_json::Value::Null => RawValue::Null,
        serde_json::Value::Bool(b) => RawValue::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Null),
        },
        serde_json::Value::String(s) => RawValue::Text(s),
        nested => RawValue::Text(nested.to_string()),
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
