/// Error types
///
/// Three outcomes can degrade a dashboard query, none of them fatal: a
/// source that cannot be loaded, a column an aggregation needs but the table
/// lacks, and a single value that fails type coercion.

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::schema::Field;

/// The source could not be read or parsed as a table.
///
/// Callers that go through the `*_or_empty` loaders never see this as an
/// `Err`: it is downgraded to a warning carried by the load report and an
/// empty table is returned instead.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("source is empty")]
    Empty,
    #[error("source has no header row")]
    MissingHeader,
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON array of objects, found {0}")]
    JsonShape(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A column required by one aggregation is absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("required column '{column}' is absent")]
pub struct MissingColumnError {
    pub column: Field,
}

impl MissingColumnError {
    pub fn new(column: Field) -> Self {
        MissingColumnError { column }
    }
}

/// A single value failed type coercion and was replaced by null.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("row {row}: cannot coerce {value:?} in column '{field}'")]
pub struct ParseWarning {
    pub field: Field,
    pub row: usize,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = MissingColumnError::new(Field::Price);
        assert_eq!(err.to_string(), "required column 'price' is absent");

        let warning = ParseWarning {
            field: Field::PurchasedAt,
            row: 3,
            value: "yesterday".to_string(),
        };
        assert_eq!(
            warning.to_string(),
            "row 3: cannot coerce \"yesterday\" in column 'order_purchase_timestamp'"
        );

        assert_eq!(DataLoadError::Empty.to_string(), "source is empty");
    }
}
