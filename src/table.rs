/// Normalized transaction table
///
/// `normalize` turns a `RawTable` into a `NormalizedTable`: every known field
/// present in the source becomes a typed column, values that fail coercion
/// become null, and the purchase timestamp is bucketed into year / month.
/// The result is immutable; filters and aggregations only read it.
///
/// # Examples
///
/// ```
/// use shopdash::{normalize, Field, Label, RawTable};
///
/// let csv = "order_id,customer_state,price,order_purchase_timestamp\n\
///            o1,SP,10,2017-10-02 10:56:33\n\
///            o2,,5,not a date\n";
/// let table = normalize(&RawTable::from_csv(csv).unwrap());
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.year(0), Some(2017));
/// assert_eq!(table.year_month(0).as_deref(), Some("2017-10"));
/// assert_eq!(table.year(1), None);
///
/// let region = table.categorical(Field::CustomerState).unwrap();
/// assert_eq!(table.label(region.category_at(1)), Label::Unset);
/// ```

use crate::column::{
    CategoricalColumn, Category, Column, IdColumn, Label, NumericColumn, RawValue,
    TimestampColumn,
};
use crate::error::{DataLoadError, ParseWarning};
use crate::interner::StringInterner;
use crate::raw::RawTable;
use crate::schema::{Field, FieldKind};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;

/// Year / month bucket derived from the purchase timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TimeBucket {
    pub year: i32,
    pub month: u32,
}

impl TimeBucket {
    pub fn from_timestamp(ts: &NaiveDateTime) -> Self {
        TimeBucket {
            year: ts.year(),
            month: ts.month(),
        }
    }

    /// `YYYY-MM` key; sorts lexically in chronological order.
    pub fn year_month(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Knobs for normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Trim categorical values before storing them.
    pub trim_categorical: bool,
    /// Parse warnings beyond this many are counted but not logged or sampled.
    pub max_logged_warnings: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        NormalizeOptions {
            trim_categorical: true,
            max_logged_warnings: 20,
        }
    }
}

/// What happened while producing a normalized table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    /// Known fields with no column in the source.
    pub absent_fields: Vec<Field>,
    /// Values nulled by failed coercion, per field.
    pub parse_warnings: BTreeMap<Field, usize>,
    /// The first few warnings, in row order per field.
    pub sample_warnings: Vec<ParseWarning>,
    /// Set when the source could not be loaded and the table is empty.
    pub load_error: Option<String>,
}

impl LoadReport {
    pub fn total_parse_warnings(&self) -> usize {
        self.parse_warnings.values().sum()
    }

    pub fn is_clean(&self) -> bool {
        self.load_error.is_none() && self.parse_warnings.is_empty()
    }

    /// Report for a source that failed to load.
    pub fn failed(error: &DataLoadError) -> Self {
        LoadReport {
            load_error: Some(error.to_string()),
            ..LoadReport::default()
        }
    }
}

/// Immutable, typed transaction table.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    dictionary: StringInterner,
    row_count: usize,
    order_id: Option<IdColumn>,
    customer_id: Option<IdColumn>,
    region: Option<CategoricalColumn>,
    category: Option<CategoricalColumn>,
    payment_type: Option<CategoricalColumn>,
    price: Option<NumericColumn>,
    payment_value: Option<NumericColumn>,
    timestamps: BTreeMap<Field, TimestampColumn>,
    buckets: Option<Column<Option<TimeBucket>>>,
}

/// Normalize a raw table with default options.
pub fn normalize(raw: &RawTable) -> NormalizedTable {
    normalize_with_report(raw, &NormalizeOptions::default()).0
}

/// Normalize a raw table, also returning the load report.
pub fn normalize_with_report(
    raw: &RawTable,
    options: &NormalizeOptions,
) -> (NormalizedTable, LoadReport) {
    Normalizer::new(raw, options).run()
}

impl NormalizedTable {
    /// Empty table in which every known field is present.
    ///
    /// Returned in place of a table that failed to load, so aggregations
    /// produce empty results instead of "unavailable".
    pub fn empty() -> Self {
        NormalizedTable {
            dictionary: StringInterner::new(),
            row_count: 0,
            order_id: Some(Column::new(Field::OrderId, Vec::new())),
            customer_id: Some(Column::new(Field::CustomerId, Vec::new())),
            region: Some(Column::new(Field::CustomerState, Vec::new())),
            category: Some(Column::new(Field::ProductCategory, Vec::new())),
            payment_type: Some(Column::new(Field::PaymentType, Vec::new())),
            price: Some(Column::new(Field::Price, Vec::new())),
            payment_value: Some(Column::new(Field::PaymentValue, Vec::new())),
            timestamps: Field::TIMESTAMPS
                .iter()
                .map(|&f| (f, Column::new(f, Vec::new())))
                .collect(),
            buckets: Some(Column::new(Field::PurchasedAt, Vec::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    pub fn dictionary(&self) -> &StringInterner {
        &self.dictionary
    }

    /// True if the source had a column for `field`.
    pub fn has_field(&self, field: Field) -> bool {
        match field.kind() {
            FieldKind::Identifier => self.identifiers(field).is_some(),
            FieldKind::Categorical => self.categorical(field).is_some(),
            FieldKind::Numeric => self.numeric(field).is_some(),
            FieldKind::Timestamp => self.timestamps.contains_key(&field),
        }
    }

    pub fn absent_fields(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|&f| !self.has_field(f))
            .collect()
    }

    pub fn identifiers(&self, field: Field) -> Option<&IdColumn> {
        match field {
            Field::OrderId => self.order_id.as_ref(),
            Field::CustomerId => self.customer_id.as_ref(),
            _ => None,
        }
    }

    pub fn categorical(&self, field: Field) -> Option<&CategoricalColumn> {
        match field {
            Field::CustomerState => self.region.as_ref(),
            Field::ProductCategory => self.category.as_ref(),
            Field::PaymentType => self.payment_type.as_ref(),
            _ => None,
        }
    }

    pub fn numeric(&self, field: Field) -> Option<&NumericColumn> {
        match field {
            Field::Price => self.price.as_ref(),
            Field::PaymentValue => self.payment_value.as_ref(),
            _ => None,
        }
    }

    pub fn timestamp(&self, field: Field) -> Option<&TimestampColumn> {
        self.timestamps.get(&field)
    }

    /// Derived year/month buckets; present iff the purchase column is.
    pub fn time_buckets(&self) -> Option<&Column<Option<TimeBucket>>> {
        self.buckets.as_ref()
    }

    pub fn time_bucket(&self, row: usize) -> Option<TimeBucket> {
        self.buckets.as_ref().and_then(|b| b.value_at(row))
    }

    pub fn year(&self, row: usize) -> Option<i32> {
        self.time_bucket(row).map(|b| b.year)
    }

    pub fn month(&self, row: usize) -> Option<u32> {
        self.time_bucket(row).map(|b| b.month)
    }

    pub fn year_month(&self, row: usize) -> Option<String> {
        self.time_bucket(row).map(|b| b.year_month())
    }

    /// Resolve a stored category to its label.
    pub fn label(&self, category: Category) -> Label {
        match category {
            Category::Value(id) => match self.dictionary.resolve(id) {
                Some(s) => Label::Value(s.to_string()),
                None => Label::Unset,
            },
            Category::Unset => Label::Unset,
        }
    }

    /// Stored category for a label, or None if no row can carry it.
    pub fn category_for(&self, label: &Label) -> Option<Category> {
        match label {
            Label::Value(s) => self.dictionary.get(s).map(Category::Value),
            Label::Unset => Some(Category::Unset),
        }
    }

    /// Export the known source columns back to a raw table.
    ///
    /// Unset categories and null values export as null, timestamps as
    /// `YYYY-MM-DD HH:MM:SS[.fff]`. Derived buckets are not exported;
    /// normalizing the export rebuilds them.
    pub fn to_raw(&self) -> RawTable {
        let present: Vec<Field> = Field::ALL
            .iter()
            .copied()
            .filter(|&f| self.has_field(f))
            .collect();
        let mut raw = RawTable::new(present.iter().map(|f| f.column_name().to_string()).collect());

        for row in 0..self.row_count {
            let values = present.iter().map(|&f| self.raw_value(f, row)).collect();
            raw.push_row(values);
        }
        raw
    }

    /// CSV form of `to_raw`. Fails with `MissingHeader` when the source had
    /// none of the known columns, since such an export could not be read back.
    pub fn to_csv(&self) -> Result<String, DataLoadError> {
        self.to_raw().to_csv()
    }

    fn raw_value(&self, field: Field, row: usize) -> RawValue {
        let text = |id| {
            self.dictionary
                .resolve(id)
                .map(|s| RawValue::Text(s.to_string()))
                .unwrap_or(RawValue::Null)
        };
        match field.kind() {
            FieldKind::Identifier => self
                .identifiers(field)
                .and_then(|c| c.value_at(row))
                .map(text)
                .unwrap_or(RawValue::Null),
            FieldKind::Categorical => match self.categorical(field).map(|c| c.category_at(row)) {
                Some(Category::Value(id)) => text(id),
                _ => RawValue::Null,
            },
            FieldKind::Numeric => self
                .numeric(field)
                .and_then(|c| c.value_at(row))
                .map(RawValue::Float)
                .unwrap_or(RawValue::Null),
            FieldKind::Timestamp => self
                .timestamp(field)
                .and_then(|c| c.value_at(row))
                .map(|ts| RawValue::Text(format_timestamp(&ts)))
                .unwrap_or(RawValue::Null),
        }
    }
}

struct Normalizer<'a> {
    raw: &'a RawTable,
    options: &'a NormalizeOptions,
    dictionary: StringInterner,
    report: LoadReport,
}

impl<'a> Normalizer<'a> {
    fn new(raw: &'a RawTable, options: &'a NormalizeOptions) -> Self {
        Normalizer {
            raw,
            options,
            dictionary: StringInterner::new(),
            report: LoadReport {
                rows: raw.len(),
                ..LoadReport::default()
            },
        }
    }

    fn run(mut self) -> (NormalizedTable, LoadReport) {
        for name in self.raw.columns() {
            if Field::from_column_name(name).is_none() {
                log::debug!("ignoring column '{}' outside the known schema", name);
            }
        }

        let mut table = NormalizedTable {
            dictionary: StringInterner::new(),
            row_count: self.raw.len(),
            order_id: None,
            customer_id: None,
            region: None,
            category: None,
            payment_type: None,
            price: None,
            payment_value: None,
            timestamps: BTreeMap::new(),
            buckets: None,
        };

        // Field::ALL order fixes dictionary IDs, which keeps output deterministic.
        for field in Field::ALL {
            let Some(col_idx) = self.raw.column_index(field.column_name()) else {
                log::debug!("column '{}' is absent", field);
                self.report.absent_fields.push(field);
                continue;
            };

            match field {
                Field::OrderId => table.order_id = Some(self.identifier_column(field, col_idx)),
                Field::CustomerId => {
                    table.customer_id = Some(self.identifier_column(field, col_idx))
                }
                Field::CustomerState => {
                    table.region = Some(self.categorical_column(field, col_idx))
                }
                Field::ProductCategory => {
                    table.category = Some(self.categorical_column(field, col_idx))
                }
                Field::PaymentType => {
                    table.payment_type = Some(self.categorical_column(field, col_idx))
                }
                Field::Price => table.price = Some(self.numeric_column(field, col_idx)),
                Field::PaymentValue => {
                    table.payment_value = Some(self.numeric_column(field, col_idx))
                }
                Field::PurchasedAt
                | Field::ApprovedAt
                | Field::DeliveredCarrierAt
                | Field::DeliveredCustomerAt
                | Field::EstimatedDeliveryAt => {
                    let column = self.timestamp_column(field, col_idx);
                    table.timestamps.insert(field, column);
                }
            }
        }

        table.buckets = table.timestamps.get(&Field::PurchasedAt).map(|purchased| {
            let buckets = purchased
                .iter()
                .map(|ts| ts.as_ref().map(TimeBucket::from_timestamp))
                .collect();
            Column::new(Field::PurchasedAt, buckets)
        });
        table.dictionary = self.dictionary;

        let total = self.report.total_parse_warnings();
        if total > self.options.max_logged_warnings {
            log::debug!(
                "{} further parse warnings not logged",
                total - self.options.max_logged_warnings
            );
        }
        log::info!(
            "normalized {} rows ({} parse warnings, {} absent columns)",
            table.row_count,
            total,
            self.report.absent_fields.len()
        );

        (table, self.report)
    }

    fn cells(&self, col_idx: usize) -> impl Iterator<Item = &'a RawValue> + 'a {
        let raw = self.raw;
        (0..raw.len()).map(move |row| raw.value_by_index(row, col_idx))
    }

    fn warn(&mut self, field: Field, row: usize, value: &RawValue) {
        let total = self.report.total_parse_warnings();
        *self.report.parse_warnings.entry(field).or_insert(0) += 1;

        if total < self.options.max_logged_warnings {
            let warning = ParseWarning {
                field,
                row,
                value: value.render(),
            };
            log::debug!("{}", warning);
            self.report.sample_warnings.push(warning);
        }
    }

    fn identifier_column(&mut self, field: Field, col_idx: usize) -> IdColumn {
        let mut values = Vec::with_capacity(self.raw.len());
        for value in self.cells(col_idx) {
            let id = if value.is_blank() {
                None
            } else {
                Some(self.dictionary.intern(value.render().trim()))
            };
            values.push(id);
        }
        Column::new(field, values)
    }

    fn categorical_column(&mut self, field: Field, col_idx: usize) -> CategoricalColumn {
        let mut values = Vec::with_capacity(self.raw.len());
        for value in self.cells(col_idx) {
            let category = if value.is_blank() {
                Category::Unset
            } else {
                let text = value.render();
                let text = if self.options.trim_categorical {
                    text.trim()
                } else {
                    text.as_str()
                };
                Category::Value(self.dictionary.intern(text))
            };
            values.push(category);
        }
        Column::new(field, values)
    }

    fn numeric_column(&mut self, field: Field, col_idx: usize) -> NumericColumn {
        let mut values = Vec::with_capacity(self.raw.len());
        for (row, value) in self.cells(col_idx).enumerate() {
            if value.is_blank() {
                values.push(None);
                continue;
            }
            let parsed = match value {
                RawValue::Text(s) => s.trim().parse::<f64>().ok(),
                other => other.as_f64(),
            };
            match parsed.filter(|n| n.is_finite()) {
                Some(n) => values.push(Some(n)),
                None => {
                    self.warn(field, row, value);
                    values.push(None);
                }
            }
        }
        Column::new(field, values)
    }

    fn timestamp_column(&mut self, field: Field, col_idx: usize) -> TimestampColumn {
        let mut values = Vec::with_capacity(self.raw.len());
        for (row, value) in self.cells(col_idx).enumerate() {
            if value.is_blank() {
                values.push(None);
                continue;
            }
            match value.as_text().and_then(parse_timestamp) {
                Some(ts) => values.push(Some(ts)),
                None => {
                    self.warn(field, row, value);
                    values.push(None);
                }
            }
        }
        Column::new(field, values)
    }
}

const NAIVE_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp string.
///
/// Accepts RFC 3339 with an offset (converted to UTC), naive
/// `YYYY-MM-DD[ T]HH:MM[:SS[.fff]]`, and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`, with fractional seconds only
/// when present.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()
}
