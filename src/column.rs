/// Column values and typed columns
///
/// Raw tables hold loosely typed `RawValue` cells exactly as the source gave
/// them. Normalization turns each known field into a typed `Column<T>`:
///
/// - categorical fields become `Column<Category>` (a dictionary ID or the
///   unset sentinel, never null)
/// - identifiers become `Column<Option<StringId>>`
/// - numeric fields become `Column<Option<f64>>`
/// - timestamps become `Column<Option<NaiveDateTime>>`
///
/// A field whose column is absent from the source has no `Column` at all,
/// which keeps "column doesn't exist" apart from "value is missing".

use crate::interner::StringId;
use crate::schema::Field;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Cell value as read from a source file, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    /// True for null and for text that is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            RawValue::Int(n) => Some(*n as f64),
            RawValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text rendering used for CSV cells and warning messages.
    /// Null renders as the empty string.
    pub fn render(&self) -> String {
        match self {
            RawValue::Null => String::new(),
            RawValue::Bool(b) => b.to_string(),
            RawValue::Int(n) => n.to_string(),
            RawValue::Float(f) => f.to_string(),
            RawValue::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        RawValue::Text(s)
    }
}

impl From<f64> for RawValue {
    fn from(f: f64) -> Self {
        RawValue::Float(f)
    }
}

impl From<i64> for RawValue {
    fn from(n: i64) -> Self {
        RawValue::Int(n)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawValue::Null)
    }
}

/// Normalized categorical cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Value(StringId),
    /// The column exists but this row has no value.
    Unset,
}

/// A resolved categorical value, used as a group key and in filters.
///
/// Ordering puts every real value before `Unset`, and real values compare
/// as strings. That ordering is the tie-break for all count-sorted results.
///
/// The text form spells `Unset` as `(unset)`. A real value that is literally
/// `(unset)`, or that starts with a backslash, is written with one leading
/// backslash, so `Display` and `FromStr` never confuse the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    Value(String),
    Unset,
}

impl Label {
    /// Text used for the unset sentinel in `Display` and `FromStr`.
    pub const UNSET_TEXT: &'static str = "(unset)";
    /// Prefix marking a real value that would otherwise read as the sentinel.
    pub const ESCAPE: char = '\\';

    pub fn value(s: impl Into<String>) -> Self {
        Label::Value(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Label::Value(s) => Some(s),
            Label::Unset => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Label::Unset)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Value(s) if s == Label::UNSET_TEXT || s.starts_with(Label::ESCAPE) => {
                f.pad(&format!("{}{}", Label::ESCAPE, s))
            }
            Label::Value(s) => f.pad(s),
            Label::Unset => f.pad(Label::UNSET_TEXT),
        }
    }
}

impl FromStr for Label {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some(escaped) = trimmed.strip_prefix(Label::ESCAPE) {
            Ok(Label::Value(escaped.to_string()))
        } else if trimmed.is_empty() || trimmed == Label::UNSET_TEXT {
            Ok(Label::Unset)
        } else {
            Ok(Label::Value(trimmed.to_string()))
        }
    }
}

/// Serialized as the plain string, or `null` for the unset sentinel.
impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Label::Value(s) => serializer.serialize_str(s),
            Label::Unset => serializer.serialize_none(),
        }
    }
}

/// A typed, immutable column of a normalized table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column<T> {
    field: Field,
    values: Vec<T>,
}

pub type CategoricalColumn = Column<Category>;
pub type IdColumn = Column<Option<StringId>>;
pub type NumericColumn = Column<Option<f64>>;
pub type TimestampColumn = Column<Option<NaiveDateTime>>;

impl<T> Column<T> {
    pub fn new(field: Field, values: Vec<T>) -> Self {
        Column { field, values }
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }
}

impl<T: Copy> Column<Option<T>> {
    /// Value at `index`, or None if null or out of bounds.
    #[inline]
    pub fn value_at(&self, index: usize) -> Option<T> {
        self.values.get(index).copied().flatten()
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        self.value_at(index).is_none()
    }

    pub fn count_non_null(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl Column<Category> {
    /// Category at `index`; out-of-bounds reads as unset.
    #[inline]
    pub fn category_at(&self, index: usize) -> Category {
        self.values.get(index).copied().unwrap_or(Category::Unset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_blank() {
        assert!(RawValue::Null.is_blank());
        assert!(RawValue::from("   ").is_blank());
        assert!(!RawValue::from("SP").is_blank());
        assert!(!RawValue::Int(0).is_blank());
    }

    #[test]
    fn test_raw_value_render() {
        assert_eq!(RawValue::Null.render(), "");
        assert_eq!(RawValue::Float(10.5).render(), "10.5");
        assert_eq!(RawValue::Int(42).render(), "42");
        assert_eq!(RawValue::from(Some("x")).render(), "x");
        assert_eq!(RawValue::from(None::<f64>), RawValue::Null);
    }

    #[test]
    fn test_label_ordering_puts_unset_last() {
        let mut labels = vec![Label::Unset, Label::value("toys"), Label::value("books")];
        labels.sort();
        assert_eq!(labels, vec![Label::value("books"), Label::value("toys"), Label::Unset]);
    }

    #[test]
    fn test_label_parse_and_display() {
        assert_eq!("SP".parse::<Label>().unwrap(), Label::value("SP"));
        assert_eq!(" (unset) ".parse::<Label>().unwrap(), Label::Unset);
        assert_eq!(Label::Unset.to_string(), "(unset)");
        assert_eq!(serde_json::to_string(&Label::Unset).unwrap(), "null");
        assert_eq!(serde_json::to_string(&Label::value("RJ")).unwrap(), "\"RJ\"");
    }

    #[test]
    fn test_label_text_keeps_real_value_apart_from_unset() {
        let literal = Label::value("(unset)");
        assert_eq!(literal.to_string(), "\\(unset)");
        assert_ne!(literal.to_string(), Label::Unset.to_string());
        assert_eq!("\\(unset)".parse::<Label>().unwrap(), literal);
        assert_eq!(serde_json::to_string(&literal).unwrap(), "\"(unset)\"");

        let backslashed = Label::value("\\x");
        assert_eq!(backslashed.to_string(), "\\\\x");
        assert_eq!(backslashed.to_string().parse::<Label>().unwrap(), backslashed);

        for label in [Label::Unset, Label::value("SP"), literal] {
            assert_eq!(label.to_string().parse::<Label>().unwrap(), label);
        }
    }

    #[test]
    fn test_nullable_column_access() {
        let col: NumericColumn = Column::new(Field::Price, vec![Some(1.5), None, Some(2.0)]);
        assert_eq!(col.len(), 3);
        assert_eq!(col.value_at(0), Some(1.5));
        assert!(col.is_null_at(1));
        assert!(col.is_null_at(10));
        assert_eq!(col.count_non_null(), 2);
    }

    #[test]
    fn test_categorical_column_access() {
        let col: CategoricalColumn =
            Column::new(Field::PaymentType, vec![Category::Value(0), Category::Unset]);
        assert_eq!(col.category_at(0), Category::Value(0));
        assert_eq!(col.category_at(1), Category::Unset);
        assert_eq!(col.field(), Field::PaymentType);
    }
}
