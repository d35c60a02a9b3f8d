/// Filtered views over a normalized table
///
/// A `FilteredView` is an index set into a `NormalizedTable`: the rows that
/// pass a `FilterSpec`, in table order. The view borrows the table and never
/// copies or mutates it; each query builds its own view.

use crate::column::{Category, Label};
use crate::schema::Field;
use crate::table::NormalizedTable;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Selected years and regions. An empty set leaves that dimension
/// unrestricted; both dimensions combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    selected_years: BTreeSet<i32>,
    selected_regions: BTreeSet<Label>,
}

impl FilterSpec {
    pub fn new(
        years: impl IntoIterator<Item = i32>,
        regions: impl IntoIterator<Item = Label>,
    ) -> Self {
        FilterSpec {
            selected_years: years.into_iter().collect(),
            selected_regions: regions.into_iter().collect(),
        }
    }

    /// No restriction on either dimension.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn years(years: impl IntoIterator<Item = i32>) -> Self {
        Self::new(years, [])
    }

    pub fn regions<S: Into<String>>(regions: impl IntoIterator<Item = S>) -> Self {
        Self::new([], regions.into_iter().map(Label::value))
    }

    pub fn selected_years(&self) -> &BTreeSet<i32> {
        &self.selected_years
    }

    pub fn selected_regions(&self) -> &BTreeSet<Label> {
        &self.selected_regions
    }

    pub fn is_unrestricted(&self) -> bool {
        self.selected_years.is_empty() && self.selected_regions.is_empty()
    }
}

/// Rows of a table passing a filter. Maintains a mapping from view
/// positions to table row indices.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    table: &'a NormalizedTable,
    view_to_table: Vec<usize>,
}

/// Apply `spec` to `table`.
pub fn filter<'a>(table: &'a NormalizedTable, spec: &FilterSpec) -> FilteredView<'a> {
    FilteredView::apply(table, spec)
}

impl<'a> FilteredView<'a> {
    /// Every row of `table`.
    pub fn all(table: &'a NormalizedTable) -> Self {
        FilteredView {
            table,
            view_to_table: (0..table.len()).collect(),
        }
    }

    pub fn apply(table: &'a NormalizedTable, spec: &FilterSpec) -> Self {
        if spec.is_unrestricted() {
            return Self::all(table);
        }

        let years = &spec.selected_years;
        if !years.is_empty() && table.time_buckets().is_none() {
            log::warn!(
                "year filter given but column '{}' is absent; no rows can match",
                Field::PurchasedAt
            );
        }

        let regions: Option<HashSet<Category>> = if spec.selected_regions.is_empty() {
            None
        } else {
            if table.categorical(Field::CustomerState).is_none() {
                log::warn!(
                    "region filter given but column '{}' is absent; no rows can match",
                    Field::CustomerState
                );
            }
            // Labels the table never saw cannot match any row.
            Some(
                spec.selected_regions
                    .iter()
                    .filter_map(|label| table.category_for(label))
                    .collect(),
            )
        };
        let region_column = table.categorical(Field::CustomerState);

        let view_to_table = (0..table.len())
            .filter(|&row| {
                let year_ok = years.is_empty()
                    || table.year(row).is_some_and(|year| years.contains(&year));
                let region_ok = match (&regions, region_column) {
                    (None, _) => true,
                    (Some(allowed), Some(column)) => allowed.contains(&column.category_at(row)),
                    (Some(_), None) => false,
                };
                year_ok && region_ok
            })
            .collect();

        FilteredView {
            table,
            view_to_table,
        }
    }

    pub fn table(&self) -> &'a NormalizedTable {
        self.table
    }

    pub fn len(&self) -> usize {
        self.view_to_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view_to_table.is_empty()
    }

    /// Table row indices in the view, ascending.
    pub fn rows(&self) -> &[usize] {
        &self.view_to_table
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.view_to_table.iter().copied()
    }

    /// Table row index for a view position.
    pub fn table_index(&self, view_index: usize) -> Option<usize> {
        self.view_to_table.get(view_index).copied()
    }
}

/// Selectable filter values of a table: what a year / region picker offers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// Distinct non-null purchase years, ascending.
    pub years: Vec<i32>,
    /// Distinct region codes, ascending; the unset sentinel is not listed.
    pub regions: Vec<String>,
    /// True if some row has the region column but no value.
    pub has_unset_region: bool,
}

impl FilterOptions {
    pub fn from_table(table: &NormalizedTable) -> Self {
        let years: BTreeSet<i32> = (0..table.len()).filter_map(|row| table.year(row)).collect();

        let mut regions = BTreeSet::new();
        let mut has_unset_region = false;
        if let Some(column) = table.categorical(Field::CustomerState) {
            let mut seen = HashSet::new();
            for category in column.iter().copied() {
                if !seen.insert(category) {
                    continue;
                }
                match table.label(category) {
                    Label::Value(s) => {
                        regions.insert(s);
                    }
                    Label::Unset => has_unset_region = true,
                }
            }
        }

        FilterOptions {
            years: years.into_iter().collect(),
            regions: regions.into_iter().collect(),
            has_unset_region,
        }
    }
}
