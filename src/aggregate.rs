/// Grouped aggregations over a filtered view
///
/// Each aggregation groups the view's rows by one key, folds per-group
/// accumulators, then sorts the groups into a fixed order:
///
/// - `by_category`: `sales_count` descending, then category ascending
/// - `revenue_by_year`: year ascending
/// - `revenue_by_month`: `YYYY-MM` ascending
/// - `by_region`: `customer_count` descending, then region ascending
/// - `by_payment_type`: `count` descending, then payment type ascending
///
/// Key ties sort real values alphabetically and the unset sentinel last.
/// When a column an aggregation cannot do without is absent, the result is
/// `Unavailable` and names that column; other aggregations are unaffected.
///
/// Sums skip null values. An absent measure column yields `None` for that
/// measure only.

use crate::column::{Category, Label};
use crate::error::MissingColumnError;
use crate::interner::StringId;
use crate::schema::Field;
use crate::view::FilteredView;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum AggregateResult<T> {
    /// Groups in result order.
    Available(Vec<T>),
    Unavailable(MissingColumnError),
}

impl<T> AggregateResult<T> {
    fn missing(column: Field) -> Self {
        log::debug!("aggregation skipped: column '{}' is absent", column);
        AggregateResult::Unavailable(MissingColumnError::new(column))
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AggregateResult::Available(_))
    }

    pub fn rows(&self) -> Option<&[T]> {
        match self {
            AggregateResult::Available(rows) => Some(rows),
            AggregateResult::Unavailable(_) => None,
        }
    }

    pub fn into_rows(self) -> Option<Vec<T>> {
        match self {
            AggregateResult::Available(rows) => Some(rows),
            AggregateResult::Unavailable(_) => None,
        }
    }

    pub fn missing_column(&self) -> Option<&MissingColumnError> {
        match self {
            AggregateResult::Available(_) => None,
            AggregateResult::Unavailable(err) => Some(err),
        }
    }

    /// Keep only the first `n` groups.
    pub fn top_n(self, n: usize) -> Self {
        match self {
            AggregateResult::Available(mut rows) => {
                rows.truncate(n);
                AggregateResult::Available(rows)
            }
            unavailable => unavailable,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: Label,
    pub sales_count: usize,
    /// None when the price column is absent.
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearRevenue {
    pub year: i32,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRevenue {
    pub year_month: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStats {
    pub region: Label,
    pub customer_count: Option<usize>,
    pub order_count: Option<usize>,
    pub revenue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStats {
    pub payment_type: Label,
    pub count: usize,
    pub total_value: Option<f64>,
    /// `total_value / count` for this group.
    pub avg_value: Option<f64>,
}

/// Count descending, then label ascending.
fn by_count_then_label(count_a: usize, label_a: &Label, count_b: usize, label_b: &Label) -> Ordering {
    count_b.cmp(&count_a).then_with(|| label_a.cmp(label_b))
}

/// Row count and price sum per product category.
pub fn by_category(view: &FilteredView<'_>) -> AggregateResult<CategoryStats> {
    let table = view.table();
    let Some(categories) = table.categorical(Field::ProductCategory) else {
        return AggregateResult::missing(Field::ProductCategory);
    };
    let price = table.numeric(Field::Price);

    let mut groups: HashMap<Category, (usize, f64)> = HashMap::new();
    for row in view.iter() {
        let entry = groups.entry(categories.category_at(row)).or_insert((0, 0.0));
        entry.0 += 1;
        if let Some(p) = price.and_then(|c| c.value_at(row)) {
            entry.1 += p;
        }
    }

    let mut rows: Vec<CategoryStats> = groups
        .into_iter()
        .map(|(category, (sales_count, revenue))| CategoryStats {
            category: table.label(category),
            sales_count,
            revenue: price.map(|_| revenue),
        })
        .collect();
    rows.sort_by(|a, b| by_count_then_label(a.sales_count, &a.category, b.sales_count, &b.category));

    AggregateResult::Available(rows)
}

/// Price sum per purchase year. Rows without a purchase year are skipped.
pub fn revenue_by_year(view: &FilteredView<'_>) -> AggregateResult<YearRevenue> {
    let table = view.table();
    if table.time_buckets().is_none() {
        return AggregateResult::missing(Field::PurchasedAt);
    }
    let Some(price) = table.numeric(Field::Price) else {
        return AggregateResult::missing(Field::Price);
    };

    let mut groups: BTreeMap<i32, f64> = BTreeMap::new();
    for row in view.iter() {
        if let Some(year) = table.year(row) {
            *groups.entry(year).or_insert(0.0) += price.value_at(row).unwrap_or(0.0);
        }
    }

    AggregateResult::Available(
        groups
            .into_iter()
            .map(|(year, revenue)| YearRevenue { year, revenue })
            .collect(),
    )
}

/// Price sum per purchase `YYYY-MM`. Rows without a purchase month are skipped.
pub fn revenue_by_month(view: &FilteredView<'_>) -> AggregateResult<MonthRevenue> {
    let table = view.table();
    if table.time_buckets().is_none() {
        return AggregateResult::missing(Field::PurchasedAt);
    }
    let Some(price) = table.numeric(Field::Price) else {
        return AggregateResult::missing(Field::Price);
    };

    let mut groups: BTreeMap<String, f64> = BTreeMap::new();
    for row in view.iter() {
        if let Some(year_month) = table.year_month(row) {
            *groups.entry(year_month).or_insert(0.0) += price.value_at(row).unwrap_or(0.0);
        }
    }

    AggregateResult::Available(
        groups
            .into_iter()
            .map(|(year_month, revenue)| MonthRevenue { year_month, revenue })
            .collect(),
    )
}

#[derive(Default)]
struct RegionAccumulator {
    customers: HashSet<StringId>,
    orders: HashSet<StringId>,
    revenue: f64,
}

/// Distinct customers, distinct orders and price sum per customer region.
pub fn by_region(view: &FilteredView<'_>) -> AggregateResult<RegionStats> {
    let table = view.table();
    let Some(regions) = table.categorical(Field::CustomerState) else {
        return AggregateResult::missing(Field::CustomerState);
    };
    let customers = table.identifiers(Field::CustomerId);
    let orders = table.identifiers(Field::OrderId);
    let price = table.numeric(Field::Price);

    let mut groups: HashMap<Category, RegionAccumulator> = HashMap::new();
    for row in view.iter() {
        let acc = groups.entry(regions.category_at(row)).or_default();
        if let Some(id) = customers.and_then(|c| c.value_at(row)) {
            acc.customers.insert(id);
        }
        if let Some(id) = orders.and_then(|c| c.value_at(row)) {
            acc.orders.insert(id);
        }
        if let Some(p) = price.and_then(|c| c.value_at(row)) {
            acc.revenue += p;
        }
    }

    let mut rows: Vec<RegionStats> = groups
        .into_iter()
        .map(|(region, acc)| RegionStats {
            region: table.label(region),
            customer_count: customers.map(|_| acc.customers.len()),
            order_count: orders.map(|_| acc.orders.len()),
            revenue: price.map(|_| acc.revenue),
        })
        .collect();
    rows.sort_by(|a, b| {
        by_count_then_label(
            a.customer_count.unwrap_or(0),
            &a.region,
            b.customer_count.unwrap_or(0),
            &b.region,
        )
    });

    AggregateResult::Available(rows)
}

/// Row count, payment value sum and per-group mean per payment type.
pub fn by_payment_type(view: &FilteredView<'_>) -> AggregateResult<PaymentStats> {
    let table = view.table();
    let Some(payment_types) = table.categorical(Field::PaymentType) else {
        return AggregateResult::missing(Field::PaymentType);
    };
    let payment_value = table.numeric(Field::PaymentValue);

    let mut groups: HashMap<Category, (usize, f64)> = HashMap::new();
    for row in view.iter() {
        let entry = groups.entry(payment_types.category_at(row)).or_insert((0, 0.0));
        entry.0 += 1;
        if let Some(v) = payment_value.and_then(|c| c.value_at(row)) {
            entry.1 += v;
        }
    }

    // Groups only exist once a row lands in them, so count >= 1.
    let mut rows: Vec<PaymentStats> = groups
        .into_iter()
        .map(|(payment_type, (count, total))| PaymentStats {
            payment_type: table.label(payment_type),
            count,
            total_value: payment_value.map(|_| total),
            avg_value: payment_value.map(|_| total / count as f64),
        })
        .collect();
    rows.sort_by(|a, b| by_count_then_label(a.count, &a.payment_type, b.count, &b.payment_type));

    AggregateResult::Available(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawTable;
    use crate::table::{normalize, NormalizedTable};
    use crate::view::{filter, FilterSpec};

    fn table_from(csv: &str) -> NormalizedTable {
        normalize(&RawTable::from_csv(csv).unwrap())
    }

    fn orders() -> NormalizedTable {
        table_from(
            "\
order_id,customer_id,customer_state,product_category_name_english,price,payment_type,payment_value,order_purchase_timestamp
o1,c1,SP,toys,10,credit_card,10,2017-11-20 09:00:00
o2,c2,SP,toys,20,credit_card,25,2018-01-05 12:00:00
o2,c2,SP,books,5,voucher,5,2018-01-05 12:00:00
o3,c3,RJ,books,7.5,boleto,,2018-02-10 16:30:00
o4,c1,,,2.5,,4,
",
        )
    }

    #[test]
    fn test_by_category_counts_and_revenue() {
        let table = orders();
        let result = by_category(&FilteredView::all(&table));
        let rows = result.rows().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].category, Label::value("books"));
        assert_eq!(rows[0].sales_count, 2);
        assert_eq!(rows[0].revenue, Some(12.5));
        assert_eq!(rows[1].category, Label::value("toys"));
        assert_eq!(rows[1].revenue, Some(30.0));
        assert_eq!(rows[2].category, Label::Unset);
        assert_eq!(rows[2].sales_count, 1);
    }

    #[test]
    fn test_by_category_sales_count_sums_to_view_len() {
        let table = orders();
        for spec in [FilterSpec::all(), FilterSpec::years([2018]), FilterSpec::regions(["SP"])] {
            let view = filter(&table, &spec);
            let total: usize = by_category(&view)
                .rows()
                .unwrap()
                .iter()
                .map(|r| r.sales_count)
                .sum();
            assert_eq!(total, view.len());
        }
    }

    #[test]
    fn test_by_category_without_price_column() {
        let table = table_from("product_category_name_english\ntoys\ntoys\nbooks\n");
        let rows = by_category(&FilteredView::all(&table)).into_rows().unwrap();

        assert_eq!(rows[0].category, Label::value("toys"));
        assert_eq!(rows[0].sales_count, 2);
        assert_eq!(rows[0].revenue, None);
        assert_eq!(rows[1].revenue, None);
    }

    #[test]
    fn test_by_category_without_category_column() {
        let table = table_from("price\n1\n");
        let result = by_category(&FilteredView::all(&table));
        assert!(!result.is_available());
        assert_eq!(result.missing_column().unwrap().column, Field::ProductCategory);
    }

    #[test]
    fn test_revenue_by_year_and_month() {
        let table = orders();
        let view = FilteredView::all(&table);

        let years = revenue_by_year(&view).into_rows().unwrap();
        assert_eq!(
            years,
            vec![
                YearRevenue { year: 2017, revenue: 10.0 },
                YearRevenue { year: 2018, revenue: 32.5 },
            ]
        );

        let months = revenue_by_month(&view).into_rows().unwrap();
        let keys: Vec<&str> = months.iter().map(|m| m.year_month.as_str()).collect();
        assert_eq!(keys, vec!["2017-11", "2018-01", "2018-02"]);
        assert_eq!(months[1].revenue, 25.0);
    }

    #[test]
    fn test_time_aggregations_need_purchase_and_price() {
        let no_purchase = table_from("price\n1\n");
        let view = FilteredView::all(&no_purchase);
        assert_eq!(
            revenue_by_year(&view).missing_column().unwrap().column,
            Field::PurchasedAt
        );

        let no_price = table_from("order_purchase_timestamp\n2018-01-01 00:00:00\n");
        let view = FilteredView::all(&no_price);
        assert_eq!(revenue_by_month(&view).missing_column().unwrap().column, Field::Price);
    }

    #[test]
    fn test_by_region_distinct_counts() {
        let table = orders();
        let rows = by_region(&FilteredView::all(&table)).into_rows().unwrap();

        assert_eq!(rows[0].region, Label::value("SP"));
        assert_eq!(rows[0].customer_count, Some(2));
        assert_eq!(rows[0].order_count, Some(2));
        assert_eq!(rows[0].revenue, Some(35.0));

        // RJ and the unset group tie on one customer each.
        assert_eq!(rows[1].region, Label::value("RJ"));
        assert_eq!(rows[2].region, Label::Unset);
        assert_eq!(rows[2].customer_count, Some(1));
    }

    #[test]
    fn test_by_region_with_partial_columns() {
        let table = table_from("customer_state,customer_id\nSP,c1\nSP,c1\nRJ,c2\n");
        let rows = by_region(&FilteredView::all(&table)).into_rows().unwrap();

        assert_eq!(rows[0].region, Label::value("RJ"));
        assert_eq!(rows[0].customer_count, Some(1));
        assert_eq!(rows[0].order_count, None);
        assert_eq!(rows[0].revenue, None);
        assert_eq!(rows[1].region, Label::value("SP"));
    }

    #[test]
    fn test_by_payment_type() {
        let table = orders();
        let rows = by_payment_type(&FilteredView::all(&table)).into_rows().unwrap();

        assert_eq!(rows[0].payment_type, Label::value("credit_card"));
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total_value, Some(35.0));
        assert_eq!(rows[0].avg_value, Some(17.5));

        let boleto = rows.iter().find(|r| r.payment_type == Label::value("boleto")).unwrap();
        assert_eq!(boleto.total_value, Some(0.0));
        assert_eq!(boleto.avg_value, Some(0.0));

        assert_eq!(rows.last().unwrap().payment_type, Label::Unset);
        assert!(rows.iter().all(|r| r.count > 0));
    }

    #[test]
    fn test_by_payment_type_without_values() {
        let table = table_from("payment_type\nboleto\nboleto\n");
        let rows = by_payment_type(&FilteredView::all(&table)).into_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].count, 2);
        assert_eq!(rows[0].total_value, None);
        assert_eq!(rows[0].avg_value, None);
    }

    #[test]
    fn test_empty_view_has_no_groups() {
        let table = orders();
        let view = filter(&table, &FilterSpec::years([1999]));
        assert_eq!(by_category(&view).rows().unwrap().len(), 0);
        assert_eq!(by_payment_type(&view).rows().unwrap().len(), 0);
        assert_eq!(revenue_by_year(&view).rows().unwrap().len(), 0);
    }

    #[test]
    fn test_top_n() {
        let table = orders();
        let top = by_category(&FilteredView::all(&table)).top_n(2);
        assert_eq!(top.rows().unwrap().len(), 2);

        let unavailable: AggregateResult<CategoryStats> =
            AggregateResult::Unavailable(MissingColumnError::new(Field::ProductCategory));
        assert!(!unavailable.top_n(2).is_available());
    }

    #[test]
    fn test_serialized_shape() {
        let result: AggregateResult<YearRevenue> =
            AggregateResult::Available(vec![YearRevenue { year: 2018, revenue: 1.5 }]);
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"status":"available","data":[{"year":2018,"revenue":1.5}]}"#
        );

        let missing: AggregateResult<YearRevenue> =
            AggregateResult::Unavailable(MissingColumnError::new(Field::Price));
        assert_eq!(
            serde_json::to_string(&missing).unwrap(),
            r#"{"status":"unavailable","data":{"column":"price"}}"#
        );
    }
}
