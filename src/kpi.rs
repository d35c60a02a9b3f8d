/// Scalar summary metrics for a filtered view
///
/// KPI computation never fails: an absent source column contributes zero.

use crate::schema::Field;
use crate::view::FilteredView;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSet {
    /// Sum of non-null prices.
    pub total_revenue: f64,
    /// Distinct non-null order ids.
    pub total_orders: usize,
    /// `total_revenue / total_orders`, or 0 when there are no orders.
    pub avg_order_value: f64,
    /// Distinct non-null customer ids.
    pub unique_customers: usize,
}

impl KpiSet {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        let table = view.table();

        let total_revenue = table
            .numeric(Field::Price)
            .map(|price| view.iter().filter_map(|row| price.value_at(row)).sum())
            .unwrap_or(0.0);

        let distinct = |field: Field| {
            table
                .identifiers(field)
                .map(|column| {
                    view.iter()
                        .filter_map(|row| column.value_at(row))
                        .collect::<HashSet<_>>()
                        .len()
                })
                .unwrap_or(0)
        };
        let total_orders = distinct(Field::OrderId);
        let unique_customers = distinct(Field::CustomerId);

        let avg_order_value = if total_orders > 0 {
            total_revenue / total_orders as f64
        } else {
            0.0
        };

        KpiSet {
            total_revenue,
            total_orders,
            avg_order_value,
            unique_customers,
        }
    }
}

/// KPIs of `view`.
pub fn kpis(view: &FilteredView<'_>) -> KpiSet {
    KpiSet::compute(view)
}

impl fmt::Display for KpiSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Revenue:    $ {}", format_money(self.total_revenue, 0))?;
        writeln!(f, "Total Orders:     {}", group_thousands(self.total_orders.to_string()))?;
        writeln!(f, "Avg Order Value:  $ {}", format_money(self.avg_order_value, 2))?;
        write!(f, "Unique Customers: {}", group_thousands(self.unique_customers.to_string()))
    }
}

/// `amount` rounded to `decimals` places with comma thousands separators.
pub fn format_money(amount: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match formatted.split_once('.') {
        Some((whole, fraction)) => (whole.to_string(), Some(fraction)),
        None => (formatted.clone(), None),
    };

    let mut out = String::new();
    // Avoid "-0" once rounding has erased the value.
    if amount < 0.0 && formatted.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

fn group_thousands(digits: String) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Label;
    use crate::raw::RawTable;
    use crate::table::{normalize, NormalizedTable};
    use crate::view::{filter, FilterSpec};

    fn table_from(csv: &str) -> NormalizedTable {
        normalize(&RawTable::from_csv(csv).unwrap())
    }

    fn kpis_of(view: &FilteredView<'_>) -> KpiSet {
        KpiSet::compute(view)
    }

    fn orders() -> NormalizedTable {
        table_from(
            "\
order_id,customer_id,customer_state,price,order_purchase_timestamp
o1,c1,SP,10,2017-11-20 09:00:00
o2,c2,SP,20,2018-01-05 12:00:00
o2,c2,SP,5,2018-01-05 12:00:00
o3,c3,RJ,,2018-02-10 16:30:00
,c1,MG,2.5,2018-03-01 08:00:00
",
        )
    }

    #[test]
    fn test_compute() {
        let table = orders();
        let set = kpis(&FilteredView::all(&table));

        assert_eq!(set.total_revenue, 37.5);
        assert_eq!(set.total_orders, 3);
        assert_eq!(set.avg_order_value, 12.5);
        assert_eq!(set.unique_customers, 3);
    }

    #[test]
    fn test_absent_columns_give_zero() {
        let table = table_from("customer_state\nSP\nRJ\n");
        assert_eq!(kpis(&FilteredView::all(&table)), KpiSet::default());
    }

    #[test]
    fn test_no_orders_means_zero_average() {
        let table = table_from("price,order_id\n10,\n20,\n");
        let set = kpis_of(&FilteredView::all(&table));
        assert_eq!(set.total_revenue, 30.0);
        assert_eq!(set.total_orders, 0);
        assert_eq!(set.avg_order_value, 0.0);

        let table = orders();
        let view = filter(&table, &FilterSpec::years([1990]));
        assert_eq!(kpis_of(&view).avg_order_value, 0.0);
    }

    #[test]
    fn test_stricter_filter_never_increases_kpis() {
        let table = orders();
        let loose = kpis_of(&filter(&table, &FilterSpec::years([2017, 2018])));
        let strict = kpis_of(&filter(
            &table,
            &FilterSpec::new([2018], [Label::value("SP")]),
        ));

        assert!(strict.total_revenue <= loose.total_revenue);
        assert!(strict.total_orders <= loose.total_orders);
        assert!(strict.unique_customers <= loose.unique_customers);
        assert_eq!(strict.total_revenue, 25.0);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(1234.56, 0), "1,235");
        assert_eq!(format_money(12.346, 2), "12.35");
        assert_eq!(format_money(1234567.0, 2), "1,234,567.00");
        assert_eq!(format_money(0.0, 0), "0");
        assert_eq!(format_money(-1500.0, 0), "-1,500");
        assert_eq!(format_money(-0.001, 2), "0.00");
    }

    #[test]
    fn test_display() {
        let set = KpiSet {
            total_revenue: 1234.6,
            total_orders: 1200,
            avg_order_value: 1.02875,
            unique_customers: 999,
        };
        assert_eq!(
            set.to_string(),
            "Total Revenue:    $ 1,235\n\
             Total Orders:     1,200\n\
             Avg Order Value:  $ 1.03\n\
             Unique Customers: 999"
        );
    }
}
