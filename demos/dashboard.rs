/// Dashboard Example
///
/// This example demonstrates:
/// - Building a raw table row by row
/// - Normalizing it and inspecting the load report
/// - Filtering by year and region
/// - Computing KPIs and grouped breakdowns

use shopdash::{
    by_category, by_payment_type, by_region, filter, kpis, normalize_with_report, revenue_by_month,
    AggregateResult, FilterOptions, FilterSpec, Label, NormalizeOptions, RawTable, RawValue,
};
use std::collections::HashMap;

fn main() {
    println!("=== Shopdash Dashboard Example ===\n");

    // 1. Build a small transaction table
    println!("1. Building transaction table...");
    let orders = vec![
        ("o1", "c1", "SP", "toys", "59.90", "credit_card", "2017-11-24 10:12:00"),
        ("o2", "c2", "RJ", "books", "19.50", "boleto", "2018-01-03 18:40:00"),
        ("o2", "c2", "RJ", "toys", "35.00", "boleto", "2018-01-03 18:40:00"),
        ("o3", "c3", "SP", "health_beauty", "120.00", "credit_card", "2018-02-14 09:05:00"),
        ("o4", "c1", "", "books", "n/a", "voucher", "2018-02-20 13:30:00"),
        ("o5", "c4", "MG", "", "88.00", "credit_card", ""),
    ];

    let mut raw = RawTable::default();
    for (order, customer, state, category, price, payment, purchased) in orders {
        let mut row = HashMap::new();
        row.insert("order_id".to_string(), RawValue::from(order));
        row.insert("customer_id".to_string(), RawValue::from(customer));
        row.insert("customer_state".to_string(), RawValue::from(state));
        row.insert("product_category_name_english".to_string(), RawValue::from(category));
        row.insert("price".to_string(), RawValue::from(price));
        row.insert("payment_type".to_string(), RawValue::from(payment));
        row.insert("order_purchase_timestamp".to_string(), RawValue::from(purchased));
        raw.append_row(row);
    }
    println!("   Added {} rows\n", raw.len());

    // 2. Normalize
    println!("2. Normalizing...");
    let (table, report) = normalize_with_report(&raw, &NormalizeOptions::default());
    println!("   Rows: {}", report.rows);
    println!("   Absent columns: {:?}", report.absent_fields);
    for warning in &report.sample_warnings {
        println!("   Warning: {}", warning);
    }
    println!();

    let options = FilterOptions::from_table(&table);
    println!("   Years available: {:?}", options.years);
    println!("   Regions available: {:?} (unset present: {})\n", options.regions, options.has_unset_region);

    // 3. Whole table
    println!("3. KPIs for all rows:");
    let everything = filter(&table, &FilterSpec::all());
    println!("{}\n", kpis(&everything));

    // 4. Filtered view
    println!("4. KPIs for 2018 in SP and RJ:");
    let spec = FilterSpec::new([2018], ["SP", "RJ"].map(Label::value));
    let view = filter(&table, &spec);
    println!("   {} rows match", view.len());
    println!("{}\n", kpis(&view));

    // 5. Breakdowns
    println!("5. Top categories:");
    if let Some(rows) = by_category(&view).top_n(5).rows() {
        for row in rows {
            println!("   {:<16} {:>3} sales  revenue {:?}", row.category, row.sales_count, row.revenue);
        }
    }

    println!("\n   Revenue by month:");
    if let Some(rows) = revenue_by_month(&view).rows() {
        for row in rows {
            println!("   {}  {:>8.2}", row.year_month, row.revenue);
        }
    }

    println!("\n   Regions:");
    if let Some(rows) = by_region(&everything).rows() {
        for row in rows {
            println!("   {:<8} customers {:?}  orders {:?}", row.region, row.customer_count, row.order_count);
        }
    }

    // This source has no payment_value column
    println!("\n   Payment types:");
    match by_payment_type(&everything) {
        AggregateResult::Available(rows) => {
            for row in rows {
                println!("   {:<12} {:>3}  avg {:?}", row.payment_type, row.count, row.avg_value);
            }
        }
        AggregateResult::Unavailable(err) => println!("   unavailable: {}", err),
    }

    println!("\n=== Example Complete ===");
}
