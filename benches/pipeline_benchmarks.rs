use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shopdash::*;

const REGIONS: [&str; 6] = ["SP", "RJ", "MG", "RS", "PR", ""];
const CATEGORIES: [&str; 7] = [
    "bed_bath_table",
    "health_beauty",
    "sports_leisure",
    "furniture_decor",
    "computers_accessories",
    "toys",
    "",
];
const PAYMENTS: [&str; 4] = ["credit_card", "boleto", "voucher", "debit_card"];

fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from(
        "order_id,customer_id,customer_state,product_category_name_english,price,payment_type,payment_value,order_purchase_timestamp\n",
    );
    for i in 0..rows {
        let year = 2016 + (i % 3);
        let month = 1 + (i % 12);
        csv.push_str(&format!(
            "o{},c{},{},{},{}.{:02},{},{}.50,{}-{:02}-{:02} 12:{:02}:00\n",
            i / 2,
            i % (rows / 4 + 1),
            REGIONS[i % REGIONS.len()],
            CATEGORIES[i % CATEGORIES.len()],
            10 + i % 490,
            i % 100,
            PAYMENTS[i % PAYMENTS.len()],
            20 + i % 300,
            year,
            month,
            1 + i % 28,
            i % 60,
        ));
    }
    csv
}

fn bench_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");

    for size in [1000, 10000, 50000].iter() {
        let raw = RawTable::from_csv(&synthetic_csv(*size)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| normalize(black_box(&raw)));
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter");

    for size in [1000, 10000, 50000].iter() {
        let table = normalize(&RawTable::from_csv(&synthetic_csv(*size)).unwrap());
        let spec = FilterSpec::new([2017, 2018], [Label::value("SP"), Label::value("MG"), Label::Unset]);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| filter(&table, black_box(&spec)).len());
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [1000, 10000, 50000].iter() {
        let table = normalize(&RawTable::from_csv(&synthetic_csv(*size)).unwrap());
        let view = FilteredView::all(&table);

        group.bench_with_input(BenchmarkId::new("by_category", size), size, |b, _| {
            b.iter(|| by_category(black_box(&view)));
        });
        group.bench_with_input(BenchmarkId::new("by_region", size), size, |b, _| {
            b.iter(|| by_region(black_box(&view)));
        });
        group.bench_with_input(BenchmarkId::new("revenue_by_month", size), size, |b, _| {
            b.iter(|| revenue_by_month(black_box(&view)));
        });
        group.bench_with_input(BenchmarkId::new("kpis", size), size, |b, _| {
            b.iter(|| kpis(black_box(&view)));
        });
    }
    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let table = normalize(&RawTable::from_csv(&synthetic_csv(10000)).unwrap());
    let spec = FilterSpec::years([2018]);

    c.bench_function("snapshot_10000", |b| {
        b.iter(|| DashboardSnapshot::compute(&filter(&table, black_box(&spec))));
    });
}

criterion_group!(benches, bench_normalize, bench_filter, bench_aggregate, bench_snapshot);
criterion_main!(benches);
