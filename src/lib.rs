/// Shopdash - Sales Dashboard Data Core
///
/// Loads e-commerce transaction tables (CSV or JSON), normalizes them into
/// typed columns, and answers the questions a sales dashboard asks of a
/// filtered slice: summary KPIs and per-category, per-period, per-region
/// and per-payment-type breakdowns. Everything past loading is a pure
/// function of an immutable table and a filter.

pub mod schema;
pub mod error;
pub mod interner;
pub mod column;
pub mod raw;
pub mod table;
pub mod loader;
pub mod view;
pub mod aggregate;
pub mod kpi;
pub mod snapshot;
pub mod cache;
pub mod config;

pub use schema::{Field, FieldKind};
pub use error::{DataLoadError, MissingColumnError, ParseWarning};
pub use interner::{StringId, StringInterner};
pub use column::{Category, Column, Label, RawValue};
pub use raw::RawTable;
pub use table::{
    format_timestamp, normalize, normalize_with_report, parse_timestamp, LoadReport,
    NormalizeOptions, NormalizedTable, TimeBucket,
};
pub use loader::{load_bytes, load_bytes_or_empty, load_path, load_path_or_empty, Loaded, SourceFormat};
pub use view::{filter, FilterOptions, FilterSpec, FilteredView};
pub use aggregate::{
    by_category, by_payment_type, by_region, revenue_by_month, revenue_by_year, AggregateResult,
    CategoryStats, MonthRevenue, PaymentStats, RegionStats, YearRevenue,
};
pub use kpi::{format_money, kpis, KpiSet};
pub use snapshot::{DashboardSnapshot, FilteredSnapshot};
pub use cache::{fingerprint, CachedTable, TableCache};
pub use config::{ConfigError, ReportConfig};
