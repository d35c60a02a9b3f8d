/// Every dashboard result for one filtered view, computed together.

use crate::aggregate::{
    by_category, by_payment_type, by_region, revenue_by_month, revenue_by_year, AggregateResult,
    CategoryStats, MonthRevenue, PaymentStats, RegionStats, YearRevenue,
};
use crate::kpi::KpiSet;
use crate::view::{FilterSpec, FilteredView};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// Rows in the view the snapshot was computed from.
    pub row_count: usize,
    pub kpis: KpiSet,
    pub categories: AggregateResult<CategoryStats>,
    pub revenue_by_year: AggregateResult<YearRevenue>,
    pub revenue_by_month: AggregateResult<MonthRevenue>,
    pub regions: AggregateResult<RegionStats>,
    pub payment_types: AggregateResult<PaymentStats>,
}

impl DashboardSnapshot {
    pub fn compute(view: &FilteredView<'_>) -> Self {
        DashboardSnapshot {
            row_count: view.len(),
            kpis: KpiSet::compute(view),
            categories: by_category(view),
            revenue_by_year: revenue_by_year(view),
            revenue_by_month: revenue_by_month(view),
            regions: by_region(view),
            payment_types: by_payment_type(view),
        }
    }

    /// Keep only the `n` best-selling categories.
    pub fn with_top_categories(mut self, n: usize) -> Self {
        self.categories = self.categories.top_n(n);
        self
    }
}

/// A snapshot together with the filter that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSnapshot {
    pub filter: FilterSpec,
    #[serde(flatten)]
    pub snapshot: DashboardSnapshot,
}
