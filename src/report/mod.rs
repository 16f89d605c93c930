mod cache;
mod fetch;
mod metrics;
mod model;
mod query;

pub use cache::TtlCache;
pub use fetch::{ReportFetcher, DEFAULT_CACHE_TTL};
pub use metrics::{
    aggregate, monthly_revenue, top_customers, top_products, MonthlyRevenue, ReportMetrics,
    RevenueShare, NO_CUSTOMER,
};
pub use model::{CellValue, ColumnKind, ReportColumn, ReportRow, ReportTable};
pub use query::{build, build_request, min_date, BuiltQuery, QueryParam, SearchRequest};
