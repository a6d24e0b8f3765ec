// Vahan Registration Dashboard - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod columns;
pub mod loader;
pub mod classifier;
pub mod growth;
pub mod aggregate;
pub mod cache;
pub mod view;

// Re-export commonly used types
pub use columns::{canonical_header, canonicalize_headers, clean_header, REQUIRED_COLUMNS};
pub use loader::{
    get_parser, load_data, DataPaths, LoadedData, MonthlyParser, Record, SchemaError, SourceMode,
    SourceParser, YearlyParser,
};
pub use classifier::{classify, VehicleGroup};
pub use growth::{growth_rate, kpi_delta};
pub use aggregate::{
    aggregate_by_group, aggregate_by_maker, filter_groups, filter_makers, filter_year_range,
    period_start, rollup_groups, series_for_group, series_for_maker, GroupTotal, MakerTotal,
    Period,
};
pub use cache::{CacheKey, LoadCache};
pub use view::{
    build_dashboard, format_count, DashboardData, DashboardFilters, DashboardView, KpiCard,
    MakerGrowthRow,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
