// Dashboard View Assembly
// Computes the tabular results the presentation layer renders: KPI cards,
// trend tables, and the manufacturer growth table

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::aggregate::{
    aggregate_by_group, aggregate_by_maker, filter_groups, filter_makers, filter_year_range,
    rollup_groups, series_for_group, series_for_maker, GroupTotal, MakerTotal, Period,
};
use crate::classifier::{classify, VehicleGroup};
use crate::growth::{growth_rate, kpi_delta};
use crate::loader::LoadedData;

/// At most this many KPI cards are shown, one per vehicle group.
const MAX_KPI_CARDS: usize = 4;

/// The maker multi-select offers at most this many options.
const MAX_MAKER_OPTIONS: usize = 10;

/// The maker trend view keeps the busiest makers of the trailing window.
const TOP_MAKER_COUNT: usize = 15;

// ============================================================================
// FILTERS
// ============================================================================

/// User-facing filter state, one value per sidebar control.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardFilters {
    /// Restrict to electric-vehicle categories (yearly data only).
    pub ev_only: bool,
    /// Inclusive whole-year range; `None` means the full data range.
    pub year_range: Option<(i32, i32)>,
    /// Vehicle-group multi-select; empty selects everything.
    pub groups: Vec<VehicleGroup>,
    /// Maker multi-select; empty selects everything.
    pub makers: Vec<String>,
}

// ============================================================================
// VIEW STRUCTURES
// ============================================================================

/// One KPI card: latest totals and growth deltas for a vehicle group.
/// QoQ comes from the quarterly rollup of monthly data, YoY from yearly data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpiCard {
    pub group: VehicleGroup,
    pub qoq_latest: i64,
    pub qoq_delta: String,
    pub yoy_latest: i64,
    pub yoy_delta: String,
}

/// One row of the manufacturer YoY growth table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MakerGrowthRow {
    pub maker: String,
    /// YoY change in percent, one decimal; `None` when not computable.
    pub yoy_change_pct: Option<f64>,
    /// Latest-period registrations; `None` when the maker has no rows.
    pub latest: Option<i64>,
}

/// Everything the presentation layer renders for one filter state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardData {
    /// Min/max year across both source tables, before range filtering;
    /// bounds for the year-range control.
    pub year_bounds: (i32, i32),
    /// Distinct vehicle groups present in the monthly data (the more
    /// complete category source), sorted.
    pub category_options: Vec<VehicleGroup>,
    /// First ten alphabetically-sorted maker names; empty without maker data.
    pub maker_options: Vec<String>,
    pub has_maker: bool,
    pub kpis: Vec<KpiCard>,
    /// Monthly registrations by (month start, vehicle group).
    pub monthly_trend: Vec<GroupTotal>,
    /// Yearly registrations for the top makers of the trailing window.
    pub top_maker_trend: Vec<MakerTotal>,
    /// YoY growth per maker, sorted by change descending, not-computable last.
    pub maker_growth: Vec<MakerGrowthRow>,
}

/// Outcome of a dashboard pass. Filters eliminating every row is an
/// informational empty state, not an error; aggregation is skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DashboardView {
    Empty,
    Ready(DashboardData),
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        matches!(self, DashboardView::Empty)
    }
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Assemble the dashboard view from freshly loaded sources and filter state.
///
/// Pure over its inputs; every interaction re-runs this pass in full.
pub fn build_dashboard(
    yearly: &LoadedData,
    monthly: &LoadedData,
    filters: &DashboardFilters,
) -> DashboardView {
    let year_bounds = match year_bounds(yearly, monthly) {
        Some(bounds) => bounds,
        None => return DashboardView::Empty,
    };
    let (start_year, end_year) = filters.year_range.unwrap_or(year_bounds);

    let yearly_records = filter_year_range(yearly.records.clone(), start_year, end_year);
    let monthly_records = filter_year_range(monthly.records.clone(), start_year, end_year);

    // Options reflect the year window but not the narrower selections.
    let category_options: Vec<VehicleGroup> = monthly_records
        .iter()
        .map(|r| classify(&r.category))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let maker_options: Vec<String> = if yearly.has_maker {
        yearly_records
            .iter()
            .filter_map(|r| r.maker.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .take(MAX_MAKER_OPTIONS)
            .collect()
    } else {
        Vec::new()
    };

    let yearly_records = filter_groups(yearly_records, &filters.groups);
    let monthly_records = filter_groups(monthly_records, &filters.groups);
    let yearly_records = if yearly.has_maker {
        filter_makers(yearly_records, &filters.makers)
    } else {
        yearly_records
    };

    if yearly_records.is_empty() && monthly_records.is_empty() {
        return DashboardView::Empty;
    }

    let monthly_trend = aggregate_by_group(&monthly_records, Period::Month);
    let topline_q = rollup_groups(&monthly_trend, Period::Quarter);
    let topline_y = aggregate_by_group(&yearly_records, Period::Year);

    let kpis = category_options
        .iter()
        .take(MAX_KPI_CARDS)
        .map(|&group| kpi_card(group, &topline_q, &topline_y))
        .collect();

    let (top_maker_trend, maker_growth) = if yearly.has_maker {
        maker_views(&yearly_records)
    } else {
        (Vec::new(), Vec::new())
    };

    DashboardView::Ready(DashboardData {
        year_bounds,
        category_options,
        maker_options,
        has_maker: yearly.has_maker,
        kpis,
        monthly_trend,
        top_maker_trend,
        maker_growth,
    })
}

/// Min/max year across both datasets; `None` when no records exist at all.
fn year_bounds(yearly: &LoadedData, monthly: &LoadedData) -> Option<(i32, i32)> {
    let years: Vec<i32> = yearly
        .records
        .iter()
        .chain(monthly.records.iter())
        .map(|r| r.date.year())
        .collect();
    let min = *years.iter().min()?;
    let max = *years.iter().max()?;
    Some((min, max))
}

fn kpi_card(group: VehicleGroup, topline_q: &[GroupTotal], topline_y: &[GroupTotal]) -> KpiCard {
    let q_values: Vec<f64> = series_for_group(topline_q, group)
        .into_iter()
        .map(|(_, v)| v)
        .collect();
    let y_values: Vec<f64> = series_for_group(topline_y, group)
        .into_iter()
        .map(|(_, v)| v)
        .collect();

    KpiCard {
        group,
        qoq_latest: q_values.last().copied().unwrap_or(0.0) as i64,
        qoq_delta: kpi_delta(growth_rate(&q_values)),
        yoy_latest: y_values.last().copied().unwrap_or(0.0) as i64,
        yoy_delta: kpi_delta(growth_rate(&y_values)),
    }
}

/// Maker-level views over yearly data: top-maker trend plus growth table.
fn maker_views(yearly_records: &[crate::loader::Record]) -> (Vec<MakerTotal>, Vec<MakerGrowthRow>) {
    let man_yearly = aggregate_by_maker(yearly_records, Period::Year);
    if man_yearly.is_empty() {
        return (Vec::new(), Vec::new());
    }

    // Trailing window: the final period plus the year before it.
    let max_period = man_yearly
        .iter()
        .map(|r| r.period)
        .max()
        .expect("non-empty aggregation");
    let cutoff = max_period
        .with_year(max_period.year() - 1)
        .unwrap_or(max_period);

    let mut window_totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in man_yearly.iter().filter(|r| r.period >= cutoff) {
        *window_totals.entry(row.maker.as_str()).or_insert(0.0) += row.registrations;
    }

    let mut ranked: Vec<(&str, f64)> = window_totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let top_makers: BTreeSet<String> = ranked
        .iter()
        .take(TOP_MAKER_COUNT)
        .map(|(m, _)| m.to_string())
        .collect();

    let top_maker_trend: Vec<MakerTotal> = if top_makers.is_empty() {
        man_yearly.clone()
    } else {
        man_yearly
            .iter()
            .filter(|r| top_makers.contains(&r.maker))
            .cloned()
            .collect()
    };

    let makers: BTreeSet<String> = man_yearly.iter().map(|r| r.maker.clone()).collect();
    let mut maker_growth: Vec<MakerGrowthRow> = makers
        .into_iter()
        .map(|maker| {
            let values: Vec<f64> = series_for_maker(&man_yearly, &maker)
                .into_iter()
                .map(|(_, v)| v)
                .collect();
            MakerGrowthRow {
                maker,
                yoy_change_pct: growth_rate(&values).map(|g| (g * 1000.0).round() / 10.0),
                latest: values.last().map(|v| *v as i64),
            }
        })
        .collect();

    // Change descending; not-computable rows sink to the bottom.
    maker_growth.sort_by(|a, b| match (a.yoy_change_pct, b.yoy_change_pct) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.maker.cmp(&b.maker),
    });

    (top_maker_trend, maker_growth)
}

/// Render a registration count with thousands separators for KPI display.
pub fn format_count(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::Record;
    use chrono::NaiveDate;

    fn record(date: (i32, u32, u32), category: &str, maker: Option<&str>, n: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            state: None,
            rto: None,
            maker: maker.map(|m| m.to_string()),
            category: category.to_string(),
            registrations: n,
        }
    }

    fn yearly_fixture() -> LoadedData {
        LoadedData {
            records: vec![
                record((2021, 1, 1), "Motor Cycle", Some("Hero"), 100.0),
                record((2022, 1, 1), "Motor Cycle", Some("Hero"), 150.0),
                record((2021, 1, 1), "Motor Car", Some("Maruti"), 80.0),
                record((2022, 1, 1), "Motor Car", Some("Maruti"), 60.0),
            ],
            has_maker: true,
        }
    }

    fn monthly_fixture() -> LoadedData {
        LoadedData {
            records: vec![
                record((2022, 1, 1), "2W", None, 10.0),
                record((2022, 4, 1), "2W", None, 20.0),
                record((2022, 7, 1), "2W", None, 30.0),
                record((2022, 1, 1), "4W", None, 5.0),
            ],
            has_maker: false,
        }
    }

    #[test]
    fn test_dashboard_assembly() {
        let view = build_dashboard(
            &yearly_fixture(),
            &monthly_fixture(),
            &DashboardFilters::default(),
        );
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        assert_eq!(data.year_bounds, (2021, 2022));
        assert_eq!(
            data.category_options,
            vec![VehicleGroup::TwoWheeler, VehicleGroup::FourWheeler]
        );
        assert_eq!(data.maker_options, vec!["Hero", "Maruti"]);
        assert!(data.has_maker);

        // 2W KPI: quarterly series 10, 20, 30 -> QoQ +50%; yearly 100 -> 150.
        let two_w = data
            .kpis
            .iter()
            .find(|k| k.group == VehicleGroup::TwoWheeler)
            .unwrap();
        assert_eq!(two_w.qoq_latest, 30);
        assert_eq!(two_w.qoq_delta, "+50.0%");
        assert_eq!(two_w.yoy_latest, 150);
        assert_eq!(two_w.yoy_delta, "+50.0%");

        // 4W KPI: one quarterly point -> growth not computable.
        let four_w = data
            .kpis
            .iter()
            .find(|k| k.group == VehicleGroup::FourWheeler)
            .unwrap();
        assert_eq!(four_w.qoq_delta, "n/a");
        assert_eq!(four_w.yoy_delta, "-25.0%");
    }

    #[test]
    fn test_maker_growth_sorted_descending() {
        let view = build_dashboard(
            &yearly_fixture(),
            &monthly_fixture(),
            &DashboardFilters::default(),
        );
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        assert_eq!(data.maker_growth.len(), 2);
        assert_eq!(data.maker_growth[0].maker, "Hero");
        assert_eq!(data.maker_growth[0].yoy_change_pct, Some(50.0));
        assert_eq!(data.maker_growth[0].latest, Some(150));
        assert_eq!(data.maker_growth[1].maker, "Maruti");
        assert_eq!(data.maker_growth[1].yoy_change_pct, Some(-25.0));
    }

    #[test]
    fn test_group_filter_narrows_both_datasets() {
        let filters = DashboardFilters {
            groups: vec![VehicleGroup::TwoWheeler],
            ..Default::default()
        };
        let view = build_dashboard(&yearly_fixture(), &monthly_fixture(), &filters);
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        assert!(data
            .monthly_trend
            .iter()
            .all(|t| t.group == VehicleGroup::TwoWheeler));
        assert!(data
            .maker_growth
            .iter()
            .all(|row| row.maker == "Hero"));
    }

    #[test]
    fn test_filters_eliminating_everything_yield_empty_state() {
        let filters = DashboardFilters {
            year_range: Some((1990, 1991)),
            ..Default::default()
        };
        let view = build_dashboard(&yearly_fixture(), &monthly_fixture(), &filters);
        assert!(view.is_empty());
    }

    #[test]
    fn test_no_records_at_all_yield_empty_state() {
        let empty = LoadedData {
            records: Vec::new(),
            has_maker: false,
        };
        assert!(build_dashboard(&empty, &empty, &DashboardFilters::default()).is_empty());
    }

    #[test]
    fn test_maker_options_capped_at_ten() {
        let records = (0..15)
            .map(|i| {
                let maker = format!("Maker{i:02}");
                record((2022, 1, 1), "Scooter", Some(maker.as_str()), 1.0)
            })
            .collect();
        let yearly = LoadedData {
            records,
            has_maker: true,
        };
        let view = build_dashboard(&yearly, &monthly_fixture(), &DashboardFilters::default());
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        assert_eq!(data.maker_options.len(), 10);
        assert_eq!(data.maker_options[0], "Maker00");
        assert_eq!(data.maker_options[9], "Maker09");
    }

    #[test]
    fn test_top_maker_trend_keeps_busiest_of_trailing_window() {
        // 20 makers, volumes descending with rank; only the 15 busiest of the
        // trailing window appear in the trend view. The growth table still
        // covers all of them.
        let mut records = Vec::new();
        for i in 0..20 {
            let maker = format!("Maker{i:02}");
            let volume = (100 - i) as f64;
            records.push(record((2021, 1, 1), "Scooter", Some(maker.as_str()), volume));
            records.push(record((2022, 1, 1), "Scooter", Some(maker.as_str()), volume));
        }
        let yearly = LoadedData {
            records,
            has_maker: true,
        };
        let view = build_dashboard(&yearly, &monthly_fixture(), &DashboardFilters::default());
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        let trend_makers: std::collections::BTreeSet<&str> = data
            .top_maker_trend
            .iter()
            .map(|r| r.maker.as_str())
            .collect();
        assert_eq!(trend_makers.len(), 15);
        assert!(trend_makers.contains("Maker00"));
        assert!(trend_makers.contains("Maker14"));
        assert!(!trend_makers.contains("Maker15"));
        assert_eq!(data.maker_growth.len(), 20);
    }

    #[test]
    fn test_no_maker_column_hides_maker_views() {
        let yearly = LoadedData {
            records: vec![record((2022, 1, 1), "Scooter", None, 10.0)],
            has_maker: false,
        };
        let view = build_dashboard(&yearly, &monthly_fixture(), &DashboardFilters::default());
        let data = match view {
            DashboardView::Ready(data) => data,
            DashboardView::Empty => panic!("expected a populated dashboard"),
        };

        assert!(!data.has_maker);
        assert!(data.maker_options.is_empty());
        assert!(data.top_maker_trend.is_empty());
        assert!(data.maker_growth.is_empty());
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(-4500), "-4,500");
    }
}
