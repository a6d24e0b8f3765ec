// Aggregation & Filtering
// Groups canonical records by calendar period and cohort dimension

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classifier::{classify, VehicleGroup};
use crate::loader::Record;

// ============================================================================
// PERIODS
// ============================================================================

/// Calendar bucketing granularity. Each record maps to the start date of the
/// period containing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Period {
    Month,
    Quarter,
    Year,
}

/// Truncate a date to the start of its period.
pub fn period_start(date: NaiveDate, period: Period) -> NaiveDate {
    match period {
        Period::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .expect("first of month is always valid"),
        Period::Quarter => {
            let quarter_month = ((date.month() - 1) / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_month, 1)
                .expect("first of quarter is always valid")
        }
        Period::Year => {
            NaiveDate::from_ymd_opt(date.year(), 1, 1).expect("January 1st is always valid")
        }
    }
}

// ============================================================================
// FILTERS
// ============================================================================

/// Keep records within an inclusive whole-year range.
pub fn filter_year_range(mut records: Vec<Record>, start_year: i32, end_year: i32) -> Vec<Record> {
    records.retain(|r| r.date.year() >= start_year && r.date.year() <= end_year);
    records
}

/// Keep records whose category classifies into one of the selected groups.
/// An empty selection keeps everything (nothing selected means no filter).
pub fn filter_groups(mut records: Vec<Record>, groups: &[VehicleGroup]) -> Vec<Record> {
    if groups.is_empty() {
        return records;
    }
    records.retain(|r| groups.contains(&classify(&r.category)));
    records
}

/// Keep records whose maker is one of the selected makers. An empty selection
/// keeps everything; records without a maker never match a non-empty one.
pub fn filter_makers(mut records: Vec<Record>, makers: &[String]) -> Vec<Record> {
    if makers.is_empty() {
        return records;
    }
    records.retain(|r| r.maker.as_ref().is_some_and(|m| makers.contains(m)));
    records
}

// ============================================================================
// SUMMARY ROWS
// ============================================================================

/// Registrations summed over one (period, vehicle group) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupTotal {
    pub period: NaiveDate,
    pub group: VehicleGroup,
    pub registrations: f64,
}

/// Registrations summed over one (period, maker) cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakerTotal {
    pub period: NaiveDate,
    pub maker: String,
    pub registrations: f64,
}

/// Sum registrations by (period start, vehicle group), ascending by period
/// then group. Every input record lands in exactly one cell.
pub fn aggregate_by_group(records: &[Record], period: Period) -> Vec<GroupTotal> {
    let mut cells: BTreeMap<(NaiveDate, VehicleGroup), f64> = BTreeMap::new();
    for r in records {
        let key = (period_start(r.date, period), classify(&r.category));
        *cells.entry(key).or_insert(0.0) += r.registrations;
    }

    cells
        .into_iter()
        .map(|((period, group), registrations)| GroupTotal {
            period,
            group,
            registrations,
        })
        .collect()
}

/// Sum registrations by (period start, maker), ascending by period then
/// maker. Records without a maker are skipped; callers gate on the load-level
/// maker-availability flag before reaching for this.
pub fn aggregate_by_maker(records: &[Record], period: Period) -> Vec<MakerTotal> {
    let mut cells: BTreeMap<(NaiveDate, String), f64> = BTreeMap::new();
    for r in records {
        if let Some(maker) = &r.maker {
            let key = (period_start(r.date, period), maker.clone());
            *cells.entry(key).or_insert(0.0) += r.registrations;
        }
    }

    cells
        .into_iter()
        .map(|((period, maker), registrations)| MakerTotal {
            period,
            maker,
            registrations,
        })
        .collect()
}

/// Re-bucket group totals to a coarser period (e.g. monthly cells rolled up
/// to quarters).
pub fn rollup_groups(rows: &[GroupTotal], period: Period) -> Vec<GroupTotal> {
    let mut cells: BTreeMap<(NaiveDate, VehicleGroup), f64> = BTreeMap::new();
    for row in rows {
        let key = (period_start(row.period, period), row.group);
        *cells.entry(key).or_insert(0.0) += row.registrations;
    }

    cells
        .into_iter()
        .map(|((period, group), registrations)| GroupTotal {
            period,
            group,
            registrations,
        })
        .collect()
}

/// Ordered time series for one vehicle group: (period start, total) pairs,
/// unique per period, ascending.
pub fn series_for_group(rows: &[GroupTotal], group: VehicleGroup) -> Vec<(NaiveDate, f64)> {
    rows.iter()
        .filter(|r| r.group == group)
        .map(|r| (r.period, r.registrations))
        .collect()
}

/// Ordered time series for one maker.
pub fn series_for_maker(rows: &[MakerTotal], maker: &str) -> Vec<(NaiveDate, f64)> {
    rows.iter()
        .filter(|r| r.maker == maker)
        .map(|r| (r.period, r.registrations))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
