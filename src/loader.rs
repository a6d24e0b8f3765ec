// Data Loader
// Reads the yearly (maker-level) and monthly (wide-format) VAHAN sources and
// normalizes both onto the canonical registration schema

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::columns::{canonicalize_headers, REQUIRED_COLUMNS};

// ============================================================================
// CORE TYPES
// ============================================================================

/// Which source table a load reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceMode {
    /// Row-oriented yearly table, optionally maker-level.
    Yearly,
    /// Wide monthly table: Year, Month, one column per category.
    Monthly,
}

impl SourceMode {
    /// Human-readable name for display and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            SourceMode::Yearly => "yearly",
            SourceMode::Monthly => "monthly",
        }
    }
}

/// One registration record in canonical form.
///
/// `date` is day-level but truncated to the start of the source period
/// (January 1st for yearly rows, first of the month for monthly rows).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub state: Option<String>,
    pub rto: Option<String>,
    pub maker: Option<String>,
    pub category: String,
    pub registrations: f64,
}

/// Output of a load: fresh records plus schema-level metadata.
///
/// `has_maker` is a property of the loaded table, not of individual rows;
/// downstream maker-level analysis is gated on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedData {
    pub records: Vec<Record>,
    pub has_maker: bool,
}

/// Source file locations, overridable from the CLI.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub yearly: PathBuf,
    pub monthly: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            yearly: PathBuf::from("data/yearly.csv"),
            monthly: PathBuf::from("data/month.csv"),
        }
    }
}

impl DataPaths {
    pub fn for_mode(&self, mode: SourceMode) -> &Path {
        match mode {
            SourceMode::Yearly => &self.yearly,
            SourceMode::Monthly => &self.monthly,
        }
    }
}

// ============================================================================
// SCHEMA ERROR
// ============================================================================

/// Fatal load failure: required canonical columns are absent.
///
/// Carries both the original and the canonicalized header row so the message
/// names exactly what was found; no partial table is returned.
#[derive(Debug, Clone)]
pub struct SchemaError {
    pub missing: Vec<String>,
    pub original_headers: Vec<String>,
    pub canonical_headers: Vec<String>,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "source is missing required columns {:?}; found headers {:?} -> canonical {:?}",
            self.missing, self.original_headers, self.canonical_headers
        )
    }
}

impl std::error::Error for SchemaError {}

// ============================================================================
// PARSER TRAIT
// ============================================================================

/// A source parser turns one CSV file into canonical records.
///
/// The two modes differ enough (header canonicalization vs. wide-to-long
/// reshape) that each gets its own implementation behind the common seam.
pub trait SourceParser {
    /// Parse the file at `path`.
    ///
    /// `ev_only` restricts rows to electric-vehicle categories where the
    /// source can express that; parsers without category text at the row
    /// level before reshaping may ignore it.
    fn parse(&self, path: &Path, ev_only: bool) -> Result<LoadedData>;

    /// The mode this parser handles.
    fn mode(&self) -> SourceMode;
}

/// Get the parser for a source mode.
pub fn get_parser(mode: SourceMode) -> Box<dyn SourceParser> {
    match mode {
        SourceMode::Yearly => Box::new(YearlyParser),
        SourceMode::Monthly => Box::new(MonthlyParser),
    }
}

/// Load one source table through its parser.
pub fn load_data(paths: &DataPaths, mode: SourceMode, ev_only: bool) -> Result<LoadedData> {
    get_parser(mode).parse(paths.for_mode(mode), ev_only)
}

// ============================================================================
// COERCION HELPERS
// ============================================================================

/// Electric-vehicle categories are identified by substring, case-insensitive.
static EV_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)ELECTRIC|EV").expect("valid regex"));

/// Coerce a registrations cell to numeric; non-numeric becomes zero.
fn coerce_registrations(cell: &str) -> f64 {
    cell.trim().parse::<f64>().unwrap_or(0.0)
}

/// Parse a year-only date cell to January 1st of that year.
fn parse_year_date(cell: &str) -> Option<NaiveDate> {
    let year: i32 = cell.trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1)
}

/// An optional string field: trimmed, with empty cells absent.
fn optional_field(cell: Option<&str>) -> Option<String> {
    match cell {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

// ============================================================================
// YEARLY PARSER
// ============================================================================

/// Parser for the row-oriented yearly source.
pub struct YearlyParser;

impl SourceParser for YearlyParser {
    fn parse(&self, path: &Path, ev_only: bool) -> Result<LoadedData> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open yearly source: {}", path.display()))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let original_headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read headers from {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let canonical_headers = canonicalize_headers(&original_headers);

        // Column selection: first occurrence of each canonical name wins;
        // data under a later duplicate is discarded, not merged.
        let mut columns: HashMap<String, usize> = HashMap::new();
        for (idx, name) in canonical_headers.iter().enumerate() {
            columns.entry(name.clone()).or_insert(idx);
        }

        // A yearly export that labels its date column "Year" still carries
        // year-only dates; adopt it when no column canonicalized to "date".
        if !columns.contains_key("date") {
            if let Some(&idx) = columns.get("year") {
                columns.insert("date".to_string(), idx);
            }
        }

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|c| !columns.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SchemaError {
                missing,
                original_headers,
                canonical_headers,
            }
            .into());
        }

        let date_idx = columns["date"];
        let category_idx = columns["category"];
        let registrations_idx = columns["registrations"];
        let state_idx = columns.get("state").copied();
        let rto_idx = columns.get("rto").copied();
        let maker_idx = columns.get("maker").copied();
        let has_maker = maker_idx.is_some();

        let mut records = Vec::new();
        let mut rows_read = 0usize;
        let mut rows_dropped = 0usize;

        for (line_num, result) in reader.records().enumerate() {
            let row = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
            })?;
            rows_read += 1;

            let date = match parse_year_date(row.get(date_idx).unwrap_or("")) {
                Some(d) => d,
                None => {
                    rows_dropped += 1;
                    continue;
                }
            };

            // An empty category cell is a null; whitespace trims off below.
            let raw_category = row.get(category_idx).unwrap_or("");
            if raw_category.is_empty() {
                rows_dropped += 1;
                continue;
            }
            let category = raw_category.trim().to_string();

            let registrations = coerce_registrations(row.get(registrations_idx).unwrap_or(""));

            if ev_only && !EV_PATTERN.is_match(&category) {
                continue;
            }

            records.push(Record {
                date,
                state: optional_field(state_idx.and_then(|i| row.get(i))),
                rto: optional_field(rto_idx.and_then(|i| row.get(i))),
                maker: optional_field(maker_idx.and_then(|i| row.get(i))),
                category,
                registrations,
            });
        }

        debug!(
            rows_read,
            rows_kept = records.len(),
            rows_dropped,
            has_maker,
            "loaded yearly source"
        );

        Ok(LoadedData { records, has_maker })
    }

    fn mode(&self) -> SourceMode {
        SourceMode::Yearly
    }
}

// ============================================================================
// MONTHLY PARSER
// ============================================================================

/// Parser for the wide monthly source: `Year`, `Month` (3-letter
/// abbreviation), and one registrations column per category.
pub struct MonthlyParser;

impl SourceParser for MonthlyParser {
    fn parse(&self, path: &Path, _ev_only: bool) -> Result<LoadedData> {
        // The monthly table has no row-level category text before the
        // reshape, so the EV-only flag does not apply here.
        let file = File::open(path)
            .with_context(|| format!("Failed to open monthly source: {}", path.display()))?;

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read headers from {}", path.display()))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let year_idx = headers
            .iter()
            .position(|h| h.trim() == "Year")
            .with_context(|| format!("Monthly source {} has no `Year` column", path.display()))?;
        let month_idx = headers
            .iter()
            .position(|h| h.trim() == "Month")
            .with_context(|| format!("Monthly source {} has no `Month` column", path.display()))?;

        // Every remaining column melts into one (date, category) row per cell.
        let category_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != year_idx && *i != month_idx)
            .map(|(i, h)| (i, h.clone()))
            .collect();

        let mut records = Vec::new();
        let mut rows_read = 0usize;

        for (line_num, result) in reader.records().enumerate() {
            let row = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 2, path.display())
            })?;
            rows_read += 1;

            let year = row.get(year_idx).unwrap_or("").trim();
            let month = row.get(month_idx).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(&format!("{year}-{month}-01"), "%Y-%b-%d")
                .with_context(|| {
                    format!(
                        "Invalid Year/Month {:?}/{:?} at line {} in {}",
                        year,
                        month,
                        line_num + 2,
                        path.display()
                    )
                })?;

            for (idx, name) in &category_columns {
                records.push(Record {
                    date,
                    state: None,
                    rto: None,
                    maker: None,
                    category: name.clone(),
                    registrations: coerce_registrations(row.get(*idx).unwrap_or("")),
                });
            }
        }

        debug!(
            rows_read,
            rows_kept = records.len(),
            categories = category_columns.len(),
            "loaded monthly source"
        );

        Ok(LoadedData {
            records,
            has_maker: false,
        })
    }

    fn mode(&self) -> SourceMode {
        SourceMode::Monthly
    }
}

// ============================================================================
// TESTS
// ============================================================================
