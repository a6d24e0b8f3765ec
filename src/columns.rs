// Column Canonicalizer
// Maps heterogeneous VAHAN export headers onto the fixed canonical schema

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Canonical field set every loaded table is normalized to.
/// `maker` presence is optional and detected at load time.
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "category", "registrations"];

/// Runs of whitespace and hyphens collapse to a single space before lookup.
static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").expect("valid regex"));

/// Synonym table: cleaned header -> canonical name.
///
/// Built once at first use. Exports from different VAHAN portal versions
/// disagree on naming (e.g. `Make_Name` vs `OEM` vs `Manufacturer`), so the
/// loader never matches raw headers directly.
static CANON: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("date", "date"),
        ("state", "state"),
        ("state name", "state"),
        ("state_name", "state"),
        ("rto", "rto"),
        ("rto name", "rto"),
        ("rto_name", "rto"),
        ("office_name", "rto"),
        ("maker", "maker"),
        ("type", "maker"),
        ("make", "maker"),
        ("make_name", "maker"),
        ("manufacturer", "maker"),
        ("company", "maker"),
        ("oem", "maker"),
        ("category", "category"),
        ("veh_category", "category"),
        ("vehicle_category", "category"),
        ("registrations", "registrations"),
        ("count", "registrations"),
        ("no_of_vehicles", "registrations"),
        ("total_vehicles", "registrations"),
    ])
});

/// Clean a raw header: lowercase, trim, collapse whitespace/hyphen runs,
/// strip the literal `"(nos.)"` unit suffix, trim again.
pub fn clean_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let collapsed = SEPARATOR_RUNS.replace_all(&lowered, " ");
    collapsed.replace("(nos.)", "").trim().to_string()
}

/// Map one raw header to its canonical name.
///
/// Headers absent from the synonym table pass through in cleaned form, so
/// unexpected extra columns survive without being mistaken for required
/// fields.
pub fn canonical_header(raw: &str) -> String {
    let cleaned = clean_header(raw);
    match CANON.get(cleaned.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// Canonicalize a full header row, left to right.
///
/// Duplicate canonical names can result (e.g. `Maker` and `OEM` in the same
/// export); the loader keeps the first occurrence and discards the rest.
pub fn canonicalize_headers<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    headers.iter().map(|h| canonical_header(h.as_ref())).collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_header_lowercases_and_trims() {
        assert_eq!(clean_header("  Maker  "), "maker");
        assert_eq!(clean_header("CATEGORY"), "category");
    }

    #[test]
    fn test_clean_header_collapses_separator_runs() {
        assert_eq!(clean_header("State   Name"), "state name");
        assert_eq!(clean_header("State-Name"), "state name");
        assert_eq!(clean_header("State - Name"), "state name");
    }

    #[test]
    fn test_clean_header_strips_unit_suffix() {
        assert_eq!(clean_header("Registrations (Nos.)"), "registrations");
    }

    #[test]
    fn test_canonical_maker_variants() {
        for raw in ["Maker", "TYPE", "make", "Make_Name", "Manufacturer", "company", "OEM"] {
            assert_eq!(canonical_header(raw), "maker", "variant {raw:?}");
        }
    }

    #[test]
    fn test_canonical_registrations_variants() {
        for raw in ["Registrations", "Count", "No_Of_Vehicles", "TOTAL_VEHICLES"] {
            assert_eq!(canonical_header(raw), "registrations", "variant {raw:?}");
        }
    }

    #[test]
    fn test_canonical_state_and_rto_variants() {
        for raw in ["State", "State Name", "state_name"] {
            assert_eq!(canonical_header(raw), "state", "variant {raw:?}");
        }
        for raw in ["RTO", "RTO Name", "rto_name", "Office_Name"] {
            assert_eq!(canonical_header(raw), "rto", "variant {raw:?}");
        }
    }

    #[test]
    fn test_canonical_category_variants() {
        for raw in ["Category", "Veh_Category", "Vehicle_Category"] {
            assert_eq!(canonical_header(raw), "category", "variant {raw:?}");
        }
    }

    #[test]
    fn test_unknown_header_passes_through_cleaned() {
        assert_eq!(canonical_header("Fuel  Type"), "fuel type");
        assert_eq!(canonical_header("Extra-Column"), "extra column");
    }

    #[test]
    fn test_canonicalize_header_row() {
        let headers = ["Year", "Type", "Veh_Category", "Count"];
        // "Year" is not a synonym; the yearly loader renames it separately.
        assert_eq!(
            canonicalize_headers(&headers),
            vec!["year", "maker", "category", "registrations"]
        );
    }
}
