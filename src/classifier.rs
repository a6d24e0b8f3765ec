// Category Classifier
// Buckets free-text vehicle category strings into the fixed 2W/3W/4W taxonomy

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VEHICLE GROUP
// ============================================================================

/// Closed set of vehicle-class buckets used for cohort-level aggregation.
///
/// Variant order matches the display-label sort order ("2W" < "3W" < "4W" <
/// "Other"), so `Ord` gives stable sorted option lists for free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleGroup {
    #[serde(rename = "2W")]
    TwoWheeler,
    #[serde(rename = "3W")]
    ThreeWheeler,
    #[serde(rename = "4W")]
    FourWheeler,
    Other,
}

impl VehicleGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleGroup::TwoWheeler => "2W",
            VehicleGroup::ThreeWheeler => "3W",
            VehicleGroup::FourWheeler => "4W",
            VehicleGroup::Other => "Other",
        }
    }

    /// All buckets in display order.
    pub fn all() -> [VehicleGroup; 4] {
        [
            VehicleGroup::TwoWheeler,
            VehicleGroup::ThreeWheeler,
            VehicleGroup::FourWheeler,
            VehicleGroup::Other,
        ]
    }
}

impl fmt::Display for VehicleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// KEYWORD TABLES
// ============================================================================

// Matching is substring containment over the normalized text, first bucket
// wins: a category containing "l2" inside a longer token still classifies
// as 2W.

const TWO_WHEELER_KEYWORDS: &[&str] = &[
    "two wheeler",
    "twowheeler",
    "2w",
    "motor cycle",
    "motorcycle",
    "m cycle",
    "mcycle",
    "scooter",
    "sctr",
    "moped",
    "bike",
    "l1",
    "l2",
];

const THREE_WHEELER_KEYWORDS: &[&str] = &[
    "three wheeler",
    "threewheeler",
    "3w",
    "auto rickshaw",
    "autorickshaw",
    "rickshaw",
    "e rickshaw",
    "erickshaw",
    "l5",
    "e rick",
];

const FOUR_WHEELER_KEYWORDS: &[&str] = &[
    "four wheeler",
    "fourwheeler",
    "4w",
    "lmv",
    "car",
    "motor car",
    "passenger car",
    "jeep",
    "van",
    "suv",
    "quadricycle",
    "qute",
    "lgv",
    "lcv",
    "mcv",
    "hcv",
    "hgv",
    "goods",
    "goods carrier",
    "truck",
    "bus",
    "omni bus",
    "omnibus",
    "taxi",
    "cab",
    "pickup",
    "tractor",
    "tempo",
    "lorry",
];

/// Runs of anything outside [a-z0-9] become a single space.
static NON_ALNUM_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

/// Normalize raw category text for keyword matching: lowercase, collapse
/// non-alphanumeric runs to single spaces, trim.
fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    NON_ALNUM_RUNS.replace_all(&lowered, " ").trim().to_string()
}

/// Classify a raw category string into its vehicle group.
///
/// Blank input is `Other`. Evaluation order matters: 2W keywords are checked
/// before 3W, 3W before 4W, and the first containing match wins.
pub fn classify(raw: &str) -> VehicleGroup {
    if raw.trim().is_empty() {
        return VehicleGroup::Other;
    }

    let text = normalize(raw);

    if TWO_WHEELER_KEYWORDS.iter().any(|k| text.contains(k)) {
        return VehicleGroup::TwoWheeler;
    }
    if THREE_WHEELER_KEYWORDS.iter().any(|k| text.contains(k)) {
        return VehicleGroup::ThreeWheeler;
    }
    if FOUR_WHEELER_KEYWORDS.iter().any(|k| text.contains(k)) {
        return VehicleGroup::FourWheeler;
    }

    VehicleGroup::Other
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_wheeler_keywords() {
        assert_eq!(classify("Motor Cycle"), VehicleGroup::TwoWheeler);
        assert_eq!(classify("M-CYCLE/SCOOTER"), VehicleGroup::TwoWheeler);
        assert_eq!(classify("MOPED"), VehicleGroup::TwoWheeler);
        assert_eq!(classify("Two Wheeler (NT)"), VehicleGroup::TwoWheeler);
        assert_eq!(classify("Electric Bike"), VehicleGroup::TwoWheeler);
    }

    #[test]
    fn test_three_wheeler_keywords() {
        assert_eq!(classify("Auto Rickshaw"), VehicleGroup::ThreeWheeler);
        assert_eq!(classify("E-RICKSHAW(P)"), VehicleGroup::ThreeWheeler);
        assert_eq!(classify("Three Wheeler (Goods)"), VehicleGroup::ThreeWheeler);
    }

    #[test]
    fn test_four_wheeler_keywords() {
        assert_eq!(classify("Motor Car"), VehicleGroup::FourWheeler);
        assert_eq!(classify("LMV"), VehicleGroup::FourWheeler);
        assert_eq!(classify("Goods Carrier"), VehicleGroup::FourWheeler);
        assert_eq!(classify("Omni Bus"), VehicleGroup::FourWheeler);
        assert_eq!(classify("TRACTOR (COMMERCIAL)"), VehicleGroup::FourWheeler);
    }

    #[test]
    fn test_priority_order_two_before_three_before_four() {
        // Contains both a 2W and a 4W fragment; 2W wins.
        assert_eq!(classify("Motor Cycle / Car"), VehicleGroup::TwoWheeler);
        // Contains both a 3W and a 4W fragment; 3W wins.
        assert_eq!(classify("Rickshaw Van"), VehicleGroup::ThreeWheeler);
    }

    #[test]
    fn test_blank_and_unmatched_are_other() {
        assert_eq!(classify(""), VehicleGroup::Other);
        assert_eq!(classify("   "), VehicleGroup::Other);
        assert_eq!(classify("Harvester"), VehicleGroup::Other);
        assert_eq!(classify("Crane Mounted"), VehicleGroup::Other);
    }

    #[test]
    fn test_substring_containment_not_whole_word() {
        // "l2" occurs inside an unrelated token after normalization; the
        // literal containment rule still classifies it as 2W.
        assert_eq!(classify("class-l2x special"), VehicleGroup::TwoWheeler);
        // "bus" inside "minibus" matches 4W.
        assert_eq!(classify("minibus"), VehicleGroup::FourWheeler);
    }

    #[test]
    fn test_normalization_collapses_punctuation() {
        assert_eq!(classify("MOTOR__CYCLE"), VehicleGroup::TwoWheeler);
        assert_eq!(classify("e.rickshaw"), VehicleGroup::ThreeWheeler);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(VehicleGroup::TwoWheeler.to_string(), "2W");
        assert_eq!(VehicleGroup::ThreeWheeler.to_string(), "3W");
        assert_eq!(VehicleGroup::FourWheeler.to_string(), "4W");
        assert_eq!(VehicleGroup::Other.to_string(), "Other");
    }

    #[test]
    fn test_sorted_option_order() {
        let mut groups = vec![
            VehicleGroup::Other,
            VehicleGroup::FourWheeler,
            VehicleGroup::TwoWheeler,
            VehicleGroup::ThreeWheeler,
        ];
        groups.sort();
        assert_eq!(
            groups,
            vec![
                VehicleGroup::TwoWheeler,
                VehicleGroup::ThreeWheeler,
                VehicleGroup::FourWheeler,
                VehicleGroup::Other,
            ]
        );
    }
}
