// Growth Calculator
// Period-over-period relative change for QoQ / YoY KPI deltas

/// Fractional change between the last two points of an ordered series.
///
/// The series is assumed already aggregated to the desired granularity and
/// sorted ascending by period. Returns `None` when fewer than two finite
/// points exist or the second-to-last value is zero; a zero baseline is
/// "not computable", not an error.
pub fn growth_rate(values: &[f64]) -> Option<f64> {
    let points: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if points.len() < 2 {
        return None;
    }

    let previous = points[points.len() - 2];
    let latest = points[points.len() - 1];
    if previous == 0.0 {
        return None;
    }

    Some((latest - previous) / previous)
}

/// Render a growth figure as a KPI delta label.
///
/// Not-computable growth renders as `"n/a"`; numeric growth renders as a
/// percentage with one decimal and an explicit `+` for non-negative values
/// ("+12.3%", "-4.0%").
pub fn kpi_delta(growth: Option<f64>) -> String {
    match growth {
        Some(g) if g.is_finite() => format!("{:+.1}%", g * 100.0),
        _ => "n/a".to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_simple_increase() {
        assert_eq!(growth_rate(&[100.0, 150.0]), Some(0.5));
    }

    #[test]
    fn test_growth_flat_series() {
        assert_eq!(growth_rate(&[100.0, 100.0]), Some(0.0));
    }

    #[test]
    fn test_growth_decline() {
        assert_eq!(growth_rate(&[200.0, 150.0]), Some(-0.25));
    }

    #[test]
    fn test_growth_zero_baseline_not_computable() {
        assert_eq!(growth_rate(&[0.0, 50.0]), None);
    }

    #[test]
    fn test_growth_needs_two_points() {
        assert_eq!(growth_rate(&[]), None);
        assert_eq!(growth_rate(&[100.0]), None);
    }

    #[test]
    fn test_growth_uses_last_two_points_only() {
        assert_eq!(growth_rate(&[10.0, 20.0, 100.0, 150.0]), Some(0.5));
    }

    #[test]
    fn test_growth_skips_non_finite_points() {
        assert_eq!(growth_rate(&[100.0, f64::NAN, 150.0]), Some(0.5));
        assert_eq!(growth_rate(&[f64::INFINITY, 100.0]), None);
    }

    #[test]
    fn test_delta_formatting() {
        assert_eq!(kpi_delta(Some(0.5)), "+50.0%");
        assert_eq!(kpi_delta(Some(0.0)), "+0.0%");
        assert_eq!(kpi_delta(Some(-0.04)), "-4.0%");
        assert_eq!(kpi_delta(Some(0.123)), "+12.3%");
    }

    #[test]
    fn test_delta_not_computable() {
        assert_eq!(kpi_delta(None), "n/a");
        assert_eq!(kpi_delta(Some(f64::NAN)), "n/a");
        assert_eq!(kpi_delta(Some(f64::INFINITY)), "n/a");
    }
}
