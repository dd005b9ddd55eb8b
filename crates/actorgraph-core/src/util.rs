/// Presentation rounding for ratio-scale values (4 decimal places).
/// Decision thresholds must always compare the unrounded value first.
pub fn round_ratio(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10_000.0).round() / 10_000.0
}

/// Presentation rounding for USD amounts (2 decimal places).
pub fn round_usd(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}
