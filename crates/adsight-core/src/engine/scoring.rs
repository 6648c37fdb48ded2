//! Scoring policy shared by the detection rules and the evaluator

/// Relative change from `before` to `after` (negative = decline)
///
/// Returns 0.0 when `before` is zero.
pub fn percent_change(before: f64, after: f64) -> f64 {
    if before == 0.0 {
        return 0.0;
    }
    (after - before) / before
}

/// Map a change magnitude to a confidence in [0, 1]
///
/// Linear in `magnitude / (2 * threshold)`: zero or negative magnitude gives
/// 0.0, a magnitude equal to the threshold gives 0.5, and twice the threshold
/// or more saturates at 1.0.
pub fn magnitude_to_confidence(magnitude: f64, threshold: f64) -> f64 {
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return 0.0;
    }
    if !threshold.is_finite() || threshold <= 0.0 {
        return 1.0;
    }
    clamp_confidence(magnitude / (2.0 * threshold))
}

/// Clamp into [0, 1]; NaN maps to 0.0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
