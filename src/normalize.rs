use tracing::warn;

/// Fixed denominator every score is mapped onto.
pub const SCALE: u32 = 1_000_000;

/// Map `obtained / maximum` onto `[0, SCALE]`, truncating toward zero.
///
/// Degenerate inputs never fail: a zero maximum, an obtained score above the
/// maximum, or a negative/infinite value yields `0` and a diagnostic. NaN maps
/// to `0` without one.
pub fn normalize(obtained: f64, maximum: f64) -> u32 {
    if obtained.is_nan() || maximum.is_nan() {
        return 0;
    }
    if maximum == 0.0 || obtained > maximum {
        warn!(obtained, maximum, "invalid scores, normalizing to 0");
        return 0;
    }
    if obtained < 0.0 || maximum < 0.0 || !obtained.is_finite() || !maximum.is_finite() {
        warn!(obtained, maximum, "out-of-range scores, normalizing to 0");
        return 0;
    }

    let normalized = (obtained / maximum) * SCALE as f64;
    // obtained <= maximum keeps this inside [0, SCALE]
    normalized.floor() as u32
}

/// Convenience wrapper for integer scores as read from the CSV.
pub fn normalize_counts(obtained: u32, maximum: u32) -> u32 {
    normalize(obtained as f64, maximum as f64)
}
