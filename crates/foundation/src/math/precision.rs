//! Deterministic float ordering for sorting and keys.

use core::cmp::Ordering;

/// Canonicalize floats for deterministic ordering.
///
/// - Collapses `-0.0` to `0.0`.
/// - Collapses all NaNs to a single canonical quiet NaN.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
///
/// Prefer this any time you sort floats or use them in ordered keys.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}
