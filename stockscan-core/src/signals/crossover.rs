//! Golden cross detection between a fast and a slow moving average.

/// True when the fast MA crosses above the slow MA exactly at `index`.
///
/// Previous bar: fast < slow. Current bar: fast >= slow. The event fires on
/// the transition bar only; once fast is at or above slow the previous-bar
/// condition fails, so a sustained crossed state never re-fires.
pub fn golden_cross(fast: &[f64], slow: &[f64], index: usize) -> bool {
    if index == 0 || index >= fast.len() || index >= slow.len() {
        return false;
    }

    let (fast_prev, slow_prev) = (fast[index - 1], slow[index - 1]);
    let (fast_cur, slow_cur) = (fast[index], slow[index]);

    // NaN guard: a window that has not filled yet cannot cross.
    if fast_prev.is_nan() || slow_prev.is_nan() || fast_cur.is_nan() || slow_cur.is_nan() {
        return false;
    }

    fast_prev < slow_prev && fast_cur >= slow_cur
}

/// Golden cross flag for every bar of the two series.
pub fn golden_cross_series(fast: &[f64], slow: &[f64]) -> Vec<bool> {
    (0..fast.len().min(slow.len()))
        .map(|i| golden_cross(fast, slow, i))
        .collect()
}
