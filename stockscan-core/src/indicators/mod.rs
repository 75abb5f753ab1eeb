//! Rolling indicators over a date-ordered bar series.
//!
//! Each indicator returns one value per bar, NaN until its window fills.

pub mod sma;

pub use sma::{rolling_mean, Sma, VolumeSma};

use crate::domain::Bar;

/// A single-series indicator computed over the whole bar history at once.
pub trait Indicator: Send + Sync {
    /// Series name, e.g. `sma_20`.
    fn name(&self) -> &str;

    /// Number of leading bars that produce NaN.
    fn lookback(&self) -> usize;

    /// Compute the full series; output length equals `bars.len()`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// open = previous close, high/low = max/min(open, close) ± 1, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: Some(1000),
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
