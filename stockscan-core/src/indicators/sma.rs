//! Simple Moving Average (SMA) over close or volume.
//!
//! Arithmetic mean of the trailing `period` values, current bar included.
//! Lookback: period - 1 (first valid value at index period-1).

use super::Indicator;
use crate::domain::Bar;

/// Trailing arithmetic mean of `values`; NaN where fewer than `period` values exist.
///
/// Each window is summed from scratch so that equal inputs always produce
/// bit-identical means (crossover detection compares them with `<`).
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return result;
    }
    for (offset, window) in values.windows(period).enumerate() {
        result[offset + period - 1] = window.iter().sum::<f64>() / period as f64;
    }
    result
}

/// SMA of closing prices.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_mean(&closes, self.period)
    }
}

/// SMA of traded volume.
///
/// Days without a reported volume are skipped rather than counted as zero:
/// each value averages the last `period` reported volumes, and a bar with no
/// volume gets NaN.
#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume SMA period must be >= 1");
        Self {
            period,
            name: format!("volume_sma_{period}"),
        }
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let reported: Vec<(usize, f64)> = bars
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.volume.map(|v| (i, v as f64)))
            .collect();
        let values: Vec<f64> = reported.iter().map(|&(_, v)| v).collect();

        let mut result = vec![f64::NAN; bars.len()];
        for (&(i, _), mean) in reported.iter().zip(rolling_mean(&values, self.period)) {
            result[i] = mean;
        }
        result
    }
}
