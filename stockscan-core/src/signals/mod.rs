//! Daily signal computation for one ticker.
//!
//! Three signals are derived from the latest bar of a date-ordered series:
//! - **Golden cross**: short MA crosses above long MA on the latest bar
//! - **Volume anomaly**: latest volume exceeds `volume_multiplier` × its trailing average
//! - **Above trend**: latest close is at or above the trend MA (MA60 by default)
//!
//! A series shorter than [`SignalParams::required_bars`] is rejected with
//! [`SignalError::InsufficientData`] rather than producing false flags.

pub mod crossover;

pub use crossover::{golden_cross, golden_cross_series};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;
use crate::indicators::{Indicator, Sma, VolumeSma};

/// Signal errors for a single ticker.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    #[error("insufficient data: {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("invalid signal parameters: {0}")]
    InvalidParams(String),
}

/// Window lengths and thresholds for the daily signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignalParams {
    /// Fast MA window for the crossover.
    pub short_window: usize,
    /// Slow MA window for the crossover.
    pub long_window: usize,
    /// Trend MA window for the above-trend flag.
    pub trend_window: usize,
    /// Trailing window for average volume (latest day included).
    pub volume_window: usize,
    /// Volume anomaly threshold as a multiple of average volume.
    pub volume_multiplier: f64,
}

impl Default for SignalParams {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 20,
            trend_window: 60,
            volume_window: 20,
            volume_multiplier: 1.5,
        }
    }
}

impl SignalParams {
    pub fn validate(&self) -> Result<(), SignalError> {
        let invalid = |msg: String| Err(SignalError::InvalidParams(msg));
        if self.short_window == 0
            || self.long_window == 0
            || self.trend_window == 0
            || self.volume_window == 0
        {
            return invalid("all windows must be >= 1".into());
        }
        if self.short_window >= self.long_window {
            return invalid(format!(
                "short_window ({}) must be < long_window ({})",
                self.short_window, self.long_window
            ));
        }
        if !(self.volume_multiplier.is_finite() && self.volume_multiplier > 0.0) {
            return invalid(format!(
                "volume_multiplier must be > 0, got {}",
                self.volume_multiplier
            ));
        }
        Ok(())
    }

    /// Minimum history for every signal to be defined on the latest bar.
    ///
    /// The crossover reads the long MA on the previous bar, hence `long + 1`.
    pub fn required_bars(&self) -> usize {
        self.short_window
            .max(self.long_window + 1)
            .max(self.trend_window)
            .max(self.volume_window)
    }
}

/// Signals and underlying values for one ticker on its latest bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Close-to-close change versus the previous bar, in percent.
    pub change_pct: Option<f64>,
    pub ma_short: f64,
    pub ma_long: f64,
    pub ma_trend: f64,
    /// Latest volume; `None` when the provider reported none for that day.
    pub volume: Option<u64>,
    /// Average of the last `volume_window` reported volumes.
    pub avg_volume: f64,
    pub golden_cross: bool,
    pub volume_anomaly: bool,
    pub above_trend: bool,
    /// Distance of close from the trend MA, in percent.
    pub trend_distance_pct: f64,
}

/// Latest close at or above the trend MA.
pub fn is_above_trend(close: f64, ma_trend: f64) -> bool {
    close >= ma_trend
}

/// Latest volume strictly above `multiplier` × average volume.
pub fn is_volume_anomaly(volume: u64, avg_volume: f64, multiplier: f64) -> bool {
    volume as f64 > multiplier * avg_volume
}

/// Compute all signals for `ticker` from date-ordered, void-free bars.
pub fn compute_signals(
    ticker: &str,
    bars: &[Bar],
    params: &SignalParams,
) -> Result<SignalResult, SignalError> {
    params.validate()?;

    let need = params.required_bars();
    if bars.len() < need {
        return Err(SignalError::InsufficientData {
            have: bars.len(),
            need,
        });
    }

    let fast = Sma::new(params.short_window).compute(bars);
    let slow = Sma::new(params.long_window).compute(bars);
    let trend = Sma::new(params.trend_window).compute(bars);
    let avg_volume = VolumeSma::new(params.volume_window).compute(bars);

    let last = bars.len() - 1;
    let latest = &bars[last];

    let change_pct = if last >= 1 && bars[last - 1].close != 0.0 {
        Some((latest.close / bars[last - 1].close - 1.0) * 100.0)
    } else {
        None
    };

    let volume_anomaly = match latest.volume {
        Some(volume) => is_volume_anomaly(volume, avg_volume[last], params.volume_multiplier),
        None => {
            tracing::warn!(ticker, stage = "signals", date = %latest.date, "no volume on latest bar; volume anomaly not evaluated");
            false
        }
    };

    let ma_trend = trend[last];
    let trend_distance_pct = if ma_trend != 0.0 {
        (latest.close / ma_trend - 1.0) * 100.0
    } else {
        f64::NAN
    };

    Ok(SignalResult {
        ticker: ticker.to_string(),
        date: latest.date,
        close: latest.close,
        change_pct,
        ma_short: fast[last],
        ma_long: slow[last],
        ma_trend,
        volume: latest.volume,
        avg_volume: avg_volume[last],
        golden_cross: golden_cross(&fast, &slow, last),
        volume_anomaly,
        above_trend: is_above_trend(latest.close, ma_trend),
        trend_distance_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    fn flat_then(tail: &[f64], flat_len: usize) -> Vec<f64> {
        let mut closes = vec![10.0; flat_len];
        closes.extend_from_slice(tail);
        closes
    }

    #[test]
    fn default_params_need_sixty_bars() {
        assert_eq!(SignalParams::default().required_bars(), 60);
    }

    #[test]
    fn required_bars_accounts_for_previous_long_ma() {
        let params = SignalParams {
            short_window: 5,
            long_window: 30,
            trend_window: 20,
            volume_window: 10,
            volume_multiplier: 2.0,
        };
        assert_eq!(params.required_bars(), 31);
    }

    #[test]
    fn thirty_bars_is_insufficient_not_false() {
        let bars = make_bars(&[10.0; 30]);
        let err = compute_signals("2330.TW", &bars, &SignalParams::default()).unwrap_err();
        assert_eq!(err, SignalError::InsufficientData { have: 30, need: 60 });
    }

    /// 55 flat closes, a four-day dip to 8, then `last`.
    fn dip_then(last: &[f64]) -> Vec<f64> {
        let mut closes = flat_then(&[8.0, 8.0, 8.0, 8.0], 55);
        closes.extend_from_slice(last);
        closes
    }

    #[test]
    fn recovery_above_long_ma_is_golden_cross() {
        // Day before: MA5 8.4 < MA20 9.6. Today: MA5 10.4, MA20 10.1.
        let bars = make_bars(&dip_then(&[20.0]));
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();

        assert!(result.golden_cross);
        assert_approx(result.ma_short, 10.4, 1e-9);
        assert_approx(result.ma_long, 10.1, 1e-9);
        assert!(result.above_trend);
        assert_approx(result.change_pct.unwrap(), 150.0, 1e-9);
    }

    #[test]
    fn recovery_to_equal_long_ma_is_golden_cross() {
        // Day before: MA5 8.4 < MA20 9.6. Today: MA5 == MA20 == 10.
        let bars = make_bars(&dip_then(&[18.0]));
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();

        assert_eq!(result.ma_short, 10.0);
        assert_eq!(result.ma_long, 10.0);
        assert!(result.golden_cross);
    }

    #[test]
    fn jump_from_flat_is_not_golden_cross() {
        // MA5 == MA20 the day before: the short MA was never below.
        let bars = make_bars(&flat_then(&[12.0], 59));
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();

        assert!(result.ma_short > result.ma_long);
        assert!(!result.golden_cross);
    }

    #[test]
    fn golden_cross_not_repeated_the_next_day() {
        let bars = make_bars(&dip_then(&[18.0, 18.0]));
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        assert!(result.ma_short > result.ma_long);
        assert!(!result.golden_cross);
    }

    #[test]
    fn flat_series_has_no_cross_and_sits_on_trend() {
        let bars = make_bars(&[10.0; 60]);
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        assert!(!result.golden_cross);
        assert!(result.above_trend, "close == MA60 counts as above");
        assert_approx(result.trend_distance_pct, 0.0, 1e-12);
    }

    #[test]
    fn close_below_trend_is_not_above() {
        let closes = flat_then(&[8.0], 59);
        let bars = make_bars(&closes);
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        assert!(!result.above_trend);
        assert!(result.trend_distance_pct < 0.0);
    }

    #[test]
    fn volume_spike_detected() {
        let mut bars = make_bars(&[10.0; 60]);
        bars.last_mut().unwrap().volume = Some(5_000);
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        // avg = (19 * 1000 + 5000) / 20 = 1200; 5000 > 1.5 * 1200
        assert_approx(result.avg_volume, 1200.0, 1e-9);
        assert!(result.volume_anomaly);
    }

    #[test]
    fn missing_latest_volume_is_not_an_anomaly() {
        let mut bars = make_bars(&[10.0; 60]);
        bars.last_mut().unwrap().volume = None;
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        assert_eq!(result.volume, None);
        assert!(result.avg_volume.is_nan());
        assert!(!result.volume_anomaly);
    }

    #[test]
    fn missing_earlier_volume_does_not_dilute_average() {
        let mut bars = make_bars(&[10.0; 60]);
        bars[50].volume = None;
        bars.last_mut().unwrap().volume = Some(1_600);
        let result = compute_signals("AAA", &bars, &SignalParams::default()).unwrap();
        // Last 20 reported volumes: 19 x 1000 and 1600.
        assert_approx(result.avg_volume, 1030.0, 1e-9);
        assert!(result.volume_anomaly);
    }

    #[test]
    fn volume_at_threshold_is_not_anomalous() {
        assert!(!is_volume_anomaly(1500, 1000.0, 1.5));
        assert!(is_volume_anomaly(1501, 1000.0, 1.5));
    }

    #[test]
    fn invalid_params_rejected() {
        let params = SignalParams {
            short_window: 20,
            long_window: 5,
            ..SignalParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(SignalError::InvalidParams(_))
        ));

        let params = SignalParams {
            volume_multiplier: 0.0,
            ..SignalParams::default()
        };
        assert!(params.validate().is_err());

        let params = SignalParams {
            trend_window: 0,
            ..SignalParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: SignalParams = serde_json::from_str(r#"{"volume_multiplier": 2.0}"#).unwrap();
        assert_eq!(params.short_window, 5);
        assert_eq!(params.volume_multiplier, 2.0);
    }
}
