//! Bar — one trading day of market data.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single ticker.
///
/// Missing provider prices are carried as NaN until [`sort_and_clean`] drops
/// bars without a usable close. A missing volume is `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Bar {
    /// True when the close is missing; such a bar cannot feed a moving average.
    pub fn is_void(&self) -> bool {
        !self.close.is_finite()
    }

    /// OHLC consistency: positive close, and wherever high/low are present
    /// they bracket open and close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() || self.close <= 0.0 {
            return false;
        }
        let high = self.high.is_finite().then_some(self.high);
        let low = self.low.is_finite().then_some(self.low);
        if let (Some(h), Some(l)) = (high, low) {
            if h < l {
                return false;
            }
        }
        [self.open, self.close]
            .into_iter()
            .filter(|v| v.is_finite())
            .all(|v| high.map_or(true, |h| v <= h) && low.map_or(true, |l| v >= l))
    }
}

/// Drop void or inconsistent bars, order by date, and keep the last bar seen
/// for a repeated date.
pub fn sort_and_clean(mut bars: Vec<Bar>) -> Vec<Bar> {
    let before = bars.len();
    bars.retain(Bar::is_sane);
    let dropped = before - bars.len();
    if dropped > 0 {
        tracing::debug!(dropped, "dropped void or inconsistent bars");
    }
    // Stable sort keeps provider order among equal dates, so the dedup below
    // retains the most recent observation.
    bars.sort_by_key(|b| b.date);
    let mut cleaned: Vec<Bar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match cleaned.last_mut() {
            Some(last) if last.date == bar.date => *last = bar,
            _ => cleaned.push(bar),
        }
    }
    cleaned
}
