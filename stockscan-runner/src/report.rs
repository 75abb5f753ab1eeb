//! Report model — one run's signal rows and skipped tickers.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use stockscan_core::signals::{SignalParams, SignalResult};

/// Why a ticker is missing from the signal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Provider error or empty response.
    Fetch,
    /// Fewer bars than the largest signal window.
    InsufficientData,
    /// Signal computation rejected the inputs.
    Compute,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Fetch => f.write_str("fetch"),
            FailureKind::InsufficientData => f.write_str("insufficient data"),
            FailureKind::Compute => f.write_str("compute"),
        }
    }
}

/// A ticker excluded from the report, with enough context to diagnose it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerFailure {
    pub ticker: String,
    pub kind: FailureKind,
    pub reason: String,
}

/// Aggregate output of one scan run.
///
/// Results and failures are sorted by ticker on construction so every
/// rendering of the same input is identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<FixedOffset>,
    pub params: SignalParams,
    pub results: Vec<SignalResult>,
    pub failures: Vec<TickerFailure>,
}

impl Report {
    pub fn new(
        generated_at: DateTime<FixedOffset>,
        params: SignalParams,
        mut results: Vec<SignalResult>,
        mut failures: Vec<TickerFailure>,
    ) -> Self {
        results.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        failures.sort_by(|a, b| a.ticker.cmp(&b.ticker));
        Self {
            generated_at,
            params,
            results,
            failures,
        }
    }

    pub fn run_date(&self) -> NaiveDate {
        self.generated_at.date_naive()
    }

    /// Artifact file stem, e.g. `scan_20240701_1830`.
    pub fn file_stem(&self) -> String {
        format!("scan_{}", self.generated_at.format("%Y%m%d_%H%M"))
    }

    pub fn signal_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.golden_cross || r.volume_anomaly)
            .count()
    }

    /// Results ranked for the e-mail summary: golden cross, volume anomaly,
    /// trend distance, daily change, all descending; ticker breaks ties.
    pub fn ranked(&self) -> Vec<&SignalResult> {
        let mut ranked: Vec<&SignalResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| {
            b.golden_cross
                .cmp(&a.golden_cross)
                .then(b.volume_anomaly.cmp(&a.volume_anomaly))
                .then(desc_nan_last(a.trend_distance_pct, b.trend_distance_pct))
                .then(desc_nan_last(
                    a.change_pct.unwrap_or(f64::NAN),
                    b.change_pct.unwrap_or(f64::NAN),
                ))
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        ranked
    }
}

fn desc_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{at, result};
    use super::*;

    #[test]
    fn new_sorts_by_ticker() {
        let report = Report::new(
            at(2024, 7, 1, 18, 30),
            SignalParams::default(),
            vec![result("MSFT", false, false, 1.0), result("AAPL", false, false, 2.0)],
            vec![
                TickerFailure {
                    ticker: "ZZZ".into(),
                    kind: FailureKind::Fetch,
                    reason: "x".into(),
                },
                TickerFailure {
                    ticker: "BBB".into(),
                    kind: FailureKind::InsufficientData,
                    reason: "y".into(),
                },
            ],
        );
        let tickers: Vec<&str> = report.results.iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(report.failures[0].ticker, "BBB");
    }

    #[test]
    fn file_stem_uses_generation_time() {
        let report = Report::new(at(2024, 7, 1, 9, 5), SignalParams::default(), vec![], vec![]);
        assert_eq!(report.file_stem(), "scan_20240701_0905");
        assert_eq!(report.run_date(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn ranking_prefers_cross_then_spike_then_trend() {
        let report = Report::new(
            at(2024, 7, 1, 18, 30),
            SignalParams::default(),
            vec![
                result("AAA", false, false, 9.0),
                result("BBB", false, true, 1.0),
                result("CCC", true, false, -3.0),
                result("DDD", false, false, f64::NAN),
                result("EEE", false, false, 4.0),
            ],
            vec![],
        );
        let order: Vec<&str> = report.ranked().iter().map(|r| r.ticker.as_str()).collect();
        assert_eq!(order, vec!["CCC", "BBB", "AAA", "EEE", "DDD"]);
        assert_eq!(report.signal_count(), 2);
    }
}
