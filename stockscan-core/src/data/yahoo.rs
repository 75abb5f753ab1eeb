//! Yahoo Finance data provider.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API. One request per
//! symbol, no retries; a failed symbol is reported to the caller and the
//! batch moves on.
//!
//! Yahoo Finance has no official API and is subject to unannounced format
//! changes. The CSV directory provider is the offline fallback.

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{sort_and_clean, Bar};
use chrono::{Days, NaiveDate, NaiveTime};
use serde::Deserialize;
use std::time::Duration;

const CHART_BASE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
}

impl YahooProvider {
    /// Build a provider whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::ClientSetup(e.to_string()))?;

        Ok(Self { client })
    }

    /// Unix-second bounds covering `start` 00:00 UTC through the end of `end`.
    fn period_bounds(start: NaiveDate, end: NaiveDate) -> (i64, i64) {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end
            .checked_add_days(Days::new(1))
            .unwrap_or(end)
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp();
        (start_ts, end_ts)
    }

    /// Parse a chart API body into date-ordered bars.
    fn parse_chart(symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        // A listed symbol with no trading in range comes back without timestamps.
        let Some(timestamps) = data.timestamp else {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        };

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let field = |v: &Vec<Option<f64>>| v.get(i).copied().flatten().unwrap_or(f64::NAN);
            bars.push(Bar {
                date,
                open: field(&quote.open),
                high: field(&quote.high),
                low: field(&quote.low),
                close: field(&quote.close),
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        let bars = sort_and_clean(bars);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let (period1, period2) = Self::period_bounds(start, end);
        let url = format!("{CHART_BASE_URL}/{symbol}");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        if !status.is_success() {
            return Err(DataError::HttpStatus {
                symbol: symbol.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let bars = Self::parse_chart(symbol, &body)?;

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::YahooFinance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn period_bounds_cover_whole_end_day() {
        let (p1, p2) = YahooProvider::period_bounds(d(2024, 1, 2), d(2024, 1, 2));
        assert_eq!(p2 - p1, 86_400);
        assert_eq!(p1, 1_704_153_600);
    }

    #[test]
    fn parses_quotes_and_skips_missing_close() {
        // 2024-01-02, 2024-01-03 (holiday-style nulls), 2024-01-04
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{
                "open":[100.0,null,102.0],
                "high":[101.0,null,103.5],
                "low":[99.0,null,101.0],
                "close":[100.5,null,103.0],
                "volume":[1500,null,2500]
            }]}
        }],"error":null}}"#;

        let bars = YahooProvider::parse_chart("SPY", body).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, d(2024, 1, 2));
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[1].date, d(2024, 1, 4));
        assert_eq!(bars[1].volume, Some(2500));
    }

    #[test]
    fn null_volume_stays_missing() {
        let body = r#"{"chart":{"result":[{
            "timestamp":[1704205800],
            "indicators":{"quote":[{
                "open":[100.0],"high":[101.0],"low":[99.0],"close":[100.5],
                "volume":[null]
            }]}
        }],"error":null}}"#;

        let bars = YahooProvider::parse_chart("SPY", body).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        let err = YahooProvider::parse_chart("NOPE", body).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { ref symbol } if symbol == "NOPE"));
    }

    #[test]
    fn other_chart_error_is_format_change() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Bad Request","description":"Invalid input"}}}"#;
        let err = YahooProvider::parse_chart("SPY", body).unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }

    #[test]
    fn missing_timestamps_is_empty() {
        let body = r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#;
        let err = YahooProvider::parse_chart("2330.TW", body).unwrap_err();
        assert!(matches!(err, DataError::Empty { .. }));
    }

    #[test]
    fn garbage_body_is_format_change() {
        let err = YahooProvider::parse_chart("SPY", "<html>rate limited</html>").unwrap_err();
        assert!(matches!(err, DataError::ResponseFormatChanged(_)));
    }
}
