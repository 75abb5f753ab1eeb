//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! import) so the pipeline can swap implementations and mock for tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Per-ticker retrieval failures. None of these abort a run.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("HTTP client setup failed: {0}")]
    ClientSetup(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {symbol}")]
    HttpStatus { symbol: String, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no bars returned for {symbol}")]
    Empty { symbol: String },

    #[error("CSV import failed for {symbol}: {reason}")]
    CsvImport { symbol: String, reason: String },
}

/// Result of a successful data fetch for a single symbol.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    /// Date-ordered, void-free bars.
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    CsvImport,
}

/// Trait for data providers.
///
/// Implementations make a single attempt per call; the caller decides what a
/// failure means for the run.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

/// Progress callback for multi-symbol fetches.
pub trait FetchProgress {
    /// Called when starting to fetch a symbol.
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    /// Called when a symbol fetch completes with its bar count or error.
    fn on_complete(&self, symbol: &str, index: usize, total: usize, result: Result<usize, &DataError>);

    /// Called when the entire batch is done.
    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that writes through `tracing`.
pub struct LogProgress;

impl FetchProgress for LogProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        tracing::debug!(ticker = symbol, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        result: Result<usize, &DataError>,
    ) {
        match result {
            Ok(bars) => tracing::info!(ticker = symbol, bars, "fetched"),
            Err(e) => tracing::warn!(ticker = symbol, stage = "fetch", error = %e, "fetch failed"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "fetch complete");
    }
}

/// Progress reporter that discards every event.
pub struct SilentProgress;

impl FetchProgress for SilentProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _result: Result<usize, &DataError>,
    ) {
    }

    fn on_batch_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}
