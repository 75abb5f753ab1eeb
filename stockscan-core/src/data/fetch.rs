//! Batch fetch orchestrator — one attempt per symbol, failures collected.

use super::provider::{DataError, DataProvider, FetchProgress, FetchResult};
use chrono::NaiveDate;

/// Fetch every symbol in order. A failing symbol never stops the batch.
pub fn fetch_all(
    provider: &dyn DataProvider,
    symbols: &[String],
    start: NaiveDate,
    end: NaiveDate,
    progress: &dyn FetchProgress,
) -> FetchSummary {
    let total = symbols.len();
    let mut fetched = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for (i, symbol) in symbols.iter().enumerate() {
        progress.on_start(symbol, i, total);

        match provider.fetch(symbol, start, end) {
            Ok(result) => {
                progress.on_complete(symbol, i, total, Ok(result.bars.len()));
                fetched.push(result);
            }
            Err(e) => {
                progress.on_complete(symbol, i, total, Err(&e));
                errors.push((symbol.clone(), e));
            }
        }
    }

    progress.on_batch_complete(fetched.len(), errors.len(), total);

    FetchSummary {
        total,
        fetched,
        errors,
    }
}

/// Summary of a batch fetch.
#[derive(Debug)]
pub struct FetchSummary {
    pub total: usize,
    pub fetched: Vec<FetchResult>,
    pub errors: Vec<(String, DataError)>,
}
