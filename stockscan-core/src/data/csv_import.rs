//! CSV directory provider — reads `<dir>/<SYMBOL>.csv` instead of the network.
//!
//! Expected header: `date,open,high,low,close,volume` with ISO dates. Empty
//! numeric cells are treated as missing and the row is dropped if it has no
//! close. Rows outside the requested range are ignored.

use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

use super::provider::{DataError, DataProvider, DataSource, FetchResult};
use crate::domain::{sort_and_clean, Bar};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

/// Offline provider backed by a directory of per-symbol CSV files.
pub struct CsvDirProvider {
    dir: PathBuf,
}

impl CsvDirProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }
}

impl DataProvider for CsvDirProvider {
    fn name(&self) -> &str {
        "csv_dir"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let import_err = |reason: String| DataError::CsvImport {
            symbol: symbol.to_string(),
            reason,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| import_err(format!("{}: {e}", path.display())))?;

        let mut bars = Vec::new();
        for row in reader.deserialize::<CsvRow>() {
            let row = row.map_err(|e| import_err(e.to_string()))?;
            if row.date < start || row.date > end {
                continue;
            }
            bars.push(Bar {
                date: row.date,
                open: row.open.unwrap_or(f64::NAN),
                high: row.high.unwrap_or(f64::NAN),
                low: row.low.unwrap_or(f64::NAN),
                close: row.close.unwrap_or(f64::NAN),
                volume: row
                    .volume
                    .filter(|v| v.is_finite())
                    .map(|v| v.max(0.0).round() as u64),
            });
        }

        let bars = sort_and_clean(bars);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: symbol.to_string(),
            });
        }

        Ok(FetchResult {
            symbol: symbol.to_string(),
            bars,
            source: DataSource::CsvImport,
        })
    }
}
