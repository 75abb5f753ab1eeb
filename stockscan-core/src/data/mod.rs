//! Market data retrieval.

pub mod csv_import;
pub mod fetch;
pub mod provider;
pub mod yahoo;

pub use csv_import::CsvDirProvider;
pub use fetch::{fetch_all, FetchSummary};
pub use provider::{
    DataError, DataProvider, DataSource, FetchProgress, FetchResult, LogProgress, SilentProgress,
};
pub use yahoo::YahooProvider;
