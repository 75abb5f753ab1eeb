//! Ticker list loading.
//!
//! One symbol per line, UTF-8. Blank lines and lines starting with `#` are
//! skipped; surrounding whitespace is trimmed. Exchange suffixes are kept as
//! written (`2330.TW`, `0050.TW`).

use std::path::Path;

use crate::config::ConfigError;

/// Parse ticker-file content in file order, dropping repeats.
pub fn parse_tickers(content: &str) -> Vec<String> {
    let mut tickers: Vec<String> = Vec::new();
    for line in content.lines() {
        let symbol = line.trim_start_matches('\u{feff}').trim();
        if symbol.is_empty() || symbol.starts_with('#') {
            continue;
        }
        if tickers.iter().any(|t| t == symbol) {
            tracing::warn!(ticker = symbol, "duplicate ticker ignored");
            continue;
        }
        tickers.push(symbol.to_string());
    }
    tickers
}

/// Read and parse the ticker file; missing or empty lists are fatal.
pub fn load_tickers(path: &Path) -> Result<Vec<String>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::TickersMissing(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let tickers = parse_tickers(&content);
    if tickers.is_empty() {
        return Err(ConfigError::NoTickers(path.to_path_buf()));
    }
    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_comments_and_blanks() {
        let content = "# Taiwan ETFs\n0050.TW\n\n  2330.TW  \n#AAPL\nMSFT\n";
        assert_eq!(parse_tickers(content), vec!["0050.TW", "2330.TW", "MSFT"]);
    }

    #[test]
    fn strips_bom_and_crlf() {
        let content = "\u{feff}SPY\r\nQQQ\r\n";
        assert_eq!(parse_tickers(content), vec!["SPY", "QQQ"]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        assert_eq!(parse_tickers("AAA\nBBB\nAAA\n"), vec!["AAA", "BBB"]);
    }

    #[test]
    fn missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_tickers(&dir.path().join("nope.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::TickersMissing(_)));
    }

    #[test]
    fn comment_only_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        std::fs::write(&path, "# nothing yet\n\n").unwrap();
        let err = load_tickers(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NoTickers(_)));
    }

    #[test]
    fn loads_file_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.txt");
        std::fs::write(&path, "2330.TW\n0050.TW\n").unwrap();
        assert_eq!(load_tickers(&path).unwrap(), vec!["2330.TW", "0050.TW"]);
    }
}
