//! Property tests for ticker-file parsing.

use proptest::prelude::*;
use stockscan_runner::parse_tickers;

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z0-9]{1,5}(\\.TW)?"
}

fn arb_line() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => arb_symbol().prop_map(|s| format!("  {s} ")),
        1 => Just(String::new()),
        1 => arb_symbol().prop_map(|s| format!("# {s}")),
    ]
}

proptest! {
    #[test]
    fn parsed_symbols_are_clean_and_unique(lines in prop::collection::vec(arb_line(), 0..40)) {
        let content = lines.join("\n");
        let tickers = parse_tickers(&content);

        for t in &tickers {
            prop_assert!(!t.is_empty());
            prop_assert!(!t.starts_with('#'));
            prop_assert_eq!(t.trim(), t.as_str());
        }
        let mut dedup = tickers.clone();
        dedup.sort();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), tickers.len());
    }

    #[test]
    fn first_occurrence_order_is_kept(symbols in prop::collection::vec(arb_symbol(), 1..20)) {
        let content = symbols.join("\n");
        let tickers = parse_tickers(&content);

        let mut expected: Vec<String> = Vec::new();
        for s in &symbols {
            if !expected.contains(s) {
                expected.push(s.clone());
            }
        }
        prop_assert_eq!(tickers, expected);
    }
}
