//! Property tests for symbol list parsing and the alert log.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use signalscan_core::domain::Signal;
use signalscan_runner::alerts::{excerpt, AlertLogEntry, RESPONSE_EXCERPT_CHARS};
use signalscan_runner::{AlertLog, ScannerConfig};

fn symbol() -> impl Strategy<Value = String> {
    "[A-Z&]{1,10}(\\.NS)?"
}

proptest! {
    /// Comma and newline separated lists parse back to the same symbols,
    /// whatever whitespace surrounds them.
    #[test]
    fn symbol_lists_round_trip_through_parsing(
        symbols in prop::collection::vec(symbol(), 0..20),
        pad in "[ \t]{0,3}",
        newline in any::<bool>(),
    ) {
        let sep = if newline { "\n" } else { "," };
        let text = symbols
            .iter()
            .map(|s| format!("{pad}{s}{pad}"))
            .collect::<Vec<_>>()
            .join(sep);
        prop_assert_eq!(ScannerConfig::parse_symbols(&text), symbols);
    }

    /// Excerpts never exceed the limit and are always a prefix.
    #[test]
    fn excerpt_is_bounded_prefix(text in "\\PC{0,400}") {
        let cut = excerpt(&text);
        prop_assert!(cut.chars().count() <= RESPONSE_EXCERPT_CHARS);
        prop_assert!(text.starts_with(&cut));
    }

    /// `recent(n)` returns the newest entries in append order.
    #[test]
    fn recent_is_tail_of_entries(count in 0usize..60, window in 0usize..30) {
        let log = AlertLog::new();
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 6, 0, 0).unwrap();
        for i in 0..count {
            log.append(AlertLogEntry {
                timestamp: ts,
                symbol: format!("S{i:03}"),
                signal: Signal::Hold,
                sent: i % 2 == 0,
                response_excerpt: String::new(),
            });
        }
        let all = log.entries();
        let recent = log.recent(window);
        prop_assert_eq!(recent.len(), window.min(count));
        prop_assert_eq!(&recent[..], &all[count - recent.len()..]);
    }
}
