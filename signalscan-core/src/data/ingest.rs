//! Canonicalize raw provider bars into a valid [`Series`].
//!
//! Drops void bars (any NaN price) and bars that break the OHLC envelope,
//! sorts by timestamp and keeps the first bar of any duplicated timestamp.

use crate::domain::{Bar, Series};

use super::provider::{DataError, RawBar};

/// Outcome of ingesting one symbol's raw bars.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub series: Series,
    pub void_dropped: usize,
    pub insane_dropped: usize,
    pub duplicates_dropped: usize,
}

pub fn ingest(symbol: &str, raw: Vec<RawBar>) -> Result<IngestResult, DataError> {
    let mut void_dropped = 0;
    let mut insane_dropped = 0;

    let mut bars: Vec<Bar> = Vec::with_capacity(raw.len());
    for r in raw {
        let bar = Bar {
            timestamp: r.timestamp,
            open: r.open,
            high: r.high,
            low: r.low,
            close: r.close,
            volume: r.volume,
        };
        if bar.is_void() {
            void_dropped += 1;
        } else if !bar.is_sane() {
            insane_dropped += 1;
        } else {
            bars.push(bar);
        }
    }

    // Stable sort keeps provider order among equal timestamps, so dedup keeps the first
    bars.sort_by_key(|b| b.timestamp);
    let before = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    let duplicates_dropped = before - bars.len();

    if void_dropped + insane_dropped + duplicates_dropped > 0 {
        tracing::debug!(
            symbol,
            void_dropped,
            insane_dropped,
            duplicates_dropped,
            "dropped raw bars during ingest"
        );
    }

    Ok(IngestResult {
        series: Series::new(symbol, bars)?,
        void_dropped,
        insane_dropped,
        duplicates_dropped,
    })
}
