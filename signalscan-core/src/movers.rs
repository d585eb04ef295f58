//! Top-mover ranking by composite short-term activity score.
//!
//! score = 2.0 × volume_ratio + 1.0 × ATR% + 1.0 × |% change since window open|

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::{EnrichedSeries, IndicatorSnapshot};

pub const VOLUME_RATIO_WEIGHT: f64 = 2.0;
pub const ATR_PCT_WEIGHT: f64 = 1.0;
pub const PCT_CHANGE_WEIGHT: f64 = 1.0;

/// What the ranking needs from one symbol's enriched series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoverInput {
    pub latest: IndicatorSnapshot,
    /// Open price of the first bar in the fetched window.
    pub window_open: f64,
}

impl MoverInput {
    /// `None` for an empty series: such symbols are never ranked.
    pub fn from_series(series: &EnrichedSeries) -> Option<Self> {
        Some(Self {
            latest: *series.latest()?,
            window_open: series.first()?.open,
        })
    }
}

/// One ranked symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoverRecord {
    pub symbol: String,
    pub percent_change: f64,
    pub volume_ratio: f64,
    pub atr_percent: f64,
    pub price: f64,
    pub score: f64,
}

/// 100 × (latest − open) / open
pub fn percent_change(latest_close: f64, window_open: f64) -> f64 {
    100.0 * (latest_close - window_open) / window_open
}

pub fn composite_score(volume_ratio: f64, atr_percent: f64, percent_change: f64) -> f64 {
    VOLUME_RATIO_WEIGHT * volume_ratio
        + ATR_PCT_WEIGHT * atr_percent
        + PCT_CHANGE_WEIGHT * percent_change.abs()
}

/// Build a record for one symbol. The score is NaN when any component is.
pub fn score_mover(symbol: &str, input: &MoverInput) -> MoverRecord {
    let latest = &input.latest;
    let pct = percent_change(latest.close, input.window_open);
    MoverRecord {
        symbol: symbol.to_string(),
        percent_change: pct,
        volume_ratio: latest.vol_ratio,
        atr_percent: latest.atr_pct,
        price: latest.close,
        score: composite_score(latest.vol_ratio, latest.atr_pct, pct),
    }
}

/// Descending score, NaN scores last, ties by symbol ascending.
fn rank_order(a: &MoverRecord, b: &MoverRecord) -> Ordering {
    match (a.score.is_nan(), b.score.is_nan()) {
        (false, false) => b.score.total_cmp(&a.score),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
    .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Rank a universe and keep the `top_n` highest scores.
///
/// Symbols mapped to `None` (no data) are excluded entirely. Fewer than
/// `top_n` qualifying symbols returns all of them.
pub fn rank_movers(universe: &BTreeMap<String, Option<MoverInput>>, top_n: usize) -> Vec<MoverRecord> {
    let mut records: Vec<MoverRecord> = universe
        .iter()
        .filter_map(|(symbol, input)| input.as_ref().map(|i| score_mover(symbol, i)))
        .collect();

    records.sort_by(rank_order);
    records.truncate(top_n);
    records
}

/// Convenience over enriched series: empty series are treated as no data.
pub fn rank_series(series: &[EnrichedSeries], top_n: usize) -> Vec<MoverRecord> {
    let universe: BTreeMap<String, Option<MoverInput>> = series
        .iter()
        .map(|s| (s.symbol.clone(), MoverInput::from_series(s)))
        .collect();
    rank_movers(&universe, top_n)
}
