//! Indicator snapshots: one enriched record per input bar.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;

/// Derived indicator values attached to one bar.
///
/// Every derived field is `f64::NAN` until enough preceding bars exist to
/// seed its window. NaN here means "undefined", never an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    /// Running sum of typical price × volume from the window start.
    pub cum_tpv: f64,
    pub cum_volume: f64,
    pub vwap: f64,
    pub ema9: f64,
    pub ema21: f64,
    pub rsi6: f64,
    pub atr14: f64,
    pub atr_pct: f64,
    pub vol_mean20: f64,
    pub vol_ratio: f64,
}

impl IndicatorSnapshot {
    /// A snapshot with the bar's OHLCV and every derived field undefined.
    pub fn undefined(bar: &Bar) -> Self {
        Self {
            timestamp: bar.timestamp,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            cum_tpv: f64::NAN,
            cum_volume: f64::NAN,
            vwap: f64::NAN,
            ema9: f64::NAN,
            ema21: f64::NAN,
            rsi6: f64::NAN,
            atr14: f64::NAN,
            atr_pct: f64::NAN,
            vol_mean20: f64::NAN,
            vol_ratio: f64::NAN,
        }
    }
}

/// A symbol's series after the indicator engine has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSeries {
    pub symbol: String,
    pub rows: Vec<IndicatorSnapshot>,
}

impl EnrichedSeries {
    pub fn latest(&self) -> Option<&IndicatorSnapshot> {
        self.rows.last()
    }

    pub fn first(&self) -> Option<&IndicatorSnapshot> {
        self.rows.first()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
