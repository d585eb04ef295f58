//! Indicator engine: series in, enriched series out.

use super::{atr_percent, volume_ratio, Atr, Ema, Indicator, Rsi, VolumeMean, Vwap};
use crate::domain::{EnrichedSeries, IndicatorSnapshot, Series};

pub const EMA_FAST: usize = 9;
pub const EMA_SLOW: usize = 21;
pub const RSI_PERIOD: usize = 6;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_WINDOW: usize = 20;

/// Bars needed before every indicator in the scanner set is defined.
pub fn warmup_bars() -> usize {
    RSI_PERIOD.max(ATR_PERIOD)
}

/// Compute the scanner's indicator set over a series.
///
/// Pure and deterministic. An empty series yields an empty enriched series.
pub fn compute_indicators(series: &Series) -> EnrichedSeries {
    let bars = series.bars();
    if bars.is_empty() {
        return EnrichedSeries {
            symbol: series.symbol().to_string(),
            rows: Vec::new(),
        };
    }

    let vwap = Vwap::accumulate(bars);
    let ema_fast = Ema::new(EMA_FAST).compute(bars);
    let ema_slow = Ema::new(EMA_SLOW).compute(bars);
    let rsi = Rsi::new(RSI_PERIOD).compute(bars);
    let atr = Atr::new(ATR_PERIOD).compute(bars);
    let vol_mean = VolumeMean::new(VOLUME_WINDOW).compute(bars);

    let rows = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| IndicatorSnapshot {
            cum_tpv: vwap.cum_tpv[i],
            cum_volume: vwap.cum_volume[i],
            vwap: vwap.vwap[i],
            ema9: ema_fast[i],
            ema21: ema_slow[i],
            rsi6: rsi[i],
            atr14: atr[i],
            atr_pct: atr_percent(atr[i], bar.close),
            vol_mean20: vol_mean[i],
            vol_ratio: volume_ratio(bar.volume as f64, vol_mean[i]),
            ..IndicatorSnapshot::undefined(bar)
        })
        .collect();

    EnrichedSeries {
        symbol: series.symbol().to_string(),
        rows,
    }
}
