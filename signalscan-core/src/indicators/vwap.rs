//! Volume-Weighted Average Price (VWAP), cumulative from the window start.
//!
//! VWAP[t] = Σ(typical_price × volume) / Σ(volume) over bars 0..=t.
//! The anchor is the first supplied bar, so callers pick the anchor by
//! choosing the window. Undefined while cumulative volume is zero.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone, Default)]
pub struct Vwap;

/// Running sums behind the VWAP series.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapAccumulation {
    pub cum_tpv: Vec<f64>,
    pub cum_volume: Vec<f64>,
    pub vwap: Vec<f64>,
}

impl Vwap {
    pub fn accumulate(bars: &[Bar]) -> VwapAccumulation {
        let n = bars.len();
        let mut cum_tpv = Vec::with_capacity(n);
        let mut cum_volume = Vec::with_capacity(n);
        let mut vwap = Vec::with_capacity(n);

        let mut tpv_sum = 0.0;
        let mut vol_sum = 0.0;
        for bar in bars {
            let volume = bar.volume as f64;
            tpv_sum += bar.typical_price() * volume;
            vol_sum += volume;
            cum_tpv.push(tpv_sum);
            cum_volume.push(vol_sum);
            vwap.push(if vol_sum > 0.0 {
                tpv_sum / vol_sum
            } else {
                f64::NAN
            });
        }

        VwapAccumulation {
            cum_tpv,
            cum_volume,
            vwap,
        }
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        Self::accumulate(bars).vwap
    }
}
