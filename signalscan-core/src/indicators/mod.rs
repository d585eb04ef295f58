//! Concrete indicator implementations and the indicator engine.
//!
//! Every indicator implements [`Indicator`]: a pure function from a bar
//! slice to a numeric series of the same length, with `f64::NAN` marking
//! bars where the indicator is not yet defined.
//!
//! [`compute_indicators`] runs the fixed scanner set (VWAP, EMA 9/21, RSI 6,
//! ATR 14, 20-bar volume mean) over a series and zips the results into one
//! [`IndicatorSnapshot`](crate::domain::IndicatorSnapshot) per bar.

pub mod atr;
pub mod ema;
pub mod engine;
pub mod rsi;
pub mod volume;
pub mod vwap;

pub use atr::{atr_percent, true_range, wilder_smooth, Atr};
pub use ema::{ema_of_series, Ema};
pub use engine::{
    compute_indicators, warmup_bars, ATR_PERIOD, EMA_FAST, EMA_SLOW, RSI_PERIOD, VOLUME_WINDOW,
};
pub use rsi::{rolling_rsi, Rsi};
pub use volume::{rolling_mean, volume_ratio, VolumeMean};
pub use vwap::{Vwap, VwapAccumulation};

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce an output series of the
/// same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// No value at bar t may depend on bars after t: computing over a truncated
/// series must reproduce the prefix of the full computation.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "ema_9", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars for which the output is undefined.
    fn lookback(&self) -> usize;

    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic minute bars from close prices for testing.
///
/// open = prev_close (or close for the first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 3, 4, 3, 45, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
