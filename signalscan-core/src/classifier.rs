//! Signal classifier: fixed threshold rules over the latest snapshot.
//!
//! BUY:  close > VWAP, EMA9 > EMA21, RSI6 in [55, 70], volume ratio >= 1.5
//! SELL: close < VWAP, EMA9 < EMA21, RSI6 in [30, 45], volume ratio >= 1.3
//! HOLD: anything else, including snapshots with undefined inputs.
//!
//! The VWAP and EMA conditions are strict and opposite, so no snapshot can
//! satisfy both BUY and SELL.

use thiserror::Error;

use crate::domain::{Classification, IndicatorSnapshot, Signal};

pub const BUY_RSI_MIN: f64 = 55.0;
pub const BUY_RSI_MAX: f64 = 70.0;
pub const BUY_MIN_VOLUME_RATIO: f64 = 1.5;
pub const SELL_RSI_MIN: f64 = 30.0;
pub const SELL_RSI_MAX: f64 = 45.0;
pub const SELL_MIN_VOLUME_RATIO: f64 = 1.3;

pub const REASON_INSUFFICIENT_DATA: &str = "insufficient data";
pub const REASON_NEUTRAL: &str = "neutral — no qualifying setup";
pub const REASON_BUY: &str = "Above VWAP + EMA9>EMA21 + RSI in [55-70] + Vol>=1.5x";
pub const REASON_SELL: &str = "Below VWAP + EMA9<EMA21 + RSI in [30-45] + Vol>=1.3x";

/// A snapshot that has every required field but cannot be classified.
#[derive(Debug, Error, PartialEq)]
pub enum ClassifyError {
    #[error("close price is not a finite number ({0})")]
    InvalidClose(f64),

    #[error("{field} is infinite")]
    Infinite { field: &'static str },

    #[error("RSI {0} outside [0, 100]")]
    RsiOutOfRange(f64),

    #[error("negative volume ratio {0}")]
    NegativeVolumeRatio(f64),
}

/// Classify a snapshot into BUY / SELL / HOLD.
///
/// Never fails: malformed snapshots become HOLD with the error as reason.
pub fn classify(snapshot: &IndicatorSnapshot) -> Classification {
    let required = [
        snapshot.vwap,
        snapshot.ema9,
        snapshot.ema21,
        snapshot.rsi6,
        snapshot.vol_ratio,
    ];
    if required.iter().any(|v| v.is_nan()) {
        return Classification::hold(REASON_INSUFFICIENT_DATA);
    }

    match evaluate(snapshot) {
        Ok(classification) => classification,
        Err(e) => {
            tracing::warn!(error = %e, "classification degraded to HOLD");
            Classification::hold(format!("classification error: {e}"))
        }
    }
}

/// Apply the threshold rules to a snapshot whose required fields are defined.
fn evaluate(s: &IndicatorSnapshot) -> Result<Classification, ClassifyError> {
    validate(s)?;

    if is_buy(s) {
        Ok(Classification::new(Signal::Buy, REASON_BUY))
    } else if is_sell(s) {
        Ok(Classification::new(Signal::Sell, REASON_SELL))
    } else {
        Ok(Classification::hold(REASON_NEUTRAL))
    }
}

fn validate(s: &IndicatorSnapshot) -> Result<(), ClassifyError> {
    if !s.close.is_finite() {
        return Err(ClassifyError::InvalidClose(s.close));
    }
    for (field, value) in [
        ("vwap", s.vwap),
        ("ema9", s.ema9),
        ("ema21", s.ema21),
        ("volume ratio", s.vol_ratio),
    ] {
        if value.is_infinite() {
            return Err(ClassifyError::Infinite { field });
        }
    }
    if !(0.0..=100.0).contains(&s.rsi6) {
        return Err(ClassifyError::RsiOutOfRange(s.rsi6));
    }
    if s.vol_ratio < 0.0 {
        return Err(ClassifyError::NegativeVolumeRatio(s.vol_ratio));
    }
    Ok(())
}

/// BUY rule. Callers must have excluded NaN inputs.
pub fn is_buy(s: &IndicatorSnapshot) -> bool {
    s.close > s.vwap
        && s.ema9 > s.ema21
        && (BUY_RSI_MIN..=BUY_RSI_MAX).contains(&s.rsi6)
        && s.vol_ratio >= BUY_MIN_VOLUME_RATIO
}

/// SELL rule. Callers must have excluded NaN inputs.
pub fn is_sell(s: &IndicatorSnapshot) -> bool {
    s.close < s.vwap
        && s.ema9 < s.ema21
        && (SELL_RSI_MIN..=SELL_RSI_MAX).contains(&s.rsi6)
        && s.vol_ratio >= SELL_MIN_VOLUME_RATIO
}
