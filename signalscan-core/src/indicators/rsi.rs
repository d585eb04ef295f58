//! Relative Strength Index (RSI), rolling-window variant.
//!
//! Average gain and average loss are simple means over the last `period`
//! close-to-close changes. RSI = 100 - 100 / (1 + avg_gain / avg_loss).
//! Lookback: period (the first change exists at bar 1).
//! Edge cases: avg_loss == 0 → 100 when avg_gain > 0, NaN when both are 0;
//! avg_gain == 0 → 0.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling_rsi(&closes, self.period)
    }
}

/// Rolling-window RSI over a close series.
pub fn rolling_rsi(closes: &[f64], period: usize) -> Vec<f64> {
    let n = closes.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period + 1 {
        return result;
    }

    // changes[i] = closes[i] - closes[i-1]; changes[0] is undefined
    let mut changes = vec![f64::NAN; n];
    for i in 1..n {
        changes[i] = closes[i] - closes[i - 1];
    }

    for i in period..n {
        let window = &changes[(i + 1 - period)..=i];
        if window.iter().any(|c| c.is_nan()) {
            continue;
        }
        let gains: f64 = window.iter().map(|&c| c.max(0.0)).sum();
        let losses: f64 = window.iter().map(|&c| (-c).max(0.0)).sum();
        result[i] = rsi_from_averages(gains / period as f64, losses / period as f64);
    }

    result
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 {
            100.0
        } else {
            f64::NAN
        }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 100.0, 1e-6);
        assert_approx(result[5], 100.0, 1e-6);
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = Rsi::new(3).compute(&bars);
        assert_approx(result[3], 0.0, 1e-6);
    }

    #[test]
    fn rsi_flat_is_undefined() {
        let bars = make_bars(&[100.0; 10]);
        let result = Rsi::new(6).compute(&bars);
        assert!(result.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn rsi_mixed_known_value() {
        // changes: +0.34, -0.25, -0.48, +0.72
        // window at bar 3: gains 0.34, losses 0.73 → RSI = 100 - 100/(1 + 0.34/0.73)
        // window at bar 4: gains 0.72, losses 0.73 → RSI = 100 - 100/(1 + 0.72/0.73)
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = Rsi::new(3).compute(&bars);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
        assert_approx(result[3], 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);
        assert_approx(result[4], 100.0 - 100.0 / (1.0 + 0.72 / 0.73), 1e-9);
    }

    #[test]
    fn rsi_6_undefined_for_first_six_bars() {
        let bars = make_bars(&[10.0, 11.0, 10.5, 11.5, 11.0, 12.0, 11.8, 12.4]);
        let result = Rsi::new(6).compute(&bars);
        for (i, v) in result.iter().enumerate().take(6) {
            assert!(v.is_nan(), "expected NaN at index {i}");
        }
        assert!(!result[6].is_nan());
        assert!(!result[7].is_nan());
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = Rsi::new(3).compute(&bars);
        for (i, &v) in result.iter().enumerate() {
            if !v.is_nan() {
                assert!(
                    (0.0..=100.0).contains(&v),
                    "RSI out of bounds at bar {i}: {v}"
                );
            }
        }
    }

    #[test]
    fn rsi_nan_only_affects_windows_containing_it() {
        let closes = [100.0, 101.0, f64::NAN, 103.0, 104.0, 105.0, 104.0];
        let result = rolling_rsi(&closes, 2);
        // changes 2 and 3 are NaN → windows ending at 2, 3, 4 are NaN
        assert!(result[2].is_nan());
        assert!(result[3].is_nan());
        assert!(result[4].is_nan());
        assert!(!result[5].is_nan());
        assert!(!result[6].is_nan());
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(6).lookback(), 6);
    }
}
