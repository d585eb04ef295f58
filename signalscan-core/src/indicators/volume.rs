//! Rolling mean volume and volume ratio.
//!
//! The mean is taken over the trailing `window` bars with a minimum of one
//! sample, so it is defined from the first bar.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeMean {
    window: usize,
    name: String,
}

impl VolumeMean {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "volume window must be >= 1");
        Self {
            window,
            name: format!("vol_mean_{window}"),
        }
    }
}

impl Indicator for VolumeMean {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume as f64).collect();
        rolling_mean(&volumes, self.window)
    }
}

/// Trailing mean over up to `window` values (min_periods = 1).
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if window == 0 {
        return result;
    }

    let mut sum = 0.0;
    for i in 0..n {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        let count = (i + 1).min(window);
        result[i] = sum / count as f64;
    }

    result
}

/// volume / mean, NaN when the mean is zero or undefined.
pub fn volume_ratio(volume: f64, mean: f64) -> f64 {
    if mean.is_nan() || mean == 0.0 {
        f64::NAN
    } else {
        volume / mean
    }
}
