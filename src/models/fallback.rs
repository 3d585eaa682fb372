//! Heuristic fallback: recent average plus a week-over-week trend.
//!
//! Used whenever a trained model cannot run and as the last resort on any
//! failure. It never fails and never predicts below the configured floor.

use crate::config::FallbackConfig;
use crate::utils::mean;

/// Recent-average forecaster with a linear trend.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackEstimator {
    default_value: f64,
    recent_days: usize,
    floor: f64,
}

impl FallbackEstimator {
    pub fn new(config: &FallbackConfig) -> Self {
        Self {
            default_value: config.default_value,
            recent_days: config.recent_days.max(1),
            floor: config.floor,
        }
    }

    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Forecast `horizon` values from the raw history `values`.
    ///
    /// With no history every step is the default value. Otherwise step `i` is
    /// `recent + trend * i`, where `recent` is the mean of the last
    /// `recent_days` values and `trend` compares it with the mean of the
    /// `recent_days` before those (zero when the history is shorter than two
    /// such windows).
    pub fn forecast(&self, values: &[f64], horizon: usize) -> Vec<f64> {
        if values.is_empty() {
            return vec![self.default_value.max(self.floor); horizon];
        }

        let n = values.len();
        let days = self.recent_days;
        let recent = mean(&values[n.saturating_sub(days)..]);

        let trend = if n >= 2 * days {
            let previous = mean(&values[n - 2 * days..n - days]);
            (recent - previous) / days as f64
        } else {
            0.0
        };

        (0..horizon)
            .map(|i| {
                let value = recent + trend * i as f64;
                if value.is_finite() {
                    value.max(self.floor)
                } else {
                    self.floor
                }
            })
            .collect()
    }
}

impl Default for FallbackEstimator {
    fn default() -> Self {
        Self::new(&FallbackConfig::default())
    }
}

/// Fallback forecast with the default parameters.
///
/// # Example
///
/// ```
/// use demand_forecast::models::fallback;
///
/// assert_eq!(fallback(&[], 3), vec![10.0, 10.0, 10.0]);
/// assert_eq!(fallback(&[4.0, 6.0], 2), vec![5.0, 5.0]);
/// ```
pub fn fallback(values: &[f64], horizon: usize) -> Vec<f64> {
    FallbackEstimator::default().forecast(values, horizon)
}
