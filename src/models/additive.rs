//! Additive trend plus weekly-seasonal decomposition.

use crate::error::{ForecastError, Result};
use crate::models::traits::SeriesForecaster;
use crate::utils::linear_fit;

/// Fewest observations the model will fit on.
pub const MIN_ADDITIVE_POINTS: usize = 4;

/// `y[t] = intercept + slope * t + seasonal[t % period]`.
///
/// Seasonal offsets are only estimated once two full periods are available;
/// they are the per-phase means of the detrended series, centred to sum to
/// zero.
#[derive(Debug, Clone)]
pub struct AdditiveDecomposition {
    period: usize,
    slope: f64,
    intercept: f64,
    seasonal: Vec<f64>,
    n: Option<usize>,
}

impl AdditiveDecomposition {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            slope: 0.0,
            intercept: 0.0,
            seasonal: Vec::new(),
            n: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    /// Seasonal offsets by phase, empty when the series was too short.
    pub fn seasonal(&self) -> &[f64] {
        &self.seasonal
    }
}

impl Default for AdditiveDecomposition {
    fn default() -> Self {
        Self::new(7)
    }
}

impl SeriesForecaster for AdditiveDecomposition {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.len() < MIN_ADDITIVE_POINTS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_ADDITIVE_POINTS,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".into(),
            ));
        }

        let (slope, intercept) = linear_fit(series);

        let seasonal = if self.period > 1 && series.len() >= 2 * self.period {
            let mut sums = vec![0.0; self.period];
            let mut counts = vec![0usize; self.period];
            for (t, &y) in series.iter().enumerate() {
                let phase = t % self.period;
                sums[phase] += y - (intercept + slope * t as f64);
                counts[phase] += 1;
            }
            let raw: Vec<f64> = sums
                .iter()
                .zip(&counts)
                .map(|(s, &c)| s / c as f64)
                .collect();
            let center = raw.iter().sum::<f64>() / self.period as f64;
            raw.iter().map(|s| s - center).collect()
        } else {
            Vec::new()
        };

        self.slope = slope;
        self.intercept = intercept;
        self.seasonal = seasonal;
        self.n = Some(series.len());
        Ok(())
    }

    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let n = self.n.ok_or(ForecastError::FitRequired)?;

        Ok((n..n + horizon)
            .map(|t| {
                let offset = if self.seasonal.is_empty() {
                    0.0
                } else {
                    self.seasonal[t % self.period]
                };
                self.intercept + self.slope * t as f64 + offset
            })
            .collect())
    }

    fn name(&self) -> &str {
        "AdditiveDecomposition"
    }

    fn is_fitted(&self) -> bool {
        self.n.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_trend_and_weekly_pattern() {
        let pattern = [2.0, -1.0, -1.0, 0.0, -1.0, -1.0, 2.0];
        let series: Vec<f64> = (0..28)
            .map(|t| 50.0 + 0.5 * t as f64 + pattern[t % 7])
            .collect();

        let mut model = AdditiveDecomposition::new(7);
        model.fit(&series).unwrap();
        assert_eq!(model.seasonal().len(), 7);
        assert_relative_eq!(model.seasonal().iter().sum::<f64>(), 0.0, epsilon = 1e-9);

        let forecast = model.forecast(7).unwrap();
        for (h, value) in forecast.iter().enumerate() {
            let t = 28 + h;
            let expected = 50.0 + 0.5 * t as f64 + pattern[t % 7];
            assert_relative_eq!(*value, expected, epsilon = 1e-6);
        }
    }

    #[test]
    fn short_series_skips_seasonality() {
        let mut model = AdditiveDecomposition::new(7);
        model.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(model.seasonal().is_empty());
        assert_relative_eq!(model.forecast(1).unwrap()[0], 6.0, epsilon = 1e-9);
    }

    #[test]
    fn too_few_points_is_insufficient() {
        let err = AdditiveDecomposition::default().fit(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 4, got: 3 });
    }

    #[test]
    fn forecast_requires_fit() {
        assert_eq!(
            AdditiveDecomposition::default().forecast(2),
            Err(ForecastError::FitRequired)
        );
    }
}
