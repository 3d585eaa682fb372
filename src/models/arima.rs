//! ARIMA(1,1,1) fitted by conditional sum of squares.

use crate::error::{ForecastError, Result};
use crate::models::traits::SeriesForecaster;
use crate::utils::mean;

/// Fewest observations the model will fit on.
pub const MIN_ARIMA_POINTS: usize = 8;

/// Coefficient grid searched for both the AR and MA terms.
const GRID_STEPS: i32 = 9;
const GRID_STEP: f64 = 0.1;

/// ARIMA(1,1,1) on the first difference of the series.
///
/// The drift is the mean of the differences; AR and MA coefficients are chosen
/// on a bounded grid by minimising the conditional sum of squares, which keeps
/// the fit stationary and invertible without an iterative optimiser.
#[derive(Debug, Clone, Default)]
pub struct Arima {
    ar: f64,
    ma: f64,
    drift: f64,
    last_level: Option<f64>,
    last_diff: f64,
    last_residual: f64,
    css: Option<f64>,
}

impl Arima {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ar_coefficient(&self) -> f64 {
        self.ar
    }

    pub fn ma_coefficient(&self) -> f64 {
        self.ma
    }

    pub fn drift(&self) -> f64 {
        self.drift
    }

    /// Conditional sum of squares at the chosen coefficients.
    pub fn css(&self) -> Option<f64> {
        self.css
    }

    /// Residuals of the differenced series for the given coefficients.
    fn residuals(diff: &[f64], ar: f64, ma: f64, drift: f64) -> Vec<f64> {
        let mut residuals = vec![0.0; diff.len()];
        for t in 1..diff.len() {
            let pred = drift + ar * (diff[t - 1] - drift) + ma * residuals[t - 1];
            residuals[t] = diff[t] - pred;
        }
        residuals
    }

    fn calculate_css(diff: &[f64], ar: f64, ma: f64, drift: f64) -> f64 {
        Self::residuals(diff, ar, ma, drift)
            .iter()
            .skip(1)
            .map(|e| e * e)
            .sum()
    }
}

impl SeriesForecaster for Arima {
    fn fit(&mut self, series: &[f64]) -> Result<()> {
        if series.len() < MIN_ARIMA_POINTS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_ARIMA_POINTS,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(
                "series contains non-finite values".into(),
            ));
        }

        let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
        let drift = mean(&diff);

        let mut best = (0.0, 0.0, f64::INFINITY);
        for i in -GRID_STEPS..=GRID_STEPS {
            for j in -GRID_STEPS..=GRID_STEPS {
                let ar = i as f64 * GRID_STEP;
                let ma = j as f64 * GRID_STEP;
                let css = Self::calculate_css(&diff, ar, ma, drift);
                if css < best.2 {
                    best = (ar, ma, css);
                }
            }
        }

        let (ar, ma, css) = best;
        if !css.is_finite() {
            return Err(ForecastError::ModelUnavailable(
                "conditional sum of squares diverged".into(),
            ));
        }

        let residuals = Self::residuals(&diff, ar, ma, drift);
        self.ar = ar;
        self.ma = ma;
        self.drift = drift;
        self.last_level = series.last().copied();
        self.last_diff = diff.last().copied().unwrap_or(0.0);
        self.last_residual = residuals.last().copied().unwrap_or(0.0);
        self.css = Some(css);
        Ok(())
    }

    fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let mut level = self.last_level.ok_or(ForecastError::FitRequired)?;

        let mut prev_diff = self.last_diff;
        let mut prev_residual = self.last_residual;
        let mut values = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let diff = self.drift + self.ar * (prev_diff - self.drift) + self.ma * prev_residual;
            level += diff;
            if !level.is_finite() {
                return Err(ForecastError::ModelUnavailable(
                    "non-finite ARIMA forecast".into(),
                ));
            }
            values.push(level);
            prev_diff = diff;
            // future shocks are zero
            prev_residual = 0.0;
        }
        Ok(values)
    }

    fn name(&self) -> &str {
        "ARIMA(1,1,1)"
    }

    fn is_fitted(&self) -> bool {
        self.last_level.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn linear_trend_continues() {
        let series: Vec<f64> = (0..20).map(|i| 10.0 + 2.0 * i as f64).collect();
        let mut model = Arima::new();
        model.fit(&series).unwrap();

        assert_relative_eq!(model.drift(), 2.0, epsilon = 1e-12);
        let forecast = model.forecast(3).unwrap();
        assert_relative_eq!(forecast[0], 50.0, epsilon = 1e-9);
        assert_relative_eq!(forecast[2], 54.0, epsilon = 1e-9);
    }

    #[test]
    fn constant_series_stays_flat() {
        let mut model = Arima::new();
        model.fit(&[6.0; 12]).unwrap();
        for v in model.forecast(5).unwrap() {
            assert_relative_eq!(v, 6.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn coefficients_stay_on_grid() {
        let series: Vec<f64> = (0..40)
            .map(|i| 20.0 + ((i * 13) % 7) as f64 - 3.0)
            .collect();
        let mut model = Arima::new();
        model.fit(&series).unwrap();

        assert!(model.ar_coefficient().abs() <= 0.9 + 1e-12);
        assert!(model.ma_coefficient().abs() <= 0.9 + 1e-12);
        assert!(model.css().unwrap() >= 0.0);
        assert_eq!(model.forecast(7).unwrap().len(), 7);
    }

    #[test]
    fn short_series_is_insufficient() {
        let err = Arima::new().fit(&[1.0; 7]).unwrap_err();
        assert_eq!(err, ForecastError::InsufficientData { needed: 8, got: 7 });
    }

    #[test]
    fn forecast_requires_fit() {
        assert_eq!(Arima::new().forecast(3), Err(ForecastError::FitRequired));
        assert!(!Arima::new().is_fitted());
    }
}
