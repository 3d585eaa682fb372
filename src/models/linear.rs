//! Ridge-stabilised linear regression on feature rows.

use crate::error::{ForecastError, Result};
use crate::models::traits::FeatureRegressor;
use crate::models::tree::validate_training_set;
use crate::utils::{mean, solve_symmetric};

/// Linear model `y = intercept + coefficients . x` fitted by ridge least
/// squares on centred columns, so the intercept is never penalised.
#[derive(Debug, Clone)]
pub struct LinearRegressor {
    ridge: f64,
    coefficients: Vec<f64>,
    intercept: f64,
    fitted: bool,
}

impl LinearRegressor {
    pub fn new(ridge: f64) -> Self {
        Self {
            ridge: ridge.max(0.0),
            coefficients: Vec::new(),
            intercept: 0.0,
            fitted: false,
        }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Default for LinearRegressor {
    fn default() -> Self {
        Self::new(1e-3)
    }
}

impl FeatureRegressor for LinearRegressor {
    fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<()> {
        validate_training_set(rows, targets)?;

        let n = rows.len();
        let p = rows[0].len();

        let x_means: Vec<f64> = (0..p)
            .map(|j| rows.iter().map(|r| r[j]).sum::<f64>() / n as f64)
            .collect();
        let y_mean = mean(targets);

        // x'x + ridge * I and x'y on centred data
        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &y) in rows.iter().zip(targets) {
            let yc = y - y_mean;
            for i in 0..p {
                let xi = row[i] - x_means[i];
                xty[i] += xi * yc;
                for j in 0..=i {
                    xtx[i][j] += xi * (row[j] - x_means[j]);
                }
            }
        }
        for i in 0..p {
            for j in 0..i {
                xtx[j][i] = xtx[i][j];
            }
            // keeps constant columns solvable
            xtx[i][i] += self.ridge.max(1e-10);
        }

        let coefficients = solve_symmetric(&xtx, &xty).ok_or_else(|| {
            ForecastError::ModelUnavailable("normal equations are not positive definite".into())
        })?;
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ModelUnavailable(
                "non-finite linear coefficients".into(),
            ));
        }

        self.intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_means)
                .map(|(c, m)| c * m)
                .sum::<f64>();
        self.coefficients = coefficients;
        self.fitted = true;
        Ok(())
    }

    fn predict_next(&self, row: &[f64]) -> Result<f64> {
        if !self.fitted {
            return Err(ForecastError::FitRequired);
        }
        if row.len() != self.coefficients.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.coefficients.len(),
                got: row.len(),
            });
        }

        let value = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, x)| c * x)
                .sum::<f64>();
        if !value.is_finite() {
            return Err(ForecastError::ModelUnavailable(format!(
                "non-finite prediction {}",
                value
            )));
        }
        Ok(value)
    }

    fn name(&self) -> &str {
        "Linear"
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn recovers_linear_relationship() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![i as f64, ((i * 7) % 11) as f64])
            .collect();
        let targets: Vec<f64> = rows.iter().map(|r| 3.0 + 2.0 * r[0] - 0.5 * r[1]).collect();

        let mut model = LinearRegressor::new(1e-8);
        model.fit(&rows, &targets).unwrap();

        assert_relative_eq!(model.coefficients()[0], 2.0, epsilon = 1e-5);
        assert_relative_eq!(model.coefficients()[1], -0.5, epsilon = 1e-5);
        assert_relative_eq!(model.intercept(), 3.0, epsilon = 1e-4);
        assert_relative_eq!(model.predict_next(&[40.0, 2.0]).unwrap(), 82.0, epsilon = 1e-3);
    }

    #[test]
    fn constant_column_does_not_break_fit() {
        let rows: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 1.0]).collect();
        let targets: Vec<f64> = (0..10).map(|i| i as f64).collect();

        let mut model = LinearRegressor::default();
        model.fit(&rows, &targets).unwrap();
        assert_relative_eq!(model.predict_next(&[12.0, 1.0]).unwrap(), 12.0, epsilon = 1e-2);
    }

    #[test]
    fn constant_targets_predict_constant() {
        let rows: Vec<Vec<f64>> = (0..8).map(|i| vec![i as f64]).collect();
        let mut model = LinearRegressor::default();
        model.fit(&rows, &[4.0; 8]).unwrap();
        assert_relative_eq!(model.predict_next(&[100.0]).unwrap(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn unfitted_and_mismatched_predictions_fail() {
        let model = LinearRegressor::default();
        assert_eq!(model.predict_next(&[1.0]), Err(ForecastError::FitRequired));

        let rows: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64, 0.0]).collect();
        let mut model = LinearRegressor::default();
        model.fit(&rows, &[1.0; 6]).unwrap();
        assert!(matches!(
            model.predict_next(&[1.0]),
            Err(ForecastError::DimensionMismatch { .. })
        ));
    }
}
