//! Column-wise standardization of feature rows.

use crate::error::{ForecastError, Result};
use crate::features::FeatureMatrix;
use crate::utils::stats;

/// Per-column z-score scaler fitted on training features.
///
/// Uses the population standard deviation; columns with (near) zero spread
/// keep a unit scale so constant features map to zero instead of NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    centers: Vec<f64>,
    scales: Vec<f64>,
}

impl FeatureScaler {
    /// Fit the scaler to every column of `features`.
    pub fn fit(features: &FeatureMatrix) -> Result<Self> {
        if features.is_empty() {
            return Err(ForecastError::EmptyData);
        }

        let width = features.width();
        if let Some(row) = features.rows().iter().find(|r| r.len() != width) {
            return Err(ForecastError::DimensionMismatch {
                expected: width,
                got: row.len(),
            });
        }

        let mut centers = Vec::with_capacity(width);
        let mut scales = Vec::with_capacity(width);
        for j in 0..width {
            let column = features.column(j);
            let center = stats::mean(&column);
            let spread = stats::population_std(&column);
            centers.push(center);
            scales.push(if spread < 1e-10 { 1.0 } else { spread });
        }

        Ok(Self { centers, scales })
    }

    /// Number of columns the scaler was fitted on.
    pub fn width(&self) -> usize {
        self.centers.len()
    }

    pub fn centers(&self) -> &[f64] {
        &self.centers
    }

    pub fn scales(&self) -> &[f64] {
        &self.scales
    }

    /// Scale one row with the fitted parameters.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.width(),
                got: row.len(),
            });
        }

        Ok(row
            .iter()
            .zip(self.centers.iter().zip(self.scales.iter()))
            .map(|(&x, (&c, &s))| (x - c) / s)
            .collect())
    }

    /// Scale every row of a matrix.
    pub fn transform_all(&self, features: &FeatureMatrix) -> Result<Vec<Vec<f64>>> {
        features.rows().iter().map(|r| self.transform(r)).collect()
    }
}
