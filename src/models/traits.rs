//! Backend capability traits and the backend selector.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::models::{AdditiveDecomposition, Arima, LinearRegressor, TreeEnsemble};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Fewest feature rows any feature-based backend will train on.
pub const MIN_TRAINING_ROWS: usize = 5;

/// A model trained on feature rows that predicts one step at a time.
pub trait FeatureRegressor: Debug + Send + Sync {
    /// Fit the model to feature rows and their targets.
    fn fit(&mut self, rows: &[Vec<f64>], targets: &[f64]) -> Result<()>;

    /// Predict the value that follows the window described by `row`.
    fn predict_next(&self, row: &[f64]) -> Result<f64>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;
}

/// A model fitted directly on the raw series that forecasts a whole horizon.
pub trait SeriesForecaster: Debug + Send + Sync {
    /// Fit the model to the raw quantities.
    fn fit(&mut self, series: &[f64]) -> Result<()>;

    /// Forecast `horizon` steps past the end of the fitted series.
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool;
}

/// Type alias for boxed feature regressors.
pub type BoxedRegressor = Box<dyn FeatureRegressor>;

/// Type alias for boxed series forecasters.
pub type BoxedSeriesForecaster = Box<dyn SeriesForecaster>;

/// The capability shape of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendShape {
    /// Trained on sliding-window features, predicts iteratively.
    FeatureBased,
    /// Trained on the raw series, forecasts the horizon in one call.
    SeriesBased,
}

/// The available model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Bagged shallow regression trees.
    #[default]
    TreeEnsemble,
    /// Ridge-stabilised linear regression.
    Linear,
    /// ARIMA(1,1,1).
    Arima,
    /// Linear trend plus seasonal offsets.
    AdditiveDecomposition,
}

impl BackendKind {
    pub fn shape(&self) -> BackendShape {
        match self {
            BackendKind::TreeEnsemble | BackendKind::Linear => BackendShape::FeatureBased,
            BackendKind::Arima | BackendKind::AdditiveDecomposition => BackendShape::SeriesBased,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::TreeEnsemble => "TreeEnsemble",
            BackendKind::Linear => "Linear",
            BackendKind::Arima => "ARIMA(1,1,1)",
            BackendKind::AdditiveDecomposition => "AdditiveDecomposition",
        }
    }

    /// Create an unfitted backend configured from `config`.
    pub fn create(&self, config: &ModelConfig) -> Backend {
        match self {
            BackendKind::TreeEnsemble => {
                Backend::Regressor(Box::new(TreeEnsemble::new(config.ensemble)))
            }
            BackendKind::Linear => Backend::Regressor(Box::new(LinearRegressor::new(config.ridge))),
            BackendKind::Arima => Backend::Series(Box::new(Arima::new())),
            BackendKind::AdditiveDecomposition => Backend::Series(Box::new(
                AdditiveDecomposition::new(config.seasonal_period),
            )),
        }
    }
}

/// An unfitted backend of either capability shape.
#[derive(Debug)]
pub enum Backend {
    Regressor(BoxedRegressor),
    Series(BoxedSeriesForecaster),
}

impl Backend {
    pub fn shape(&self) -> BackendShape {
        match self {
            Backend::Regressor(_) => BackendShape::FeatureBased,
            Backend::Series(_) => BackendShape::SeriesBased,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Backend::Regressor(model) => model.name(),
            Backend::Series(model) => model.name(),
        }
    }
}
