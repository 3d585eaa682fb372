//! Forecasting model backends.
//!
//! Two capability shapes share this module: feature-based regressors that
//! predict one step from a window of features, and series-based forecasters
//! that fit the raw history and produce the whole horizon at once. The
//! [`fallback`] heuristic sits beside them as the universal safety net.

mod traits;

pub mod additive;
pub mod arima;
pub mod fallback;
pub mod linear;
pub mod tree;

pub use additive::AdditiveDecomposition;
pub use arima::Arima;
pub use fallback::{fallback, FallbackEstimator};
pub use linear::LinearRegressor;
pub use traits::{
    Backend, BackendKind, BackendShape, BoxedRegressor, BoxedSeriesForecaster, FeatureRegressor,
    SeriesForecaster, MIN_TRAINING_ROWS,
};
pub use tree::{RegressionTree, TreeEnsemble};
