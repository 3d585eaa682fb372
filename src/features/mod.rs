//! Feature construction for the feature-based model backends.
//!
//! A feature vector is the raw window of the `W` most recent quantities
//! followed by their mean, population standard deviation, max, min and
//! linear-trend slope, so it is always `W + 5` wide.
//!
//! # Example
//!
//! ```
//! use demand_forecast::features::{build_features, feature_width};
//!
//! let values: Vec<f64> = (1..=20).map(|i| i as f64).collect();
//! let matrix = build_features(&values, 7);
//!
//! assert_eq!(matrix.len(), 13);
//! assert_eq!(matrix.width(), feature_width(7));
//! assert_eq!(matrix.targets()[0], 8.0);
//! ```

mod window;

pub use window::{
    build_features, feature_row, feature_width, padded_row, FeatureMatrix, MIN_TREND_POINTS,
    SUMMARY_FEATURES,
};
