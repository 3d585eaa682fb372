//! Feature normalization.

mod scale;

pub use scale::FeatureScaler;
