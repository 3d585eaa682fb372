//! Error types for the demand-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while loading data, training models or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// A model backend could not be fitted or failed while predicting.
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    /// The requested product or category does not exist in the catalog.
    #[error("invalid entity: {0}")]
    InvalidEntity(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Date ordering or quantity validation failed.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// The data source could not provide a table.
    #[error("data source error: {0}")]
    DataSource(String),

    /// Configuration could not be parsed or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ForecastError {
    /// Whether the orchestrator answers this error with a fallback forecast
    /// instead of surfacing it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ForecastError::EmptyData
                | ForecastError::InsufficientData { .. }
                | ForecastError::ModelUnavailable(_)
                | ForecastError::FitRequired
                | ForecastError::DimensionMismatch { .. }
        )
    }
}
