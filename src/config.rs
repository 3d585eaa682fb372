//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object yields the stock
//! configuration: 5 minute data cache, 30 minute forecast cache, a 7-day
//! feature window over the last 50 observations and a 10-tree ensemble.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the forecasting engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cache lifetimes and bounds
    pub cache: CacheConfig,
    /// Feature window and model training parameters
    pub model: ModelConfig,
    /// Heuristic fallback parameters
    pub fallback: FallbackConfig,
    /// Entity-level service parameters
    pub service: ServiceConfig,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time-to-live of loaded tables, in seconds
    pub data_ttl_secs: u64,
    /// Time-to-live of computed forecasts, in seconds
    pub forecast_ttl_secs: u64,
    /// Optional bound on the number of entries in each TTL cache
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_ttl_secs: 300,
            forecast_ttl_secs: 1800,
            max_entries: None,
        }
    }
}

impl CacheConfig {
    pub fn data_ttl(&self) -> Duration {
        Duration::from_secs(self.data_ttl_secs)
    }

    pub fn forecast_ttl(&self) -> Duration {
        Duration::from_secs(self.forecast_ttl_secs)
    }
}

/// Model training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of trailing observations in one feature vector
    pub window: usize,
    /// Number of most recent observations used for training
    pub training_tail: usize,
    /// Minimum raw points before a model is trained
    pub min_training_points: usize,
    /// Minimum feature rows after windowing
    pub min_feature_rows: usize,
    /// Below this many points the orchestrator goes straight to the fallback
    pub min_model_points: usize,
    /// Ridge penalty used by the linear backend
    pub ridge: f64,
    /// Seasonal period of the additive backend
    pub seasonal_period: usize,
    /// Tree-ensemble parameters
    pub ensemble: EnsembleConfig,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window: 7,
            training_tail: 50,
            min_training_points: 14,
            min_feature_rows: 5,
            min_model_points: 10,
            ridge: 1e-3,
            seasonal_period: 7,
            ensemble: EnsembleConfig::default(),
        }
    }
}

/// Tree-ensemble configuration, fixed for speed and determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnsembleConfig {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            n_estimators: 10,
            max_depth: 3,
            seed: 42,
        }
    }
}

/// Fallback estimator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Value returned for every step when there is no history at all
    pub default_value: f64,
    /// Length of the recent averaging window
    pub recent_days: usize,
    /// Lowest demand ever predicted
    pub floor: f64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            default_value: 10.0,
            recent_days: 7,
            floor: 1.0,
        }
    }
}

/// Entity forecast service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Forecast horizon in days
    pub horizon: usize,
    /// Row cap when loading sales for forecasts
    pub sales_max_rows: Option<usize>,
    /// Row cap when loading sales for stock recommendations
    pub stock_sales_max_rows: Option<usize>,
    /// Row cap when loading sales for summaries and rankings
    pub analytics_max_rows: Option<usize>,
    /// Days of average demand held as safety stock
    pub safety_days: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            horizon: 7,
            sales_max_rows: Some(10_000),
            stock_sales_max_rows: Some(30_000),
            analytics_max_rows: Some(50_000),
            safety_days: 3.0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON and validate it.
    ///
    /// # Example
    /// ```
    /// use demand_forecast::config::EngineConfig;
    ///
    /// let config = EngineConfig::from_json(r#"{ "service": { "horizon": 14 } }"#).unwrap();
    /// assert_eq!(config.service.horizon, 14);
    /// assert_eq!(config.model.window, 7);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ForecastError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for internally inconsistent values.
    pub fn validate(&self) -> Result<()> {
        let model = &self.model;
        if model.window == 0 {
            return Err(ForecastError::Config("window must be positive".into()));
        }
        if model.training_tail <= model.window {
            return Err(ForecastError::Config(format!(
                "training_tail ({}) must exceed window ({})",
                model.training_tail, model.window
            )));
        }
        if model.ensemble.n_estimators == 0 || model.ensemble.max_depth == 0 {
            return Err(ForecastError::Config(
                "ensemble needs at least one tree of depth one".into(),
            ));
        }
        if model.ridge < 0.0 || !model.ridge.is_finite() {
            return Err(ForecastError::Config("ridge must be non-negative".into()));
        }
        if self.service.horizon == 0 {
            return Err(ForecastError::Config("horizon must be positive".into()));
        }
        if self.fallback.recent_days == 0 {
            return Err(ForecastError::Config("recent_days must be positive".into()));
        }
        if self.cache.forecast_ttl_secs <= self.cache.data_ttl_secs {
            return Err(ForecastError::Config(format!(
                "forecast ttl ({}s) must be longer than data ttl ({}s)",
                self.cache.forecast_ttl_secs, self.cache.data_ttl_secs
            )));
        }
        Ok(())
    }
}
