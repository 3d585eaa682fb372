//! # demand-forecast
//!
//! Short-horizon demand forecasting with layered caching.
//!
//! A request for the whole catalog, a product or a category is served from a
//! forecast cache when possible. Otherwise sales are loaded through a short
//! lived data cache, aggregated to a daily series and handed to the
//! [`Orchestrator`], which trains (or reuses) a lightweight model and predicts
//! the horizon one step at a time. Every path that cannot use a model answers
//! with a recent-average heuristic, so a forecast of the requested length is
//! always produced.
//!
//! ```
//! use demand_forecast::prelude::*;
//!
//! let orchestrator = Orchestrator::default();
//! let history: Vec<f64> = (0..20).map(|i| 10.0 + (i % 2) as f64 + i as f64 * 0.5).collect();
//!
//! let forecast = orchestrator.forecast("general_sales", &history, 7, BackendKind::TreeEnsemble);
//! assert_eq!(forecast.horizon(), 7);
//! assert!(forecast.values().iter().all(|&v| v >= 1.0));
//! ```

#![allow(clippy::needless_range_loop)]

pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod error;
pub mod features;
pub mod models;
pub mod orchestrator;
pub mod service;
pub mod transform;
pub mod utils;

pub use error::{ForecastError, Result};
pub use orchestrator::Orchestrator;

pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::core::{DemandSeries, FallbackReason, Forecast, ForecastMethod};
    pub use crate::data::{DataSource, InMemorySource, Product, SalesRecord};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::{fallback, BackendKind};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::service::{Entity, ForecastService};
}
