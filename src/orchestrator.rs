//! Request-scoped forecasting policy.
//!
//! Given a series and a horizon, the orchestrator always answers with exactly
//! `horizon` values, each at or above the fallback floor:
//!
//! - empty series: fallback, reason [`FallbackReason::NoData`]
//! - fewer than `min_model_points`: fallback, [`FallbackReason::ThinData`]
//! - feature-based backend: cached or freshly trained model, then iterative
//!   one-step prediction over a rolling window that takes each prediction
//!   back in as input. A failing step keeps the earlier predictions and fills
//!   the rest from the fallback on the original series.
//! - series-based backend: one fit and one whole-horizon forecast, replaced
//!   entirely by the fallback on failure.

use crate::cache::{ModelCache, ModelEntry};
use crate::config::EngineConfig;
use crate::core::{FallbackReason, Forecast, ForecastMethod};
use crate::error::{ForecastError, Result};
use crate::features::padded_row;
use crate::models::{Backend, BackendKind, FallbackEstimator};
use log::{debug, warn};

/// Composes the model cache, the backends and the fallback estimator.
#[derive(Debug)]
pub struct Orchestrator {
    config: EngineConfig,
    models: ModelCache,
    fallback: FallbackEstimator,
}

impl Orchestrator {
    pub fn new(config: EngineConfig) -> Self {
        let fallback = FallbackEstimator::new(&config.fallback);
        Self {
            config,
            models: ModelCache::new(),
            fallback,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    /// The heuristic forecast used on every fallback path.
    pub fn fallback(&self, values: &[f64], horizon: usize) -> Vec<f64> {
        self.fallback.forecast(values, horizon)
    }

    /// Forecast `horizon` steps after `values` with the given backend.
    ///
    /// `model_key` scopes the trained model in the cache; it is ignored by
    /// series-based backends, which are fitted per call.
    pub fn forecast(
        &self,
        model_key: &str,
        values: &[f64],
        horizon: usize,
        kind: BackendKind,
    ) -> Forecast {
        let n = values.len();
        if n == 0 {
            debug!("'{}': no data, using fallback", model_key);
            return Forecast::fallback(self.fallback(values, horizon), FallbackReason::NoData);
        }
        if n < self.config.model.min_model_points {
            debug!("'{}': only {} points, using fallback", model_key, n);
            return Forecast::fallback(
                self.fallback(values, horizon),
                FallbackReason::ThinData { points: n },
            );
        }

        match kind.create(&self.config.model) {
            Backend::Regressor(_) => self.forecast_iterative(model_key, values, horizon, kind),
            Backend::Series(mut model) => {
                let result = model.fit(values).and_then(|_| model.forecast(horizon));
                match result {
                    Ok(predictions) if predictions.len() == horizon => Forecast::new(
                        self.floored(predictions),
                        ForecastMethod::Model { backend: kind },
                    ),
                    Ok(predictions) => self.unavailable(
                        values,
                        horizon,
                        ForecastError::DimensionMismatch {
                            expected: horizon,
                            got: predictions.len(),
                        },
                    ),
                    Err(e) => {
                        warn!("{} forecast failed for '{}': {}", kind.name(), model_key, e);
                        self.unavailable(values, horizon, e)
                    }
                }
            }
        }
    }

    fn forecast_iterative(
        &self,
        model_key: &str,
        values: &[f64],
        horizon: usize,
        kind: BackendKind,
    ) -> Forecast {
        let entry = match self
            .models
            .get_or_train(model_key, values, kind, &self.config.model)
        {
            Ok(entry) => entry,
            Err(e) => {
                warn!("model training failed for '{}': {}", model_key, e);
                return self.unavailable(values, horizon, e);
            }
        };

        let window_len = entry.window();
        let mut window: Vec<f64> = values[values.len().saturating_sub(window_len)..].to_vec();
        let mut predictions = Vec::with_capacity(horizon);
        let mut failure = None;

        for step in 0..horizon {
            if window.len() < window_len {
                failure = Some(ForecastError::InsufficientData {
                    needed: window_len,
                    got: window.len(),
                });
                break;
            }
            match predict_step(&entry, &window) {
                Ok(value) => {
                    let value = value.max(self.fallback.floor());
                    predictions.push(value);
                    // the prediction becomes input for the next step
                    window.push(value);
                    window.remove(0);
                }
                Err(e) => {
                    warn!("prediction failed for '{}' at step {}: {}", model_key, step, e);
                    failure = Some(e);
                    break;
                }
            }
        }

        let model_steps = predictions.len();
        if model_steps == horizon {
            return Forecast::new(predictions, ForecastMethod::Model { backend: kind });
        }
        if model_steps == 0 {
            let error = failure.unwrap_or_else(|| {
                ForecastError::ModelUnavailable("no prediction produced".into())
            });
            return self.unavailable(values, horizon, error);
        }

        predictions.extend(self.fallback(values, horizon - model_steps));
        Forecast::new(
            predictions,
            ForecastMethod::Partial {
                backend: kind,
                model_steps,
            },
        )
    }

    fn unavailable(&self, values: &[f64], horizon: usize, error: ForecastError) -> Forecast {
        let reason = match error {
            ForecastError::InsufficientData { .. } | ForecastError::EmptyData => {
                FallbackReason::ThinData {
                    points: values.len(),
                }
            }
            other => FallbackReason::ModelUnavailable(other.to_string()),
        };
        Forecast::fallback(self.fallback(values, horizon), reason)
    }

    fn floored(&self, predictions: Vec<f64>) -> Vec<f64> {
        let floor = self.fallback.floor();
        predictions
            .into_iter()
            .map(|v| if v.is_finite() { v.max(floor) } else { floor })
            .collect()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// One model prediction from the current rolling window.
fn predict_step(entry: &ModelEntry, window: &[f64]) -> Result<f64> {
    let row = padded_row(&window[window.len() - entry.window()..], entry.width());
    let scaled = entry.scaler().transform(&row)?;
    entry.model().predict_next(&scaled)
}
