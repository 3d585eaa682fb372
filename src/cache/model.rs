//! Registry of trained feature-based models.

use crate::config::ModelConfig;
use crate::error::{ForecastError, Result};
use crate::features::{build_features, feature_width};
use crate::models::{Backend, BackendKind, BoxedRegressor};
use crate::transform::FeatureScaler;
use chrono::{DateTime, Utc};
use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A trained model with the scaler fitted on its training features.
#[derive(Debug)]
pub struct ModelEntry {
    key: String,
    kind: BackendKind,
    model: BoxedRegressor,
    scaler: FeatureScaler,
    window: usize,
    training_rows: usize,
    trained_at: DateTime<Utc>,
}

impl ModelEntry {
    /// Wrap a fitted model and the scaler of its training features.
    pub fn new(
        key: impl Into<String>,
        kind: BackendKind,
        model: BoxedRegressor,
        scaler: FeatureScaler,
        window: usize,
        training_rows: usize,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            model,
            scaler,
            window,
            training_rows,
            trained_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    pub fn model(&self) -> &BoxedRegressor {
        &self.model
    }

    pub fn scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    /// Raw window length the model was trained with.
    pub fn window(&self) -> usize {
        self.window
    }

    /// Feature row width the model expects.
    pub fn width(&self) -> usize {
        feature_width(self.window)
    }

    pub fn training_rows(&self) -> usize {
        self.training_rows
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

/// Trained models keyed by logical model identity.
///
/// Entries never expire; they are replaced wholesale on retrain and removed
/// only by explicit invalidation. Training happens outside the lock, so two
/// concurrent misses for one key both train and the last insert wins.
#[derive(Debug, Default)]
pub struct ModelCache {
    entries: RwLock<HashMap<String, Arc<ModelEntry>>>,
}

impl ModelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<ModelEntry>> {
        self.entries.read().get(key).cloned()
    }

    /// Return the cached model for `key`, training one on `series` on a miss
    /// or when the cached model is of a different backend.
    ///
    /// Trains on the last `training_tail` points and needs at least
    /// `min_training_points` raw points and `min_feature_rows` feature rows.
    pub fn get_or_train(
        &self,
        key: &str,
        series: &[f64],
        kind: BackendKind,
        config: &ModelConfig,
    ) -> Result<Arc<ModelEntry>> {
        match self.get(key) {
            Some(entry) if entry.kind == kind => {
                debug!("model cache hit: {}", key);
                return Ok(entry);
            }
            Some(entry) => debug!(
                "model cache entry '{}' holds {}, retraining as {}",
                key,
                entry.kind.name(),
                kind.name()
            ),
            None => debug!("model cache miss: {}", key),
        }

        let entry = Arc::new(train(key, series, kind, config)?);
        info!(
            "trained {} model '{}' on {} rows",
            kind.name(),
            key,
            entry.training_rows
        );

        self.entries
            .write()
            .insert(key.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    /// Store an already trained model, replacing any entry under its key.
    pub fn insert(&self, entry: ModelEntry) -> Arc<ModelEntry> {
        let entry = Arc::new(entry);
        self.entries
            .write()
            .insert(entry.key.clone(), Arc::clone(&entry));
        entry
    }

    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Cached entries ordered by key.
    pub fn entries(&self) -> Vec<Arc<ModelEntry>> {
        let mut entries: Vec<Arc<ModelEntry>> = self.entries.read().values().cloned().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }

    /// Cached model keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn train(
    key: &str,
    series: &[f64],
    kind: BackendKind,
    config: &ModelConfig,
) -> Result<ModelEntry> {
    let start = series.len().saturating_sub(config.training_tail);
    let tail = &series[start..];
    if tail.len() < config.min_training_points {
        return Err(ForecastError::InsufficientData {
            needed: config.min_training_points,
            got: tail.len(),
        });
    }

    let features = build_features(tail, config.window);
    if features.len() < config.min_feature_rows {
        return Err(ForecastError::InsufficientData {
            needed: config.min_feature_rows,
            got: features.len(),
        });
    }

    let scaler = FeatureScaler::fit(&features)?;
    let rows = scaler.transform_all(&features)?;

    let mut model = match kind.create(config) {
        Backend::Regressor(model) => model,
        Backend::Series(_) => {
            return Err(ForecastError::InvalidParameter(format!(
                "{} is not a feature-based backend",
                kind.name()
            )))
        }
    };
    model.fit(&rows, features.targets())?;

    Ok(ModelEntry::new(
        key,
        kind,
        model,
        scaler,
        config.window,
        features.len(),
    ))
}
