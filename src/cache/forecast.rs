//! Cache of finished, user-facing forecast results.

use super::TtlCache;
use crate::config::CacheConfig;
use chrono::{DateTime, Utc};
use log::debug;
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Build a content-derived key `"{kind}_{sha256(target)}"`.
pub fn forecast_key(kind: &str, target: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.as_bytes());
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}_{}", kind, hex)
}

/// Forecast results keyed by forecast kind and target id.
///
/// The payload is opaque to the cache.
#[derive(Debug)]
pub struct ForecastCache<V> {
    inner: TtlCache<V>,
}

impl<V> ForecastCache<V> {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            inner: TtlCache::new(config.forecast_ttl(), config.max_entries),
        }
    }

    pub fn get(&self, kind: &str, target: &str) -> Option<Arc<V>> {
        self.get_at(kind, target, Utc::now())
    }

    pub fn get_at(&self, kind: &str, target: &str, now: DateTime<Utc>) -> Option<Arc<V>> {
        let key = forecast_key(kind, target);
        let hit = self.inner.get_at(&key, now);
        debug!(
            "forecast cache {}: {}",
            if hit.is_some() { "hit" } else { "miss" },
            key
        );
        hit
    }

    pub fn insert(&self, kind: &str, target: &str, value: V) -> Arc<V> {
        self.insert_at(kind, target, value, Utc::now())
    }

    pub fn insert_at(&self, kind: &str, target: &str, value: V, now: DateTime<Utc>) -> Arc<V> {
        self.inner.insert_at(forecast_key(kind, target), value, now)
    }

    /// Creation time of the cached result, if any.
    pub fn created_at(&self, kind: &str, target: &str) -> Option<DateTime<Utc>> {
        self.inner.created_at(&forecast_key(kind, target))
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn keys_are_stable_and_distinct() {
        let a = forecast_key("ml_product_forecast", "7");
        assert_eq!(a, forecast_key("ml_product_forecast", "7"));
        assert_ne!(a, forecast_key("ml_product_forecast", "8"));
        assert_ne!(a, forecast_key("ml_category_forecast", "7"));
        assert!(a.starts_with("ml_product_forecast_"));
        assert_eq!(a.len(), "ml_product_forecast_".len() + 64);
    }

    #[test]
    fn forecast_ttl_outlives_data_ttl() {
        let config = CacheConfig::default();
        let cache: ForecastCache<Vec<f64>> = ForecastCache::new(&config);
        let t = Utc::now();
        cache.insert_at("ml_general_forecast", "all", vec![1.0], t);

        assert!(cache
            .get_at("ml_general_forecast", "all", t + Duration::seconds(1000))
            .is_some());
        assert!(cache
            .get_at("ml_general_forecast", "all", t + Duration::seconds(1800))
            .is_none());
    }
}
