//! Short-lived cache of loaded sales and catalog tables.

use super::TtlCache;
use crate::config::CacheConfig;
use crate::data::{DataSource, Product, SalesRecord};
use crate::error::Result;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::Arc;

/// Cache of raw tables keyed by source id and load parameters.
///
/// A failed load is logged and yields an empty table that is not cached, so
/// the next request tries the source again.
#[derive(Debug)]
pub struct DataCache {
    sales: TtlCache<Vec<SalesRecord>>,
    products: TtlCache<Vec<Product>>,
}

impl DataCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            sales: TtlCache::new(config.data_ttl(), config.max_entries),
            products: TtlCache::new(config.data_ttl(), config.max_entries),
        }
    }

    /// Cache key for a sales load.
    pub fn sales_key(source: &str, max_rows: Option<usize>) -> String {
        match max_rows {
            Some(rows) => format!("{}:sales_limited_{}", source, rows),
            None => format!("{}:sales_all", source),
        }
    }

    /// Cache key for the catalog of a source.
    pub fn products_key(source: &str) -> String {
        format!("{}:products", source)
    }

    pub fn sales(&self, source: &dyn DataSource, max_rows: Option<usize>) -> Arc<Vec<SalesRecord>> {
        self.sales_at(source, max_rows, Utc::now())
    }

    pub fn sales_at(
        &self,
        source: &dyn DataSource,
        max_rows: Option<usize>,
        now: DateTime<Utc>,
    ) -> Arc<Vec<SalesRecord>> {
        let key = Self::sales_key(source.id(), max_rows);
        if let Some(hit) = self.sales.get_at(&key, now) {
            debug!("data cache hit: {}", key);
            return hit;
        }

        debug!("data cache miss: {}", key);
        match source.load_sales(max_rows) {
            Ok(rows) => self.sales.insert_at(key, rows, now),
            Err(e) => {
                warn!("failed to load sales from '{}': {}", source.id(), e);
                Arc::new(Vec::new())
            }
        }
    }

    pub fn products(&self, source: &dyn DataSource) -> Arc<Vec<Product>> {
        self.try_products(source).unwrap_or_default()
    }

    /// The catalog of `source`, or the load error when it could not be read.
    ///
    /// Lets callers tell a catalog outage apart from an empty catalog.
    pub fn try_products(&self, source: &dyn DataSource) -> Result<Arc<Vec<Product>>> {
        self.try_products_at(source, Utc::now())
    }

    pub fn try_products_at(
        &self,
        source: &dyn DataSource,
        now: DateTime<Utc>,
    ) -> Result<Arc<Vec<Product>>> {
        let key = Self::products_key(source.id());
        if let Some(hit) = self.products.get_at(&key, now) {
            debug!("data cache hit: {}", key);
            return Ok(hit);
        }

        debug!("data cache miss: {}", key);
        match source.load_products() {
            Ok(rows) => Ok(self.products.insert_at(key, rows, now)),
            Err(e) => {
                warn!("failed to load products from '{}': {}", source.id(), e);
                Err(e)
            }
        }
    }

    /// Number of cached tables.
    pub fn len(&self) -> usize {
        self.sales.len() + self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.sales.clear();
        self.products.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::InMemorySource;
    use chrono::{Duration, NaiveDate};

    fn source() -> InMemorySource {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sales = (0..5)
            .map(|i| SalesRecord {
                product_id: 1,
                date: date + Duration::days(i),
                quantity: 2.0,
            })
            .collect();
        InMemorySource::new("memory", sales, Vec::new())
    }

    #[test]
    fn reload_only_after_ttl() {
        let source = source();
        let cache = DataCache::new(&CacheConfig::default());
        let t = Utc::now();

        let first = cache.sales_at(&source, Some(3), t);
        let again = cache.sales_at(&source, Some(3), t + Duration::seconds(299));
        assert_eq!(first.len(), 3);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(source.load_count(), 1);

        let fresh = cache.sales_at(&source, Some(3), t + Duration::seconds(300));
        assert!(!Arc::ptr_eq(&first, &fresh));
        assert_eq!(source.load_count(), 2);
    }

    #[test]
    fn row_cap_is_part_of_key() {
        let source = source();
        let cache = DataCache::new(&CacheConfig::default());
        assert_eq!(cache.sales(&source, Some(2)).len(), 2);
        assert_eq!(cache.sales(&source, None).len(), 5);
        assert_eq!(source.load_count(), 2);
        assert_ne!(
            DataCache::sales_key("memory", Some(2)),
            DataCache::sales_key("memory", None)
        );
    }

    #[test]
    fn failed_load_is_empty_and_uncached() {
        let source = InMemorySource::unavailable("down");
        let cache = DataCache::new(&CacheConfig::default());

        assert!(cache.sales(&source, None).is_empty());
        assert!(cache.products(&source).is_empty());
        assert!(cache.is_empty());
        cache.sales(&source, None);
        assert_eq!(source.load_count(), 3);
    }

    #[test]
    fn catalog_outage_is_distinct_from_empty_catalog() {
        let cache = DataCache::new(&CacheConfig::default());
        let down = InMemorySource::unavailable("down");
        assert!(matches!(
            cache.try_products(&down),
            Err(crate::error::ForecastError::DataSource(_))
        ));

        let empty = source();
        let t = Utc::now();
        let first = cache.try_products_at(&empty, t).unwrap();
        let again = cache.try_products_at(&empty, t + Duration::seconds(10)).unwrap();
        assert!(first.is_empty());
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(empty.load_count(), 1);
    }
}
