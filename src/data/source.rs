//! Data source trait and an in-memory implementation.

use super::{Product, SalesRecord};
use crate::error::{ForecastError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Supplier of sales and catalog tables.
///
/// Implementations are called synchronously from request handlers and must be
/// shareable across threads.
pub trait DataSource: Send + Sync {
    /// Identifier used as part of data cache keys.
    fn id(&self) -> &str;

    /// Load sales rows, keeping at most `max_rows` when a cap is given.
    fn load_sales(&self, max_rows: Option<usize>) -> Result<Vec<SalesRecord>>;

    /// Load the product catalog.
    fn load_products(&self) -> Result<Vec<Product>>;
}

/// A data source backed by vectors held in memory.
///
/// Counts every load so callers can observe how often the data cache
/// actually reached the source.
#[derive(Debug, Default)]
pub struct InMemorySource {
    id: String,
    sales: Vec<SalesRecord>,
    products: Vec<Product>,
    unavailable: bool,
    loads: AtomicUsize,
}

impl InMemorySource {
    pub fn new(id: impl Into<String>, sales: Vec<SalesRecord>, products: Vec<Product>) -> Self {
        Self {
            id: id.into(),
            sales,
            products,
            unavailable: false,
            loads: AtomicUsize::new(0),
        }
    }

    /// A source whose every load fails.
    pub fn unavailable(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            unavailable: true,
            ..Default::default()
        }
    }

    /// Number of loads served so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }

    fn check_available(&self) -> Result<()> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        if self.unavailable {
            return Err(ForecastError::DataSource(format!(
                "source '{}' is unavailable",
                self.id
            )));
        }
        Ok(())
    }
}

impl DataSource for InMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    fn load_sales(&self, max_rows: Option<usize>) -> Result<Vec<SalesRecord>> {
        self.check_available()?;
        let take = max_rows.unwrap_or(self.sales.len());
        Ok(self.sales.iter().take(take).cloned().collect())
    }

    fn load_products(&self) -> Result<Vec<Product>> {
        self.check_available()?;
        Ok(self.products.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rows(n: usize) -> Vec<SalesRecord> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| SalesRecord {
                product_id: 1,
                date: start + chrono::Duration::days(i as i64),
                quantity: 1.0,
            })
            .collect()
    }

    #[test]
    fn row_cap_truncates_sales() {
        let source = InMemorySource::new("mem", rows(10), vec![]);
        assert_eq!(source.load_sales(Some(4)).unwrap().len(), 4);
        assert_eq!(source.load_sales(None).unwrap().len(), 10);
        assert_eq!(source.load_count(), 2);
    }

    #[test]
    fn unavailable_source_errors_and_counts() {
        let source = InMemorySource::unavailable("broken");
        assert!(matches!(
            source.load_sales(None),
            Err(ForecastError::DataSource(_))
        ));
        assert!(source.load_products().is_err());
        assert_eq!(source.load_count(), 2);
        assert_eq!(source.id(), "broken");
    }
}
