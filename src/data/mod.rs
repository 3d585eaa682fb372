//! Sales and catalog records and the data source boundary.
//!
//! Parsing files into records is the job of the data source; the engine only
//! ever sees already-typed rows.

mod source;

pub use source::{DataSource, InMemorySource};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sales transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_id: u32,
    pub date: NaiveDate,
    pub quantity: f64,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: f64,
    pub category_id: u32,
}

/// Find a product by id.
pub fn find_product(products: &[Product], id: u32) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

/// Ids of every product in a category.
pub fn category_members(products: &[Product], category_id: u32) -> Vec<u32> {
    products
        .iter()
        .filter(|p| p.category_id == category_id)
        .map(|p| p.id)
        .collect()
}
