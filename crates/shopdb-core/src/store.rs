//! Collaborator interfaces the import pipeline writes through.
//!
//! The pipeline never talks to a database or filesystem directly; callers
//! pass implementations of these traits (Postgres and on-disk in
//! `shopdb-db`, in-memory fakes in tests).

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::{Category, NewProduct};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("conflicting record: {0}")]
    Conflict(String),
}

/// Read access to catalog categories.
#[async_trait]
pub trait CategoryLookup: Send + Sync {
    async fn find_category(&self, id: i32) -> Result<Option<Category>, StoreError>;
}

/// Product persistence used for duplicate detection and inserts.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the id of an existing product with exactly this name and brand.
    async fn find_product_by_name_and_brand(
        &self,
        name: &str,
        brand: &str,
    ) -> Result<Option<i64>, StoreError>;

    /// Inserts the product and its image rows as one unit and returns the
    /// new product id. Image rows are owned by the product.
    async fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError>;
}

/// Binary storage for downloaded image assets.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `bytes` under a newly generated opaque name and returns the
    /// URL to record on the image row.
    async fn save_bytes(&self, bytes: &[u8], suggested_extension: &str)
        -> Result<String, StoreError>;

    /// Removes a previously saved asset. Used to clean up after a product
    /// insert fails; implementations should tolerate missing files.
    async fn discard(&self, stored_url: &str) -> Result<(), StoreError>;
}
