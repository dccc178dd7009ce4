//! `reclass-store` — persistent per-product progress.
//!
//! The [`ProgressStore`] trait is the resumability source of truth: one row
//! per product carrying identity, old/new classification, status and error
//! message. The orchestrator is its single writer; restart re-derives all
//! run state from it.

pub mod import;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use reclass_core::{ProcessingState, Product, ProductId};

pub use import::{ImportError, import_csv};
pub use memory::InMemoryProgressStore;
pub use postgres::PostgresProgressStore;

/// Storage failure.
///
/// A non-fatal error fails the current item only (skip-and-continue);
/// [`StorageError::Unreachable`] aborts the whole run.
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The backend itself is gone (pool closed, connection refused). Fatal
    /// for the run.
    #[error("storage backend unreachable: {0}")]
    Unreachable(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl StorageError {
    /// True when the store as a whole is unusable, not just one operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StorageError::Unreachable(_))
    }
}

/// Aggregate progress counters, as persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct StoreStats {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
    pub errored: u64,
    /// Average confidence over completed products, if any exist.
    pub avg_confidence: Option<f64>,
}

/// Per-category rollup over completed products.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CategoryCount {
    pub category_code: String,
    pub category_name: String,
    pub count: u64,
    pub avg_confidence: f64,
}

/// Persistent table of per-product processing status and results.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Create/verify the storage schema. Idempotent.
    async fn create_schema(&self) -> Result<(), StorageError>;

    /// Insert freshly imported products (pending status). Returns the number
    /// of rows written.
    async fn insert_products(&self, products: &[Product]) -> Result<u64, StorageError>;

    /// Up to `limit` pending products with their context, ordered by product
    /// id so resumed runs make deterministic forward progress. Completed and
    /// errored items are excluded.
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<Product>, StorageError>;

    /// All products currently in error status, ordered by product id.
    async fn fetch_errored(&self) -> Result<Vec<Product>, StorageError>;

    /// Persist the outcome of a classification attempt. Atomic per product:
    /// status, classification and error message are written together, never
    /// partially.
    async fn upsert_result(
        &self,
        product_id: ProductId,
        state: &ProcessingState,
    ) -> Result<(), StorageError>;

    /// Move the given errored products back to pending (the explicit
    /// reprocess transition). Returns how many rows were reset; ids that are
    /// not in error status are left untouched.
    async fn reset_errored_to_pending(
        &self,
        product_ids: &[ProductId],
    ) -> Result<u64, StorageError>;

    /// Aggregate progress counters.
    async fn stats(&self) -> Result<StoreStats, StorageError>;

    /// Per-category distribution over completed products, most populous
    /// first.
    async fn category_distribution(&self) -> Result<Vec<CategoryCount>, StorageError>;
}
