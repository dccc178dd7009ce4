//! In-memory progress store for tests and local development.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use reclass_core::{ProcessingState, ProcessingStatus, Product, ProductId};

use crate::{CategoryCount, ProgressStore, StorageError, StoreStats};

/// `ProgressStore` backed by a `BTreeMap` (so iteration order is product-id
/// order, matching the Postgres `ORDER BY id`).
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    rows: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read access for test assertions.
    pub fn get(&self, product_id: ProductId) -> Option<Product> {
        self.rows.read().unwrap().get(&product_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().unwrap().is_empty()
    }
}

fn with_state(product: &Product, state: ProcessingState) -> Product {
    Product::rehydrate(
        product.id(),
        product.name().to_string(),
        product.brand().map(String::from),
        product.model().map(String::from),
        product.original_category().map(String::from),
        product.old_classification().clone(),
        state,
        product.imported_at(),
    )
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn create_schema(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn insert_products(&self, products: &[Product]) -> Result<u64, StorageError> {
        let mut rows = self.rows.write().unwrap();
        for product in products {
            rows.insert(product.id(), product.clone());
        }
        Ok(products.len() as u64)
    }

    async fn fetch_pending(&self, limit: u32) -> Result<Vec<Product>, StorageError> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .filter(|p| p.status() == ProcessingStatus::Pending)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_errored(&self) -> Result<Vec<Product>, StorageError> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .filter(|p| p.status() == ProcessingStatus::Error)
            .cloned()
            .collect())
    }

    async fn upsert_result(
        &self,
        product_id: ProductId,
        state: &ProcessingState,
    ) -> Result<(), StorageError> {
        let mut rows = self.rows.write().unwrap();
        let product = rows
            .get(&product_id)
            .ok_or(StorageError::NotFound(product_id))?;
        let updated = with_state(product, state.clone());
        rows.insert(product_id, updated);
        Ok(())
    }

    async fn reset_errored_to_pending(
        &self,
        product_ids: &[ProductId],
    ) -> Result<u64, StorageError> {
        let mut rows = self.rows.write().unwrap();
        let mut reset = 0;
        for id in product_ids {
            if let Some(product) = rows.get(id) {
                if product.status() == ProcessingStatus::Error {
                    let updated = with_state(product, ProcessingState::Pending);
                    rows.insert(*id, updated);
                    reset += 1;
                }
            }
        }
        Ok(reset)
    }

    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let rows = self.rows.read().unwrap();
        let mut stats = StoreStats {
            total: rows.len() as u64,
            ..Default::default()
        };
        let mut confidence_sum = 0.0;
        for product in rows.values() {
            match product.status() {
                ProcessingStatus::Pending => stats.pending += 1,
                ProcessingStatus::Completed => {
                    stats.completed += 1;
                    if let Some(c) = product.state().classification() {
                        confidence_sum += c.confidence();
                    }
                }
                ProcessingStatus::Error => stats.errored += 1,
            }
        }
        if stats.completed > 0 {
            stats.avg_confidence = Some(confidence_sum / stats.completed as f64);
        }
        Ok(stats)
    }

    async fn category_distribution(&self) -> Result<Vec<CategoryCount>, StorageError> {
        let rows = self.rows.read().unwrap();
        let mut by_category: BTreeMap<(String, String), (u64, f64)> = BTreeMap::new();
        for product in rows.values() {
            if let Some(c) = product.state().classification() {
                let entry = by_category
                    .entry((c.category_code.clone(), c.category_name.clone()))
                    .or_default();
                entry.0 += 1;
                entry.1 += c.confidence();
            }
        }
        let mut counts: Vec<CategoryCount> = by_category
            .into_iter()
            .map(|((code, name), (count, sum))| CategoryCount {
                category_code: code,
                category_name: name,
                count,
                avg_confidence: sum / count as f64,
            })
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.category_code.cmp(&b.category_code)));
        Ok(counts)
    }
}
