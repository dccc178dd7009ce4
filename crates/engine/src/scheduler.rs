//! Batch sizing and inter-batch pacing.

use std::time::Duration;

use thiserror::Error;

use reclass_core::product::Product;
use reclass_store::{ProgressStore, StorageError};

/// Rejected scheduler configuration.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
}

/// Hands out fixed-size batches of pending products and enforces the
/// pause between consecutive batches.
///
/// The scheduler never tracks batch membership itself: each call to
/// [`next_batch`](Self::next_batch) re-reads the pending set from the
/// store, so products completed by an earlier batch (or an earlier,
/// interrupted run) are never handed out again.
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    batch_size: u32,
    batch_delay: Duration,
    item_delay: Duration,
}

impl BatchScheduler {
    /// Default number of products per batch.
    pub const DEFAULT_BATCH_SIZE: u32 = 10;
    /// Default pause between consecutive batches.
    pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(2);

    pub fn new(batch_size: u32, batch_delay: Duration) -> Result<Self, SchedulerError> {
        if batch_size == 0 {
            return Err(SchedulerError::ZeroBatchSize);
        }
        Ok(Self {
            batch_size,
            batch_delay,
            item_delay: Duration::ZERO,
        })
    }

    /// Additional pause between consecutive products within a batch.
    pub fn with_item_delay(mut self, item_delay: Duration) -> Self {
        self.item_delay = item_delay;
        self
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    pub fn batch_delay(&self) -> Duration {
        self.batch_delay
    }

    pub fn item_delay(&self) -> Duration {
        self.item_delay
    }

    /// Number of pending rows to request: the batch plus `extra` slots for
    /// rows the caller is going to ignore.
    pub fn window(&self, extra: u32) -> u32 {
        self.batch_size.saturating_add(extra)
    }

    /// Fetches the next window of pending products, oldest import first.
    /// `extra` widens the window past rows the caller will drop (e.g. rows
    /// whose outcome could not be persisted this run), so those rows cannot
    /// crowd unattempted work out of the window. A fetch below the window
    /// means the pending set is drained.
    pub async fn next_batch<S>(&self, store: &S, extra: u32) -> Result<Vec<Product>, StorageError>
    where
        S: ProgressStore + ?Sized,
    {
        store.fetch_pending(self.window(extra)).await
    }

    /// Sleeps out the inter-batch delay after a batch has been fully
    /// persisted. `fetched` is the pre-filter row count of the fetch: a
    /// fetch below the window means the pending set is exhausted (the
    /// engine is the only writer during a run), so there is nothing to
    /// pace against and the wait is skipped.
    pub async fn pace_between_batches(&self, fetched: usize, extra: u32) {
        if fetched as u32 >= self.window(extra) && !self.batch_delay.is_zero() {
            tokio::time::sleep(self.batch_delay).await;
        }
    }

    /// Sleeps out the per-item delay between two products of one batch.
    pub async fn pace_between_items(&self) {
        if !self.item_delay.is_zero() {
            tokio::time::sleep(self.item_delay).await;
        }
    }
}

impl Default for BatchScheduler {
    fn default() -> Self {
        Self {
            batch_size: Self::DEFAULT_BATCH_SIZE,
            batch_delay: Self::DEFAULT_BATCH_DELAY,
            item_delay: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use reclass_core::ProductId;
    use reclass_store::memory::InMemoryProgressStore;

    async fn seeded_store(count: usize) -> InMemoryProgressStore {
        let store = InMemoryProgressStore::new();
        let products: Vec<_> = (0..count)
            .map(|i| Product::imported(ProductId::new(), format!("PRODUCT {i}"), None, None, None))
            .collect();
        store.insert_products(&products).await.unwrap();
        store
    }

    #[test]
    fn rejects_zero_batch_size() {
        assert!(matches!(
            BatchScheduler::new(0, Duration::ZERO),
            Err(SchedulerError::ZeroBatchSize)
        ));
    }

    #[tokio::test]
    async fn next_batch_caps_at_batch_size() {
        let store = seeded_store(7).await;
        let scheduler = BatchScheduler::new(5, Duration::ZERO).unwrap();

        let batch = scheduler.next_batch(&store, 0).await.unwrap();
        assert_eq!(batch.len(), 5);
    }

    #[tokio::test]
    async fn short_batch_returns_remainder() {
        let store = seeded_store(3).await;
        let scheduler = BatchScheduler::new(10, Duration::ZERO).unwrap();

        let batch = scheduler.next_batch(&store, 0).await.unwrap();
        assert_eq!(batch.len(), 3);
    }

    #[tokio::test]
    async fn window_widens_for_ignored_rows() {
        let store = seeded_store(7).await;
        let scheduler = BatchScheduler::new(5, Duration::ZERO).unwrap();

        assert_eq!(scheduler.window(2), 7);
        let batch = scheduler.next_batch(&store, 2).await.unwrap();
        assert_eq!(batch.len(), 7);
    }

    #[tokio::test]
    async fn pace_skips_delay_after_short_batch() {
        let scheduler = BatchScheduler::new(10, Duration::from_secs(60)).unwrap();

        // Would hang well past the test timeout if the delay were applied.
        tokio::time::timeout(Duration::from_millis(50), scheduler.pace_between_batches(3, 0))
            .await
            .expect("short batch must not be paced");
    }

    #[tokio::test]
    async fn pace_waits_after_full_batch() {
        let scheduler = BatchScheduler::new(2, Duration::from_millis(80)).unwrap();

        let started = std::time::Instant::now();
        scheduler.pace_between_batches(2, 0).await;
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn pace_compares_against_the_widened_window() {
        let scheduler = BatchScheduler::new(1, Duration::from_millis(80)).unwrap();

        // One fetched row with one ignored slot is a short window: no wait.
        tokio::time::timeout(Duration::from_millis(50), scheduler.pace_between_batches(1, 1))
            .await
            .expect("short window must not be paced");

        let started = std::time::Instant::now();
        scheduler.pace_between_batches(2, 1).await;
        assert!(started.elapsed() >= Duration::from_millis(80));
    }
}
