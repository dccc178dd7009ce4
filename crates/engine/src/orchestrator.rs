//! The run loop: drain pending products batch by batch, classify with
//! retries, persist every terminal outcome.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use tracing::{debug, error, info, instrument, warn};

use reclass_classifier::{
    ClassificationCapability, Classifier, FailureKind, RetryDecision, RetryPolicy,
};
use reclass_core::{ProcessingState, Product, ProductId, RunId};
use reclass_store::{ProgressStore, StorageError};

use crate::report::{CostModel, RunOutcome, RunReport, RunStats};
use crate::scheduler::BatchScheduler;

/// Cooperative stop flag. Cloned into signal handlers; the orchestrator
/// checks it between products, so the in-flight product always reaches a
/// persisted terminal outcome before the run ends.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Drives a full re-classification run over a progress store.
///
/// Progress lives entirely in the store: the orchestrator keeps no product
/// list of its own, so a run interrupted at any point resumes by simply
/// starting a new run.
pub struct Orchestrator<C, S> {
    classifier: Classifier<C>,
    store: S,
    scheduler: BatchScheduler,
    policy: RetryPolicy,
    cost_model: CostModel,
    stop: StopSignal,
}

impl<C, S> Orchestrator<C, S>
where
    C: ClassificationCapability,
    S: ProgressStore,
{
    pub fn new(classifier: Classifier<C>, store: S, scheduler: BatchScheduler) -> Self {
        Self {
            classifier,
            store,
            scheduler,
            policy: RetryPolicy::default(),
            cost_model: CostModel::default(),
            stop: StopSignal::new(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cost_model(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    /// Handle for requesting a cooperative stop from another task.
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process the whole pending set to terminal outcomes.
    pub async fn run(&self) -> RunReport {
        let run_id = RunId::new();
        let started = Instant::now();
        let mut stats = RunStats::default();

        info!(
            %run_id,
            batch_size = self.scheduler.batch_size(),
            batch_delay_ms = self.scheduler.batch_delay().as_millis() as u64,
            max_attempts = self.policy.max_attempts,
            "classification run started"
        );

        let outcome = self.drive(&mut stats).await;
        let report = RunReport {
            run_id,
            estimated_cost: self
                .cost_model
                .estimate(stats.input_tokens, stats.output_tokens),
            outcome,
            stats,
            elapsed: started.elapsed(),
        };

        match &report.outcome {
            RunOutcome::Completed => info!(
                %run_id,
                processed = stats.processed,
                completed = stats.completed,
                errored = stats.errored,
                "run completed, pending set drained"
            ),
            RunOutcome::Stopped => info!(
                %run_id,
                processed = stats.processed,
                "run stopped on request, remaining products stay pending"
            ),
            RunOutcome::Aborted { reason } => error!(
                %run_id,
                processed = stats.processed,
                reason,
                "run aborted"
            ),
        }
        report
    }

    /// Reset errored products to pending, then run. Completed products are
    /// untouched.
    pub async fn reprocess_errors(&self) -> RunReport {
        let errored = match self.store.fetch_errored().await {
            Ok(errored) => errored,
            Err(e) => return Self::aborted_before_start(e),
        };

        if errored.is_empty() {
            info!("no errored products to reprocess");
        } else {
            let ids: Vec<ProductId> = errored.iter().map(Product::id).collect();
            match self.store.reset_errored_to_pending(&ids).await {
                Ok(reset) => info!(reset, "errored products reset to pending"),
                Err(e) => return Self::aborted_before_start(e),
            }
        }
        self.run().await
    }

    fn aborted_before_start(error: StorageError) -> RunReport {
        error!(%error, "run aborted before processing started");
        RunReport {
            run_id: RunId::new(),
            outcome: RunOutcome::Aborted {
                reason: error.to_string(),
            },
            stats: RunStats::default(),
            elapsed: std::time::Duration::ZERO,
            estimated_cost: 0.0,
        }
    }

    async fn drive(&self, stats: &mut RunStats) -> RunOutcome {
        // Products whose outcome could not be persisted this run. They stay
        // pending in the store and sort first by id, so the fetch window is
        // widened past them; otherwise they would crowd out (and hide)
        // unattempted pending work.
        let mut skipped: HashSet<ProductId> = HashSet::new();
        loop {
            let extra = skipped.len() as u32;
            let mut batch = match self.scheduler.next_batch(&self.store, extra).await {
                Ok(batch) => batch,
                Err(e) => {
                    return RunOutcome::Aborted {
                        reason: format!("failed to fetch pending batch: {e}"),
                    };
                }
            };
            let fetched = batch.len();
            batch.retain(|p| !skipped.contains(&p.id()));
            if batch.is_empty() {
                // The window holds batch_size slots beyond the skip set, so
                // an all-skipped fetch is necessarily below the window: the
                // whole pending set was seen and only skipped rows remain.
                if fetched > 0 {
                    warn!(
                        skipped = skipped.len(),
                        "only storage-failed products remain pending"
                    );
                }
                return RunOutcome::Completed;
            }
            stats.batches += 1;
            debug!(batch = stats.batches, size = batch.len(), "batch fetched");

            for (index, product) in batch.iter().enumerate() {
                // Unstarted products stay pending for the next run.
                if self.stop.is_stop_requested() {
                    return RunOutcome::Stopped;
                }
                if index > 0 {
                    self.scheduler.pace_between_items().await;
                }
                match self.process_product(product, stats).await {
                    Ok(persisted) => {
                        if !persisted {
                            skipped.insert(product.id());
                        }
                    }
                    Err(e) => {
                        return RunOutcome::Aborted {
                            reason: e.to_string(),
                        };
                    }
                }
            }

            if self.stop.is_stop_requested() {
                return RunOutcome::Stopped;
            }
            // Pace on the pre-filter count: a window kept full by skipped
            // rows still means more work is coming.
            self.scheduler.pace_between_batches(fetched, extra).await;
        }
    }

    /// Classify one product (with retries) and persist the terminal outcome.
    ///
    /// Returns `Ok(false)` when the outcome could not be persisted
    /// non-fatally; only a fatal storage failure escapes as an error.
    #[instrument(skip(self, stats), fields(product_id = %product.id(), product = product.name()))]
    async fn process_product(
        &self,
        product: &Product,
        stats: &mut RunStats,
    ) -> Result<bool, StorageError> {
        let mut attempt = 1u32;
        let classified = loop {
            match self.classifier.classify(product).await {
                Ok(classified) => break Ok(classified),
                Err(error) => match self.policy.decide(attempt, error.kind()) {
                    RetryDecision::RetryAfter(delay) => {
                        stats.retries += 1;
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            %error,
                            "transient classification failure, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => break Err((attempt, error)),
                },
            }
        };

        let transition = match classified {
            Ok(classified) => {
                if let Some(usage) = classified.usage {
                    stats.record_usage(usage);
                }
                product.state().clone().complete(classified.classification)
            }
            Err((attempts, error)) => {
                let message = match error.kind() {
                    FailureKind::Transient if attempts > 1 => {
                        format!("retries exhausted after {attempts} attempts: {error}")
                    }
                    FailureKind::Transient => format!("failed on the only attempt: {error}"),
                    FailureKind::Permanent => error.to_string(),
                };
                warn!(attempts, error = %message, "product failed terminally");
                product.state().clone().fail(message)
            }
        };
        let state = match transition {
            Ok(state) => state,
            Err(e) => {
                // fetch_pending only hands out pending rows, so this means
                // the store and the run disagree about the product's state.
                error!(error = %e, "refusing to persist illegal transition");
                return Ok(false);
            }
        };

        match self.store.upsert_result(product.id(), &state).await {
            Ok(()) => match &state {
                ProcessingState::Completed { classification } => {
                    stats.record_completed(classification.confidence());
                }
                ProcessingState::Error { .. } => stats.record_errored(),
                ProcessingState::Pending => {}
            },
            Err(e) if e.is_fatal() => {
                error!(error = %e, "progress store unreachable");
                return Err(e);
            }
            Err(e) => {
                warn!(error = %e, "failed to persist outcome, product stays pending");
                stats.record_storage_failure();
                return Ok(false);
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use reclass_classifier::{
        CapabilityError, CapabilityResponse, ClassificationRequest, TokenUsage,
    };
    use reclass_core::ProcessingStatus;
    use reclass_store::memory::InMemoryProgressStore;
    use reclass_store::{CategoryCount, StoreStats};
    use reclass_taxonomy::TaxonomyCatalog;

    /// Capability that replays a scripted sequence of results and records
    /// the instant of every call.
    #[derive(Default)]
    struct ScriptedCapability {
        script: Mutex<VecDeque<Result<CapabilityResponse, CapabilityError>>>,
        calls: Mutex<Vec<Instant>>,
        stop_on_first_call: Option<StopSignal>,
    }

    impl ScriptedCapability {
        fn new(
            script: impl IntoIterator<Item = Result<CapabilityResponse, CapabilityError>>,
        ) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                ..Self::default()
            }
        }

        fn push(&self, result: Result<CapabilityResponse, CapabilityError>) {
            self.script.lock().unwrap().push_back(result);
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn call_instants(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClassificationCapability for &ScriptedCapability {
        async fn classify(
            &self,
            _request: &ClassificationRequest,
        ) -> Result<CapabilityResponse, CapabilityError> {
            self.calls.lock().unwrap().push(Instant::now());
            if let Some(signal) = &self.stop_on_first_call {
                signal.request_stop();
            }
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CapabilityError::Rejected("script exhausted".into())))
        }
    }

    fn response(category: &str, subcategory: &str, confidence: f64) -> CapabilityResponse {
        CapabilityResponse {
            department_code: "D03".to_string(),
            department_name: String::new(),
            category_code: category.to_string(),
            category_name: String::new(),
            subcategory_code: subcategory.to_string(),
            subcategory_name: String::new(),
            confidence,
            usage: Some(TokenUsage {
                input_tokens: 1000,
                output_tokens: 50,
            }),
        }
    }

    fn valid_response() -> CapabilityResponse {
        response("S47", "C163", 0.95)
    }

    fn product(name: &str) -> Product {
        Product::imported(ProductId::new(), name, None, None, None)
    }

    async fn seeded_store(products: &[Product]) -> InMemoryProgressStore {
        let store = InMemoryProgressStore::new();
        store.insert_products(products).await.unwrap();
        store
    }

    fn orchestrator<'a, S: ProgressStore>(
        capability: &'a ScriptedCapability,
        store: S,
        batch_size: u32,
        batch_delay: Duration,
    ) -> Orchestrator<&'a ScriptedCapability, S> {
        let scheduler = BatchScheduler::new(batch_size, batch_delay).unwrap();
        Orchestrator::new(
            Classifier::new(capability, TaxonomyCatalog::builtin()),
            store,
            scheduler,
        )
        .with_retry_policy(RetryPolicy::fixed(3, Duration::ZERO))
    }

    #[tokio::test]
    async fn transient_failures_are_retried_then_succeed() {
        let capability = ScriptedCapability::new([
            Err(CapabilityError::Timeout),
            Err(CapabilityError::Timeout),
            Ok(valid_response()),
        ]);
        let p = product("DISJUNTOR MOTOR 3P 30-36A");
        let orch = orchestrator(
            &capability,
            seeded_store(std::slice::from_ref(&p)).await,
            10,
            Duration::ZERO,
        );

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(capability.call_count(), 3);
        assert_eq!(report.stats.completed, 1);
        assert_eq!(report.stats.retries, 2);

        let stored = orch.store().get(p.id()).unwrap();
        assert_eq!(stored.status(), ProcessingStatus::Completed);
        let classification = stored.state().classification().unwrap();
        assert_eq!(classification.category_code, "S47");
        assert_eq!(classification.subcategory_name, "Fusíveis e disjuntores");
        assert!(classification.confidence() >= 0.9);
    }

    #[tokio::test]
    async fn exhausted_retries_mark_the_product_errored() {
        let capability = ScriptedCapability::new([
            Err(CapabilityError::Timeout),
            Err(CapabilityError::Timeout),
            Err(CapabilityError::Timeout),
        ]);
        let p = product("fails forever");
        let orch = orchestrator(
            &capability,
            seeded_store(std::slice::from_ref(&p)).await,
            10,
            Duration::ZERO,
        );

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(capability.call_count(), 3);
        assert_eq!(report.stats.errored, 1);

        let stored = orch.store().get(p.id()).unwrap();
        assert_eq!(stored.status(), ProcessingStatus::Error);
        let message = stored.state().error_message().unwrap();
        assert!(message.contains("retries exhausted after 3 attempts"));
    }

    #[tokio::test]
    async fn invalid_taxonomy_code_fails_without_retry() {
        let capability = ScriptedCapability::new([Ok(response("S99", "C163", 0.9))]);
        let p = product("unknown category");
        let orch = orchestrator(
            &capability,
            seeded_store(std::slice::from_ref(&p)).await,
            10,
            Duration::ZERO,
        );

        let report = orch.run().await;

        // Permanent failure: exactly one call, no retries.
        assert_eq!(capability.call_count(), 1);
        assert_eq!(report.stats.errored, 1);
        assert_eq!(report.stats.retries, 0);

        let stored = orch.store().get(p.id()).unwrap();
        assert_eq!(stored.status(), ProcessingStatus::Error);
        assert!(stored.state().classification().is_none());
        assert!(stored.state().error_message().unwrap().contains("S99"));
    }

    #[tokio::test]
    async fn a_second_run_processes_nothing() {
        let capability = ScriptedCapability::new([Ok(valid_response())]);
        let p = product("once");
        let orch = orchestrator(
            &capability,
            seeded_store(std::slice::from_ref(&p)).await,
            10,
            Duration::ZERO,
        );

        let first = orch.run().await;
        assert_eq!(first.stats.processed, 1);

        let second = orch.run().await;
        assert_eq!(second.outcome, RunOutcome::Completed);
        assert_eq!(second.stats.processed, 0);
        assert_eq!(capability.call_count(), 1);
    }

    #[tokio::test]
    async fn a_run_resumes_where_the_previous_one_left_off() {
        let products = [product("done earlier"), product("p1"), product("p2")];
        let store = seeded_store(&products).await;
        // One product already completed by an earlier, interrupted run.
        let prior = ProcessingState::Pending
            .complete(
                reclass_core::NewClassification::new(
                    "D03", "MRO", "S47", "Elétricos", "C163", "Fusíveis", 0.9,
                    chrono::Utc::now(),
                )
                .unwrap(),
            )
            .unwrap();
        store.upsert_result(products[0].id(), &prior).await.unwrap();

        let capability =
            ScriptedCapability::new([Ok(valid_response()), Ok(valid_response())]);
        let orch = orchestrator(&capability, store, 10, Duration::ZERO);

        let report = orch.run().await;

        assert_eq!(report.stats.processed, 2);
        assert_eq!(capability.call_count(), 2);
        let stats = orch.store().stats().await.unwrap();
        assert_eq!(stats.completed, 3);
        assert_eq!(stats.pending, 0);
    }

    #[tokio::test]
    async fn reprocess_errors_resets_only_errored_products() {
        let capability = ScriptedCapability::new([
            Ok(valid_response()),
            Ok(response("S99", "C163", 0.9)), // errors out
        ]);
        let products = ordered_products(&["good", "bad"]);
        let orch = orchestrator(&capability, seeded_store(&products).await, 10, Duration::ZERO);

        let first = orch.run().await;
        assert_eq!(first.stats.completed, 1);
        assert_eq!(first.stats.errored, 1);

        // The second pass classifies the previously errored product.
        capability.push(Ok(valid_response()));
        let second = orch.reprocess_errors().await;

        assert_eq!(second.outcome, RunOutcome::Completed);
        assert_eq!(second.stats.processed, 1);
        assert_eq!(second.stats.completed, 1);
        assert_eq!(
            orch.store().get(products[1].id()).unwrap().status(),
            ProcessingStatus::Completed
        );
    }

    #[tokio::test]
    async fn stop_request_finishes_the_in_flight_product() {
        let mut capability = ScriptedCapability::new([Ok(valid_response())]);
        let signal = StopSignal::new();
        capability.stop_on_first_call = Some(signal.clone());

        let products = ordered_products(&["in flight", "left", "behind"]);
        let orch = {
            let scheduler = BatchScheduler::new(10, Duration::ZERO).unwrap();
            Orchestrator::new(
                Classifier::new(&capability, TaxonomyCatalog::builtin()),
                seeded_store(&products).await,
                scheduler,
            )
        };
        // Share the externally triggered signal.
        let orch = Orchestrator {
            stop: signal,
            ..orch
        };

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Stopped);
        assert_eq!(report.stats.processed, 1);
        assert_eq!(capability.call_count(), 1);
        // The in-flight product was persisted; the rest stay pending.
        assert_eq!(
            orch.store().get(products[0].id()).unwrap().status(),
            ProcessingStatus::Completed
        );
        assert_eq!(
            orch.store().get(products[1].id()).unwrap().status(),
            ProcessingStatus::Pending
        );
    }

    #[tokio::test]
    async fn full_batches_are_paced_apart() {
        let capability =
            ScriptedCapability::new([Ok(valid_response()), Ok(valid_response())]);
        let products = [product("first batch"), product("second batch")];
        let orch = orchestrator(
            &capability,
            seeded_store(&products).await,
            1,
            Duration::from_millis(60),
        );

        let report = orch.run().await;
        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.batches, 2);

        let calls = capability.call_instants();
        assert_eq!(calls.len(), 2);
        assert!(calls[1] - calls[0] >= Duration::from_millis(60));
    }

    /// Store whose `upsert_result` replays scripted failures before
    /// delegating to the in-memory store.
    struct FailingUpsertStore {
        inner: InMemoryProgressStore,
        upsert_failures: Mutex<VecDeque<StorageError>>,
    }

    #[async_trait]
    impl ProgressStore for FailingUpsertStore {
        async fn create_schema(&self) -> Result<(), StorageError> {
            self.inner.create_schema().await
        }
        async fn insert_products(&self, products: &[Product]) -> Result<u64, StorageError> {
            self.inner.insert_products(products).await
        }
        async fn fetch_pending(&self, limit: u32) -> Result<Vec<Product>, StorageError> {
            self.inner.fetch_pending(limit).await
        }
        async fn fetch_errored(&self) -> Result<Vec<Product>, StorageError> {
            self.inner.fetch_errored().await
        }
        async fn upsert_result(
            &self,
            product_id: ProductId,
            state: &ProcessingState,
        ) -> Result<(), StorageError> {
            if let Some(error) = self.upsert_failures.lock().unwrap().pop_front() {
                return Err(error);
            }
            self.inner.upsert_result(product_id, state).await
        }
        async fn reset_errored_to_pending(
            &self,
            product_ids: &[ProductId],
        ) -> Result<u64, StorageError> {
            self.inner.reset_errored_to_pending(product_ids).await
        }
        async fn stats(&self) -> Result<StoreStats, StorageError> {
            self.inner.stats().await
        }
        async fn category_distribution(&self) -> Result<Vec<CategoryCount>, StorageError> {
            self.inner.category_distribution().await
        }
    }

    #[tokio::test]
    async fn unreachable_store_aborts_the_run() {
        let capability =
            ScriptedCapability::new([Ok(valid_response()), Ok(valid_response())]);
        let p = product("unpersistable");
        let store = FailingUpsertStore {
            inner: seeded_store(std::slice::from_ref(&p)).await,
            upsert_failures: Mutex::new(VecDeque::from([StorageError::Unreachable(
                "connection pool closed".to_string(),
            )])),
        };
        let orch = orchestrator(&capability, store, 10, Duration::ZERO);

        let report = orch.run().await;

        assert!(report.outcome.is_aborted());
        assert_eq!(report.stats.processed, 0);
        // The outcome was never persisted, so the product is still pending.
        assert_eq!(
            orch.store().inner.get(p.id()).unwrap().status(),
            ProcessingStatus::Pending
        );
    }

    #[tokio::test]
    async fn single_attempt_policies_do_not_claim_exhausted_retries() {
        let capability = ScriptedCapability::new([Err(CapabilityError::Timeout)]);
        let p = product("one shot");
        let orch = {
            let scheduler = BatchScheduler::new(10, Duration::ZERO).unwrap();
            Orchestrator::new(
                Classifier::new(&capability, TaxonomyCatalog::builtin()),
                seeded_store(std::slice::from_ref(&p)).await,
                scheduler,
            )
            .with_retry_policy(RetryPolicy::fixed(1, Duration::ZERO))
        };

        let report = orch.run().await;

        assert_eq!(capability.call_count(), 1);
        assert_eq!(report.stats.retries, 0);
        let message = orch
            .store()
            .get(p.id())
            .unwrap()
            .state()
            .error_message()
            .unwrap()
            .to_string();
        assert!(message.contains("failed on the only attempt"));
        assert!(!message.contains("retries exhausted"));
    }

    #[tokio::test]
    async fn transient_storage_failure_skips_the_product_and_continues() {
        let capability =
            ScriptedCapability::new([Ok(valid_response()), Ok(valid_response())]);
        let products = ordered_products(&["lost write", "fine"]);
        let store = FailingUpsertStore {
            inner: seeded_store(&products).await,
            upsert_failures: Mutex::new(VecDeque::from([StorageError::Backend(
                "serialization conflict".to_string(),
            )])),
        };
        let orch = orchestrator(&capability, store, 2, Duration::ZERO);

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.storage_failures, 1);
        assert_eq!(report.stats.completed, 1);
        // The unpersisted product stays pending for a later run.
        assert_eq!(
            orch.store().inner.get(products[0].id()).unwrap().status(),
            ProcessingStatus::Pending
        );
        assert_eq!(
            orch.store().inner.get(products[1].id()).unwrap().status(),
            ProcessingStatus::Completed
        );
    }

    /// Products created far enough apart that their UUIDv7 ids (and so the
    /// store's fetch order) match creation order.
    fn ordered_products(names: &[&str]) -> Vec<Product> {
        let mut products = Vec::new();
        for name in names {
            products.push(product(name));
            std::thread::sleep(Duration::from_millis(2));
        }
        products
    }

    #[tokio::test]
    async fn skipped_products_do_not_hide_later_pending_work() {
        // The skipped product sorts first by id, so with batch_size 1 it
        // fills the whole fetch window unless the window is widened.
        let products = ordered_products(&["unpersistable", "behind it"]);
        let capability =
            ScriptedCapability::new([Ok(valid_response()), Ok(valid_response())]);
        let store = FailingUpsertStore {
            inner: seeded_store(&products).await,
            upsert_failures: Mutex::new(VecDeque::from([StorageError::Backend(
                "serialization conflict".to_string(),
            )])),
        };
        let orch = orchestrator(&capability, store, 1, Duration::ZERO);

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(capability.call_count(), 2);
        assert_eq!(report.stats.storage_failures, 1);
        assert_eq!(report.stats.completed, 1);
        assert_eq!(
            orch.store().inner.get(products[0].id()).unwrap().status(),
            ProcessingStatus::Pending
        );
        assert_eq!(
            orch.store().inner.get(products[1].id()).unwrap().status(),
            ProcessingStatus::Completed
        );
    }

    #[tokio::test]
    async fn pacing_survives_a_window_kept_full_by_skipped_products() {
        let products = ordered_products(&["unpersistable", "second", "third"]);
        let capability = ScriptedCapability::new([
            Ok(valid_response()),
            Ok(valid_response()),
            Ok(valid_response()),
        ]);
        let store = FailingUpsertStore {
            inner: seeded_store(&products).await,
            upsert_failures: Mutex::new(VecDeque::from([StorageError::Backend(
                "serialization conflict".to_string(),
            )])),
        };
        let orch = orchestrator(&capability, store, 1, Duration::from_millis(60));

        let report = orch.run().await;

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.stats.completed, 2);
        assert_eq!(report.stats.storage_failures, 1);

        // Every batch after the skip still fills its widened window, so the
        // inter-batch delay keeps applying.
        let calls = capability.call_instants();
        assert_eq!(calls.len(), 3);
        assert!(calls[1] - calls[0] >= Duration::from_millis(60));
        assert!(calls[2] - calls[1] >= Duration::from_millis(60));
    }
}
