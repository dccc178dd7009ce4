//! Batch orchestration for bulk re-classification runs.
//!
//! The engine drains pending products from a [`ProgressStore`] in fixed-size
//! batches, pushes each product through a [`Classifier`], retries transient
//! failures according to a [`RetryPolicy`], and persists every terminal
//! outcome before the next batch is requested. A run always produces a
//! [`RunReport`], even when it is stopped early or aborted.
//!
//! [`ProgressStore`]: reclass_store::ProgressStore
//! [`Classifier`]: reclass_classifier::Classifier
//! [`RetryPolicy`]: reclass_classifier::RetryPolicy

pub mod orchestrator;
pub mod report;
pub mod scheduler;

pub use orchestrator::{Orchestrator, StopSignal};
pub use report::{CostModel, RunOutcome, RunReport, RunStats};
pub use scheduler::{BatchScheduler, SchedulerError};
