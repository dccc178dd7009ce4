//! `reclass-classifier` — the classification seam.
//!
//! The external classification capability is an injected trait
//! ([`ClassificationCapability`]), so tests substitute a deterministic
//! stand-in for the live network dependency. [`Classifier`] wraps a
//! capability with taxonomy validation, and [`RetryPolicy`] decides, purely
//! from (attempt, failure kind), whether a failed call is retried.

pub mod capability;
pub mod classifier;
pub mod http;
pub mod retry;

pub use capability::{
    CapabilityError, CapabilityResponse, ClassificationCapability, ClassificationRequest,
    TokenUsage,
};
pub use classifier::{Classified, Classifier, ClassifyError, FailureKind};
pub use http::{HttpCapability, HttpCapabilityConfig};
pub use retry::{BackoffCurve, RetryDecision, RetryPolicy};
