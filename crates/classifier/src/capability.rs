//! Contract with the external classification capability.
//!
//! This module stays storage-agnostic and side-effect free: a capability
//! turns a request into a raw (unvalidated) response or a typed failure.
//! Validation against the taxonomy happens in [`crate::classifier`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use reclass_core::Product;

/// Logical request schema sent to the capability. The prior classification
/// travels along as context/hint for the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    pub product_name: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub original_category: Option<String>,
    pub old_department: Option<String>,
    pub old_category: Option<String>,
    pub old_subcategory: Option<String>,
}

impl ClassificationRequest {
    pub fn from_product(product: &Product) -> Self {
        let old = product.old_classification();
        Self {
            product_name: product.name().to_string(),
            brand: product.brand().map(String::from),
            model: product.model().map(String::from),
            original_category: product.original_category().map(String::from),
            old_department: old.department.clone(),
            old_category: old.category.clone(),
            old_subcategory: old.subcategory.clone(),
        }
    }

    /// Minimal request for ad-hoc diagnostics (`test-one`).
    pub fn ad_hoc(product_name: impl Into<String>, original_category: Option<String>) -> Self {
        let old = original_category
            .as_deref()
            .map(reclass_core::OldClassification::parse)
            .unwrap_or_default();
        Self {
            product_name: product_name.into(),
            brand: None,
            model: None,
            original_category,
            old_department: old.department,
            old_category: old.category,
            old_subcategory: old.subcategory,
        }
    }
}

/// Token accounting reported by the capability, when available. Feeds the
/// run report's cost estimate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Raw response from the capability, not yet validated against the
/// taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub department_code: String,
    pub department_name: String,
    pub category_code: String,
    pub category_name: String,
    pub subcategory_code: String,
    pub subcategory_name: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// Failure signaled by the capability itself.
///
/// The transient/permanent split here drives the retry policy: transient
/// failures are worth retrying with backoff, permanent ones are not.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The call did not complete within the configured timeout.
    #[error("classification request timed out")]
    Timeout,

    /// Transport-level failure (DNS, connect, broken stream, upstream 5xx).
    #[error("network error: {0}")]
    Network(String),

    /// The provider signaled rate-limit pressure.
    #[error("rate limited by classification provider")]
    RateLimited,

    /// The capability explicitly refused the input.
    #[error("capability rejected input: {0}")]
    Rejected(String),

    /// The response could not be parsed into the wire schema.
    #[error("malformed capability response: {0}")]
    Malformed(String),
}

impl CapabilityError {
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CapabilityError::Timeout | CapabilityError::Network(_) | CapabilityError::RateLimited
        )
    }
}

/// The injectable external classification capability.
///
/// Implementations must not touch the progress store; their only side effect
/// is the remote call itself.
#[async_trait]
pub trait ClassificationCapability: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<CapabilityResponse, CapabilityError>;
}
