//! Classifier: capability call plus taxonomy validation.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use reclass_core::{NewClassification, Product};
use reclass_taxonomy::TaxonomyCatalog;

use crate::capability::{
    CapabilityError, CapabilityResponse, ClassificationCapability, ClassificationRequest,
    TokenUsage,
};

/// Retry-relevant split of classification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transient,
    Permanent,
}

/// Typed failure of one classification attempt.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// Network/timeout/rate-limit signaled by the capability; retriable.
    #[error("transient capability failure: {0}")]
    Transient(CapabilityError),

    /// The capability answered with a code outside the taxonomy. A result
    /// failing validation is not a success.
    #[error("invalid taxonomy code: unknown {level} code {code}")]
    InvalidTaxonomyCode { level: &'static str, code: String },

    /// Response violated the wire contract (unparsable, confidence outside
    /// [0, 1]).
    #[error("malformed capability response: {0}")]
    MalformedResponse(String),

    /// The capability explicitly refused the input.
    #[error("capability rejected input: {0}")]
    CapabilityRejected(String),
}

impl ClassifyError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClassifyError::Transient(_) => FailureKind::Transient,
            ClassifyError::InvalidTaxonomyCode { .. }
            | ClassifyError::MalformedResponse(_)
            | ClassifyError::CapabilityRejected(_) => FailureKind::Permanent,
        }
    }

    fn from_capability(error: CapabilityError) -> Self {
        match error {
            e if e.is_transient() => ClassifyError::Transient(e),
            CapabilityError::Rejected(msg) => ClassifyError::CapabilityRejected(msg),
            CapabilityError::Malformed(msg) => ClassifyError::MalformedResponse(msg),
            // is_transient() above covers the remaining variants.
            e => ClassifyError::Transient(e),
        }
    }
}

/// A validated classification plus the token accounting of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub classification: NewClassification,
    pub usage: Option<TokenUsage>,
}

/// Wraps the external capability with taxonomy validation. Does not touch
/// the progress store.
pub struct Classifier<C> {
    capability: C,
    catalog: TaxonomyCatalog,
}

impl<C: ClassificationCapability> Classifier<C> {
    pub fn new(capability: C, catalog: TaxonomyCatalog) -> Self {
        Self {
            capability,
            catalog,
        }
    }

    pub fn catalog(&self) -> &TaxonomyCatalog {
        &self.catalog
    }

    /// Classify a catalog product.
    pub async fn classify(&self, product: &Product) -> Result<Classified, ClassifyError> {
        self.classify_request(&ClassificationRequest::from_product(product))
            .await
    }

    /// Classify an arbitrary request (diagnostics path; `test-one`).
    pub async fn classify_request(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classified, ClassifyError> {
        let response = self
            .capability
            .classify(request)
            .await
            .map_err(ClassifyError::from_capability)?;
        debug!(
            product = %request.product_name,
            department = %response.department_code,
            category = %response.category_code,
            subcategory = %response.subcategory_code,
            confidence = response.confidence,
            "capability answered"
        );
        self.validate(response)
    }

    /// Validate a raw capability response against the taxonomy and turn it
    /// into a domain classification carrying the catalog's canonical names.
    fn validate(&self, response: CapabilityResponse) -> Result<Classified, ClassifyError> {
        let names = self
            .catalog
            .lookup_names(
                &response.department_code,
                &response.category_code,
                &response.subcategory_code,
            )
            .map_err(|e| ClassifyError::InvalidTaxonomyCode {
                level: e.level,
                code: e.code,
            })?;

        let classification = NewClassification::new(
            &response.department_code,
            names.department,
            &response.category_code,
            names.category,
            &response.subcategory_code,
            names.subcategory,
            response.confidence,
            Utc::now(),
        )
        .map_err(|e| ClassifyError::MalformedResponse(e.to_string()))?;

        Ok(Classified {
            classification,
            usage: response.usage,
        })
    }
}
