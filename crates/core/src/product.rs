//! Product data model and processing-status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::id::ProductId;

/// Classification previously assigned to a product (free-text names parsed
/// from the source catalog). Immutable reference data carried as context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OldClassification {
    pub department: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
}

impl OldClassification {
    /// Parse the source catalog's `"DEPT > CATEGORY > SUBCATEGORY"` free text.
    /// Missing levels stay `None`.
    pub fn parse(original_category: &str) -> Self {
        let mut parts = original_category.split(" > ").map(str::trim);
        Self {
            department: parts.next().filter(|s| !s.is_empty()).map(String::from),
            category: parts.next().filter(|s| !s.is_empty()).map(String::from),
            subcategory: parts.next().filter(|s| !s.is_empty()).map(String::from),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.department.is_none() && self.category.is_none() && self.subcategory.is_none()
    }
}

/// Classification produced by the classifier, validated against the taxonomy
/// before construction. Present only while the product is completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClassification {
    pub department_code: String,
    pub department_name: String,
    pub category_code: String,
    pub category_name: String,
    pub subcategory_code: String,
    pub subcategory_name: String,
    /// Classifier's self-reported certainty, always in [0, 1].
    confidence: f64,
    pub classified_at: DateTime<Utc>,
}

impl NewClassification {
    /// Construct a classification, rejecting a confidence outside [0, 1].
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        department_code: impl Into<String>,
        department_name: impl Into<String>,
        category_code: impl Into<String>,
        category_name: impl Into<String>,
        subcategory_code: impl Into<String>,
        subcategory_name: impl Into<String>,
        confidence: f64,
        classified_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if !(0.0..=1.0).contains(&confidence) || confidence.is_nan() {
            return Err(DomainError::validation(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
        Ok(Self {
            department_code: department_code.into(),
            department_name: department_name.into(),
            category_code: category_code.into(),
            category_name: category_name.into(),
            subcategory_code: subcategory_code.into(),
            subcategory_name: subcategory_name.into(),
            confidence,
            classified_at,
        })
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// Flat status label, as persisted and reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Completed,
    Error,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Error => "error",
        }
    }
}

impl core::str::FromStr for ProcessingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProcessingStatus::Pending),
            "completed" => Ok(ProcessingStatus::Completed),
            "error" => Ok(ProcessingStatus::Error),
            other => Err(DomainError::validation(format!(
                "unknown processing status: {other}"
            ))),
        }
    }
}

impl core::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state as a tagged variant, so a classification can only exist
/// on a completed product and an error message only on an errored one.
///
/// Legal transitions:
/// - pending → completed (via [`ProcessingState::complete`])
/// - pending → error (via [`ProcessingState::fail`])
/// - error → pending (via [`ProcessingState::reset_for_reprocess`] only;
///   never automatically)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessingState {
    Pending,
    Completed { classification: NewClassification },
    Error { message: String },
}

impl ProcessingState {
    pub fn status(&self) -> ProcessingStatus {
        match self {
            ProcessingState::Pending => ProcessingStatus::Pending,
            ProcessingState::Completed { .. } => ProcessingStatus::Completed,
            ProcessingState::Error { .. } => ProcessingStatus::Error,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ProcessingState::Pending)
    }

    pub fn classification(&self) -> Option<&NewClassification> {
        match self {
            ProcessingState::Completed { classification } => Some(classification),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ProcessingState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// pending → completed.
    pub fn complete(self, classification: NewClassification) -> DomainResult<Self> {
        match self {
            ProcessingState::Pending => Ok(ProcessingState::Completed { classification }),
            other => Err(DomainError::illegal_transition(format!(
                "{} → completed",
                other.status()
            ))),
        }
    }

    /// pending → error.
    pub fn fail(self, message: impl Into<String>) -> DomainResult<Self> {
        match self {
            ProcessingState::Pending => Ok(ProcessingState::Error {
                message: message.into(),
            }),
            other => Err(DomainError::illegal_transition(format!(
                "{} → error",
                other.status()
            ))),
        }
    }

    /// error → pending. The only path back; requires an explicit reprocess
    /// request from the operator.
    pub fn reset_for_reprocess(self) -> DomainResult<Self> {
        match self {
            ProcessingState::Error { .. } => Ok(ProcessingState::Pending),
            other => Err(DomainError::illegal_transition(format!(
                "{} → pending",
                other.status()
            ))),
        }
    }
}

/// A catalog product. Identity and descriptive attributes are immutable once
/// imported; the processing state is the only mutable part of the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    brand: Option<String>,
    model: Option<String>,
    original_category: Option<String>,
    old_classification: OldClassification,
    state: ProcessingState,
    imported_at: DateTime<Utc>,
}

impl Product {
    /// Create a freshly imported product in pending status.
    pub fn imported(
        id: ProductId,
        name: impl Into<String>,
        brand: Option<String>,
        model: Option<String>,
        original_category: Option<String>,
    ) -> Self {
        let old_classification = original_category
            .as_deref()
            .map(OldClassification::parse)
            .unwrap_or_default();
        Self {
            id,
            name: name.into(),
            brand,
            model,
            original_category,
            old_classification,
            state: ProcessingState::Pending,
            imported_at: Utc::now(),
        }
    }

    /// Rehydrate a product from persisted fields (store-side constructor).
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        id: ProductId,
        name: String,
        brand: Option<String>,
        model: Option<String>,
        original_category: Option<String>,
        old_classification: OldClassification,
        state: ProcessingState,
        imported_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            brand,
            model,
            original_category,
            old_classification,
            state,
            imported_at,
        }
    }

    pub fn id(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn brand(&self) -> Option<&str> {
        self.brand.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn original_category(&self) -> Option<&str> {
        self.original_category.as_deref()
    }

    pub fn old_classification(&self) -> &OldClassification {
        &self.old_classification
    }

    pub fn state(&self) -> &ProcessingState {
        &self.state
    }

    pub fn status(&self) -> ProcessingStatus {
        self.state.status()
    }

    pub fn imported_at(&self) -> DateTime<Utc> {
        self.imported_at
    }

    /// Record a successful classification (pending → completed).
    pub fn complete(&mut self, classification: NewClassification) -> DomainResult<()> {
        self.state = self.state.clone().complete(classification)?;
        Ok(())
    }

    /// Record a terminal failure (pending → error).
    pub fn fail(&mut self, message: impl Into<String>) -> DomainResult<()> {
        self.state = self.state.clone().fail(message)?;
        Ok(())
    }

    /// Explicit reprocess request (error → pending).
    pub fn reset_for_reprocess(&mut self) -> DomainResult<()> {
        self.state = self.state.clone().reset_for_reprocess()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn classification(confidence: f64) -> NewClassification {
        NewClassification::new(
            "D03",
            "MRO: MATERIAL, REPARO E OPERAÇÃO",
            "S47",
            "MATERIAIS ELÉTRICOS E ELETRÔNICOS",
            "C163",
            "Fusíveis e disjuntores",
            confidence,
            Utc::now(),
        )
        .unwrap()
    }

    fn pending_product() -> Product {
        Product::imported(
            ProductId::new(),
            "DISJUNTOR MOTOR 3P 30-36A",
            Some("WEG".to_string()),
            None,
            Some("MRO: MATERIAL, REPARO E OPERAÇÃO > AUTOMAÇÃO INDUSTRIAL".to_string()),
        )
    }

    #[test]
    fn imported_product_is_pending_with_parsed_old_classification() {
        let p = pending_product();
        assert_eq!(p.status(), ProcessingStatus::Pending);
        assert_eq!(
            p.old_classification().department.as_deref(),
            Some("MRO: MATERIAL, REPARO E OPERAÇÃO")
        );
        assert_eq!(
            p.old_classification().category.as_deref(),
            Some("AUTOMAÇÃO INDUSTRIAL")
        );
        assert_eq!(p.old_classification().subcategory, None);
    }

    #[test]
    fn pending_completes_and_carries_classification() {
        let mut p = pending_product();
        p.complete(classification(0.95)).unwrap();
        assert_eq!(p.status(), ProcessingStatus::Completed);
        assert_eq!(p.state().classification().unwrap().confidence(), 0.95);
        assert_eq!(p.state().error_message(), None);
    }

    #[test]
    fn pending_fails_with_message() {
        let mut p = pending_product();
        p.fail("capability rejected input").unwrap();
        assert_eq!(p.status(), ProcessingStatus::Error);
        assert_eq!(
            p.state().error_message(),
            Some("capability rejected input")
        );
        assert!(p.state().classification().is_none());
    }

    #[test]
    fn completed_cannot_transition_again() {
        let mut p = pending_product();
        p.complete(classification(0.9)).unwrap();
        assert!(p.complete(classification(0.9)).is_err());
        assert!(p.fail("late failure").is_err());
        assert!(p.reset_for_reprocess().is_err());
    }

    #[test]
    fn only_errored_products_reset_for_reprocess() {
        let mut p = pending_product();
        assert!(p.reset_for_reprocess().is_err());

        p.fail("timeout").unwrap();
        p.reset_for_reprocess().unwrap();
        assert_eq!(p.status(), ProcessingStatus::Pending);

        // And the loop is legal again after the reset.
        p.complete(classification(0.8)).unwrap();
        assert_eq!(p.status(), ProcessingStatus::Completed);
    }

    #[test]
    fn confidence_outside_unit_interval_is_rejected() {
        assert!(
            NewClassification::new("D03", "d", "S47", "c", "C163", "s", 1.2, Utc::now()).is_err()
        );
        assert!(
            NewClassification::new("D03", "d", "S47", "c", "C163", "s", -0.01, Utc::now())
                .is_err()
        );
        assert!(
            NewClassification::new("D03", "d", "S47", "c", "C163", "s", f64::NAN, Utc::now())
                .is_err()
        );
    }

    #[test]
    fn old_classification_parse_handles_partial_paths() {
        let full = OldClassification::parse("A > B > C");
        assert_eq!(full.subcategory.as_deref(), Some("C"));

        let only_dept = OldClassification::parse("A");
        assert_eq!(only_dept.department.as_deref(), Some("A"));
        assert_eq!(only_dept.category, None);

        assert!(OldClassification::parse("").is_empty());
    }

    #[test]
    fn status_labels_round_trip() {
        for status in [
            ProcessingStatus::Pending,
            ProcessingStatus::Completed,
            ProcessingStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<ProcessingStatus>().unwrap(), status);
        }
    }

    proptest! {
        #[test]
        fn constructed_confidence_is_always_in_unit_interval(c in -10.0f64..10.0) {
            match NewClassification::new("D03", "d", "S47", "c", "C163", "s", c, Utc::now()) {
                Ok(nc) => prop_assert!((0.0..=1.0).contains(&nc.confidence())),
                Err(_) => prop_assert!(!(0.0..=1.0).contains(&c)),
            }
        }
    }
}
