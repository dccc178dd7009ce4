//! `reclass-core` — domain foundation for catalog re-classification.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! typed identifiers, the domain error model, and the product/classification
//! data model with its status state machine.

pub mod error;
pub mod id;
pub mod product;

pub use error::{DomainError, DomainResult};
pub use id::{ProductId, RunId};
pub use product::{
    NewClassification, OldClassification, ProcessingState, ProcessingStatus, Product,
};
