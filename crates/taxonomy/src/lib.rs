//! `reclass-taxonomy` — the fixed category hierarchy classifications are
//! validated against.
//!
//! A [`TaxonomyCatalog`] maps department → category → subcategory codes to
//! human-readable names. It is read-only after construction and small enough
//! to live fully in memory (one department, 16 categories, ~170
//! subcategories for the built-in MRO data set).

pub mod catalog;
mod data;

pub use catalog::{TaxonomyCatalog, TaxonomyError, TaxonomyNames};
