//! CSV import: load catalog rows into the progress store as pending products.
//!
//! Source files carry `Produto` / `Marca` / `Modelo` / `Categoria` columns;
//! `Categoria` is the `"DEPT > CATEGORY > SUBCATEGORY"` free text that
//! becomes the old classification.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use reclass_core::{Product, ProductId};

use crate::{ProgressStore, StorageError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Import a CSV file, returning the number of products stored.
pub async fn import_csv<S: ProgressStore + ?Sized>(
    store: &S,
    path: &Path,
) -> Result<u64, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let products = read_products(file)?;
    let inserted = store.insert_products(&products).await?;
    info!(path = %path.display(), inserted, "imported products");
    Ok(inserted)
}

/// Parse CSV rows into pending products. Rows with an empty product name are
/// skipped.
pub fn read_products<R: Read>(reader: R) -> Result<Vec<Product>, ImportError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let column = |name: &'static str| -> Result<usize, ImportError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or(ImportError::MissingColumn(name))
    };

    let product_col = column("Produto")?;
    // Optional context columns.
    let brand_col = headers.iter().position(|h| h.trim() == "Marca");
    let model_col = headers.iter().position(|h| h.trim() == "Modelo");
    let category_col = headers.iter().position(|h| h.trim() == "Categoria");

    let mut products = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };

        let Some(name) = field(Some(product_col)) else {
            continue;
        };

        products.push(Product::imported(
            ProductId::new(),
            name,
            field(brand_col),
            field(model_col),
            field(category_col),
        ));
    }
    Ok(products)
}
