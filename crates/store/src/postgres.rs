//! Postgres-backed progress store.
//!
//! One row per product; the per-product upsert is a single `UPDATE`, so
//! status and classification can never be written partially. SQLx errors are
//! mapped so that pool/connection loss surfaces as
//! [`StorageError::Unreachable`] (fatal for a run) while anything else stays
//! a per-item [`StorageError::Backend`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use reclass_core::{
    NewClassification, OldClassification, ProcessingState, ProcessingStatus, Product, ProductId,
};

use crate::{CategoryCount, ProgressStore, StorageError, StoreStats};

const SCHEMA_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id UUID PRIMARY KEY,
        product_name TEXT NOT NULL,
        brand TEXT,
        model TEXT,
        original_category TEXT,

        old_department TEXT,
        old_category TEXT,
        old_subcategory TEXT,

        new_department_code TEXT,
        new_department_name TEXT,
        new_category_code TEXT,
        new_category_name TEXT,
        new_subcategory_code TEXT,
        new_subcategory_name TEXT,

        confidence_score DOUBLE PRECISION,
        classification_timestamp TIMESTAMPTZ,
        processing_status TEXT NOT NULL DEFAULT 'pending',
        error_message TEXT,

        imported_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_status ON products (processing_status)",
    "CREATE INDEX IF NOT EXISTS idx_products_new_category ON products (new_category_code)",
];

const PRODUCT_COLUMNS: &str = r#"
    id, product_name, brand, model, original_category,
    old_department, old_category, old_subcategory,
    new_department_code, new_department_name,
    new_category_code, new_category_name,
    new_subcategory_code, new_subcategory_name,
    confidence_score, classification_timestamp,
    processing_status, error_message, imported_at
"#;

/// `ProgressStore` over a SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresProgressStore {
    pool: Arc<PgPool>,
}

impl PostgresProgressStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl ProgressStore for PostgresProgressStore {
    #[instrument(skip(self), err)]
    async fn create_schema(&self) -> Result<(), StorageError> {
        for statement in SCHEMA_STATEMENTS {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(|e| map_sqlx_error("create_schema", e))?;
        }
        Ok(())
    }

    #[instrument(skip(self, products), fields(count = products.len()), err)]
    async fn insert_products(&self, products: &[Product]) -> Result<u64, StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_products", e))?;

        let mut inserted = 0;
        for product in products {
            let old = product.old_classification();
            let result = sqlx::query(
                r#"
                INSERT INTO products (
                    id, product_name, brand, model, original_category,
                    old_department, old_category, old_subcategory,
                    processing_status, imported_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending', $9)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(product.id().as_uuid())
            .bind(product.name())
            .bind(product.brand())
            .bind(product.model())
            .bind(product.original_category())
            .bind(old.department.as_deref())
            .bind(old.category.as_deref())
            .bind(old.subcategory.as_deref())
            .bind(product.imported_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_products", e))?;
            inserted += result.rows_affected();
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_products", e))?;
        Ok(inserted)
    }

    #[instrument(skip(self), err)]
    async fn fetch_pending(&self, limit: u32) -> Result<Vec<Product>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE processing_status = 'pending' ORDER BY id LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_pending", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn fetch_errored(&self) -> Result<Vec<Product>, StorageError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE processing_status = 'error' ORDER BY id"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch_errored", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, state), fields(status = %state.status()), err)]
    async fn upsert_result(
        &self,
        product_id: ProductId,
        state: &ProcessingState,
    ) -> Result<(), StorageError> {
        let classification = state.classification();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                new_department_code = $2,
                new_department_name = $3,
                new_category_code = $4,
                new_category_name = $5,
                new_subcategory_code = $6,
                new_subcategory_name = $7,
                confidence_score = $8,
                classification_timestamp = $9,
                processing_status = $10,
                error_message = $11,
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(product_id.as_uuid())
        .bind(classification.map(|c| c.department_code.as_str()))
        .bind(classification.map(|c| c.department_name.as_str()))
        .bind(classification.map(|c| c.category_code.as_str()))
        .bind(classification.map(|c| c.category_name.as_str()))
        .bind(classification.map(|c| c.subcategory_code.as_str()))
        .bind(classification.map(|c| c.subcategory_name.as_str()))
        .bind(classification.map(|c| c.confidence()))
        .bind(classification.map(|c| c.classified_at))
        .bind(state.status().as_str())
        .bind(state.error_message())
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("upsert_result", e))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(product_id));
        }
        Ok(())
    }

    #[instrument(skip(self, product_ids), fields(count = product_ids.len()), err)]
    async fn reset_errored_to_pending(
        &self,
        product_ids: &[ProductId],
    ) -> Result<u64, StorageError> {
        let ids: Vec<Uuid> = product_ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                processing_status = 'pending',
                error_message = NULL,
                new_department_code = NULL,
                new_department_name = NULL,
                new_category_code = NULL,
                new_category_name = NULL,
                new_subcategory_code = NULL,
                new_subcategory_name = NULL,
                confidence_score = NULL,
                classification_timestamp = NULL,
                updated_at = now()
            WHERE processing_status = 'error' AND id = ANY($1)
            "#,
        )
        .bind(ids)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("reset_errored_to_pending", e))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self), err)]
    async fn stats(&self) -> Result<StoreStats, StorageError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE processing_status = 'pending') AS pending,
                COUNT(*) FILTER (WHERE processing_status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE processing_status = 'error') AS errored,
                AVG(confidence_score) FILTER (WHERE processing_status = 'completed')
                    AS avg_confidence
            FROM products
            "#,
        )
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("stats", e))?;

        Ok(StoreStats {
            total: get_count(&row, "total")?,
            pending: get_count(&row, "pending")?,
            completed: get_count(&row, "completed")?,
            errored: get_count(&row, "errored")?,
            avg_confidence: row
                .try_get::<Option<f64>, _>("avg_confidence")
                .map_err(|e| map_sqlx_error("stats", e))?,
        })
    }

    #[instrument(skip(self), err)]
    async fn category_distribution(&self) -> Result<Vec<CategoryCount>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT
                new_category_code,
                new_category_name,
                COUNT(*) AS count,
                AVG(confidence_score) AS avg_confidence
            FROM products
            WHERE processing_status = 'completed'
            GROUP BY new_category_code, new_category_name
            ORDER BY count DESC, new_category_code
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("category_distribution", e))?;

        rows.iter()
            .map(|row| {
                Ok(CategoryCount {
                    category_code: row
                        .try_get("new_category_code")
                        .map_err(|e| map_sqlx_error("category_distribution", e))?,
                    category_name: row
                        .try_get("new_category_name")
                        .map_err(|e| map_sqlx_error("category_distribution", e))?,
                    count: get_count(row, "count")?,
                    avg_confidence: row
                        .try_get("avg_confidence")
                        .map_err(|e| map_sqlx_error("category_distribution", e))?,
                })
            })
            .collect()
    }
}

fn get_count(row: &PgRow, column: &str) -> Result<u64, StorageError> {
    let value: i64 = row
        .try_get(column)
        .map_err(|e| map_sqlx_error("count column", e))?;
    Ok(value.max(0) as u64)
}

/// Rehydrate a product from its row, rebuilding the processing state from the
/// status label plus result columns.
fn product_from_row(row: &PgRow) -> Result<Product, StorageError> {
    let get = |column: &str| -> Result<Option<String>, StorageError> {
        row.try_get(column)
            .map_err(|e| map_sqlx_error("product row", e))
    };

    let id: Uuid = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("product row", e))?;
    let name: String = row
        .try_get("product_name")
        .map_err(|e| map_sqlx_error("product row", e))?;
    let status: String = row
        .try_get("processing_status")
        .map_err(|e| map_sqlx_error("product row", e))?;
    let imported_at: DateTime<Utc> = row
        .try_get("imported_at")
        .map_err(|e| map_sqlx_error("product row", e))?;

    let status: ProcessingStatus = status
        .parse()
        .map_err(|e| StorageError::Backend(format!("product {id}: {e}")))?;

    let state = match status {
        ProcessingStatus::Pending => ProcessingState::Pending,
        ProcessingStatus::Error => ProcessingState::Error {
            message: get("error_message")?.unwrap_or_else(|| "unknown error".to_string()),
        },
        ProcessingStatus::Completed => {
            let missing =
                || StorageError::Backend(format!("product {id}: completed row missing result"));
            let confidence: f64 = row
                .try_get::<Option<f64>, _>("confidence_score")
                .map_err(|e| map_sqlx_error("product row", e))?
                .ok_or_else(missing)?;
            let classified_at: DateTime<Utc> = row
                .try_get::<Option<DateTime<Utc>>, _>("classification_timestamp")
                .map_err(|e| map_sqlx_error("product row", e))?
                .ok_or_else(missing)?;
            let classification = NewClassification::new(
                get("new_department_code")?.ok_or_else(missing)?,
                get("new_department_name")?.ok_or_else(missing)?,
                get("new_category_code")?.ok_or_else(missing)?,
                get("new_category_name")?.ok_or_else(missing)?,
                get("new_subcategory_code")?.ok_or_else(missing)?,
                get("new_subcategory_name")?.ok_or_else(missing)?,
                confidence,
                classified_at,
            )
            .map_err(|e| StorageError::Backend(format!("product {id}: {e}")))?;
            ProcessingState::Completed { classification }
        }
    };

    Ok(Product::rehydrate(
        ProductId::from_uuid(id),
        name,
        get("brand")?,
        get("model")?,
        get("original_category")?,
        OldClassification {
            department: get("old_department")?,
            category: get("old_category")?,
            subcategory: get("old_subcategory")?,
        },
        state,
        imported_at,
    ))
}

/// Map SQLx failures onto the store error model. Pool/connection loss means
/// the store is unreachable and the run must abort; everything else is an
/// operation-scoped backend error.
fn map_sqlx_error(operation: &'static str, error: sqlx::Error) -> StorageError {
    match error {
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
            StorageError::Unreachable(format!("{operation}: {error}"))
        }
        other => StorageError::Backend(format!("{operation}: {other}")),
    }
}
