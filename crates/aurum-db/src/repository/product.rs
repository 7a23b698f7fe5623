//! # Product Repository
//!
//! Product CRUD, filtered listing, and the stock adjustment operation.
//!
//! Stock is only ever mutated in three places: sale creation (decrement),
//! sale cancellation (restitution) - both in the sale repository - and the
//! explicit adjustment here. Every one of them runs inside a transaction.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult, StoreResult};
use aurum_core::{CoreError, Product, StockOperation};

/// A product joined with its category name, as returned by listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: String,
}

/// One appearance of a product in past sales (product detail view).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProductSaleEntry {
    pub sale_code: String,
    pub customer: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
    pub sold_at: chrono::DateTime<Utc>,
}

/// Listing filter. `search` matches code or title, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub is_active: Option<bool>,
    pub page: i64,
    pub limit: i64,
}

impl ProductFilter {
    fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

/// Result of a stock adjustment: the updated product and whether it now
/// sits at or below its reorder threshold.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub product: Product,
    pub low_stock: bool,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, title, description, category_id,
                quantity, unit_price_cents, sale_price_cents, min_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(product.quantity)
        .bind(product.unit_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, title, description, category_id,
                   quantity, unit_price_cents, sale_price_cents, min_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, title, description, category_id,
                   quantity, unit_price_cents, sale_price_cents, min_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products with filtering and pagination, newest first.
    ///
    /// Returns the page of rows plus the total match count.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<(Vec<ProductWithCategory>, i64)> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, ProductWithCategory>(
            r#"
            SELECT p.id, p.code, p.title, p.description, p.category_id,
                   p.quantity, p.unit_price_cents, p.sale_price_cents, p.min_stock,
                   p.is_active, p.created_at, p.updated_at,
                   c.name AS category_name
            FROM products p
            INNER JOIN categories c ON c.id = p.category_id
            WHERE (?1 IS NULL OR p.code LIKE ?1 OR p.title LIKE ?1)
              AND (?2 IS NULL OR p.category_id = ?2)
              AND (?3 IS NULL OR p.is_active = ?3)
            ORDER BY p.created_at DESC
            LIMIT ?4 OFFSET ?5
            "#,
        )
        .bind(&pattern)
        .bind(&filter.category_id)
        .bind(filter.is_active)
        .bind(filter.limit)
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products p
            WHERE (?1 IS NULL OR p.code LIKE ?1 OR p.title LIKE ?1)
              AND (?2 IS NULL OR p.category_id = ?2)
              AND (?3 IS NULL OR p.is_active = ?3)
            "#,
        )
        .bind(&pattern)
        .bind(&filter.category_id)
        .bind(filter.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total))
    }

    /// Updates an existing product (full row).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                title = ?2,
                description = ?3,
                category_id = ?4,
                quantity = ?5,
                unit_price_cents = ?6,
                sale_price_cents = ?7,
                min_stock = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.title)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(product.quantity)
        .bind(product.unit_price_cents)
        .bind(product.sale_price_cents)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Applies a stock adjustment inside its own transaction.
    ///
    /// SUBTRACT refuses to take the quantity negative; the returned
    /// `low_stock` flag is raised when the resulting quantity is at or
    /// below the product's `min_stock` (non-fatal, caller decides what to
    /// surface).
    pub async fn update_stock(
        &self,
        id: &str,
        quantity: i64,
        operation: StockOperation,
    ) -> StoreResult<StockAdjustment> {
        debug!(id = %id, quantity = %quantity, ?operation, "Adjusting stock");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, title, description, category_id,
                   quantity, unit_price_cents, sale_price_cents, min_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let new_quantity = match operation {
            StockOperation::Add => product.quantity + quantity,
            StockOperation::Subtract => {
                let remaining = product.quantity - quantity;
                if remaining < 0 {
                    return Err(CoreError::InsufficientStock {
                        title: product.title,
                        available: product.quantity,
                        requested: quantity,
                    }
                    .into());
                }
                remaining
            }
            StockOperation::Set => quantity,
        };

        let now = Utc::now();

        sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_quantity)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        let low_stock = new_quantity <= product.min_stock;

        Ok(StockAdjustment {
            product: Product {
                quantity: new_quantity,
                updated_at: now,
                ..product
            },
            low_stock,
        })
    }

    /// Lists active products under the reorder policy
    /// (out of stock, or below their own `min_stock`), lowest first.
    pub async fn low_stock(&self) -> DbResult<Vec<ProductWithCategory>> {
        let rows = sqlx::query_as::<_, ProductWithCategory>(
            r#"
            SELECT p.id, p.code, p.title, p.description, p.category_id,
                   p.quantity, p.unit_price_cents, p.sale_price_cents, p.min_stock,
                   p.is_active, p.created_at, p.updated_at,
                   c.name AS category_name
            FROM products p
            INNER JOIN categories c ON c.id = p.category_id
            WHERE p.is_active = 1
              AND (p.quantity = 0 OR p.quantity < p.min_stock)
            ORDER BY p.quantity ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Recent sales this product appeared in (detail view).
    pub async fn recent_sales(&self, product_id: &str, limit: i64) -> DbResult<Vec<ProductSaleEntry>> {
        let rows = sqlx::query_as::<_, ProductSaleEntry>(
            r#"
            SELECT s.code AS sale_code, s.customer,
                   si.quantity, si.unit_price_cents, si.subtotal_cents,
                   s.created_at AS sold_at
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE si.product_id = ?1
            ORDER BY s.created_at DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Whether the product appears in any sale. Drives delete-vs-deactivate.
    pub async fn has_sale_history(&self, id: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sale_items WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Used when historical sales still reference the product.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result =
            sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Hard-deletes a product with no sale history.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
