//! # Sale Repository
//!
//! The transactional sale workflow plus its read surface.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sale Lifecycle                                 │
//! │                                                                         │
//! │  1. CREATE                                                              │
//! │     └── create() → Sale { status: Pending }                             │
//! │         One transaction: stock checks, price snapshots, header +       │
//! │         items, per-product decrements. Any failure rolls back all.     │
//! │                                                                         │
//! │  2. PROGRESS                                                            │
//! │     └── update_status() → Pending → Confirmed → Delivered               │
//! │         Transition table enforced. Never touches stock.                │
//! │                                                                         │
//! │  3. (OPTIONAL) CANCEL                                                   │
//! │     └── cancel() → Sale { status: Cancelled }                           │
//! │         Restores every deducted quantity in the same transaction.      │
//! │         Status guards make restitution happen at most once.            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why the rules live here
//! The stock check is only meaningful if it is serialized with the decrement
//! it protects. Both therefore run on the same transaction; SQLite's write
//! lock keeps concurrent sales from overselling the same product.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use crate::repository::dashboard::TopProduct;
use aurum_core::money::{line_subtotal, sale_total};
use aurum_core::{CoreError, Money, Product, Sale, SaleItem, SaleStatus, ValidationError};

/// Input for one line of a new sale.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for sale creation. Prices are never part of the input; they are
/// snapshotted from the product rows inside the transaction.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub code: String,
    pub customer: String,
    pub items: Vec<NewSaleItem>,
    pub discount_cents: i64,
}

/// A sale item joined with its product's code and title.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: SaleItem,
    pub product_code: String,
    pub product_title: String,
}

/// A sale header with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

/// Listing filter. `search` matches sale code or customer name.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    pub search: Option<String>,
    pub status: Option<SaleStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: i64,
    pub limit: i64,
}

impl SaleFilter {
    fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

/// Per-status rollup line of the sales report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StatusRollup {
    pub status: SaleStatus,
    pub count: i64,
    pub value_cents: i64,
}

/// Sales report over a date range. Cancelled sales are excluded from the
/// totals but still appear in the per-status rollup.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReport {
    pub total_count: i64,
    pub total_value_cents: i64,
    pub total_discount_cents: i64,
    pub average_ticket_cents: i64,
    pub by_status: Vec<StatusRollup>,
    pub top_products: Vec<TopProduct>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Creates a sale: header, items, and stock decrements in one transaction.
    ///
    /// ## Per-line checks (first failure aborts everything)
    /// 1. Product exists, else [`CoreError::ProductNotFound`]
    /// 2. Product is active, else [`CoreError::ProductInactive`]
    /// 3. Requested quantity fits current stock, else
    ///    [`CoreError::InsufficientStock`]
    ///
    /// ## Snapshot Pattern
    /// The line's `unit_price_cents` is frozen from the product's current
    /// selling price; later price changes never rewrite history.
    ///
    /// The discount is applied after all lines are priced; a discount larger
    /// than the items total fails with [`CoreError::InvalidDiscount`] and,
    /// like every other failure here, rolls back the stock decrements
    /// already applied.
    pub async fn create(&self, new_sale: NewSale) -> StoreResult<SaleWithItems> {
        debug!(code = %new_sale.code, items = new_sale.items.len(), "Creating sale");

        if new_sale.items.is_empty() {
            return Err(CoreError::Validation(ValidationError::Required { field: "items" }).into());
        }

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE code = ?1")
            .bind(&new_sale.code)
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::from)?;
        if taken > 0 {
            return Err(CoreError::DuplicateCode {
                entity: "Sale",
                code: new_sale.code,
            }
            .into());
        }

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let mut subtotal_sum = Money::zero();
        let mut items = Vec::with_capacity(new_sale.items.len());

        for line in &new_sale.items {
            let product = sqlx::query_as::<_, Product>(
                r#"
                SELECT id, code, title, description, category_id,
                       quantity, unit_price_cents, sale_price_cents, min_stock,
                       is_active, created_at, updated_at
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(&line.product_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(DbError::from)?
            .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.is_active {
                return Err(CoreError::ProductInactive {
                    title: product.title,
                }
                .into());
            }

            if line.quantity > product.quantity {
                return Err(CoreError::InsufficientStock {
                    title: product.title,
                    available: product.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            let subtotal = line_subtotal(product.sale_price(), line.quantity);
            subtotal_sum += subtotal;

            sqlx::query("UPDATE products SET quantity = quantity - ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&product.id)
                .bind(line.quantity)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;

            items.push(SaleItemDetail {
                item: SaleItem {
                    id: Uuid::new_v4().to_string(),
                    sale_id: sale_id.clone(),
                    product_id: product.id.clone(),
                    quantity: line.quantity,
                    unit_price_cents: product.sale_price_cents,
                    subtotal_cents: subtotal.cents(),
                    created_at: now,
                },
                product_code: product.code,
                product_title: product.title,
            });
        }

        let discount = Money::from_cents(new_sale.discount_cents);
        let total = sale_total(subtotal_sum, discount)?;

        let sale = Sale {
            id: sale_id.clone(),
            code: new_sale.code,
            customer: new_sale.customer,
            discount_cents: discount.cents(),
            total_cents: total.cents(),
            status: SaleStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO sales (id, code, customer, discount_cents, total_cents, status, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.code)
        .bind(&sale.customer)
        .bind(sale.discount_cents)
        .bind(sale.total_cents)
        .bind(sale.status)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for detail in &items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&detail.item.id)
            .bind(&detail.item.sale_id)
            .bind(&detail.item.product_id)
            .bind(detail.item.quantity)
            .bind(detail.item.unit_price_cents)
            .bind(detail.item.subtotal_cents)
            .bind(detail.item.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            id = %sale.id,
            code = %sale.code,
            total_cents = sale.total_cents,
            items = items.len(),
            "Sale created"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Cancels a sale and restores the deducted stock, atomically.
    ///
    /// Restitution is full and unconditional: each product gets back exactly
    /// the quantity its line deducted, regardless of what happened to the
    /// product since. The status guards ensure this runs at most once per
    /// sale and never for delivered sales.
    pub async fn cancel(&self, id: &str) -> StoreResult<()> {
        debug!(id = %id, "Cancelling sale");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        match sale.status {
            SaleStatus::Cancelled => {
                return Err(CoreError::AlreadyCancelled(id.to_string()).into());
            }
            SaleStatus::Delivered => {
                return Err(CoreError::CannotCancelDelivered(id.to_string()).into());
            }
            SaleStatus::Pending | SaleStatus::Confirmed => {}
        }

        let now = Utc::now();

        sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(SaleStatus::Cancelled)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        let lines = sqlx::query_as::<_, (String, i64)>(
            "SELECT product_id, quantity FROM sale_items WHERE sale_id = ?1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for (product_id, quantity) in &lines {
            sqlx::query("UPDATE products SET quantity = quantity + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(product_id)
                .bind(quantity)
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(DbError::from)?;
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, code = %sale.code, lines = lines.len(), "Sale cancelled, stock restored");

        Ok(())
    }

    /// Applies a status transition from the explicit transition table.
    ///
    /// Re-applying the current status is an idempotent no-op. Transitions
    /// into `Cancelled` are rejected here; stock restitution must go through
    /// [`SaleRepository::cancel`]. Stock is never mutated on this path.
    pub async fn update_status(&self, id: &str, new_status: SaleStatus) -> StoreResult<Sale> {
        debug!(id = %id, status = %new_status, "Updating sale status");

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        if sale.status == new_status {
            tx.commit().await.map_err(DbError::from)?;
            return Ok(sale);
        }

        if !sale.status.allows_direct_update(new_status) {
            return Err(CoreError::InvalidStatusTransition {
                from: sale.status,
                to: new_status,
            }
            .into());
        }

        let now = Utc::now();

        sqlx::query("UPDATE sales SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_status)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        info!(id = %id, from = %sale.status, to = %new_status, "Sale status updated");

        Ok(Sale {
            status: new_status,
            updated_at: now,
            ..sale
        })
    }

    /// Gets a sale with its items by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                let items = self.items(&sale.id).await?;
                Ok(Some(SaleWithItems { sale, items }))
            }
            None => Ok(None),
        }
    }

    /// Gets a sale with its items by business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => {
                let items = self.items(&sale.id).await?;
                Ok(Some(SaleWithItems { sale, items }))
            }
            None => Ok(None),
        }
    }

    /// Gets all items for a sale, with product code and title.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItemDetail>> {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.id, si.sale_id, si.product_id, si.quantity,
                   si.unit_price_cents, si.subtotal_cents, si.created_at,
                   p.code AS product_code, p.title AS product_title
            FROM sale_items si
            INNER JOIN products p ON p.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales with filtering and pagination, newest first.
    ///
    /// Returns the page of sales (items included) plus the total match
    /// count.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<(Vec<SaleWithItems>, i64)> {
        let pattern = filter.search.as_ref().map(|s| format!("%{}%", s));

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            WHERE (?1 IS NULL OR code LIKE ?1 OR customer LIKE ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR created_at >= ?3)
              AND (?4 IS NULL OR created_at <= ?4)
            ORDER BY created_at DESC
            LIMIT ?5 OFFSET ?6
            "#,
        )
        .bind(&pattern)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.limit)
        .bind(filter.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM sales
            WHERE (?1 IS NULL OR code LIKE ?1 OR customer LIKE ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR created_at >= ?3)
              AND (?4 IS NULL OR created_at <= ?4)
            "#,
        )
        .bind(&pattern)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(&self.pool)
        .await?;

        let mut rows = Vec::with_capacity(sales.len());
        for sale in sales {
            let items = self.items(&sale.id).await?;
            rows.push(SaleWithItems { sale, items });
        }

        Ok((rows, total))
    }

    /// Builds the sales report over an optional date range.
    pub async fn report(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> DbResult<SaleReport> {
        let (total_count, total_value_cents, total_discount_cents): (i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*),
                       COALESCE(SUM(total_cents), 0),
                       COALESCE(SUM(discount_cents), 0)
                FROM sales
                WHERE status != 'CANCELLED'
                  AND (?1 IS NULL OR created_at >= ?1)
                  AND (?2 IS NULL OR created_at <= ?2)
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?;

        let average_ticket_cents = if total_count > 0 {
            total_value_cents / total_count
        } else {
            0
        };

        let by_status = sqlx::query_as::<_, StatusRollup>(
            r#"
            SELECT status, COUNT(*) AS count, COALESCE(SUM(total_cents), 0) AS value_cents
            FROM sales
            WHERE (?1 IS NULL OR created_at >= ?1)
              AND (?2 IS NULL OR created_at <= ?2)
            GROUP BY status
            ORDER BY status
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.id AS product_id, p.code, p.title,
                   SUM(si.quantity) AS quantity_sold,
                   SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            INNER JOIN products p ON p.id = si.product_id
            WHERE s.status != 'CANCELLED'
              AND (?1 IS NULL OR s.created_at >= ?1)
              AND (?2 IS NULL OR s.created_at <= ?2)
            GROUP BY p.id
            ORDER BY quantity_sold DESC
            LIMIT 5
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(SaleReport {
            total_count,
            total_value_cents,
            total_discount_cents,
            average_ticket_cents,
            by_status,
            top_products,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{seed_category, seed_product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn line(product_id: &str, quantity: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn new_sale(code: &str, items: Vec<NewSaleItem>, discount_cents: i64) -> NewSale {
        NewSale {
            code: code.to_string(),
            customer: "Ana Costa".to_string(),
            items,
            discount_cents,
        }
    }

    async fn quantity_of(db: &Database, product_id: &str) -> i64 {
        db.products()
            .get_by_id(product_id)
            .await
            .unwrap()
            .unwrap()
            .quantity
    }

    #[tokio::test]
    async fn test_create_computes_totals_and_decrements_stock() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;
        let chain = seed_product(&db, "CHAIN01", &category.id, 4, 1, 40000).await;

        let created = db
            .sales()
            .create(new_sale(
                "S-0001",
                vec![line(&ring.id, 3), line(&chain.id, 1)],
                5000,
            ))
            .await
            .unwrap();

        // total = 3×25000 + 1×40000 − 5000
        assert_eq!(created.sale.total_cents, 110_000);
        assert_eq!(created.sale.discount_cents, 5000);
        assert_eq!(created.sale.status, SaleStatus::Pending);
        assert_eq!(created.items.len(), 2);

        let subtotal_sum: i64 = created.items.iter().map(|i| i.item.subtotal_cents).sum();
        assert_eq!(subtotal_sum - created.sale.discount_cents, created.sale.total_cents);

        // Each product dropped by exactly its line quantity.
        assert_eq!(quantity_of(&db, &ring.id).await, 7);
        assert_eq!(quantity_of(&db, &chain.id).await, 3);
    }

    #[tokio::test]
    async fn test_create_snapshots_price_at_sale_time() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;

        let created = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap();

        // Raise the price after the sale; the stored item must keep the
        // price it was sold at.
        let mut updated = ring.clone();
        updated.sale_price_cents = 99000;
        db.products().update(&updated).await.unwrap();

        let fetched = db.sales().get_by_id(&created.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.items[0].item.unit_price_cents, 25000);
    }

    #[tokio::test]
    async fn test_create_insufficient_stock_mutates_nothing() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;
        let chain = seed_product(&db, "CHAIN01", &category.id, 5, 1, 40000).await;

        // First line would succeed; the second line oversells. The whole
        // operation must roll back, including the first decrement.
        let err = db
            .sales()
            .create(new_sale(
                "S-0001",
                vec![line(&ring.id, 2), line(&chain.id, 6)],
                0,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));

        assert_eq!(quantity_of(&db, &ring.id).await, 10);
        assert_eq!(quantity_of(&db, &chain.id).await, 5);
        assert!(db.sales().get_by_code("S-0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_code() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;

        db.sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap();

        let err = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Rule(CoreError::DuplicateCode { entity: "Sale", .. })
        ));
        // The failed attempt deducted nothing.
        assert_eq!(quantity_of(&db, &ring.id).await, 9);
    }

    #[tokio::test]
    async fn test_create_rejects_inactive_and_unknown_products() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;
        db.products().soft_delete(&ring.id).await.unwrap();

        let err = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::ProductInactive { .. })
        ));

        let err = db
            .sales()
            .create(new_sale("S-0002", vec![line("missing", 1)], 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_rejects_oversized_discount_and_rolls_back() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 50).await;

        // Items total 50 cents, discount 1000: total would be negative.
        let err = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 1000))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InvalidDiscount {
                subtotal_cents: 50,
                discount_cents: 1000
            })
        ));

        // The decrement ran before the discount check; rollback undid it.
        assert_eq!(quantity_of(&db, &ring.id).await, 10);
        assert!(db.sales().get_by_code("S-0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_requires_items() {
        let db = setup().await;

        let err = db
            .sales()
            .create(new_sale("S-0001", vec![], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_exactly_once() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;
        let chain = seed_product(&db, "CHAIN01", &category.id, 4, 1, 40000).await;

        let created = db
            .sales()
            .create(new_sale(
                "S-0001",
                vec![line(&ring.id, 3), line(&chain.id, 2)],
                0,
            ))
            .await
            .unwrap();
        assert_eq!(quantity_of(&db, &ring.id).await, 7);

        db.sales().cancel(&created.sale.id).await.unwrap();

        // Round-trip: every product is back at its pre-sale quantity.
        assert_eq!(quantity_of(&db, &ring.id).await, 10);
        assert_eq!(quantity_of(&db, &chain.id).await, 4);

        let fetched = db.sales().get_by_id(&created.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale.status, SaleStatus::Cancelled);

        // A second cancel must fail and must not restore again.
        let err = db.sales().cancel(&created.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::AlreadyCancelled(_))
        ));
        assert_eq!(quantity_of(&db, &ring.id).await, 10);
    }

    #[tokio::test]
    async fn test_cancel_delivered_is_rejected_and_stock_untouched() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;

        let created = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 3)], 0))
            .await
            .unwrap();

        db.sales()
            .update_status(&created.sale.id, SaleStatus::Confirmed)
            .await
            .unwrap();
        db.sales()
            .update_status(&created.sale.id, SaleStatus::Delivered)
            .await
            .unwrap();

        let err = db.sales().cancel(&created.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::CannotCancelDelivered(_))
        ));
        assert_eq!(quantity_of(&db, &ring.id).await, 7);
    }

    #[tokio::test]
    async fn test_cancel_unknown_sale() {
        let db = setup().await;
        let err = db.sales().cancel("missing").await.unwrap_err();
        assert!(matches!(err, StoreError::Rule(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_status_transitions_follow_the_table() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 10, 2, 25000).await;

        let created = db
            .sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap();
        let id = created.sale.id.clone();

        // Delivery without confirmation is not in the table.
        let err = db
            .sales()
            .update_status(&id, SaleStatus::Delivered)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InvalidStatusTransition {
                from: SaleStatus::Pending,
                to: SaleStatus::Delivered,
            })
        ));

        // Cancellation must go through the cancel flow.
        let err = db
            .sales()
            .update_status(&id, SaleStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rule(CoreError::InvalidStatusTransition { .. })
        ));

        // Re-applying the current status is a no-op.
        let sale = db
            .sales()
            .update_status(&id, SaleStatus::Pending)
            .await
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Pending);

        let sale = db
            .sales()
            .update_status(&id, SaleStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Confirmed);

        let sale = db
            .sales()
            .update_status(&id, SaleStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(sale.status, SaleStatus::Delivered);

        // Status updates never touch stock.
        assert_eq!(quantity_of(&db, &ring.id).await, 9);
    }

    #[tokio::test]
    async fn test_list_filters_and_pagination() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 25000).await;

        for i in 0..3 {
            db.sales()
                .create(new_sale(&format!("S-{:04}", i), vec![line(&ring.id, 1)], 0))
                .await
                .unwrap();
        }
        let cancelled = db
            .sales()
            .create(new_sale("S-9999", vec![line(&ring.id, 1)], 0))
            .await
            .unwrap();
        db.sales().cancel(&cancelled.sale.id).await.unwrap();

        let filter = SaleFilter {
            page: 1,
            limit: 10,
            ..Default::default()
        };
        let (rows, total) = db.sales().list(&filter).await.unwrap();
        assert_eq!(total, 4);
        assert!(rows.iter().all(|r| r.items.len() == 1));

        let filter = SaleFilter {
            status: Some(SaleStatus::Cancelled),
            page: 1,
            limit: 10,
            ..Default::default()
        };
        let (rows, total) = db.sales().list(&filter).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].sale.code, "S-9999");

        let filter = SaleFilter {
            search: Some("S-000".to_string()),
            page: 1,
            limit: 2,
            ..Default::default()
        };
        let (rows, total) = db.sales().list(&filter).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_report_excludes_cancelled_from_totals() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 10000).await;

        db.sales()
            .create(new_sale("S-0001", vec![line(&ring.id, 2)], 0))
            .await
            .unwrap();
        db.sales()
            .create(new_sale("S-0002", vec![line(&ring.id, 1)], 1000))
            .await
            .unwrap();
        let cancelled = db
            .sales()
            .create(new_sale("S-0003", vec![line(&ring.id, 5)], 0))
            .await
            .unwrap();
        db.sales().cancel(&cancelled.sale.id).await.unwrap();

        let report = db.sales().report(None, None).await.unwrap();
        assert_eq!(report.total_count, 2);
        assert_eq!(report.total_value_cents, 20000 + 9000);
        assert_eq!(report.total_discount_cents, 1000);
        assert_eq!(report.average_ticket_cents, 14500);

        // The rollup still shows the cancelled sale.
        let cancelled_row = report
            .by_status
            .iter()
            .find(|r| r.status == SaleStatus::Cancelled)
            .unwrap();
        assert_eq!(cancelled_row.count, 1);

        // Top products count only non-cancelled quantities.
        assert_eq!(report.top_products.len(), 1);
        assert_eq!(report.top_products[0].quantity_sold, 3);
    }
}
