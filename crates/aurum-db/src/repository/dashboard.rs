//! # Dashboard Repository
//!
//! Read-only rollups over sales and products. Nothing here mutates state;
//! the queries run outside any transaction and may lag concurrent writes
//! slightly, which is acceptable for dashboard data.
//!
//! ## Two low-stock policies
//! The KPI block counts products under the reorder policy (per-product
//! `min_stock`), while the critical-stock list uses the global threshold.
//! They answer different questions and are deliberately not unified; see
//! [`aurum_core::Product::needs_reorder`] and
//! [`aurum_core::Product::is_critical_stock`].

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;
use aurum_core::{Sale, CRITICAL_STOCK_THRESHOLD};

/// Headline counters for the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    /// All sales ever recorded, cancelled included.
    pub total_sales: i64,
    /// Revenue of non-cancelled sales.
    pub revenue_cents: i64,
    pub product_count: i64,
    pub customer_count: i64,
    pub pending_sales: i64,
    /// Active products under the reorder policy.
    pub low_stock_count: i64,
}

/// A product ranked by units sold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub code: String,
    pub title: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// A row of the critical-stock list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CriticalStockRow {
    pub id: String,
    pub code: String,
    pub title: String,
    pub quantity: i64,
    pub min_stock: i64,
}

/// Revenue attributed to one category, from item snapshots.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRevenue {
    pub category_id: String,
    pub name: String,
    pub revenue_cents: i64,
}

/// One month's bucket of the trend, oldest first.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrendRow {
    /// Calendar month, `YYYY-MM`.
    pub month: String,
    pub sale_count: i64,
    /// Revenue of non-cancelled sales in the month.
    pub revenue_cents: i64,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub kpis: Kpis,
    pub recent_sales: Vec<Sale>,
    pub top_products: Vec<TopProduct>,
    pub critical_stock: Vec<CriticalStockRow>,
    pub sales_by_category: Vec<CategoryRevenue>,
    pub monthly_trend: Vec<MonthlyTrendRow>,
}

/// Sales KPIs for the dedicated endpoint; cancelled sales excluded
/// throughout.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesKpis {
    pub revenue_cents: i64,
    pub sale_count: i64,
    pub average_sale_cents: i64,
    pub top_products: Vec<TopProduct>,
}

/// Repository for dashboard rollup queries.
#[derive(Debug, Clone)]
pub struct DashboardRepository {
    pool: SqlitePool,
}

impl DashboardRepository {
    /// Creates a new DashboardRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DashboardRepository { pool }
    }

    /// Builds the full dashboard payload.
    pub async fn summary(&self) -> DbResult<DashboardSummary> {
        let kpis = self.kpis().await?;
        let recent_sales = self.recent_sales(5).await?;
        let top_products = self.top_products(5).await?;
        let critical_stock = self.critical_stock().await?;
        let sales_by_category = self.sales_by_category().await?;
        let monthly_trend = self.monthly_trend().await?;

        Ok(DashboardSummary {
            kpis,
            recent_sales,
            top_products,
            critical_stock,
            sales_by_category,
            monthly_trend,
        })
    }

    /// Headline counters.
    pub async fn kpis(&self) -> DbResult<Kpis> {
        let kpis = sqlx::query_as::<_, Kpis>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sales) AS total_sales,
                (SELECT COALESCE(SUM(total_cents), 0) FROM sales WHERE status != 'CANCELLED') AS revenue_cents,
                (SELECT COUNT(*) FROM products WHERE is_active = 1) AS product_count,
                (SELECT COUNT(DISTINCT customer) FROM sales) AS customer_count,
                (SELECT COUNT(*) FROM sales WHERE status = 'PENDING') AS pending_sales,
                (SELECT COUNT(*) FROM products
                 WHERE is_active = 1 AND (quantity = 0 OR quantity < min_stock)) AS low_stock_count
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(kpis)
    }

    /// The sales KPI endpoint payload.
    pub async fn sales_kpis(&self) -> DbResult<SalesKpis> {
        let (revenue_cents, sale_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE status != 'CANCELLED'
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let average_sale_cents = if sale_count > 0 {
            revenue_cents / sale_count
        } else {
            0
        };

        Ok(SalesKpis {
            revenue_cents,
            sale_count,
            average_sale_cents,
            top_products: self.top_products(5).await?,
        })
    }

    /// Latest sales, newest first.
    pub async fn recent_sales(&self, limit: i64) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, code, customer, discount_cents, total_cents, status, created_at, updated_at
            FROM sales
            ORDER BY created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Products ranked by units sold across non-cancelled sales.
    pub async fn top_products(&self, limit: i64) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.id AS product_id, p.code, p.title,
                   SUM(si.quantity) AS quantity_sold,
                   SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            INNER JOIN products p ON p.id = si.product_id
            WHERE s.status != 'CANCELLED'
            GROUP BY p.id
            ORDER BY quantity_sold DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Active products under the critical policy, lowest stock first,
    /// capped at 10 rows.
    pub async fn critical_stock(&self) -> DbResult<Vec<CriticalStockRow>> {
        let rows = sqlx::query_as::<_, CriticalStockRow>(
            r#"
            SELECT id, code, title, quantity, min_stock
            FROM products
            WHERE is_active = 1
              AND (quantity = 0 OR quantity < ?1)
            ORDER BY quantity ASC
            LIMIT 10
            "#,
        )
        .bind(CRITICAL_STOCK_THRESHOLD)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Revenue share per category, from the price snapshots on sale items.
    pub async fn sales_by_category(&self) -> DbResult<Vec<CategoryRevenue>> {
        let rows = sqlx::query_as::<_, CategoryRevenue>(
            r#"
            SELECT c.id AS category_id, c.name,
                   SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            INNER JOIN products p ON p.id = si.product_id
            INNER JOIN categories c ON c.id = p.category_id
            WHERE s.status != 'CANCELLED'
            GROUP BY c.id
            ORDER BY revenue_cents DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Sales count and non-cancelled revenue per calendar month, most
    /// recent five months, oldest first.
    pub async fn monthly_trend(&self) -> DbResult<Vec<MonthlyTrendRow>> {
        let mut rows = sqlx::query_as::<_, MonthlyTrendRow>(
            r#"
            SELECT strftime('%Y-%m', created_at) AS month,
                   COUNT(*) AS sale_count,
                   COALESCE(SUM(CASE WHEN status != 'CANCELLED' THEN total_cents ELSE 0 END), 0) AS revenue_cents
            FROM sales
            GROUP BY month
            ORDER BY month DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.reverse();
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::sale::{NewSale, NewSaleItem};
    use crate::repository::test_support::{seed_category, seed_product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn record_sale(db: &Database, code: &str, product_id: &str, quantity: i64) -> String {
        let created = db
            .sales()
            .create(NewSale {
                code: code.to_string(),
                customer: format!("Customer {}", code),
                items: vec![NewSaleItem {
                    product_id: product_id.to_string(),
                    quantity,
                }],
                discount_cents: 0,
            })
            .await
            .unwrap();
        created.sale.id
    }

    #[tokio::test]
    async fn test_kpis_exclude_cancelled_revenue() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 10000).await;

        record_sale(&db, "S-0001", &ring.id, 2).await;
        let cancelled = record_sale(&db, "S-0002", &ring.id, 3).await;
        db.sales().cancel(&cancelled).await.unwrap();

        let kpis = db.dashboard().kpis().await.unwrap();
        assert_eq!(kpis.total_sales, 2);
        assert_eq!(kpis.revenue_cents, 20000);
        assert_eq!(kpis.pending_sales, 1);
        assert_eq!(kpis.product_count, 1);
        assert_eq!(kpis.customer_count, 2);
    }

    #[tokio::test]
    async fn test_critical_and_reorder_policies_diverge() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        // quantity 5, min_stock 2: selling 3 leaves quantity 2, which the
        // reorder policy does not flag (2 < 2 is false) but the critical
        // list does (2 < 10).
        let ring = seed_product(&db, "RING001", &category.id, 5, 2, 10000).await;
        seed_product(&db, "SAFE", &category.id, 50, 2, 10000).await;

        record_sale(&db, "S-0001", &ring.id, 3).await;

        let kpis = db.dashboard().kpis().await.unwrap();
        assert_eq!(kpis.low_stock_count, 0);

        let critical = db.dashboard().critical_stock().await.unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0].code, "RING001");
        assert_eq!(critical[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_top_products_and_category_revenue() {
        let db = setup().await;
        let rings = seed_category(&db, "Rings", None).await;
        let chains = seed_category(&db, "Necklaces", None).await;
        let ring = seed_product(&db, "RING001", &rings.id, 100, 2, 10000).await;
        let chain = seed_product(&db, "CHAIN01", &chains.id, 100, 2, 40000).await;

        record_sale(&db, "S-0001", &ring.id, 5).await;
        record_sale(&db, "S-0002", &chain.id, 2).await;
        let cancelled = record_sale(&db, "S-0003", &ring.id, 50).await;
        db.sales().cancel(&cancelled).await.unwrap();

        let top = db.dashboard().top_products(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].code, "RING001");
        assert_eq!(top[0].quantity_sold, 5);
        assert_eq!(top[0].revenue_cents, 50000);

        let by_category = db.dashboard().sales_by_category().await.unwrap();
        assert_eq!(by_category.len(), 2);
        // Necklaces lead on revenue (80000 vs 50000).
        assert_eq!(by_category[0].name, "Necklaces");
        assert_eq!(by_category[0].revenue_cents, 80000);
    }

    #[tokio::test]
    async fn test_monthly_trend_buckets_by_calendar_month() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 10000).await;

        record_sale(&db, "S-0001", &ring.id, 1).await;
        record_sale(&db, "S-0002", &ring.id, 2).await;
        let cancelled = record_sale(&db, "S-0003", &ring.id, 4).await;
        db.sales().cancel(&cancelled).await.unwrap();

        let trend = db.dashboard().monthly_trend().await.unwrap();
        // All test sales land in the current month.
        assert_eq!(trend.len(), 1);
        assert_eq!(trend[0].sale_count, 3);
        assert_eq!(trend[0].revenue_cents, 30000);
    }

    #[tokio::test]
    async fn test_sales_kpis_average() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 10000).await;

        record_sale(&db, "S-0001", &ring.id, 1).await;
        record_sale(&db, "S-0002", &ring.id, 3).await;

        let kpis = db.dashboard().sales_kpis().await.unwrap();
        assert_eq!(kpis.sale_count, 2);
        assert_eq!(kpis.revenue_cents, 40000);
        assert_eq!(kpis.average_sale_cents, 20000);
        assert_eq!(kpis.top_products[0].quantity_sold, 4);
    }

    #[tokio::test]
    async fn test_recent_sales_order_and_limit() {
        let db = setup().await;
        let category = seed_category(&db, "Rings", None).await;
        let ring = seed_product(&db, "RING001", &category.id, 100, 2, 10000).await;

        for i in 0..7 {
            record_sale(&db, &format!("S-{:04}", i), &ring.id, 1).await;
        }

        let recent = db.dashboard().recent_sales(5).await.unwrap();
        assert_eq!(recent.len(), 5);
    }
}
