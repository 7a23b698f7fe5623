//! # Category Repository
//!
//! CRUD over the category tree. Categories self-reference through
//! `parent_id`; the hierarchical listing is assembled in memory from a
//! single query rather than recursing in SQL.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use aurum_core::{Category, Product};

/// A category with its parent name and dependent counts (flat listing).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub parent_name: Option<String>,
    pub product_count: i64,
    pub child_count: i64,
}

/// A node of the hierarchical listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    #[serde(flatten)]
    pub info: CategoryWithCounts,
    pub children: Vec<CategoryNode>,
}

/// Full category detail: parent, children, and active products.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    pub parent: Option<Category>,
    pub children: Vec<Category>,
    pub products: Vec<Product>,
}

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, description, parent_id, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.parent_id)
        .bind(category.is_active)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a category by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, parent_id, is_active, created_at, updated_at
            FROM categories
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Full detail for one category: parent, children, active products.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<CategoryDetail>> {
        let Some(category) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let parent = match &category.parent_id {
            Some(pid) => self.get_by_id(pid).await?,
            None => None,
        };

        let children = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description, parent_id, is_active, created_at, updated_at
            FROM categories
            WHERE parent_id = ?1
            ORDER BY name ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, code, title, description, category_id,
                   quantity, unit_price_cents, sale_price_cents, min_stock,
                   is_active, created_at, updated_at
            FROM products
            WHERE category_id = ?1 AND is_active = 1
            ORDER BY title ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(CategoryDetail {
            category,
            parent,
            children,
            products,
        }))
    }

    /// Flat listing with parent names and dependent counts, by name.
    pub async fn list(&self, include_inactive: bool) -> DbResult<Vec<CategoryWithCounts>> {
        let rows = sqlx::query_as::<_, CategoryWithCounts>(
            r#"
            SELECT c.id, c.name, c.description, c.parent_id, c.is_active,
                   c.created_at, c.updated_at,
                   p.name AS parent_name,
                   (SELECT COUNT(*) FROM products pr WHERE pr.category_id = c.id) AS product_count,
                   (SELECT COUNT(*) FROM categories ch WHERE ch.parent_id = c.id) AS child_count
            FROM categories c
            LEFT JOIN categories p ON p.id = c.parent_id
            WHERE (?1 OR c.is_active = 1)
            ORDER BY c.name ASC
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Hierarchical listing, assembled from the flat query.
    pub async fn tree(&self, include_inactive: bool) -> DbResult<Vec<CategoryNode>> {
        let rows = self.list(include_inactive).await?;
        Ok(assemble_tree(rows))
    }

    /// Updates an existing category (full row).
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                name = ?2,
                description = ?3,
                parent_id = ?4,
                is_active = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.parent_id)
        .bind(category.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Whether the category has products or subcategories attached.
    /// Drives delete-vs-deactivate.
    pub async fn has_dependents(&self, id: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT (SELECT COUNT(*) FROM products WHERE category_id = ?1)
                 + (SELECT COUNT(*) FROM categories WHERE parent_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Soft-deletes a category by setting is_active = false.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating category");

        let result =
            sqlx::query("UPDATE categories SET is_active = 0, updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Hard-deletes a category with no products or children.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

/// Builds the category tree from flat rows.
///
/// Rows whose parent is absent from the set (filtered out or missing) would
/// otherwise vanish; they are treated as roots so the listing never hides a
/// live category.
fn assemble_tree(rows: Vec<CategoryWithCounts>) -> Vec<CategoryNode> {
    let ids: std::collections::HashSet<String> =
        rows.iter().map(|r| r.category.id.clone()).collect();

    let mut by_parent: HashMap<Option<String>, Vec<CategoryWithCounts>> = HashMap::new();
    for row in rows {
        let key = match &row.category.parent_id {
            Some(pid) if ids.contains(pid) => Some(pid.clone()),
            _ => None,
        };
        by_parent.entry(key).or_default().push(row);
    }

    fn attach(
        by_parent: &mut HashMap<Option<String>, Vec<CategoryWithCounts>>,
        key: &Option<String>,
    ) -> Vec<CategoryNode> {
        let rows = by_parent.remove(key).unwrap_or_default();
        rows.into_iter()
            .map(|info| {
                let id = Some(info.category.id.clone());
                CategoryNode {
                    children: attach(by_parent, &id),
                    info,
                }
            })
            .collect()
    }

    attach(&mut by_parent, &None)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{seed_category, seed_product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_tree_assembly() {
        let db = setup().await;
        let root = seed_category(&db, "Accessories", None).await;
        let rings = seed_category(&db, "Rings", Some(&root.id)).await;
        seed_category(&db, "Bracelets", Some(&root.id)).await;
        seed_category(&db, "Signet Rings", Some(&rings.id)).await;

        let tree = db.categories().tree(false).await.unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].info.category.name, "Accessories");
        assert_eq!(tree[0].children.len(), 2);

        let rings_node = tree[0]
            .children
            .iter()
            .find(|n| n.info.category.name == "Rings")
            .unwrap();
        assert_eq!(rings_node.children.len(), 1);
        assert_eq!(rings_node.children[0].info.category.name, "Signet Rings");
    }

    #[tokio::test]
    async fn test_list_counts_and_inactive_filter() {
        let db = setup().await;
        let root = seed_category(&db, "Accessories", None).await;
        let rings = seed_category(&db, "Rings", Some(&root.id)).await;
        seed_product(&db, "RING001", &rings.id, 5, 0, 1000).await;
        seed_product(&db, "RING002", &rings.id, 5, 0, 1000).await;

        db.categories().soft_delete(&rings.id).await.unwrap();

        let visible = db.categories().list(false).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].category.name, "Accessories");
        assert_eq!(visible[0].child_count, 1);

        let all = db.categories().list(true).await.unwrap();
        assert_eq!(all.len(), 2);
        let rings_row = all.iter().find(|c| c.category.name == "Rings").unwrap();
        assert_eq!(rings_row.product_count, 2);
        assert_eq!(rings_row.parent_name.as_deref(), Some("Accessories"));
    }

    #[tokio::test]
    async fn test_has_dependents() {
        let db = setup().await;
        let root = seed_category(&db, "Accessories", None).await;
        let empty = seed_category(&db, "Watches", None).await;
        seed_category(&db, "Rings", Some(&root.id)).await;

        assert!(db.categories().has_dependents(&root.id).await.unwrap());
        assert!(!db.categories().has_dependents(&empty.id).await.unwrap());

        db.categories().delete(&empty.id).await.unwrap();
        assert!(db.categories().get_by_id(&empty.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_detail_includes_relations() {
        let db = setup().await;
        let root = seed_category(&db, "Accessories", None).await;
        let rings = seed_category(&db, "Rings", Some(&root.id)).await;
        seed_product(&db, "RING001", &rings.id, 5, 0, 1000).await;

        let detail = db.categories().get_detail(&rings.id).await.unwrap().unwrap();
        assert_eq!(detail.parent.as_ref().unwrap().name, "Accessories");
        assert_eq!(detail.products.len(), 1);

        let root_detail = db.categories().get_detail(&root.id).await.unwrap().unwrap();
        assert!(root_detail.parent.is_none());
        assert_eq!(root_detail.children.len(), 1);
    }
}
