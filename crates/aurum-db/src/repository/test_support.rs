//! Shared fixtures for repository tests.

use chrono::Utc;
use uuid::Uuid;

use crate::pool::Database;
use aurum_core::{Category, Product};

/// Inserts a category and returns it.
pub async fn seed_category(db: &Database, name: &str, parent_id: Option<&str>) -> Category {
    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        parent_id: parent_id.map(|p| p.to_string()),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.categories().insert(&category).await.unwrap();
    category
}

/// Inserts an active product and returns it.
pub async fn seed_product(
    db: &Database,
    code: &str,
    category_id: &str,
    quantity: i64,
    min_stock: i64,
    sale_price_cents: i64,
) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        title: format!("{} title", code),
        description: None,
        category_id: category_id.to_string(),
        quantity,
        unit_price_cents: sale_price_cents / 2,
        sale_price_cents,
        min_stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}
