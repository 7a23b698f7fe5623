//! # Product Routes
//!
//! CRUD over products plus the stock adjustment endpoint. Deletion follows
//! the delete-or-deactivate rule: products that appear in past sales are
//! soft-deleted so history keeps resolving.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use aurum_core::validation::{
    validate_code, validate_description, validate_non_negative, validate_quantity, validate_title,
};
use aurum_core::{Category, Product, StockOperation};
use aurum_db::repository::product::{ProductFilter, ProductSaleEntry, ProductWithCategory};

use crate::error::{ApiError, ApiJson};
use crate::routes::{default_limit, default_page, Pagination};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub code: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub sale_price_cents: i64,
    #[serde(default)]
    pub min_stock: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub min_stock: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRequest {
    pub quantity: i64,
    #[serde(default)]
    pub operation: StockOperation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Serialize)]
pub struct ProductResponse {
    pub message: String,
    pub product: Product,
}

#[derive(Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductWithCategory>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    pub product: Product,
    pub category: Option<Category>,
    pub recent_sales: Vec<ProductSaleEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockResponse {
    pub message: String,
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn validate_prices(unit_price_cents: i64, sale_price_cents: i64, min_stock: i64) -> Result<(), ApiError> {
    validate_non_negative("unitPriceCents", unit_price_cents)?;
    validate_non_negative("salePriceCents", sale_price_cents)?;
    validate_non_negative("minStock", min_stock)?;
    Ok(())
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    debug!(code = %body.code, "create product");

    validate_code(&body.code)?;
    validate_title(&body.title)?;
    validate_description(body.description.as_deref(), 500)?;
    validate_non_negative("quantity", body.quantity)?;
    validate_prices(body.unit_price_cents, body.sale_price_cents, body.min_stock)?;

    state
        .db
        .categories()
        .get_by_id(&body.category_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &body.category_id))?;

    if state.db.products().get_by_code(&body.code).await?.is_some() {
        return Err(ApiError::conflict(format!(
            "Product code '{}' already exists",
            body.code
        )));
    }

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        code: body.code,
        title: body.title,
        description: body.description,
        category_id: body.category_id,
        quantity: body.quantity,
        unit_price_cents: body.unit_price_cents,
        sale_price_cents: body.sale_price_cents,
        min_stock: body.min_stock,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProductResponse {
            message: "Product created successfully".to_string(),
            product,
        }),
    ))
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>, ApiError> {
    let filter = ProductFilter {
        search: query.search,
        category_id: query.category_id,
        is_active: query.is_active,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    };

    let (products, total) = state.db.products().list(&filter).await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination::new(filter.page, filter.limit, total),
    }))
}

/// `GET /api/products/low-stock` - reorder policy, lowest quantity first.
pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let products = state.db.products().low_stock().await?;
    Ok(Json(serde_json::json!({ "products": products })))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProductDetailResponse>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let category = state.db.categories().get_by_id(&product.category_id).await?;
    let recent_sales = state.db.products().recent_sales(&id, 10).await?;

    Ok(Json(ProductDetailResponse {
        product,
        category,
        recent_sales,
    }))
}

/// `GET /api/products/code/{code}`
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &code))?;

    Ok(Json(serde_json::json!({ "product": product })))
}

/// `PUT /api/products/{id}` - partial update.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    debug!(id = %id, "update product");

    let mut product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    if let Some(title) = body.title {
        validate_title(&title)?;
        product.title = title;
    }
    if let Some(description) = body.description {
        validate_description(Some(&description), 500)?;
        product.description = Some(description);
    }
    if let Some(category_id) = body.category_id {
        state
            .db
            .categories()
            .get_by_id(&category_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", &category_id))?;
        product.category_id = category_id;
    }
    if let Some(quantity) = body.quantity {
        validate_non_negative("quantity", quantity)?;
        product.quantity = quantity;
    }
    if let Some(cents) = body.unit_price_cents {
        validate_non_negative("unitPriceCents", cents)?;
        product.unit_price_cents = cents;
    }
    if let Some(cents) = body.sale_price_cents {
        validate_non_negative("salePriceCents", cents)?;
        product.sale_price_cents = cents;
    }
    if let Some(min_stock) = body.min_stock {
        validate_non_negative("minStock", min_stock)?;
        product.min_stock = min_stock;
    }
    if let Some(is_active) = body.is_active {
        product.is_active = is_active;
    }

    state.db.products().update(&product).await?;

    Ok(Json(ProductResponse {
        message: "Product updated successfully".to_string(),
        product,
    }))
}

/// `DELETE /api/products/{id}` - soft-deactivates when sale history exists.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(id = %id, "delete product");

    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    let message = if state.db.products().has_sale_history(&id).await? {
        state.db.products().soft_delete(&id).await?;
        "Product deactivated; existing sales reference it"
    } else {
        state.db.products().delete(&id).await?;
        "Product deleted successfully"
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}

/// `PATCH /api/products/{id}/stock`
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    debug!(id = %id, quantity = body.quantity, ?body.operation, "update stock");

    // SET accepts zero (inventory count); ADD and SUBTRACT move by a
    // strictly positive amount.
    match body.operation {
        StockOperation::Set => validate_non_negative("quantity", body.quantity)?,
        StockOperation::Add | StockOperation::Subtract => validate_quantity(body.quantity)?,
    }

    let adjustment = state
        .db
        .products()
        .update_stock(&id, body.quantity, body.operation)
        .await?;

    let warning = adjustment.low_stock.then(|| {
        format!(
            "Stock is at or below the minimum ({})",
            adjustment.product.min_stock
        )
    });

    Ok(Json(StockResponse {
        message: "Stock updated successfully".to_string(),
        product: adjustment.product,
        warning,
    }))
}
