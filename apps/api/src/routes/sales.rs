//! # Sale Routes
//!
//! The HTTP face of the sale workflow. Handlers validate input shape and
//! delegate to the transactional repository; every business-rule failure
//! there already rolled the transaction back by the time it reaches the
//! error mapping.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use aurum_core::validation::{validate_code, validate_customer, validate_non_negative, validate_quantity};
use aurum_core::{SaleStatus, ValidationError};
use aurum_db::repository::sale::{NewSale, NewSaleItem, SaleFilter, SaleReport, SaleWithItems};

use crate::error::{ApiError, ApiJson};
use crate::routes::{default_limit, default_page, Pagination};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    pub code: String,
    pub customer: String,
    pub items: Vec<LineRequest>,
    #[serde(default)]
    pub discount_cents: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub status: SaleStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<SaleStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct SaleResponse {
    pub message: String,
    pub sale: SaleWithItems,
}

#[derive(Serialize)]
pub struct SaleListResponse {
    pub sales: Vec<SaleWithItems>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /api/sales`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), ApiError> {
    debug!(code = %body.code, items = body.items.len(), "create sale");

    validate_code(&body.code)?;
    validate_customer(&body.customer)?;
    validate_non_negative("discountCents", body.discount_cents)?;

    if body.items.is_empty() {
        return Err(ValidationError::Required { field: "items" }.into());
    }
    for line in &body.items {
        validate_quantity(line.quantity)?;
    }

    let sale = state
        .db
        .sales()
        .create(NewSale {
            code: body.code,
            customer: body.customer.trim().to_string(),
            items: body
                .items
                .into_iter()
                .map(|line| NewSaleItem {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            discount_cents: body.discount_cents,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse {
            message: "Sale created successfully".to_string(),
            sale,
        }),
    ))
}

/// `GET /api/sales`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SaleListResponse>, ApiError> {
    let filter = SaleFilter {
        search: query.search,
        status: query.status,
        from: query.from,
        to: query.to,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    };

    let (sales, total) = state.db.sales().list(&filter).await?;

    Ok(Json(SaleListResponse {
        sales,
        pagination: Pagination::new(filter.page, filter.limit, total),
    }))
}

/// `GET /api/sales/report`
pub async fn report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<SaleReport>, ApiError> {
    let report = state.db.sales().report(query.from, query.to).await?;
    Ok(Json(report))
}

/// `GET /api/sales/{id}`
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    Ok(Json(serde_json::json!({ "sale": sale })))
}

/// `GET /api/sales/code/{code}`
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &code))?;

    Ok(Json(serde_json::json!({ "sale": sale })))
}

/// `PATCH /api/sales/{id}/status`
///
/// An unknown status string never reaches the repository; it is rejected by
/// deserialization as a 400.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    debug!(id = %id, status = %body.status, "update sale status");

    let sale = state.db.sales().update_status(&id, body.status).await?;

    Ok(Json(serde_json::json!({
        "message": "Sale status updated successfully",
        "sale": sale,
    })))
}

/// `PATCH /api/sales/{id}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(id = %id, "cancel sale");

    state.db.sales().cancel(&id).await?;

    Ok(Json(MessageResponse {
        message: "Sale cancelled and stock restored".to_string(),
    }))
}
