//! # Category Routes
//!
//! CRUD over the category tree. The flat and hierarchical listings share
//! one query; the tree shape is selected per request.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use aurum_core::validation::{validate_category_name, validate_description};
use aurum_core::Category;

use crate::error::{ApiError, ApiJson};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
    #[serde(default)]
    pub hierarchical: bool,
}

#[derive(Serialize)]
pub struct CategoryResponse {
    pub message: String,
    pub category: Category,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `POST /api/categories`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    debug!(name = %body.name, "create category");

    validate_category_name(&body.name)?;
    validate_description(body.description.as_deref(), 300)?;

    if let Some(parent_id) = &body.parent_id {
        state
            .db
            .categories()
            .get_by_id(parent_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", parent_id))?;
    }

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        description: body.description,
        parent_id: body.parent_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.db.categories().insert(&category).await?;

    Ok((
        StatusCode::CREATED,
        Json(CategoryResponse {
            message: "Category created successfully".to_string(),
            category,
        }),
    ))
}

/// `GET /api/categories?hierarchical=true|false&includeInactive=true|false`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    if query.hierarchical {
        let categories = state.db.categories().tree(query.include_inactive).await?;
        return Ok(Json(serde_json::json!({ "categories": categories })).into_response());
    }

    let categories = state.db.categories().list(query.include_inactive).await?;
    Ok(Json(serde_json::json!({ "categories": categories })).into_response())
}

/// `GET /api/categories/{id}` - with parent, children, and active products.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let detail = state
        .db
        .categories()
        .get_detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    Ok(Json(serde_json::json!({ "category": detail })))
}

/// `PUT /api/categories/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateCategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    debug!(id = %id, "update category");

    let mut category = state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    if let Some(name) = body.name {
        validate_category_name(&name)?;
        category.name = name.trim().to_string();
    }
    if let Some(description) = body.description {
        validate_description(Some(&description), 300)?;
        category.description = Some(description);
    }
    if let Some(parent_id) = body.parent_id {
        if parent_id == id {
            return Err(ApiError::validation("A category cannot be its own parent"));
        }
        state
            .db
            .categories()
            .get_by_id(&parent_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Category", &parent_id))?;
        category.parent_id = Some(parent_id);
    }
    if let Some(is_active) = body.is_active {
        category.is_active = is_active;
    }

    state.db.categories().update(&category).await?;

    Ok(Json(CategoryResponse {
        message: "Category updated successfully".to_string(),
        category,
    }))
}

/// `DELETE /api/categories/{id}` - soft-deactivates when it has products or
/// subcategories.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    debug!(id = %id, "delete category");

    state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    let message = if state.db.categories().has_dependents(&id).await? {
        state.db.categories().soft_delete(&id).await?;
        "Category deactivated; it still has products or subcategories"
    } else {
        state.db.categories().delete(&id).await?;
        "Category deleted successfully"
    };

    Ok(Json(MessageResponse {
        message: message.to_string(),
    }))
}
