//! # Route Table
//!
//! One module per resource; handlers are thin orchestration over the
//! repositories. Everything under `/api` except registration and login sits
//! behind the bearer-token middleware.

pub mod auth;
pub mod categories;
pub mod dashboard;
pub mod products;
pub mod sales;

use axum::extract::State;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Assembles the application router.
pub fn router(state: AppState) -> Router {
    let open = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    let protected = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/change-password", post(auth::change_password))
        .route("/api/auth/users", get(auth::list_users))
        .route(
            "/api/products",
            post(products::create).get(products::list),
        )
        .route("/api/products/low-stock", get(products::low_stock))
        .route(
            "/api/products/{id}",
            get(products::get).put(products::update).delete(products::remove),
        )
        .route("/api/products/code/{code}", get(products::get_by_code))
        .route("/api/products/{id}/stock", patch(products::update_stock))
        .route(
            "/api/categories",
            post(categories::create).get(categories::list),
        )
        .route(
            "/api/categories/{id}",
            get(categories::get).put(categories::update).delete(categories::remove),
        )
        .route("/api/sales", post(sales::create).get(sales::list))
        .route("/api/sales/report", get(sales::report))
        .route("/api/sales/{id}", get(sales::get))
        .route("/api/sales/code/{code}", get(sales::get_by_code))
        .route("/api/sales/{id}/status", patch(sales::update_status))
        .route("/api/sales/{id}/cancel", patch(sales::cancel))
        .route("/api/dashboard", get(dashboard::summary))
        .route("/api/dashboard/kpis", get(dashboard::kpis))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_auth,
        ));

    open.merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
}

/// Unauthenticated liveness check.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.db.health_check().await;
    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}

/// Pagination metadata attached to list responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// Default page number for list endpoints.
pub(crate) fn default_page() -> i64 {
    1
}

/// Default page size for list endpoints.
pub(crate) fn default_limit() -> i64 {
    10
}
