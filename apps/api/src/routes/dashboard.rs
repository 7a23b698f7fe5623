//! # Dashboard Routes
//!
//! Read-only rollups. These queries are not transactionally isolated from
//! concurrent writes; slightly stale aggregates are acceptable here.

use axum::extract::State;
use axum::Json;

use aurum_db::repository::dashboard::{DashboardSummary, SalesKpis};

use crate::error::ApiError;
use crate::AppState;

/// `GET /api/dashboard`
pub async fn summary(State(state): State<AppState>) -> Result<Json<DashboardSummary>, ApiError> {
    let summary = state.db.dashboard().summary().await?;
    Ok(Json(summary))
}

/// `GET /api/dashboard/kpis`
pub async fn kpis(State(state): State<AppState>) -> Result<Json<SalesKpis>, ApiError> {
    let kpis = state.db.dashboard().sales_kpis().await?;
    Ok(Json(kpis))
}
