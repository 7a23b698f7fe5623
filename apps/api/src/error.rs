//! # API Error Type
//!
//! The single error surface clients see.
//!
//! ## Error Flow
//! ```text
//! ValidationError ─┐
//! CoreError ───────┼──► ApiError { code, message } ──► HTTP status + JSON
//! DbError ─────────┤
//! StoreError ──────┘
//! ```
//!
//! Business-rule and validation failures carry their message through to the
//! client. Storage failures do not: they are logged server-side and the
//! client receives a generic message.

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use aurum_core::{CoreError, ValidationError};
use aurum_db::{DbError, StoreError};

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed or missing input (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Duplicate code or email (409)
    Conflict,

    /// Business rule violation: insufficient stock, invalid discount,
    /// status guards (400)
    BusinessRule,

    /// Missing or invalid credentials (401)
    Unauthorized,

    /// Authenticated but not allowed (403)
    Forbidden,

    /// Internal server error (500); detail is logged, never returned
    Internal,
}

/// API error returned to clients.
///
/// ## Serialization
/// ```json
/// { "code": "BUSINESS_RULE", "message": "Insufficient stock for ..." }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Conflict, message)
    }

    /// Creates a business rule error.
    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessRule, message)
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Creates a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::ValidationError | ErrorCode::BusinessRule => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Converts business rule violations to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DuplicateCode { .. } => ApiError::conflict(err.to_string()),

            CoreError::ProductNotFound(ref id) => ApiError::not_found("Product", id),
            CoreError::SaleNotFound(ref id) => ApiError::not_found("Sale", id),

            CoreError::ProductInactive { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::InvalidDiscount { .. }
            | CoreError::AlreadyCancelled(_)
            | CoreError::CannotCancelDelivered(_)
            | CoreError::InvalidStatusTransition { .. } => ApiError::business(err.to_string()),

            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts database errors to API errors.
///
/// Only not-found and constraint violations carry detail to the client;
/// everything else is logged and genericized.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),

            DbError::UniqueViolation { field } => {
                ApiError::conflict(format!("Duplicate value for {}", field))
            }

            DbError::ForeignKeyViolation { message } => {
                error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }

            other => {
                error!("Database error: {}", other);
                ApiError::internal("Internal server error")
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rule(e) => e.into(),
            StoreError::Db(e) => e.into(),
        }
    }
}

// =============================================================================
// Json Extractor
// =============================================================================

/// `Json` wrapper whose rejection is an [`ApiError`].
///
/// Axum's own rejection would answer malformed bodies with a bare 422; the
/// API contract wants every input problem as a 400 with the standard error
/// shape, including unknown enum values like a bad sale status.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::validation(rejection.body_text())),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
