//! # Error Types
//!
//! Domain-specific error types for aurum-core.
//!
//! ## Error Hierarchy
//! ```text
//! aurum-core errors (this file)
//! ├── CoreError        - Business rule violations
//! └── ValidationError  - Input validation failures
//!
//! aurum-db errors (separate crate)
//! └── DbError          - Database operation failures
//!
//! API errors (in app)
//! └── ApiError         - What clients see (HTTP status + message)
//!
//! Flow: ValidationError → CoreError → StoreError → ApiError → client
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (code, quantities, etc.)
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::types::SaleStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
///
/// These abort the operation that raised them; inside the sale workflow they
/// abort the whole transaction, so no partial stock mutation ever persists.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A unique business code (product or sale) is already taken.
    #[error("{entity} code '{code}' already exists")]
    DuplicateCode { entity: &'static str, code: String },

    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been deactivated and cannot be sold.
    #[error("Product '{title}' is inactive")]
    ProductInactive { title: String },

    /// Requested quantity exceeds current stock.
    ///
    /// ## When This Occurs
    /// - A sale line asks for more than the product has on hand
    /// - A SUBTRACT stock adjustment would take the quantity negative
    #[error("Insufficient stock for '{title}': available {available}, requested {requested}")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },

    /// Discount larger than the sum of line subtotals.
    #[error("Discount ({discount_cents} cents) exceeds the items total ({subtotal_cents} cents)")]
    InvalidDiscount {
        subtotal_cents: i64,
        discount_cents: i64,
    },

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Cancellation was already applied; stock must never be restored twice.
    #[error("Sale {0} is already cancelled")]
    AlreadyCancelled(String),

    /// Delivered sales are final and cannot be cancelled.
    #[error("Sale {0} has been delivered and can no longer be cancelled")]
    CannotCancelDelivered(String),

    /// The requested status change is not in the transition table.
    #[error("Cannot change sale status from {from} to {to}")]
    InvalidStatusTransition { from: SaleStatus, to: SaleStatus },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when request input doesn't meet shape requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: &'static str },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: &'static str, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: &'static str },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: &'static str },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    /// Invalid format (e.g. malformed email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat {
        field: &'static str,
        reason: &'static str,
    },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            title: "Gold Ring 18k".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Gold Ring 18k': available 3, requested 5"
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = CoreError::InvalidStatusTransition {
            from: SaleStatus::Pending,
            to: SaleStatus::Delivered,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change sale status from PENDING to DELIVERED"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required { field: "code" };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
