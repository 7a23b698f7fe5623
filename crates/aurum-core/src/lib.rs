//! # aurum-core: Pure Business Logic
//!
//! The heart of the inventory system. Everything here is a pure function or
//! a plain type with zero I/O dependencies.
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Category, Sale, SaleItem, User)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock level below which the dashboard flags a product as critical,
/// regardless of the product's own `min_stock`.
///
/// This is deliberately a second policy next to [`Product::needs_reorder`]:
/// `min_stock` drives reorder decisions per product, while the dashboard
/// surfaces anything running low in absolute terms.
pub const CRITICAL_STOCK_THRESHOLD: i64 = 10;

/// Maximum quantity of a single line item in a sale.
///
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
