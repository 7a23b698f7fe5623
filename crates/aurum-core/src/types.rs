//! # Domain Types
//!
//! Core domain types shared across the workspace.
//!
//! ## Type Hierarchy
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │   Product    │    │     Sale     │    │   SaleItem   │
//! │ ──────────── │    │ ──────────── │    │ ──────────── │
//! │ id (UUID)    │    │ id (UUID)    │    │ sale_id (FK) │
//! │ code (biz)   │◄───│ code (biz)   │───►│ product_id   │
//! │ quantity     │    │ status       │    │ unit_price   │
//! │ min_stock    │    │ total_cents  │    │ (snapshot)   │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!
//! ┌──────────────┐    ┌──────────────┐
//! │   Category   │    │     User     │
//! │ parent_id ──►│    │ email, role  │
//! └──────────────┘    └──────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Products and sales carry both:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `code`: business identifier - human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::money::Money;
use crate::CRITICAL_STOCK_THRESHOLD;

// =============================================================================
// Sale Status
// =============================================================================

/// The lifecycle status of a sale.
///
/// ## Transition Graph
/// ```text
/// PENDING ──► CONFIRMED ──► DELIVERED (terminal)
///    │            │
///    └────────────┴───────► CANCELLED (terminal, restores stock)
/// ```
///
/// Cancellation edges exist in the graph but are only reachable through the
/// cancel flow, which restores stock in the same transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// Sale recorded, stock reserved, awaiting confirmation.
    Pending,
    /// Sale confirmed, awaiting delivery.
    Confirmed,
    /// Sale cancelled; reserved stock has been restored.
    Cancelled,
    /// Sale delivered. Final.
    Delivered,
}

impl SaleStatus {
    /// Whether `next` is reachable from `self` in the transition graph.
    pub fn can_transition_to(self, next: SaleStatus) -> bool {
        use SaleStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed) | (Pending, Cancelled) | (Confirmed, Cancelled) | (Confirmed, Delivered)
        )
    }

    /// Whether `next` may be applied through a plain status update.
    ///
    /// Cancellation is excluded here: it must go through the cancel flow so
    /// stock restitution happens alongside the status change.
    pub fn allows_direct_update(self, next: SaleStatus) -> bool {
        next != SaleStatus::Cancelled && self.can_transition_to(next)
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, SaleStatus::Cancelled | SaleStatus::Delivered)
    }

    /// Wire/database representation (`PENDING`, `CONFIRMED`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            SaleStatus::Pending => "PENDING",
            SaleStatus::Confirmed => "CONFIRMED",
            SaleStatus::Cancelled => "CANCELLED",
            SaleStatus::Delivered => "DELIVERED",
        }
    }
}

impl fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

// =============================================================================
// Stock Operation
// =============================================================================

/// How a stock adjustment is applied to the current quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockOperation {
    /// Add to the current quantity (restock).
    Add,
    /// Subtract from the current quantity; fails if it would go negative.
    Subtract,
    /// Replace the current quantity (inventory count).
    Set,
}

impl Default for StockOperation {
    fn default() -> Self {
        StockOperation::Set
    }
}

// =============================================================================
// User Role
// =============================================================================

/// Access role embedded in auth tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Admin => "ADMIN",
            Role::Manager => "MANAGER",
            Role::User => "USER",
        };
        f.write_str(s)
    }
}

// =============================================================================
// User
// =============================================================================

/// An authenticated operator of the system.
///
/// The password hash never leaves the backend: it is skipped during
/// serialization.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Category
// =============================================================================

/// A product category. Categories form a tree via `parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<String>,
    /// Soft-delete flag; inactive categories keep their history.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business identifier, unique across all products.
    pub code: String,

    /// Display name.
    pub title: String,

    pub description: Option<String>,

    pub category_id: String,

    /// Current stock level. Never negative.
    pub quantity: i64,

    /// Acquisition price in cents.
    pub unit_price_cents: i64,

    /// Selling price in cents. Snapshotted onto sale items at sale time.
    pub sale_price_cents: i64,

    /// Reorder threshold for this product.
    pub min_stock: i64,

    /// Soft-delete flag; inactive products cannot be sold.
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Selling price as Money.
    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// Acquisition price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Reorder policy: out of stock, or below this product's own threshold.
    ///
    /// Note the strict comparison: a product sitting exactly at `min_stock`
    /// is not yet flagged.
    pub fn needs_reorder(&self) -> bool {
        self.quantity == 0 || self.quantity < self.min_stock
    }

    /// Critical policy: out of stock, or below the global
    /// [`CRITICAL_STOCK_THRESHOLD`], independent of `min_stock`.
    pub fn is_critical_stock(&self) -> bool {
        self.quantity == 0 || self.quantity < CRITICAL_STOCK_THRESHOLD
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction header. Line items live in [`SaleItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub code: String,
    pub customer: String,
    pub discount_cents: i64,
    /// Sum of item subtotals minus the discount. Never negative.
    pub total_cents: i64,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Uses the snapshot pattern: `unit_price_cents` is frozen from the
/// product's selling price at sale time, so history survives later price
/// changes. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    /// Selling price at sale time (frozen).
    pub unit_price_cents: i64,
    /// unit_price_cents × quantity.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product_with_stock(quantity: i64, min_stock: i64) -> Product {
        Product {
            id: "p1".to_string(),
            code: "RING001".to_string(),
            title: "Gold Ring 18k".to_string(),
            description: None,
            category_id: "c1".to_string(),
            quantity,
            unit_price_cents: 15000,
            sale_price_cents: 25000,
            min_stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_transition_table() {
        use SaleStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Delivered));

        // Delivery requires confirmation first.
        assert!(!Pending.can_transition_to(Delivered));
        // Terminal states admit nothing.
        assert!(!Cancelled.can_transition_to(Pending));
        assert!(!Delivered.can_transition_to(Cancelled));
    }

    #[test]
    fn test_direct_update_excludes_cancellation() {
        use SaleStatus::*;
        assert!(Pending.allows_direct_update(Confirmed));
        assert!(Confirmed.allows_direct_update(Delivered));
        // Cancelling must go through the cancel flow.
        assert!(!Pending.allows_direct_update(Cancelled));
        assert!(!Confirmed.allows_direct_update(Cancelled));
    }

    #[test]
    fn test_terminal_states() {
        assert!(SaleStatus::Cancelled.is_terminal());
        assert!(SaleStatus::Delivered.is_terminal());
        assert!(!SaleStatus::Pending.is_terminal());
        assert!(!SaleStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&SaleStatus::Pending).unwrap();
        assert_eq!(json, "\"PENDING\"");
        let parsed: SaleStatus = serde_json::from_str("\"DELIVERED\"").unwrap();
        assert_eq!(parsed, SaleStatus::Delivered);
    }

    #[test]
    fn test_stock_policies_diverge() {
        // quantity 2, min_stock 2: not a reorder candidate (2 < 2 is false)
        // but still critical (2 < 10).
        let p = product_with_stock(2, 2);
        assert!(!p.needs_reorder());
        assert!(p.is_critical_stock());
    }

    #[test]
    fn test_reorder_policy() {
        assert!(product_with_stock(0, 0).needs_reorder());
        assert!(product_with_stock(1, 5).needs_reorder());
        assert!(!product_with_stock(5, 5).needs_reorder());
        assert!(!product_with_stock(50, 5).needs_reorder());
    }

    #[test]
    fn test_critical_policy_ignores_min_stock() {
        assert!(product_with_stock(9, 0).is_critical_stock());
        assert!(!product_with_stock(10, 100).is_critical_stock());
    }

    #[test]
    fn test_stock_operation_wire_format() {
        let parsed: StockOperation = serde_json::from_str("\"SUBTRACT\"").unwrap();
        assert_eq!(parsed, StockOperation::Subtract);
        assert_eq!(StockOperation::default(), StockOperation::Set);
    }
}
