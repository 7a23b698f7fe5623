//! # aurum-db: Database Layer
//!
//! SQLite storage for the inventory system.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and combined operation error types
//! - [`repository`] - Repository implementations (products, categories,
//!   sales, users, dashboard rollups)
//!
//! The sale workflow in [`repository::sale`] is the one place where business
//! rules and storage meet inside a single transaction: stock checks, price
//! snapshots, and the stock decrement/restitution must commit or roll back
//! together.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aurum_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/aurum.db")).await?;
//! let products = db.products().low_stock().await?;
//! ```

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, StoreError};
pub use pool::{Database, DbConfig};

pub use repository::category::CategoryRepository;
pub use repository::dashboard::DashboardRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::UserRepository;
