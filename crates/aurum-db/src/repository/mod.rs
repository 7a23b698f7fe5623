//! # Repository Module
//!
//! Database repository implementations. Each repository wraps the pool and
//! isolates its table's SQL behind a typed API; the handlers above never see
//! a query string.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD, stock adjustments, low-stock listing
//! - [`category::CategoryRepository`] - Category tree CRUD
//! - [`sale::SaleRepository`] - The transactional sale workflow plus read surface
//! - [`user::UserRepository`] - User accounts for the auth layer
//! - [`dashboard::DashboardRepository`] - Read-only rollups

pub mod category;
pub mod dashboard;
pub mod product;
pub mod sale;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;
