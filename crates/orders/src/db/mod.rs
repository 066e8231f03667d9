//! Database operations for the orders `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `orders` - Order records, one row per (email, product) pair. A unique
//!   index on `(email, product_id)` enforces the duplicate-order invariant
//!   at the storage boundary.
//!
//! # Migrations
//!
//! Migrations live in `crates/orders/migrations/` and are embedded into the
//! binary via `sqlx::migrate!`; they run at startup.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use pomelo_core::{OrderId, ProductId};

use crate::models::{NewOrder, Order};

pub mod orders;

pub use orders::PgOrderStore;

/// Errors from the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (the unique (email, product) index).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Persistence seam for order records.
///
/// The production implementation is [`PgOrderStore`]; tests substitute an
/// in-memory store. Implementations must enforce (or surface the store's
/// enforcement of) the one-order-per-(email, product) invariant by returning
/// [`StoreError::Conflict`] from `create`/`update` on violation.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Find the order owned by `email` for `product_id`, if any.
    async fn find_by_email_and_product(
        &self,
        email: &str,
        product_id: ProductId,
    ) -> Result<Option<Order>, StoreError>;

    /// All orders owned by `email`.
    async fn find_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError>;

    /// Every order in the store.
    async fn find_all(&self) -> Result<Vec<Order>, StoreError>;

    /// Look up an order by id.
    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Persist a new order; the store assigns the id.
    async fn create(&self, order: NewOrder) -> Result<Order, StoreError>;

    /// Persist the mutable fields (owner email and name snapshot) of an
    /// existing order.
    async fn update(&self, order: &Order) -> Result<Order, StoreError>;

    /// Remove an order. Returns `false` if no such order existed.
    async fn delete(&self, id: OrderId) -> Result<bool, StoreError>;

    /// Number of orders in the store.
    async fn count(&self) -> Result<i64, StoreError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
