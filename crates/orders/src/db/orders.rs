//! Order repository for database operations.
//!
//! Queries use runtime-checked `query_as` so the crate builds without a live
//! database connection.

use async_trait::async_trait;
use sqlx::PgPool;

use pomelo_core::{OrderId, ProductId};

use super::{OrderStore, StoreError};
use crate::models::{NewOrder, Order};

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store over the given pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a sqlx error, turning a unique-index violation into `Conflict`.
///
/// The unique index on `(email, product_id)` is what makes the service's
/// check-then-write sequence safe under concurrent requests.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return StoreError::Conflict(
            "order already exists for this email and product".to_owned(),
        );
    }
    StoreError::Database(e)
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn find_by_email_and_product(
        &self,
        email: &str,
        product_id: ProductId,
    ) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, email, product_id, first_name, last_name
            FROM orders
            WHERE email = $1 AND product_id = $2
            ",
        )
        .bind(email)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Order>, StoreError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, email, product_id, first_name, last_name
            FROM orders
            WHERE email = $1
            ORDER BY id ASC
            ",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn find_all(&self) -> Result<Vec<Order>, StoreError> {
        let orders = sqlx::query_as::<_, Order>(
            r"
            SELECT id, email, product_id, first_name, last_name
            FROM orders
            ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            SELECT id, email, product_id, first_name, last_name
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    async fn create(&self, order: NewOrder) -> Result<Order, StoreError> {
        let created = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (email, product_id, first_name, last_name)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, product_id, first_name, last_name
            ",
        )
        .bind(order.email.as_str())
        .bind(order.product_id)
        .bind(&order.first_name)
        .bind(&order.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(created)
    }

    async fn update(&self, order: &Order) -> Result<Order, StoreError> {
        // product_id and id are immutable; only the owner and name snapshot move.
        let updated = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET email = $1, first_name = $2, last_name = $3
            WHERE id = $4
            RETURNING id, email, product_id, first_name, last_name
            ",
        )
        .bind(order.email.as_str())
        .bind(&order.first_name)
        .bind(&order.last_name)
        .bind(order.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        updated.ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            DELETE FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            r"
            SELECT COUNT(*) FROM orders
            ",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }
}
