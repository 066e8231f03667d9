//! Order entity.

use pomelo_core::{Email, OrderId, ProductId};

/// A durable order record.
///
/// `id` and `product_id` never change after creation. `email` is the current
/// owner and moves only through a transfer; `first_name`/`last_name` are a
/// snapshot of the directory user taken when the email was last validated
/// (create or transfer), not kept live-synced with the directory.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub email: Email,
    pub product_id: ProductId,
    pub first_name: String,
    pub last_name: String,
}

/// An order that has not been persisted yet; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub email: Email,
    pub product_id: ProductId,
    pub first_name: String,
    pub last_name: String,
}
