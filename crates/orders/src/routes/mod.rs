//! HTTP route definitions.

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

pub mod orders;

/// Build the order API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route(
            "/orders/{order_id}",
            put(orders::transfer).delete(orders::remove),
        )
}
