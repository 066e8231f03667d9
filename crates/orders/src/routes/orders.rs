//! Order route handlers.
//!
//! Thin adapters between the HTTP surface and the order service: decode the
//! request, call the use case, encode the response. Wire field names
//! (`productID`, `orderID`, `firstName`, ...) follow the published API.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use pomelo_core::{OrderId, ProductId};

use crate::error::{AppError, Result};
use crate::models::Order;
use crate::state::AppState;

/// Request body for creating an order.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub email: String,
    #[serde(rename = "productID")]
    pub product_id: i32,
}

/// Response body for a created order.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    #[serde(rename = "orderID")]
    pub order_id: OrderId,
}

/// Request body for transferring an order to a new owner.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderRequest {
    pub email: Option<String>,
}

/// Query parameters for listing orders.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub email: Option<String>,
}

/// Order as serialized on the wire (ids as strings, per the published API).
#[derive(Debug, Serialize)]
pub struct OrderDto {
    pub id: String,
    pub email: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(rename = "productID")]
    pub product_id: String,
}

impl From<Order> for OrderDto {
    fn from(order: Order) -> Self {
        Self {
            id: order.id.to_string(),
            email: order.email.into_inner(),
            first_name: order.first_name,
            last_name: order.last_name,
            product_id: order.product_id.to_string(),
        }
    }
}

/// Decode a JSON body, turning extractor rejections into the structured
/// `VALIDATION_ERROR` payload instead of axum's plain-text default.
fn decode<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    let Json(body) = payload.map_err(|e| AppError::Validation(vec![e.body_text()]))?;
    Ok(body)
}

/// Create a new order.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateOrderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateOrderResponse>)> {
    let request = decode(payload)?;
    let order_id = state
        .orders()
        .create_order(&request.email, ProductId::new(request.product_id))
        .await?;

    Ok((StatusCode::CREATED, Json(CreateOrderResponse { order_id })))
}

/// List orders, optionally filtered by owner email.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<OrderDto>>> {
    let orders = state.orders().list_orders(query.email.as_deref()).await?;
    tracing::info!(count = orders.len(), "retrieved orders");

    Ok(Json(orders.into_iter().map(OrderDto::from).collect()))
}

/// Transfer an order to a new owner.
#[instrument(skip(state, payload))]
pub async fn transfer(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
    payload: std::result::Result<Json<UpdateOrderRequest>, JsonRejection>,
) -> Result<Json<OrderDto>> {
    let request = decode(payload)?;
    let updated = state
        .orders()
        .transfer_order(OrderId::new(order_id), request.email.as_deref())
        .await?;

    Ok(Json(updated.into()))
}

/// Delete an order.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<StatusCode> {
    state.orders().delete_order(OrderId::new(order_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}
