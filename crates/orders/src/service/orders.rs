//! Order use cases: create, list, delete, and ownership transfer.
//!
//! Every email-bearing mutation re-validates the email against the external
//! directory rather than trusting a cached snapshot: the directory is the
//! sole source of truth for "does this customer exist", and the denormalized
//! name fields must reflect the directory at the moment of the state change.

use std::sync::Arc;

use thiserror::Error;

use pomelo_core::{Email, OrderId, ProductId};

use crate::db::{OrderStore, StoreError};
use crate::directory::{DirectoryError, DirectoryUser, UserDirectory};
use crate::models::{NewOrder, Order};

/// Failures of the order use cases.
///
/// `InvalidIdentity` ("directory said no") and `ExternalService` ("directory
/// was unreachable") are deliberately distinct variants; the transport
/// boundary maps each to its own status and machine code.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Malformed input, e.g. a missing email on transfer.
    #[error("{0}")]
    InvalidRequest(String),

    /// The email is not a known identity in the external directory.
    #[error("Email {0} does not exist in external user system")]
    InvalidIdentity(String),

    /// No order with the given id.
    #[error("Order not found")]
    OrderNotFound(OrderId),

    /// An order for this (email, product) pair already exists.
    #[error("{0}")]
    DuplicateOrder(String),

    /// The directory could not be consulted.
    #[error("Failed to validate email against external service")]
    ExternalService(#[source] DirectoryError),

    /// Store failure.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<DirectoryError> for OrderError {
    fn from(e: DirectoryError) -> Self {
        Self::ExternalService(e)
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        match e {
            // The only unique constraint on orders is the (email, product)
            // index, so a conflict always means a duplicate order.
            StoreError::Conflict(_) => {
                Self::DuplicateOrder("Order already exists for this user and product".to_owned())
            }
            other => Self::Store(other),
        }
    }
}

/// Order consistency service.
///
/// Stateless between calls; each use case is a single request/response
/// transaction against the store, with identity validation against the
/// directory where an email is involved.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    directory: Arc<dyn UserDirectory>,
}

impl OrderService {
    /// Create a new order service.
    #[must_use]
    pub fn new(store: Arc<dyn OrderStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self { store, directory }
    }

    /// Create an order for `email` and `product_id`.
    ///
    /// The email must resolve in the external directory, and the customer
    /// must not already have an order for the same product. The resolved
    /// user's name is snapshotted onto the order.
    ///
    /// # Errors
    ///
    /// `InvalidIdentity` if the email is unknown to the directory,
    /// `DuplicateOrder` if the (email, product) pair already has an order,
    /// `ExternalService`/`Store` on infrastructure failures.
    pub async fn create_order(
        &self,
        email: &str,
        product_id: ProductId,
    ) -> Result<OrderId, OrderError> {
        let user = self.resolve_identity(email).await?;
        let email = Email::parse(email).map_err(|e| OrderError::InvalidRequest(e.to_string()))?;

        if self
            .store
            .find_by_email_and_product(email.as_str(), product_id)
            .await?
            .is_some()
        {
            return Err(OrderError::DuplicateOrder(
                "The customer already ordered the same product".to_owned(),
            ));
        }

        let order = self
            .store
            .create(NewOrder {
                email,
                product_id,
                first_name: user.first_name,
                last_name: user.last_name,
            })
            .await?;

        Ok(order.id)
    }

    /// List orders, optionally filtered by owner.
    ///
    /// A blank or absent email returns every order without validating any
    /// identity; a non-blank email is validated against the directory first.
    ///
    /// # Errors
    ///
    /// `InvalidIdentity` if a non-blank email is unknown to the directory.
    pub async fn list_orders(&self, email: Option<&str>) -> Result<Vec<Order>, OrderError> {
        match email.map(str::trim) {
            Some(email) if !email.is_empty() => {
                self.resolve_identity(email).await?;
                Ok(self.store.find_by_email(email).await?)
            }
            _ => Ok(self.store.find_all().await?),
        }
    }

    /// Delete an order by id.
    ///
    /// Deleting is not idempotent-success: once the order is gone, a repeat
    /// call fails with `OrderNotFound` again.
    ///
    /// # Errors
    ///
    /// `OrderNotFound` if no order has the given id.
    pub async fn delete_order(&self, order_id: OrderId) -> Result<(), OrderError> {
        if !self.store.delete(order_id).await? {
            return Err(OrderError::OrderNotFound(order_id));
        }
        tracing::info!(%order_id, "order deleted");
        Ok(())
    }

    /// Transfer an order to a new owner.
    ///
    /// The new email must resolve in the directory. Transferring to the
    /// current owner is always legal (the identity is still re-validated and
    /// the name snapshot refreshed); transferring to an owner that already
    /// has this product is a duplicate.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` if the new email is absent or blank, `OrderNotFound`
    /// if the order does not exist, `InvalidIdentity` if the email is
    /// unknown, `DuplicateOrder` if the target owner already has the product.
    pub async fn transfer_order(
        &self,
        order_id: OrderId,
        new_email: Option<&str>,
    ) -> Result<Order, OrderError> {
        let new_email = new_email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| OrderError::InvalidRequest("email must not be null".to_owned()))?;

        let mut order = self
            .store
            .find_by_id(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))?;

        let user = self.resolve_identity(new_email).await?;

        if new_email != order.email.as_str()
            && self
                .store
                .find_by_email_and_product(new_email, order.product_id)
                .await?
                .is_some()
        {
            return Err(OrderError::DuplicateOrder(
                "Order already exists for this user and product".to_owned(),
            ));
        }

        order.email =
            Email::parse(new_email).map_err(|e| OrderError::InvalidRequest(e.to_string()))?;
        order.first_name = user.first_name;
        order.last_name = user.last_name;

        let updated = self.store.update(&order).await?;
        tracing::info!(%order_id, new_owner = %updated.email, "order transferred");
        Ok(updated)
    }

    /// Resolve an email through the directory, failing if it is unknown.
    async fn resolve_identity(&self, email: &str) -> Result<DirectoryUser, OrderError> {
        self.directory
            .find_by_email(email)
            .await?
            .ok_or_else(|| OrderError::InvalidIdentity(email.to_owned()))
    }
}
