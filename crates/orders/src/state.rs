//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::OrdersConfig;
use crate::db::PgOrderStore;
use crate::directory::{DirectoryClient, DirectoryError};
use crate::service::OrderService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to shared
/// resources like the database pool, configuration, and the order service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OrdersConfig,
    pool: PgPool,
    orders: OrderService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory client cannot be constructed (e.g.,
    /// the configured API key is not a valid header value).
    pub fn new(config: OrdersConfig, pool: PgPool) -> Result<Self, DirectoryError> {
        let directory = DirectoryClient::new(&config.directory)?;
        let store = PgOrderStore::new(pool.clone());
        let orders = OrderService::new(Arc::new(store), Arc::new(directory));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                orders,
            }),
        })
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &OrdersConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the order service.
    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
